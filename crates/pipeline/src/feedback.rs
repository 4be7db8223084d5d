//! Which movies each model showed most recently.
//!
//! A like only moves the blend toward a model when the liked movie can be
//! credited to that model. The tracker remembers the id sets from the last
//! hybrid recommendation so feedback can be checked against them.

use data_loader::{ModelKind, MovieId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Last-shown id sets, one per model
///
/// Also serves as the attribution token handed back with every
/// recommendation: a client that returns it with its feedback gets that
/// feedback judged against exactly what it was shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackTracker {
    cf: BTreeSet<MovieId>,
    cbf: BTreeSet<MovieId>,
}

impl FeedbackTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the set for `kind` with `ids`
    pub fn record(&mut self, kind: ModelKind, ids: impl IntoIterator<Item = MovieId>) {
        let set = match kind {
            ModelKind::Cf => &mut self.cf,
            ModelKind::Cbf => &mut self.cbf,
        };
        *set = ids.into_iter().collect();
    }

    pub fn shown_by(&self, kind: ModelKind) -> &BTreeSet<MovieId> {
        match kind {
            ModelKind::Cf => &self.cf,
            ModelKind::Cbf => &self.cbf,
        }
    }

    pub fn was_shown_by(&self, kind: ModelKind, movie_id: MovieId) -> bool {
        self.shown_by(kind).contains(&movie_id)
    }

    pub fn is_empty(&self) -> bool {
        self.cf.is_empty() && self.cbf.is_empty()
    }
}

/// Rule deciding whether a like can be credited to the liked model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributionPolicy {
    /// Credit unless the other model also showed the movie
    #[default]
    NotShownByOther,
    /// Credit only if the liked model showed the movie and the other did not
    ShownOnlyByLiked,
}

impl AttributionPolicy {
    pub fn attributes(self, shown: &FeedbackTracker, liked: ModelKind, movie_id: MovieId) -> bool {
        let shown_by_other = shown.was_shown_by(liked.opposite(), movie_id);
        match self {
            AttributionPolicy::NotShownByOther => !shown_by_other,
            AttributionPolicy::ShownOnlyByLiked => {
                !shown_by_other && shown.was_shown_by(liked, movie_id)
            }
        }
    }
}
