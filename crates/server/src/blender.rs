//! # Hybrid Blender
//!
//! Combines the collaborative-filtering and content-based models into one
//! recommendation:
//! 1. Resolve the movie reference (fuzzy title or exact id)
//! 2. Split 12 slots between the models from the session weights
//! 3. Query both neighbor indices, dropping the queried movie
//! 4. Record what each model showed, for later feedback
//!
//! The blender itself is immutable and shared; all mutable state lives in the
//! `BlendSession` the caller passes in.

use std::sync::Arc;
use std::time::Instant;

use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use data_loader::{
    ModelArtifact, ModelKind, Movie, MovieId, MovieRef, RecommendationItem, RecsError, Result,
};
use pipeline::{BlendSession, FeedbackTracker};
use sources::{ModelSource, TitleResolver};

/// Result of one hybrid recommendation
#[derive(Debug, Clone, Serialize)]
pub struct HybridRecommendations {
    /// Canonical title of the queried movie
    pub title: String,
    pub movie_id: MovieId,
    /// Collaborative-filtering neighbors, nearest first
    pub cf: Vec<RecommendationItem>,
    /// Content-based neighbors, nearest first
    pub cbf: Vec<RecommendationItem>,
    /// What each model showed; pass back to `like_with` to have feedback
    /// judged against exactly this response
    pub shown: FeedbackTracker,
}

/// Neighbors from a single model, sized by the caller
#[derive(Debug, Clone, Serialize)]
pub struct ModelRecommendations {
    pub model: ModelKind,
    pub title: String,
    pub movie_id: MovieId,
    /// Nearest first, never the queried movie
    pub recommendations: Vec<RecommendationItem>,
}

/// Result of one like
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LikeOutcome {
    /// Display name of the liked model
    pub model: &'static str,
    pub title: String,
    pub cf_weight: f64,
    pub cbf_weight: f64,
    /// Whether the like moved the weights
    pub adjusted: bool,
}

/// Read-only engine shared by every request
pub struct HybridBlender {
    cf: Arc<ModelSource>,
    cbf: Arc<ModelSource>,
    resolver: TitleResolver,
}

impl HybridBlender {
    /// Pair a CF and a CBF source
    ///
    /// Titles for search and display come from the CBF catalog. Movies known
    /// to only one model are logged; they can still be recommended but only
    /// the model that knows them can be queried for them.
    pub fn new(cf: ModelSource, cbf: ModelSource) -> Result<Self> {
        expect_kind(&cf, ModelKind::Cf)?;
        expect_kind(&cbf, ModelKind::Cbf)?;

        let missing_from_cf = cbf
            .catalog()
            .movies()
            .iter()
            .filter(|m| !cf.catalog().contains(m.id))
            .count();
        let missing_from_cbf = cf
            .catalog()
            .movies()
            .iter()
            .filter(|m| !cbf.catalog().contains(m.id))
            .count();
        if missing_from_cf > 0 || missing_from_cbf > 0 {
            warn!(
                "Model catalogs differ: {} CBF movies missing from CF, {} CF movies missing from CBF",
                missing_from_cf, missing_from_cbf
            );
        }

        let resolver = TitleResolver::new(cbf.catalog().unique_titles())?;
        info!(
            "Blender ready: {} CF movies, {} CBF movies",
            cf.catalog().len(),
            cbf.catalog().len()
        );

        Ok(Self {
            cf: Arc::new(cf),
            cbf: Arc::new(cbf),
            resolver,
        })
    }

    /// Build both sources from loaded artifacts
    pub fn from_artifacts(cf: &ModelArtifact, cbf: &ModelArtifact) -> Result<Self> {
        let (cf, cbf) = rayon::join(
            || ModelSource::from_artifact(cf),
            || ModelSource::from_artifact(cbf),
        );
        Self::new(cf?, cbf?)
    }

    pub fn source(&self, kind: ModelKind) -> &Arc<ModelSource> {
        match kind {
            ModelKind::Cf => &self.cf,
            ModelKind::Cbf => &self.cbf,
        }
    }

    /// Best fuzzy match for `query` among the canonical titles
    #[instrument(skip(self))]
    pub fn search(&self, query: &str) -> Result<Movie> {
        let matched = self.resolver.resolve(query)?;
        debug!("Matched {:?} with score {}", matched.title, matched.score);
        let id = self.cbf.catalog().title_to_id(&matched.title)?;
        Ok(Movie {
            id,
            title: matched.title,
        })
    }

    /// Canonical movie for an id
    pub fn get_title(&self, movie_id: MovieId) -> Result<Movie> {
        self.cbf.catalog().get_movie(movie_id).cloned()
    }

    /// Resolve a reference to a canonical movie
    pub fn resolve(&self, movie_ref: &MovieRef) -> Result<Movie> {
        match movie_ref {
            MovieRef::Id(id) => self.get_title(*id),
            MovieRef::Title(query) => self.search(query),
        }
    }

    /// `count` neighbors of `movie_id` from one model, as titled items
    pub fn neighbors(
        &self,
        kind: ModelKind,
        movie_id: MovieId,
        count: usize,
    ) -> Result<Vec<RecommendationItem>> {
        let source = self.source(kind);
        source
            .similar_movies(movie_id, count)?
            .into_iter()
            .map(|id| self.item(source, id))
            .collect()
    }

    /// `count` neighbors of `movie_id` from the model named by `model`
    ///
    /// Leaves every session untouched, so a later like is still judged
    /// against the last hybrid recommendation.
    #[instrument(skip(self))]
    pub fn model_recommendations(
        &self,
        model: &str,
        movie_id: MovieId,
        count: usize,
    ) -> Result<ModelRecommendations> {
        let kind: ModelKind = model.parse()?;
        let movie = self.get_title(movie_id)?;
        let recommendations = self.neighbors(kind, movie_id, count)?;
        Ok(ModelRecommendations {
            model: kind,
            title: movie.title,
            movie_id,
            recommendations,
        })
    }

    /// Store what both models showed and build the response
    fn assemble(
        &self,
        session: &mut BlendSession,
        movie: Movie,
        cf: Vec<RecommendationItem>,
        cbf: Vec<RecommendationItem>,
    ) -> HybridRecommendations {
        let cf_ids: Vec<MovieId> = cf.iter().map(|item| item.id).collect();
        let cbf_ids: Vec<MovieId> = cbf.iter().map(|item| item.id).collect();
        session.record_shown(&cf_ids, &cbf_ids);

        HybridRecommendations {
            title: movie.title,
            movie_id: movie.id,
            cf,
            cbf,
            shown: session.tracker().clone(),
        }
    }

    /// Recommend movies similar to `movie_ref`, sized by the session weights
    #[instrument(skip(self, session))]
    pub fn recommend(
        &self,
        session: &mut BlendSession,
        movie_ref: &MovieRef,
    ) -> Result<HybridRecommendations> {
        let start_time = Instant::now();

        let movie = self.resolve(movie_ref)?;
        let (cf_count, cbf_count) = session.counts();
        debug!("Blending {} CF and {} CBF neighbors", cf_count, cbf_count);

        let (cf, cbf) = rayon::join(
            || self.neighbors(ModelKind::Cf, movie.id, cf_count),
            || self.neighbors(ModelKind::Cbf, movie.id, cbf_count),
        );
        let recommendations = self.assemble(session, movie, cf?, cbf?);

        info!(
            "Recommended {} + {} movies for {:?} in {:.2?}",
            recommendations.cf.len(),
            recommendations.cbf.len(),
            recommendations.title,
            start_time.elapsed()
        );
        Ok(recommendations)
    }

    /// Apply a like judged against the session's latest recommendation
    pub fn like(
        &self,
        session: &mut BlendSession,
        model: &str,
        movie_id: MovieId,
    ) -> Result<LikeOutcome> {
        let shown = session.tracker().clone();
        self.like_with(session, model, movie_id, &shown)
    }

    /// Apply a like judged against a `shown` token from an earlier response
    ///
    /// The movie is looked up before the model selector is parsed, so an
    /// unknown movie is reported even when the selector is also bad.
    pub fn like_with(
        &self,
        session: &mut BlendSession,
        model: &str,
        movie_id: MovieId,
        shown: &FeedbackTracker,
    ) -> Result<LikeOutcome> {
        let movie = self.get_title(movie_id)?;
        let liked: ModelKind = model.parse()?;

        let adjusted = session.apply_feedback_with(liked, movie_id, shown);
        let weights = session.weights();

        Ok(LikeOutcome {
            model: liked.display_name(),
            title: movie.title,
            cf_weight: weights.cf_weight(),
            cbf_weight: weights.cbf_weight(),
            adjusted,
        })
    }

    /// Title from the CBF catalog, falling back to the source's own catalog
    fn item(&self, source: &ModelSource, movie_id: MovieId) -> Result<RecommendationItem> {
        let title = match self.cbf.catalog().id_to_title(movie_id) {
            Ok(title) => title,
            Err(_) => source.catalog().id_to_title(movie_id)?,
        };
        Ok(RecommendationItem {
            title: title.to_string(),
            id: movie_id,
        })
    }
}

fn expect_kind(source: &ModelSource, expected: ModelKind) -> Result<()> {
    if source.kind() != expected {
        return Err(RecsError::ModelKindMismatch {
            expected: expected.to_string(),
            found: source.kind().to_string(),
        });
    }
    Ok(())
}
