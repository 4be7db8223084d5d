//! Mutable state of one blending session.
//!
//! A session pairs the current weights with the tracker of what was last
//! shown, because the two are only meaningful together: feedback is judged
//! against the tracker and then moves the weights. Whoever owns a session
//! decides how it is shared; the engine only ever borrows it mutably.

use crate::feedback::{AttributionPolicy, FeedbackTracker};
use crate::weights::WeightState;
use data_loader::{ModelKind, MovieId};
use tracing::info;

#[derive(Debug, Clone, Default)]
pub struct BlendSession {
    weights: WeightState,
    tracker: FeedbackTracker,
    policy: AttributionPolicy,
}

impl BlendSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start from specific weights
    pub fn with_weights(mut self, weights: WeightState) -> Self {
        self.weights = weights;
        self
    }

    /// Configure how likes are attributed (default: not shown by the other model)
    pub fn with_policy(mut self, policy: AttributionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn weights(&self) -> WeightState {
        self.weights
    }

    pub fn tracker(&self) -> &FeedbackTracker {
        &self.tracker
    }

    pub fn policy(&self) -> AttributionPolicy {
        self.policy
    }

    /// Neighbor counts for the next recommendation
    pub fn counts(&self) -> (usize, usize) {
        self.weights.balanced_split()
    }

    /// Replace both last-shown sets
    pub fn record_shown(&mut self, cf: &[MovieId], cbf: &[MovieId]) {
        self.tracker.record(ModelKind::Cf, cf.iter().copied());
        self.tracker.record(ModelKind::Cbf, cbf.iter().copied());
    }

    /// Apply a like against the session's own last-shown sets
    pub fn apply_feedback(&mut self, liked: ModelKind, movie_id: MovieId) -> bool {
        let shown = self.tracker.clone();
        self.apply_feedback_with(liked, movie_id, &shown)
    }

    /// Apply a like against a token returned by an earlier recommendation
    pub fn apply_feedback_with(
        &mut self,
        liked: ModelKind,
        movie_id: MovieId,
        shown: &FeedbackTracker,
    ) -> bool {
        let adjusted = self
            .weights
            .adjust_with_policy(liked, movie_id, shown, self.policy);
        if adjusted {
            info!(
                "Like for movie {} moved blend toward {}: cf={:.1} cbf={:.1}",
                movie_id,
                liked,
                self.weights.cf_weight(),
                self.weights.cbf_weight()
            );
        }
        adjusted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_feedback_uses_latest_shown_sets() {
        let mut session = BlendSession::new();
        session.record_shown(&[1, 2], &[3, 4]);

        assert!(session.apply_feedback(ModelKind::Cf, 1));
        assert_eq!(session.weights().cf_weight(), 6.2);

        // A newer recommendation also showed movie 1 through CBF
        session.record_shown(&[1, 2], &[1, 5]);
        assert!(!session.apply_feedback(ModelKind::Cf, 1));
        assert_eq!(session.weights().cf_weight(), 6.2);
    }

    #[test]
    fn test_feedback_with_token() {
        let mut session = BlendSession::new();
        session.record_shown(&[1], &[2]);
        let token = session.tracker().clone();

        // Session moves on; the old token still decides attribution
        session.record_shown(&[2], &[1]);
        assert!(session.apply_feedback_with(ModelKind::Cf, 1, &token));
        assert!(!session.apply_feedback(ModelKind::Cf, 1));
    }

    #[test]
    fn test_counts_follow_weights() {
        let mut session = BlendSession::new();
        session.record_shown(&[1], &[2]);
        assert_eq!(session.counts(), (6, 6));

        session.apply_feedback(ModelKind::Cbf, 2);
        session.apply_feedback(ModelKind::Cbf, 2);
        session.apply_feedback(ModelKind::Cbf, 2);
        // cf 5.4 / cbf 6.6
        assert_eq!(session.counts(), (6, 6));

        for _ in 0..3 {
            session.apply_feedback(ModelKind::Cbf, 2);
        }
        // cf 4.8 / cbf 7.2
        assert_eq!(session.counts(), (5, 7));
    }

    #[test]
    fn test_strict_policy_session() {
        let mut session = BlendSession::new().with_policy(AttributionPolicy::ShownOnlyByLiked);
        session.record_shown(&[1], &[2]);

        assert!(!session.apply_feedback(ModelKind::Cf, 99));
        assert!(session.apply_feedback(ModelKind::Cf, 1));
    }
}
