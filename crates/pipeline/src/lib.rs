//! Blend state for the hybrid recommender.
//!
//! This crate provides:
//! - WeightState: the CF/CBF weights and the like-driven state machine
//! - FeedbackTracker: the ids each model showed last, used for attribution
//! - BlendSession: weights and tracker kept together for one session
//!
//! ## Architecture
//! A recommendation reads the session in two places:
//! 1. `counts()` turns the weights into neighbor counts that sum to 12
//! 2. `record_shown()` stores what each model contributed
//!
//! Feedback then goes the other way: `apply_feedback()` checks the liked
//! movie against the last-shown sets and, if the like can be credited to
//! the liked model, steps the weights by 0.2 toward it.
//!
//! ## Example Usage
//! ```ignore
//! use pipeline::BlendSession;
//! use data_loader::ModelKind;
//!
//! let mut session = BlendSession::new();
//! let (cf_count, cbf_count) = session.counts();       // (6, 6)
//! session.record_shown(&cf_ids, &cbf_ids);
//! session.apply_feedback(ModelKind::Cf, cf_ids[0]);    // 6.2 / 5.8
//! ```

pub mod feedback;
pub mod weights;
pub mod session;

// Re-export main types
pub use feedback::{AttributionPolicy, FeedbackTracker};
pub use weights::{TOTAL_RECOMMENDATIONS, WeightSnapshot, WeightState};
pub use session::BlendSession;
