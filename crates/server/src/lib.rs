//! Server crate for the ReelRecs recommendation engine.
//!
//! This crate contains the hybrid blender that combines the two models, the
//! async service that owns the shared blend session, and its configuration.

pub mod blender;
pub mod config;
pub mod service;

#[cfg(test)]
mod test_support;

pub use blender::{HybridBlender, HybridRecommendations, LikeOutcome, ModelRecommendations};
pub use config::ServiceConfig;
pub use service::RecommendationService;
