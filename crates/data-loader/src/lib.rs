//! # Data Loader Crate
//!
//! This crate handles loading exported model artifacts and building the
//! per-model catalogs that the recommendation engine looks movies up in.
//!
//! ## Main Components
//!
//! - **types**: Core domain types (MovieId, Movie, ModelKind, MovieRef)
//! - **catalog**: Immutable id/title/row mappings for one model
//! - **artifact**: JSON model artifacts and their validation
//! - **error**: The error type shared by the whole workspace
//!
//! ## Example Usage
//!
//! ```ignore
//! use data_loader::ModelArtifact;
//! use std::path::Path;
//!
//! let (cf, cbf) = ModelArtifact::load_pair(
//!     Path::new("models/cf_model.json"),
//!     Path::new("models/cbf_model.json"),
//! )?;
//!
//! let catalog = cbf.catalog()?;
//! println!("{} has id {}", "Heat (1995)", catalog.title_to_id("Heat (1995)")?);
//! ```

// Public modules
pub mod error;
pub mod types;
pub mod catalog;
pub mod artifact;

// Re-export commonly used types for convenience
pub use error::{ErrorKind, RecsError, Result};
pub use types::{
    // Type aliases
    MovieId,
    RowIndex,
    // Core types
    Movie,
    MovieRef,
    RecommendationItem,
    // Enums
    DistanceMetric,
    ModelKind,
};
pub use catalog::Catalog;
pub use artifact::ModelArtifact;
