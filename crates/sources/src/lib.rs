//! # Sources Crate
//!
//! This crate implements the two recommendation sources that get blended
//! into a hybrid result, plus the title search used to find the movie a
//! request is about.
//!
//! ## Components
//!
//! ### NeighborIndex
//! Exact nearest-neighbor search over one model's embedding matrix:
//! - "Movies whose embeddings sit closest to this one"
//! - The queried row always comes back first, at distance zero
//!
//! ### ModelSource
//! One model (collaborative or content-based) with its catalog and index,
//! answering "the k movies most similar to movie X" by id.
//!
//! ### TitleResolver
//! Fuzzy match from whatever the user typed to the closest catalog title.
//!
//! ## Example Usage
//!
//! ```ignore
//! use sources::{ModelSource, TitleResolver};
//! use data_loader::ModelArtifact;
//!
//! let (cf_artifact, cbf_artifact) = ModelArtifact::load_pair(cf_path, cbf_path)?;
//! let cf = ModelSource::from_artifact(&cf_artifact)?;
//! let cbf = ModelSource::from_artifact(&cbf_artifact)?;
//!
//! let resolver = TitleResolver::new(cbf.catalog().titles())?;
//! let matched = resolver.resolve("terminater")?;
//! let id = cbf.catalog().title_to_id(&matched.title)?;
//!
//! let cf_neighbors = cf.similar_movies(id, 6)?;
//! let cbf_neighbors = cbf.similar_movies(id, 6)?;
//! ```

// Public modules
pub mod neighbor_index;
pub mod title_resolver;
pub mod model_source;

// Re-export commonly used types
pub use neighbor_index::{Neighbor, NeighborIndex};
pub use title_resolver::{TitleMatch, TitleResolver};
pub use model_source::ModelSource;
