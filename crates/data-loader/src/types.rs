//! Core domain types shared by the recommendation crates.
//!
//! - Type aliases for domain clarity (MovieId, RowIndex)
//! - The two model kinds and how they are named by clients
//! - Output items and movie references

use crate::error::RecsError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// =============================================================================
// Type Aliases
// =============================================================================
// Movie ids are stable across models; row indices are private to one model.

/// Unique identifier for a movie, shared by both models
pub type MovieId = u32;

/// Position of a movie inside one model's embedding matrix
pub type RowIndex = usize;

// =============================================================================
// Movies
// =============================================================================

/// A movie as known to a catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movie {
    pub id: MovieId,
    pub title: String,
}

/// One recommended movie. Title and id always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecommendationItem {
    pub title: String,
    pub id: MovieId,
}

impl From<Movie> for RecommendationItem {
    fn from(movie: Movie) -> Self {
        Self {
            title: movie.title,
            id: movie.id,
        }
    }
}

/// How a request refers to the movie it wants recommendations for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MovieRef {
    /// Exact movie id
    Id(MovieId),
    /// Free text, resolved by fuzzy title match
    Title(String),
}

impl From<MovieId> for MovieRef {
    fn from(id: MovieId) -> Self {
        MovieRef::Id(id)
    }
}

impl From<&str> for MovieRef {
    fn from(title: &str) -> Self {
        MovieRef::Title(title.to_string())
    }
}

impl From<String> for MovieRef {
    fn from(title: String) -> Self {
        MovieRef::Title(title)
    }
}

// =============================================================================
// Models
// =============================================================================

/// The two recommenders being blended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModelKind {
    /// Collaborative filtering
    Cf,
    /// Content-based filtering
    Cbf,
}

impl ModelKind {
    /// The other model of the pair
    pub fn opposite(self) -> Self {
        match self {
            ModelKind::Cf => ModelKind::Cbf,
            ModelKind::Cbf => ModelKind::Cf,
        }
    }

    /// Human readable name used in feedback responses
    pub fn display_name(self) -> &'static str {
        match self {
            ModelKind::Cf => "Collaborative Filtering",
            ModelKind::Cbf => "Content-based Filtering",
        }
    }
}

impl fmt::Display for ModelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ModelKind::Cf => f.write_str("cf"),
            ModelKind::Cbf => f.write_str("cbf"),
        }
    }
}

/// Parses the selector clients send with feedback. Only the exact strings
/// "cf" and "cbf" are accepted.
impl FromStr for ModelKind {
    type Err = RecsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cf" => Ok(ModelKind::Cf),
            "cbf" => Ok(ModelKind::Cbf),
            _ => Err(RecsError::InvalidModelSelector(s.to_string())),
        }
    }
}

/// Distance used when ranking neighbors inside one model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DistanceMetric {
    /// `1 - cosine similarity`
    #[default]
    Cosine,
    /// Straight-line distance
    Euclidean,
}
