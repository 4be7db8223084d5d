//! Shared fixtures for the server tests.
//!
//! Sixteen movies with one-dimensional Euclidean embeddings. The CBF model
//! keeps the movies in list order; the CF model stores them in reverse, so
//! any mix-up between ids and rows shows up immediately. Neighbor distances
//! are all distinct, which keeps the expected lists free of ties.

use data_loader::{DistanceMetric, ModelArtifact, ModelKind, Movie, MovieId};

pub const TITLES: [&str; 16] = [
    "Toy Story (1995)",
    "Jumanji (1995)",
    "Heat (1995)",
    "GoldenEye (1995)",
    "Casino (1995)",
    "Sense and Sensibility (1995)",
    "Four Rooms (1995)",
    "Get Shorty (1995)",
    "Copycat (1995)",
    "Braveheart (1995)",
    "Apollo 13 (1995)",
    "Batman Forever (1995)",
    "The Terminator (1984)",
    "Terminal Velocity (1994)",
    "Rob Roy (1995)",
    "Clueless (1995)",
];

/// Id of the movie at position `k` of `TITLES`
pub fn movie_id(k: usize) -> MovieId {
    (k as MovieId + 1) * 10
}

pub const HEAT: MovieId = 30;
pub const TERMINATOR: MovieId = 130;

/// CBF neighbors of Heat, nearest first
pub const HEAT_CBF: [MovieId; 6] = [20, 40, 10, 50, 60, 70];
/// CF neighbors of Heat, nearest first
pub const HEAT_CF: [MovieId; 6] = [60, 160, 90, 130, 120, 100];
/// Proposed for Heat by both models
pub const HEAT_SHARED: MovieId = 60;

fn movies(order: impl Iterator<Item = usize>) -> Vec<Movie> {
    order
        .map(|k| Movie {
            id: movie_id(k),
            title: TITLES[k].to_string(),
        })
        .collect()
}

pub fn cbf_artifact() -> ModelArtifact {
    let order = 0..TITLES.len();
    ModelArtifact {
        kind: ModelKind::Cbf,
        metric: DistanceMetric::Euclidean,
        movies: movies(order.clone()),
        matrix: order
            .map(|k| vec![k as f32 + (k * k) as f32 * 0.01])
            .collect(),
    }
}

pub fn cf_artifact() -> ModelArtifact {
    let order = (0..TITLES.len()).rev();
    ModelArtifact {
        kind: ModelKind::Cf,
        metric: DistanceMetric::Euclidean,
        movies: movies(order.clone()),
        matrix: order
            .map(|k| vec![((k * 5) % 16) as f32 + k as f32 * 0.01])
            .collect(),
    }
}
