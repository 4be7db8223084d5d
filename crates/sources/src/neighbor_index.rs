//! Exact k-nearest-neighbor search over one model's embedding matrix.
//!
//! The index is a bulk-built, read-only view of the matrix plus precomputed
//! row norms. A query scans every row in parallel with Rayon, which for
//! catalogs of a few thousand movies is well under a millisecond and needs
//! no approximate structure.
//!
//! The query row is always part of its own answer: it sits at distance zero
//! and wins every tie, so `k_nearest(row, k)[0] == row`. Callers that do not
//! want self-matches drop them themselves.

use data_loader::{DistanceMetric, RecsError, Result, RowIndex};
use ndarray::{Array1, Array2, ArrayView1};
use rayon::prelude::*;
use std::cmp::Ordering;
use tracing::debug;

/// A neighbor row and its distance from the query row
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Neighbor {
    pub row: RowIndex,
    pub distance: f32,
}

/// Immutable nearest-neighbor index for one model
#[derive(Debug, Clone)]
pub struct NeighborIndex {
    matrix: Array2<f32>,
    /// L2 norm of every row, used by the cosine metric
    norms: Array1<f32>,
    metric: DistanceMetric,
}

impl NeighborIndex {
    /// Build an index from a `rows x dims` matrix
    pub fn build(matrix: Array2<f32>, metric: DistanceMetric) -> Result<Self> {
        if matrix.nrows() == 0 {
            return Err(RecsError::EmptyCatalog("embedding matrix has no rows".to_string()));
        }

        let norms = Array1::from_iter(matrix.rows().into_iter().map(|r| r.dot(&r).sqrt()));
        debug!(
            "Built {:?} neighbor index: {} rows x {} dims",
            metric,
            matrix.nrows(),
            matrix.ncols()
        );

        Ok(Self {
            matrix,
            norms,
            metric,
        })
    }

    /// Build an index from a row-major buffer
    pub fn from_flat(rows: usize, dims: usize, data: Vec<f32>, metric: DistanceMetric) -> Result<Self> {
        let matrix = Array2::from_shape_vec((rows, dims), data)
            .map_err(|e| RecsError::ValidationError(format!("embedding matrix shape: {}", e)))?;
        Self::build(matrix, metric)
    }

    /// Rows closest to `row`, nearest first, starting with `row` itself
    pub fn k_nearest(&self, row: RowIndex, k: usize) -> Result<Vec<RowIndex>> {
        Ok(self
            .k_nearest_with_distances(row, k)?
            .into_iter()
            .map(|n| n.row)
            .collect())
    }

    /// Like `k_nearest`, but keeps the distances
    pub fn k_nearest_with_distances(&self, row: RowIndex, k: usize) -> Result<Vec<Neighbor>> {
        let available = self.len();
        if row >= available {
            return Err(RecsError::unknown_movie(format!("row {}", row)));
        }
        if k > available {
            return Err(RecsError::InsufficientNeighbors {
                requested: k,
                available,
            });
        }
        if k == 0 {
            return Ok(Vec::new());
        }

        let query = self.matrix.row(row);
        let mut neighbors: Vec<Neighbor> = (0..available)
            .into_par_iter()
            .map(|other| Neighbor {
                row: other,
                distance: if other == row {
                    0.0
                } else {
                    self.distance(row, query, other)
                },
            })
            .collect();

        let by_rank = |a: &Neighbor, b: &Neighbor| compare_neighbors(a, b, row);
        if k < neighbors.len() {
            neighbors.select_nth_unstable_by(k - 1, by_rank);
            neighbors.truncate(k);
        }
        neighbors.sort_unstable_by(by_rank);

        Ok(neighbors)
    }

    fn distance(&self, row: RowIndex, query: ArrayView1<f32>, other: RowIndex) -> f32 {
        let candidate = self.matrix.row(other);
        match self.metric {
            DistanceMetric::Cosine => {
                let denom = self.norms[row] * self.norms[other];
                if denom == 0.0 {
                    // A zero vector has no direction
                    return 1.0;
                }
                (1.0 - query.dot(&candidate) / denom).clamp(0.0, 2.0)
            }
            DistanceMetric::Euclidean => query
                .iter()
                .zip(candidate.iter())
                .map(|(a, b)| (a - b) * (a - b))
                .sum::<f32>()
                .sqrt(),
        }
    }

    pub fn metric(&self) -> DistanceMetric {
        self.metric
    }

    pub fn dimension(&self) -> usize {
        self.matrix.ncols()
    }

    pub fn len(&self) -> usize {
        self.matrix.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.matrix.nrows() == 0
    }
}

/// Nearest first; on equal distance the query row wins, then lower rows
fn compare_neighbors(a: &Neighbor, b: &Neighbor, query: RowIndex) -> Ordering {
    a.distance
        .total_cmp(&b.distance)
        .then_with(|| (a.row != query).cmp(&(b.row != query)))
        .then_with(|| a.row.cmp(&b.row))
}
