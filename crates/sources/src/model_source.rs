//! One recommender model, ready to serve.
//!
//! A `ModelSource` bundles everything a single model contributes to a hybrid
//! recommendation: its catalog (which movie lives in which row) and its
//! neighbor index. Both are built from the same artifact and checked against
//! each other before the source is handed out.

use crate::neighbor_index::NeighborIndex;
use data_loader::{Catalog, ModelArtifact, ModelKind, MovieId, RecsError, Result};
use tracing::{debug, instrument};

/// Typed, validated view of one model artifact
#[derive(Debug, Clone)]
pub struct ModelSource {
    kind: ModelKind,
    catalog: Catalog,
    index: NeighborIndex,
}

impl ModelSource {
    /// Combine a catalog and an index that describe the same rows
    pub fn new(kind: ModelKind, catalog: Catalog, index: NeighborIndex) -> Result<Self> {
        if catalog.len() != index.len() {
            return Err(RecsError::ValidationError(format!(
                "{} catalog has {} movies but the index has {} rows",
                kind,
                catalog.len(),
                index.len()
            )));
        }
        Ok(Self {
            kind,
            catalog,
            index,
        })
    }

    /// Validate an artifact and build its catalog and index
    pub fn from_artifact(artifact: &ModelArtifact) -> Result<Self> {
        artifact.validate()?;
        let catalog = artifact.catalog()?;
        let index = NeighborIndex::from_flat(
            artifact.rows(),
            artifact.dimension(),
            artifact.flat_matrix(),
            artifact.metric,
        )?;
        Self::new(artifact.kind, catalog, index)
    }

    /// Ids of the `count` movies closest to `movie_id`, nearest first
    ///
    /// Asks the index for one extra neighbor to absorb the self-match, then
    /// drops the queried movie, so at most `count` ids come back.
    #[instrument(skip(self), fields(model = %self.kind))]
    pub fn similar_movies(&self, movie_id: MovieId, count: usize) -> Result<Vec<MovieId>> {
        let row = self.catalog.id_to_row(movie_id)?;
        let rows = self.index.k_nearest(row, count + 1)?;

        let ids: Vec<MovieId> = rows
            .into_iter()
            .map(|r| self.catalog.row_to_id(r))
            .filter(|&id| id != movie_id)
            .take(count)
            .collect();

        debug!("Found {} neighbors for movie {}", ids.len(), movie_id);
        Ok(ids)
    }

    pub fn kind(&self) -> ModelKind {
        self.kind
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn index(&self) -> &NeighborIndex {
        &self.index
    }
}
