//! Exported model artifacts.
//!
//! Training happens elsewhere; what arrives here is a JSON document per model
//! holding the embedding matrix and the row-ordered movie table:
//!
//! ```json
//! {
//!   "kind": "cbf",
//!   "metric": "cosine",
//!   "movies": [{ "id": 1, "title": "Toy Story (1995)" }, ...],
//!   "matrix": [[0.12, 0.80, ...], ...]
//! }
//! ```
//!
//! `movies[i]` describes `matrix[i]`. `metric` is optional and defaults to
//! cosine.

use crate::catalog::Catalog;
use crate::error::{RecsError, Result};
use crate::types::{DistanceMetric, ModelKind, Movie};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use tracing::{debug, info};

/// A deserialized model, not yet validated
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelArtifact {
    pub kind: ModelKind,
    #[serde(default)]
    pub metric: DistanceMetric,
    pub movies: Vec<Movie>,
    pub matrix: Vec<Vec<f32>>,
}

impl ModelArtifact {
    /// Read and validate one artifact from disk
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(RecsError::FileNotFound {
                path: path.display().to_string(),
            });
        }

        let raw = fs::read_to_string(path)?;
        let artifact: ModelArtifact =
            serde_json::from_str(&raw).map_err(|source| RecsError::ParseError {
                file: path.display().to_string(),
                source,
            })?;

        artifact.validate()?;
        debug!(
            "Loaded {} artifact from {:?}: {} rows x {} dims",
            artifact.kind,
            path,
            artifact.rows(),
            artifact.dimension()
        );
        Ok(artifact)
    }

    /// Load the CF and CBF artifacts in parallel
    ///
    /// Each file must declare the kind of the slot it is loaded into, so the
    /// two cannot be swapped by a misnamed file.
    pub fn load_pair(cf_path: &Path, cbf_path: &Path) -> Result<(Self, Self)> {
        info!("Loading model artifacts {:?} and {:?}", cf_path, cbf_path);

        let (cf, cbf) = rayon::join(|| Self::load(cf_path), || Self::load(cbf_path));
        let cf = cf?;
        let cbf = cbf?;

        cf.expect_kind(ModelKind::Cf)?;
        cbf.expect_kind(ModelKind::Cbf)?;

        info!(
            "Loaded CF model ({} movies) and CBF model ({} movies)",
            cf.rows(),
            cbf.rows()
        );
        Ok((cf, cbf))
    }

    /// Check the structural invariants of the artifact
    ///
    /// - at least one movie
    /// - one matrix row per movie
    /// - every row has the same, non-zero dimension
    /// - every value is finite
    pub fn validate(&self) -> Result<()> {
        if self.movies.is_empty() {
            return Err(RecsError::EmptyCatalog(format!("{} artifact has no movies", self.kind)));
        }
        if self.movies.len() != self.matrix.len() {
            return Err(RecsError::ValidationError(format!(
                "{} artifact has {} movies but {} matrix rows",
                self.kind,
                self.movies.len(),
                self.matrix.len()
            )));
        }

        let expected = self.matrix[0].len();
        if expected == 0 {
            return Err(RecsError::ValidationError(format!(
                "{} artifact has zero-dimensional embeddings",
                self.kind
            )));
        }

        for (row, values) in self.matrix.iter().enumerate() {
            if values.len() != expected {
                return Err(RecsError::DimensionMismatch {
                    row,
                    expected,
                    found: values.len(),
                });
            }
            if values.iter().any(|v| !v.is_finite()) {
                return Err(RecsError::ValidationError(format!(
                    "non-finite value in row {} of {} artifact",
                    row, self.kind
                )));
            }
        }
        Ok(())
    }

    fn expect_kind(&self, expected: ModelKind) -> Result<()> {
        if self.kind != expected {
            return Err(RecsError::ModelKindMismatch {
                expected: expected.to_string(),
                found: self.kind.to_string(),
            });
        }
        Ok(())
    }

    pub fn rows(&self) -> usize {
        self.matrix.len()
    }

    pub fn dimension(&self) -> usize {
        self.matrix.first().map(|r| r.len()).unwrap_or(0)
    }

    /// Build the catalog for this artifact's movie table
    pub fn catalog(&self) -> Result<Catalog> {
        Catalog::new(self.movies.clone())
    }

    /// Row-major copy of the matrix
    pub fn flat_matrix(&self) -> Vec<f32> {
        self.matrix.iter().flatten().copied().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn sample(kind: ModelKind) -> ModelArtifact {
        ModelArtifact {
            kind,
            metric: DistanceMetric::Cosine,
            movies: vec![
                Movie { id: 1, title: "Toy Story (1995)".to_string() },
                Movie { id: 2, title: "Jumanji (1995)".to_string() },
            ],
            matrix: vec![vec![1.0, 0.0], vec![0.5, 0.5]],
        }
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("reel-recs-artifact-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_validate_ok() {
        assert!(sample(ModelKind::Cf).validate().is_ok());
    }

    #[test]
    fn test_validate_row_count_mismatch() {
        let mut artifact = sample(ModelKind::Cf);
        artifact.matrix.pop();
        assert!(matches!(artifact.validate(), Err(RecsError::ValidationError(_))));
    }

    #[test]
    fn test_validate_ragged_matrix() {
        let mut artifact = sample(ModelKind::Cf);
        artifact.matrix[1] = vec![1.0, 2.0, 3.0];
        assert!(matches!(
            artifact.validate(),
            Err(RecsError::DimensionMismatch { row: 1, expected: 2, found: 3 })
        ));
    }

    #[test]
    fn test_validate_non_finite() {
        let mut artifact = sample(ModelKind::Cbf);
        artifact.matrix[0][1] = f32::NAN;
        assert!(matches!(artifact.validate(), Err(RecsError::ValidationError(_))));
    }

    #[test]
    fn test_validate_empty() {
        let mut artifact = sample(ModelKind::Cbf);
        artifact.movies.clear();
        artifact.matrix.clear();
        assert!(matches!(artifact.validate(), Err(RecsError::EmptyCatalog(_))));
    }

    #[test]
    fn test_metric_defaults_to_cosine() {
        let json = r#"{
            "kind": "cf",
            "movies": [{"id": 1, "title": "Heat (1995)"}],
            "matrix": [[0.1, 0.2]]
        }"#;
        let artifact: ModelArtifact = serde_json::from_str(json).unwrap();
        assert_eq!(artifact.kind, ModelKind::Cf);
        assert_eq!(artifact.metric, DistanceMetric::Cosine);
        assert_eq!(artifact.dimension(), 2);
    }

    #[test]
    fn test_load_missing_file() {
        let result = ModelArtifact::load(Path::new("/definitely/not/here.json"));
        assert!(matches!(result, Err(RecsError::FileNotFound { .. })));
    }

    #[test]
    fn test_load_malformed_json() {
        let path = temp_file("broken.json", "{ not json");
        let result = ModelArtifact::load(&path);
        assert!(matches!(result, Err(RecsError::ParseError { .. })));
    }

    #[test]
    fn test_load_pair_rejects_swapped_kinds() {
        let cf = temp_file("swapped_cf.json", &serde_json::to_string(&sample(ModelKind::Cbf)).unwrap());
        let cbf = temp_file("swapped_cbf.json", &serde_json::to_string(&sample(ModelKind::Cbf)).unwrap());

        let result = ModelArtifact::load_pair(&cf, &cbf);
        assert!(matches!(result, Err(RecsError::ModelKindMismatch { .. })));
    }

    #[test]
    fn test_load_pair() {
        let cf = temp_file("pair_cf.json", &serde_json::to_string(&sample(ModelKind::Cf)).unwrap());
        let cbf = temp_file("pair_cbf.json", &serde_json::to_string(&sample(ModelKind::Cbf)).unwrap());

        let (cf, cbf) = ModelArtifact::load_pair(&cf, &cbf).unwrap();
        assert_eq!(cf.kind, ModelKind::Cf);
        assert_eq!(cbf.kind, ModelKind::Cbf);
        assert_eq!(cf.flat_matrix(), vec![1.0, 0.0, 0.5, 0.5]);
    }
}
