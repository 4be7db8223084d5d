//! Error types shared by every crate in the workspace.
//!
//! The four recommendation errors (`UnknownMovie`, `EmptyCatalog`,
//! `InsufficientNeighbors`, `InvalidModelSelector`) are what callers of the
//! engine see at request time. The remaining variants only occur while model
//! artifacts are being loaded at startup.

use thiserror::Error;

/// Errors that can occur while loading models or serving recommendations
///
/// The `#[derive(Error)]` macro from thiserror implements `std::error::Error`
/// and `Display` from the `#[error(...)]` attributes.
#[derive(Error, Debug)]
pub enum RecsError {
    /// A movie id, title or row is not present in the catalog
    #[error("Unknown movie: {reference}")]
    UnknownMovie { reference: String },

    /// A catalog (or the list of titles to match against) has no entries
    #[error("Catalog is empty: {0}")]
    EmptyCatalog(String),

    /// More neighbors were requested than the index holds
    #[error("Requested {requested} neighbors but the index only holds {available} rows")]
    InsufficientNeighbors { requested: usize, available: usize },

    /// Feedback named a model other than "cf" or "cbf"
    #[error("Invalid model selector: {0:?}")]
    InvalidModelSelector(String),

    /// Artifact file could not be found
    #[error("Failed to open file: {path}")]
    FileNotFound { path: String },

    /// I/O error occurred while reading an artifact
    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    /// Artifact is not valid JSON or does not match the expected layout
    #[error("Parse error in {file}: {source}")]
    ParseError {
        file: String,
        #[source]
        source: serde_json::Error,
    },

    /// Embedding rows do not share one dimension
    #[error("Row {row} has dimension {found}, expected {expected}")]
    DimensionMismatch {
        row: usize,
        expected: usize,
        found: usize,
    },

    /// An artifact was loaded into the wrong model slot
    #[error("Expected a {expected} artifact but found {found}")]
    ModelKindMismatch { expected: String, found: String },

    /// Artifact content failed validation
    #[error("Validation failed: {0}")]
    ValidationError(String),

    /// A background neighbor query did not complete
    #[error("Neighbor query task failed: {0}")]
    TaskFailed(String),
}

/// Broad classes of failure, for a request layer that needs to tell a bad
/// reference from a malformed request from a broken deployment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller referenced a movie that does not exist
    BadReference,
    /// The caller sent a request with an invalid shape
    BadRequest,
    /// Models or configuration do not fit together
    Misconfiguration,
    /// Unexpected runtime failure
    Internal,
}

impl RecsError {
    pub fn unknown_movie(reference: impl ToString) -> Self {
        RecsError::UnknownMovie {
            reference: reference.to_string(),
        }
    }

    /// Classify this error for the surrounding request layer
    pub fn kind(&self) -> ErrorKind {
        match self {
            RecsError::UnknownMovie { .. } => ErrorKind::BadReference,
            RecsError::InvalidModelSelector(_) => ErrorKind::BadRequest,
            RecsError::EmptyCatalog(_)
            | RecsError::InsufficientNeighbors { .. }
            | RecsError::FileNotFound { .. }
            | RecsError::IoError(_)
            | RecsError::ParseError { .. }
            | RecsError::DimensionMismatch { .. }
            | RecsError::ModelKindMismatch { .. }
            | RecsError::ValidationError(_) => ErrorKind::Misconfiguration,
            RecsError::TaskFailed(_) => ErrorKind::Internal,
        }
    }
}

/// Convenience type alias for Results in this workspace
pub type Result<T> = std::result::Result<T, RecsError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(RecsError::unknown_movie(42).kind(), ErrorKind::BadReference);
        assert_eq!(
            RecsError::InvalidModelSelector("hybrid".into()).kind(),
            ErrorKind::BadRequest
        );
        assert_eq!(
            RecsError::InsufficientNeighbors { requested: 11, available: 5 }.kind(),
            ErrorKind::Misconfiguration
        );
        assert_eq!(
            RecsError::EmptyCatalog("cbf".into()).kind(),
            ErrorKind::Misconfiguration
        );
    }

    #[test]
    fn test_error_messages() {
        let err = RecsError::unknown_movie("Heat (1995)");
        assert_eq!(err.to_string(), "Unknown movie: Heat (1995)");

        let err = RecsError::InvalidModelSelector("hybrid".into());
        assert_eq!(err.to_string(), "Invalid model selector: \"hybrid\"");
    }
}
