//! Error types for the triage training pipeline

use thiserror::Error;

/// Result type alias for triage operations
pub type Result<T> = std::result::Result<T, TriageError>;

/// Main error type for the triage pipeline
#[derive(Error, Debug)]
pub enum TriageError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("Column not found: {0}")]
    FeatureNotFound(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Model not fitted")]
    ModelNotFitted,

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl From<polars::error::PolarsError> for TriageError {
    fn from(err: polars::error::PolarsError) -> Self {
        TriageError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for TriageError {
    fn from(err: serde_json::Error) -> Self {
        TriageError::SerializationError(err.to_string())
    }
}

impl From<bincode::Error> for TriageError {
    fn from(err: bincode::Error) -> Self {
        TriageError::SerializationError(err.to_string())
    }
}

impl From<ndarray::ShapeError> for TriageError {
    fn from(err: ndarray::ShapeError) -> Self {
        TriageError::ShapeError {
            expected: "valid shape".to_string(),
            actual: err.to_string(),
        }
    }
}
