//! Error types for the cardioml pipeline

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for cardioml operations
pub type Result<T> = std::result::Result<T, CardioError>;

/// Main error type for the pipeline
#[derive(Error, Debug)]
pub enum CardioError {
    #[error("Data error: {0}")]
    DataError(String),

    #[error("Preprocessing error: {0}")]
    PreprocessingError(String),

    #[error("Training error: {0}")]
    TrainingError(String),

    #[error("Inference error: {0}")]
    InferenceError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Invalid shape: expected {expected}, got {actual}")]
    ShapeError { expected: String, actual: String },

    #[error("Feature not found: {0}")]
    FeatureNotFound(String),

    #[error("Not fitted: fit (or resolve) must be called first")]
    NotFitted,

    #[error("No artifact matching '{pattern}' in {dir}")]
    ArtifactNotFound { pattern: String, dir: PathBuf },

    #[error("Data file not found: {path} ({hint})")]
    DataFileNotFound { path: PathBuf, hint: String },

    #[error("Validation error: {0}")]
    ValidationError(String),
}

impl From<polars::error::PolarsError> for CardioError {
    fn from(err: polars::error::PolarsError) -> Self {
        CardioError::DataError(err.to_string())
    }
}

impl From<serde_json::Error> for CardioError {
    fn from(err: serde_json::Error) -> Self {
        CardioError::SerializationError(err.to_string())
    }
}
