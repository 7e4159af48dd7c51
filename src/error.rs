//! Error types for the evaluation harness.

use crate::services::corrector::CorrectorError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, EvalError>;

#[derive(Error, Debug)]
pub enum EvalError {
    /// Nothing to compute metrics over.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Dataset missing or malformed.
    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Unsupported file format: {0}")]
    UnsupportedFormat(String),

    #[error("Unsupported model: {0}")]
    UnsupportedModel(String),

    #[error("Corrector error: {0}")]
    Corrector(#[from] CorrectorError),

    #[error("Config error: {0}")]
    Config(String),
}

impl EvalError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        EvalError::InvalidInput(msg.into())
    }

    pub fn dataset(msg: impl Into<String>) -> Self {
        EvalError::Dataset(msg.into())
    }
}
