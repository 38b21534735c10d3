//! Key-field extraction error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum IngestionError {
    #[error("Cannot parse {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("Unsupported top-level JSON shape in {0}")]
    UnsupportedShape(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, IngestionError>;
