//! Error types for LumiFlux

use thiserror::Error;

/// Core error type
#[derive(Error, Debug)]
pub enum LxError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Source error: {0}")]
    Source(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Frame error: {0}")]
    Frame(String),
}

/// Result type alias
pub type LxResult<T> = Result<T, LxError>;
