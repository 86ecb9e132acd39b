//! Error types for the application

use thiserror::Error;

/// Result type alias using our EngineError
pub type Result<T> = std::result::Result<T, EngineError>;

/// Main error type for decision-path operations
#[derive(Error, Debug)]
pub enum EngineError {
    /// Malformed request payload; the request is aborted with no partial effects
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Predictor not loaded or failed to produce a prediction
    #[error("Model unavailable: {0}")]
    ModelUnavailable(String),

    /// Missing or inconsistent model artifacts / configuration at startup
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// JSON serialization/deserialization errors
    #[error("JSON parsing error: {0}")]
    JsonParse(#[from] serde_json::Error),

    /// I/O errors (reading requests, loading artifacts)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Whether this error is fatal for the CLI entry point.
    ///
    /// An out-of-range price is deliberately absent from this taxonomy:
    /// it is a normal reject decision, not a system error.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            EngineError::Configuration(_) | EngineError::Io(_) | EngineError::JsonParse(_)
        )
    }
}
