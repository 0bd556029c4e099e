use thiserror::Error;

#[derive(Debug, Error)]
pub enum VigilError {
    // Provider errors
    #[error("Duplicate probe provider: {0}")]
    DuplicateProvider(String),

    #[error("Probe execution failed: {provider}: {message}")]
    ProbeExecution { provider: String, message: String },

    // Orchestration errors
    #[error("Orchestration cancelled")]
    Cancelled,

    // I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // JSON errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, VigilError>;
