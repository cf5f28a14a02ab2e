use thiserror::Error;

/// Overlay error types
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("Failed to acquire {0} lock")]
    LockPoisoned(&'static str),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for overlay operations
pub type OverlayResult<T> = Result<T, OverlayError>;
