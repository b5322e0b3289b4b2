use thiserror::Error;

/// Top-level error type for Ducker.
#[derive(Debug, Error)]
pub enum DuckerError {
    /// Error from the AI backend.
    #[error("provider error: {0}")]
    Provider(String),

    /// Error from the messaging transport (send, upload, presence, lookup).
    #[error("transport error: {0}")]
    Transport(String),

    /// Configuration error.
    #[error("config error: {0}")]
    Config(String),

    /// History storage error.
    #[error("memory error: {0}")]
    Memory(String),

    /// Local media lookup error.
    #[error("media error: {0}")]
    Media(String),

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
