//! Error types for the arbitration engine.

/// Top-level error type for the interrupt arbitration engine.
#[derive(Debug, thiserror::Error)]
pub enum ArbiterError {
    /// Configuration error (empty or overlapping word lists, bad timeout).
    #[error("config error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience result type.
pub type Result<T> = std::result::Result<T, ArbiterError>;
