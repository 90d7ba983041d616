/// Crate-wide result alias.
pub type VitrineResult<T> = Result<T, VitrineError>;

/// Errors surfaced by configuration loading, validation, and resource close operations.
///
/// Handle lifecycle operations (`reset`, `draw`, bounds changes) never return these; close
/// failures are absorbed at the slot boundary.
#[derive(thiserror::Error, Debug)]
pub enum VitrineError {
    /// Invalid argument or state supplied by a caller.
    #[error("validation error: {0}")]
    Validation(String),

    /// A closeable resource failed to release.
    #[error("close error: {0}")]
    Close(String),

    /// I/O failure while closing a resource or reading configuration.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid configuration values.
    #[error("config error: {0}")]
    Config(String),

    /// Configuration could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Any other failure.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl VitrineError {
    /// Build a [`VitrineError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`VitrineError::Close`].
    pub fn close(msg: impl Into<String>) -> Self {
        Self::Close(msg.into())
    }

    /// Build a [`VitrineError::Config`].
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Build a [`VitrineError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
