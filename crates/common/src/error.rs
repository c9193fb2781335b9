//! Error types shared across VidSplice crates.

/// Top-level error type for VidSplice operations.
#[derive(Debug, thiserror::Error)]
pub enum VidspliceError {
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    #[error("Failed to load source: {message}")]
    LoadFailure { message: String },

    #[error("Frame not ready after {waited_ms}ms at {time_ms:.1}ms")]
    ReadinessTimeout { time_ms: f64, waited_ms: u64 },

    #[error("Encoder error: {message}")]
    EncodeFailure { message: String },

    #[error("Export cancelled")]
    Cancelled,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Result type alias using VidspliceError.
pub type VidspliceResult<T> = Result<T, VidspliceError>;

impl VidspliceError {
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Self::InvalidArgument {
            message: msg.into(),
        }
    }

    pub fn load(msg: impl Into<String>) -> Self {
        Self::LoadFailure {
            message: msg.into(),
        }
    }

    pub fn encode(msg: impl Into<String>) -> Self {
        Self::EncodeFailure {
            message: msg.into(),
        }
    }

    /// Whether the error came from the caller cancelling the operation.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}
