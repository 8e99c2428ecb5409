//! Error types for the symbol cache.

/// Symbol cache errors.
///
/// Per-call variants carry the relative symbol path so a log line or CLI
/// message is enough to find the offending entry.
#[derive(Debug, Clone, thiserror::Error)]
pub enum SymbolCacheError {
    /// Cache root or server URL missing or unparsable. Permanent.
    #[error("configuration error: {message}")]
    ConfigInvalid { message: String },

    /// Symbol key cannot be mapped onto a safe cache path.
    #[error("invalid symbol key: {message}")]
    InvalidKey { message: String },

    /// Connection failure or non-200 status.
    #[error("transport error for {path}: {message}")]
    Transport { path: String, message: String },

    /// Content-Length missing, zero, or different from the received body.
    #[error("size mismatch for {path}: declared {declared:?}, received {actual}")]
    SizeMismatch {
        path: String,
        declared: Option<u64>,
        actual: u64,
    },

    /// Downloaded file rejected by the content validator.
    #[error("validation failed for {path}: {reason}")]
    Validation { path: String, reason: String },

    /// Directory creation, temp write or commit rename failed.
    #[error("filesystem error for {path}: {message}")]
    Filesystem { path: String, message: String },
}

impl SymbolCacheError {
    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::ConfigInvalid { .. } => 1,
            Self::InvalidKey { .. } => 1,

            Self::Validation { .. } => 4,

            Self::Transport { .. } => 5,
            Self::SizeMismatch { .. } => 5,

            Self::Filesystem { .. } => 6,
        }
    }

    /// Whether the failure happened on the wire (callers treat both kinds alike).
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport { .. } | Self::SizeMismatch { .. })
    }

    pub(crate) fn filesystem(path: &std::path::Path, err: impl std::fmt::Display) -> Self {
        Self::Filesystem {
            path: path.display().to_string(),
            message: err.to_string(),
        }
    }
}

/// Result type for symbol cache operations.
pub type SymbolCacheResult<T> = Result<T, SymbolCacheError>;
