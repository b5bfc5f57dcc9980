//! Error types
//!
//! Nothing here is fatal to the UI: callers that ignore these results get
//! the default "log and carry on" behavior.

use thiserror::Error;

/// Failure talking to durable storage or decoding what it holds
#[derive(Debug, Error)]
pub enum StorageError {
    /// No durable key-value store in this environment (e.g. not a browser)
    #[error("durable storage is not available")]
    Unavailable,

    /// Backend refused the write for lack of space
    #[error("storage quota exceeded writing `{key}`")]
    QuotaExceeded { key: String },

    /// Any other backend failure
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Stored entry is not a valid board
    #[error("stored board under `{key}` is corrupt: {source}")]
    Corrupt {
        key: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize board `{board_id}`: {source}")]
    Serialize {
        board_id: String,
        #[source]
        source: serde_json::Error,
    },
}

impl StorageError {
    /// True for the "not a browser" case, which is expected rather than a fault
    pub fn is_unavailable(&self) -> bool {
        matches!(self, StorageError::Unavailable)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("a board id is required to initialize the board store")]
    MissingBoardId,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config `{path}`: {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("unsupported log level `{0}`")]
    LogLevel(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown element type `{0}`")]
pub struct UnknownElementKind(pub String);
