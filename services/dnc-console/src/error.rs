//! Error types for the DNC console

/// Errors that can occur in the DNC console
#[derive(Debug, thiserror::Error)]
pub enum DncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("HTTP request failed: {0}")]
    Transport(String),

    #[error("Request rejected with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("{entity} records do not support {operation}")]
    Unsupported {
        entity: String,
        operation: &'static str,
    },

    #[error("Another action is already awaiting confirmation")]
    GateBusy,

    #[error("No action is awaiting confirmation")]
    NoPendingAction,

    #[error("Challenge answer did not match")]
    ChallengeFailed,

    #[error("Row {id} belongs to a previous load and is no longer valid")]
    StaleRow { id: u32 },

    #[error("Row {id} does not exist")]
    UnknownRow { id: u32 },

    #[error("No editor is open")]
    NoEditor,

    #[error("A request is already in flight")]
    Busy,

    #[error("The table has been closed")]
    Closed,

    #[error("Invalid export file name: {0:?}")]
    InvalidFileName(String),
}

impl DncError {
    /// True for errors raised by the network layer rather than by usage
    pub fn is_network(&self) -> bool {
        matches!(
            self,
            DncError::Transport(_) | DncError::Rejected { .. } | DncError::Json(_)
        )
    }
}

/// Result type alias for console operations
pub type Result<T> = std::result::Result<T, DncError>;
