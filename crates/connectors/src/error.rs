use model::records::decode::DecodeError;
use thiserror::Error;

/// Failures reported by a query service implementation.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Any transport-level failure of the underlying client.
    #[error("Transport error: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Unknown query execution: {0}")]
    UnknownExecution(String),

    #[error("Invalid continuation token: {0}")]
    InvalidToken(String),

    #[error("Service rejected request: {0}")]
    Rejected(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lock error: {0}")]
    LockError(String),
}

/// All errors coming out of the query execution client.
#[derive(Debug, Error)]
pub enum QueryError {
    /// The service rejected the query at submit time.
    #[error("Query submission failed: {0}")]
    SubmissionFailed(#[source] ServiceError),

    /// Polling the execution status failed at the transport level.
    #[error("Status check failed for execution {handle}: {source}")]
    StatusCheckFailed {
        handle: String,
        source: ServiceError,
    },

    #[error("Query execution failed: {reason}")]
    QueryExecutionFailed { reason: String },

    #[error("Query execution was cancelled")]
    QueryExecutionCancelled,

    /// Transport error while fetching a page. The cursor is not advanced, so
    /// the same read can be retried.
    #[error("Page fetch failed for execution {handle}: {source}")]
    PageFetchFailed {
        handle: String,
        source: ServiceError,
    },

    #[error("Unsupported column type: {0}")]
    UnsupportedColumnType(String),

    #[error("Failed to coerce column '{column}' from value '{raw_value}'")]
    CoercionFailed { column: String, raw_value: String },

    #[error("Row has {actual} cells but the result set declares {expected} columns")]
    ColumnCountMismatch { expected: usize, actual: usize },

    #[error("Decode error: {0}")]
    Decode(#[from] DecodeError),
}

impl QueryError {
    /// Whether repeating the failed call at the same cursor position is safe.
    pub fn is_retryable(&self) -> bool {
        matches!(self, QueryError::PageFetchFailed { .. })
    }
}
