use connectors::error::QueryError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ReaderError {
    #[error("Reader is not open")]
    NotOpened,

    #[error("Reader was closed or reopened while a page fetch was in flight")]
    CursorChanged,

    #[error("Lock error: {0}")]
    LockPoisoned(String),

    #[error("Query error: {0}")]
    Query(#[from] QueryError),
}

impl ReaderError {
    /// True when the same `read_page` call can be repeated as-is.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ReaderError::Query(err) if err.is_retryable())
    }
}
