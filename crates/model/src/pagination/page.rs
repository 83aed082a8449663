use crate::core::identifiers::ExecutionHandle;
use serde::{Deserialize, Serialize};

/// The query a reader submits once per open cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryRequest {
    pub query_text: String,
    pub database: String,
    /// Execution work group, passed to the service as-is when set.
    pub work_group: Option<String>,
}

impl QueryRequest {
    pub fn new(query_text: impl Into<String>, database: impl Into<String>) -> Self {
        QueryRequest {
            query_text: query_text.into(),
            database: database.into(),
            work_group: None,
        }
    }

    pub fn with_work_group(mut self, work_group: impl Into<String>) -> Self {
        self.work_group = Some(work_group.into());
        self
    }
}

/// Request for a single page of results.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageRequest {
    pub execution_handle: ExecutionHandle,
    pub continuation_token: Option<String>,
    pub max_results: Option<usize>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub execution_handle: ExecutionHandle,
    pub rows: Vec<T>,
    /// `None` when the result set has no further pages.
    pub continuation_token: Option<String>,
}

impl<T> PageResult<T> {
    /// An empty, terminal page.
    pub fn exhausted(execution_handle: ExecutionHandle) -> Self {
        PageResult {
            execution_handle,
            rows: Vec::new(),
            continuation_token: None,
        }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn has_more(&self) -> bool {
        self.continuation_token.is_some()
    }
}
