use crate::{core::identifiers::ExecutionHandle, pagination::page::PageRequest};

/// Pagination state of one reader for one open/close cycle.
///
/// Kept as a single record so that the first-page flag and the continuation
/// token are always read and replaced together.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaginationCursor {
    /// True until the first page of the current open cycle has been fetched.
    pub is_first_page: bool,
    pub continuation_token: Option<String>,
    pub execution_handle: Option<ExecutionHandle>,
}

impl Default for PaginationCursor {
    fn default() -> Self {
        PaginationCursor {
            is_first_page: true,
            continuation_token: None,
            execution_handle: None,
        }
    }
}

impl PaginationCursor {
    /// Fresh cursor for a newly completed execution.
    pub fn opened(execution_handle: ExecutionHandle) -> Self {
        PaginationCursor {
            execution_handle: Some(execution_handle),
            ..Default::default()
        }
    }

    pub fn is_open(&self) -> bool {
        self.execution_handle.is_some()
    }

    /// Set once a page past the first one came back without a continuation
    /// token. Fetching again with no token would restart the result set.
    pub fn is_exhausted(&self) -> bool {
        self.is_open() && !self.is_first_page && self.continuation_token.is_none()
    }

    /// Rows to ask for: one extra on the first page to make up for the header
    /// row that gets dropped.
    pub fn request_size(&self, page_size: usize) -> usize {
        if self.is_first_page {
            page_size + 1
        } else {
            page_size
        }
    }

    /// Builds the request for the next page, or `None` when not open.
    pub fn page_request(&self, page_size: usize) -> Option<PageRequest> {
        let execution_handle = self.execution_handle.clone()?;
        Some(PageRequest {
            execution_handle,
            continuation_token: self.continuation_token.clone(),
            max_results: Some(self.request_size(page_size)),
        })
    }

    /// Records a successfully fetched page.
    pub fn advance(&mut self, continuation_token: Option<String>) {
        self.continuation_token = continuation_token;
        self.is_first_page = false;
    }

    pub fn reset(&mut self) {
        *self = PaginationCursor::default();
    }
}
