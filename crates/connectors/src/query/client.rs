use crate::{
    error::QueryError,
    query::{
        coercion::{column_meta, decode_row},
        poll::{FixedInterval, PollStrategy},
        service::{GetResultsRequest, QueryService, QueryState, StartQueryRequest},
    },
};
use async_trait::async_trait;
use model::{
    core::identifiers::ExecutionHandle,
    pagination::page::{PageRequest, PageResult, QueryRequest},
    records::decode::RowDecoder,
};
use std::sync::Arc;
use tokio::time::sleep;
use tracing::{debug, info, warn};

/// Submits queries, waits for them and pages through their results.
#[async_trait]
pub trait QueryExecutionClient: Send + Sync {
    async fn submit(&self, request: &QueryRequest) -> Result<ExecutionHandle, QueryError>;

    /// Returns once the execution has succeeded; fails on any other terminal
    /// state.
    async fn await_completion(&self, handle: &ExecutionHandle) -> Result<(), QueryError>;

    /// Fetches and decodes one page.
    ///
    /// `is_first_page` must be the caller's own cursor flag: when set, the
    /// first raw row is the header row and is dropped. An empty raw page is
    /// always terminal, whatever token the service returned.
    async fn fetch_page<T, D>(
        &self,
        request: PageRequest,
        is_first_page: bool,
        decoder: &D,
    ) -> Result<PageResult<T>, QueryError>
    where
        T: Send,
        D: RowDecoder<T> + ?Sized;
}

/// [`QueryExecutionClient`] over any [`QueryService`].
#[derive(Clone)]
pub struct DefaultQueryClient {
    service: Arc<dyn QueryService>,
    poll_strategy: Arc<dyn PollStrategy>,
}

impl DefaultQueryClient {
    pub fn new(service: Arc<dyn QueryService>) -> Self {
        Self {
            service,
            poll_strategy: Arc::new(FixedInterval::default()),
        }
    }

    pub fn with_poll_strategy(mut self, poll_strategy: Arc<dyn PollStrategy>) -> Self {
        self.poll_strategy = poll_strategy;
        self
    }
}

#[async_trait]
impl QueryExecutionClient for DefaultQueryClient {
    async fn submit(&self, request: &QueryRequest) -> Result<ExecutionHandle, QueryError> {
        let execution_id = self
            .service
            .start_query_execution(StartQueryRequest {
                query: request.query_text.clone(),
                database: request.database.clone(),
                work_group: request.work_group.clone(),
            })
            .await
            .map_err(QueryError::SubmissionFailed)?;

        info!(
            "Submitted query against database '{}' as execution {}",
            request.database, execution_id
        );
        Ok(ExecutionHandle::new(execution_id))
    }

    async fn await_completion(&self, handle: &ExecutionHandle) -> Result<(), QueryError> {
        let mut attempt: u32 = 0;

        loop {
            let status = self
                .service
                .get_query_execution(handle.as_str())
                .await
                .map_err(|source| QueryError::StatusCheckFailed {
                    handle: handle.to_string(),
                    source,
                })?;

            debug!("Current status of execution {} is {:?}", handle, status.state);

            match status.state {
                QueryState::Succeeded => return Ok(()),
                QueryState::Failed => {
                    let reason = status.state_change_reason.unwrap_or_default();
                    warn!("Execution {} failed: {}", handle, reason);
                    return Err(QueryError::QueryExecutionFailed { reason });
                }
                QueryState::Cancelled => {
                    warn!("Execution {} was cancelled", handle);
                    return Err(QueryError::QueryExecutionCancelled);
                }
                QueryState::Queued | QueryState::Running => {
                    sleep(self.poll_strategy.next_poll_delay(attempt)).await;
                    attempt = attempt.saturating_add(1);
                }
            }
        }
    }

    async fn fetch_page<T, D>(
        &self,
        request: PageRequest,
        is_first_page: bool,
        decoder: &D,
    ) -> Result<PageResult<T>, QueryError>
    where
        T: Send,
        D: RowDecoder<T> + ?Sized,
    {
        let handle = request.execution_handle;
        let page = self
            .service
            .get_query_results(GetResultsRequest {
                execution_id: handle.as_str().to_string(),
                next_token: request.continuation_token,
                max_results: request.max_results,
            })
            .await
            .map_err(|source| QueryError::PageFetchFailed {
                handle: handle.to_string(),
                source,
            })?;

        if page.rows.is_empty() {
            debug!("Execution {} returned an empty page", handle);
            return Ok(PageResult::exhausted(handle));
        }

        let columns = column_meta(&page.columns);
        let skip = usize::from(is_first_page);

        let rows = page
            .rows
            .iter()
            .skip(skip)
            .map(|cells| -> Result<T, QueryError> {
                let row = decode_row(cells, &columns)?;
                Ok(decoder.decode(&row)?)
            })
            .collect::<Result<Vec<T>, QueryError>>()?;

        debug!(
            "Fetched {} rows for execution {} (more: {})",
            rows.len(),
            handle,
            page.next_token.is_some()
        );

        Ok(PageResult {
            execution_handle: handle,
            rows,
            continuation_token: page.next_token,
        })
    }
}
