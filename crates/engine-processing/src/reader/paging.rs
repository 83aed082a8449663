use crate::{error::ReaderError, reader::PageReader};
use async_trait::async_trait;
use connectors::query::client::QueryExecutionClient;
use engine_config::settings::validated::ValidatedSettings;
use model::{
    pagination::{cursor::PaginationCursor, page::QueryRequest},
    records::decode::RowDecoder,
};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};
use tracing::{debug, info};

/// Pages through the results of a single query.
///
/// Each open cycle submits the query exactly once, waits for it to finish and
/// then walks the result set forward with the service's continuation tokens.
/// The first page asks for one extra row because the service puts a header row
/// in front of the data on that page only.
///
/// The cursor is one mutex-guarded record and the current page is swapped as
/// a whole, so observers on other threads never see a half-updated cursor or a
/// half-written page. Only one `read_page` may be in flight at a time.
pub struct PagingQueryReader<T, C, D> {
    client: Arc<C>,
    decoder: D,
    query: QueryRequest,
    page_size: usize,
    cursor: Mutex<PaginationCursor>,
    results: RwLock<Arc<Vec<T>>>,
}

impl<T, C, D> PagingQueryReader<T, C, D>
where
    T: Send + Sync,
    C: QueryExecutionClient,
    D: RowDecoder<T>,
{
    /// `page_size` below 1 is raised to 1.
    pub fn new(client: Arc<C>, query: QueryRequest, page_size: usize, decoder: D) -> Self {
        Self {
            client,
            decoder,
            query,
            page_size: page_size.max(1),
            cursor: Mutex::new(PaginationCursor::default()),
            results: RwLock::new(Arc::new(Vec::new())),
        }
    }

    pub fn from_settings(client: Arc<C>, settings: &ValidatedSettings, decoder: D) -> Self {
        Self::new(
            client,
            settings.query().clone(),
            settings.page_size(),
            decoder,
        )
    }

    /// Snapshot of the pagination cursor.
    pub fn cursor(&self) -> Result<PaginationCursor, ReaderError> {
        Ok(self.lock_cursor()?.clone())
    }

    /// The page produced by the last successful `read_page`.
    pub fn current_page(&self) -> Result<Arc<Vec<T>>, ReaderError> {
        let results = self
            .results
            .read()
            .map_err(|_| ReaderError::LockPoisoned("Failed to read page buffer".into()))?;
        Ok(Arc::clone(&results))
    }

    fn lock_cursor(&self) -> Result<MutexGuard<'_, PaginationCursor>, ReaderError> {
        self.cursor
            .lock()
            .map_err(|_| ReaderError::LockPoisoned("Failed to lock pagination cursor".into()))
    }

    fn replace_results(&self, rows: Arc<Vec<T>>) -> Result<(), ReaderError> {
        let mut results = self
            .results
            .write()
            .map_err(|_| ReaderError::LockPoisoned("Failed to write page buffer".into()))?;
        *results = rows;
        Ok(())
    }
}

#[async_trait]
impl<T, C, D> PageReader for PagingQueryReader<T, C, D>
where
    T: Send + Sync,
    C: QueryExecutionClient,
    D: RowDecoder<T>,
{
    type Item = T;

    async fn open(&self) -> Result<(), ReaderError> {
        let handle = self.client.submit(&self.query).await?;
        self.client.await_completion(&handle).await?;

        info!(
            "Opened reader on execution {} (page size {})",
            handle, self.page_size
        );
        *self.lock_cursor()? = PaginationCursor::opened(handle);
        self.replace_results(Arc::new(Vec::new()))
    }

    async fn read_page(&self) -> Result<Arc<Vec<T>>, ReaderError> {
        let snapshot = self.cursor()?;
        let request = snapshot
            .page_request(self.page_size)
            .ok_or(ReaderError::NotOpened)?;

        if snapshot.is_exhausted() {
            debug!("Execution {} is exhausted", request.execution_handle);
            let empty = Arc::new(Vec::new());
            self.replace_results(Arc::clone(&empty))?;
            return Ok(empty);
        }

        let page = self
            .client
            .fetch_page::<T, D>(request, snapshot.is_first_page, &self.decoder)
            .await?;

        let rows = Arc::new(page.rows);
        {
            let mut cursor = self.lock_cursor()?;
            if *cursor != snapshot {
                return Err(ReaderError::CursorChanged);
            }
            self.replace_results(Arc::clone(&rows))?;
            cursor.advance(page.continuation_token);
        }

        Ok(rows)
    }

    async fn close(&self) -> Result<(), ReaderError> {
        let previous = {
            let mut cursor = self.lock_cursor()?;
            let previous = cursor.execution_handle.take();
            cursor.reset();
            previous
        };
        self.replace_results(Arc::new(Vec::new()))?;

        if let Some(handle) = previous {
            info!("Closed reader on execution {}", handle);
        }
        Ok(())
    }

    fn jump_to_page(&self, page_index: usize) {
        debug!(
            "Ignoring jump to page {}: reader only moves forward",
            page_index
        );
    }

    fn page_size(&self) -> usize {
        self.page_size
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use connectors::{
        error::QueryError,
        query::{
            client::DefaultQueryClient,
            memory::{InMemoryQueryService, ResultFixture},
            poll::FixedInterval,
            service::{ColumnInfo, QueryState},
        },
    };
    use model::{
        core::identifiers::ExecutionHandle,
        pagination::page::{PageRequest, PageResult},
        records::{
            decode::{PassThrough, SerdeDecoder},
            row::RowData,
        },
    };
    use serde::Deserialize;
    use std::time::Duration;
    use tokio::sync::Notify;
    use tracing_test::traced_test;

    #[derive(Debug, Clone, PartialEq, Deserialize)]
    struct Visit {
        id: i32,
        page: String,
        #[serde(default)]
        tags: Vec<String>,
    }

    type VisitReader = PagingQueryReader<Visit, DefaultQueryClient, SerdeDecoder<Visit>>;

    fn fixture(rows: usize) -> ResultFixture {
        ResultFixture::new(
            vec![
                ColumnInfo::new("id", "integer"),
                ColumnInfo::new("page", "varchar"),
                ColumnInfo::new("tags", "array"),
            ],
            (1..=rows)
                .map(|i| {
                    vec![
                        Some(i.to_string()),
                        Some(format!("/p/{i}")),
                        (i % 2 == 0).then(|| "[x, y]".to_string()),
                    ]
                })
                .collect(),
        )
    }

    fn reader(service: &Arc<InMemoryQueryService>, page_size: usize) -> VisitReader {
        let client = DefaultQueryClient::new(service.clone())
            .with_poll_strategy(Arc::new(FixedInterval::new(Duration::ZERO)));
        PagingQueryReader::new(
            Arc::new(client),
            QueryRequest::new("SELECT id, page, tags FROM visits", "web"),
            page_size,
            SerdeDecoder::new(),
        )
    }

    async fn drain(reader: &VisitReader) -> Vec<Vec<Visit>> {
        let mut pages = Vec::new();
        loop {
            let page = reader.read_page().await.unwrap();
            if page.is_empty() {
                return pages;
            }
            pages.push(page.as_ref().clone());
        }
    }

    #[tokio::test]
    async fn test_reads_ceil_r_over_p_pages_then_empty() {
        for (rows, page_size) in [(5, 2), (4, 2), (1, 1), (3, 10), (7, 3)] {
            let service = Arc::new(InMemoryQueryService::new(fixture(rows)));
            let reader = reader(&service, page_size);
            reader.open().await.unwrap();

            let pages = drain(&reader).await;
            assert_eq!(pages.len(), rows.div_ceil(page_size), "R={rows} P={page_size}");

            let ids: Vec<i32> = pages.iter().flatten().map(|v| v.id).collect();
            assert_eq!(ids, (1..=rows as i32).collect::<Vec<_>>());
            assert!(pages.iter().all(|p| p.len() <= page_size));
        }
    }

    #[tokio::test]
    async fn test_empty_result_set_yields_empty_first_page() {
        let service = Arc::new(InMemoryQueryService::new(fixture(0)));
        let reader = reader(&service, 3);
        reader.open().await.unwrap();

        assert!(reader.read_page().await.unwrap().is_empty());
        assert!(reader.cursor().unwrap().is_exhausted());
    }

    #[tokio::test]
    async fn test_first_read_requests_one_extra_row() {
        let service = Arc::new(InMemoryQueryService::new(fixture(6)));
        let reader = reader(&service, 2);
        reader.open().await.unwrap();

        let first = reader.read_page().await.unwrap();
        reader.read_page().await.unwrap();

        assert_eq!(first.iter().map(|v| v.id).collect::<Vec<_>>(), vec![1, 2]);
        let calls = service.calls().unwrap();
        assert_eq!(calls.results_requests[0].max_results, Some(3));
        assert_eq!(calls.results_requests[1].max_results, Some(2));
    }

    #[tokio::test]
    async fn test_tokens_are_forwarded_verbatim() {
        let service = Arc::new(InMemoryQueryService::new(fixture(5)));
        let reader = reader(&service, 2);
        reader.open().await.unwrap();

        let mut seen = Vec::new();
        loop {
            let page = reader.read_page().await.unwrap();
            seen.push(reader.cursor().unwrap().continuation_token);
            if page.is_empty() {
                break;
            }
        }

        let requests = service.calls().unwrap().results_requests;
        assert_eq!(requests[0].next_token, None);
        for (i, request) in requests.iter().enumerate().skip(1) {
            assert_eq!(request.next_token, seen[i - 1]);
        }
        // the exhausted cursor does not go back to the service
        assert_eq!(requests.len(), 3);
    }

    #[tokio::test]
    async fn test_open_submits_exactly_once() {
        let service = Arc::new(InMemoryQueryService::new(
            fixture(1).with_states(vec![QueryState::Running, QueryState::Succeeded]),
        ));
        let reader = reader(&service, 1);
        reader.open().await.unwrap();

        let calls = service.calls().unwrap();
        assert_eq!(calls.submissions.len(), 1);
        assert_eq!(calls.submissions[0].database, "web");
        assert_eq!(calls.status_polls.len(), 2);

        let cursor = reader.cursor().unwrap();
        assert!(cursor.is_first_page);
        assert_eq!(cursor.continuation_token, None);
        assert_eq!(cursor.execution_handle.unwrap().as_str(), "exec-1");
    }

    #[tokio::test]
    async fn test_failed_query_leaves_reader_unopened() {
        let service = Arc::new(InMemoryQueryService::new(
            fixture(1)
                .with_states(vec![QueryState::Failed])
                .with_reason("TABLE_NOT_FOUND"),
        ));
        let reader = reader(&service, 1);

        let err = reader.open().await.unwrap_err();
        assert!(matches!(
            err,
            ReaderError::Query(QueryError::QueryExecutionFailed { ref reason }) if reason == "TABLE_NOT_FOUND"
        ));
        assert!(matches!(
            reader.read_page().await.unwrap_err(),
            ReaderError::NotOpened
        ));
    }

    #[tokio::test]
    async fn test_read_before_open_fails() {
        let service = Arc::new(InMemoryQueryService::new(fixture(1)));
        let reader = reader(&service, 1);
        assert!(matches!(
            reader.read_page().await.unwrap_err(),
            ReaderError::NotOpened
        ));
        assert!(service.calls().unwrap().results_requests.is_empty());
    }

    #[tokio::test]
    async fn test_close_and_reopen_rearms_header_skip() {
        let service = Arc::new(InMemoryQueryService::new(fixture(3)));
        let reader = reader(&service, 2);

        reader.open().await.unwrap();
        let first_cycle = reader.read_page().await.unwrap();
        reader.close().await.unwrap();

        let cursor = reader.cursor().unwrap();
        assert_eq!(cursor, PaginationCursor::default());
        assert!(reader.current_page().unwrap().is_empty());

        reader.open().await.unwrap();
        let second_cycle = reader.read_page().await.unwrap();

        assert_eq!(first_cycle, second_cycle);
        assert_eq!(second_cycle[0].id, 1);

        let calls = service.calls().unwrap();
        assert_eq!(calls.submissions.len(), 2);
        assert_eq!(calls.results_requests[1].execution_id, "exec-2");
        assert_eq!(calls.results_requests[1].next_token, None);
        assert_eq!(calls.results_requests[1].max_results, Some(3));
    }

    #[tokio::test]
    #[traced_test]
    async fn test_jump_to_page_changes_nothing() {
        let service = Arc::new(InMemoryQueryService::new(fixture(5)));
        let reader = reader(&service, 2);
        reader.open().await.unwrap();
        reader.read_page().await.unwrap();

        let cursor = reader.cursor().unwrap();
        let page = reader.current_page().unwrap();

        for index in [0, 1, 7, usize::MAX] {
            reader.jump_to_page(index);
        }

        assert_eq!(reader.cursor().unwrap(), cursor);
        assert!(Arc::ptr_eq(&reader.current_page().unwrap(), &page));
        assert_eq!(service.calls().unwrap().results_requests.len(), 1);
        assert!(logs_contain("Ignoring jump to page 7"));
    }

    #[tokio::test]
    async fn test_fetch_failure_leaves_cursor_for_retry() {
        let service = Arc::new(InMemoryQueryService::new(fixture(4)));
        let reader = reader(&service, 2);
        reader.open().await.unwrap();
        let first = reader.read_page().await.unwrap();
        let before = reader.cursor().unwrap();

        service.fail_next_fetches(1).unwrap();
        let err = reader.read_page().await.unwrap_err();
        assert!(err.is_retryable());
        assert_eq!(reader.cursor().unwrap(), before);
        assert_eq!(reader.current_page().unwrap(), first);

        let retried = reader.read_page().await.unwrap();
        assert_eq!(retried.iter().map(|v| v.id).collect::<Vec<_>>(), vec![3, 4]);

        let requests = service.calls().unwrap().results_requests;
        assert_eq!(requests[1], requests[2]);
    }

    #[tokio::test]
    async fn test_decode_failure_is_not_retryable() {
        let mut bad = fixture(2);
        bad.rows[1][0] = Some("two".into());
        let service = Arc::new(InMemoryQueryService::new(bad));
        let reader = reader(&service, 5);
        reader.open().await.unwrap();

        let err = reader.read_page().await.unwrap_err();
        assert!(matches!(
            err,
            ReaderError::Query(QueryError::CoercionFailed { .. })
        ));
        assert!(!err.is_retryable());
        assert!(reader.cursor().unwrap().is_first_page);
        assert!(reader.current_page().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_pass_through_rows() {
        let service = Arc::new(InMemoryQueryService::new(fixture(2)));
        let client = DefaultQueryClient::new(service.clone())
            .with_poll_strategy(Arc::new(FixedInterval::new(Duration::ZERO)));
        let reader: PagingQueryReader<RowData, _, _> = PagingQueryReader::new(
            Arc::new(client),
            QueryRequest::new("SELECT * FROM visits", "web"),
            0,
            PassThrough,
        );
        assert_eq!(reader.page_size(), 1);

        reader.open().await.unwrap();
        let page = reader.read_page().await.unwrap();
        assert_eq!(page.len(), 1);
        assert!(!page[0].contains("tags"));
    }

    /// Holds every fetched page until the test lets it through.
    struct GatedClient {
        inner: DefaultQueryClient,
        fetched: Notify,
        release: Notify,
    }

    #[async_trait]
    impl QueryExecutionClient for GatedClient {
        async fn submit(&self, request: &QueryRequest) -> Result<ExecutionHandle, QueryError> {
            self.inner.submit(request).await
        }

        async fn await_completion(&self, handle: &ExecutionHandle) -> Result<(), QueryError> {
            self.inner.await_completion(handle).await
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
            let page = self.inner.fetch_page(request, is_first_page, decoder).await?;
            self.fetched.notify_one();
            self.release.notified().await;
            Ok(page)
        }
    }

    #[tokio::test]
    async fn test_page_fetched_across_reopen_is_discarded() {
        let service = Arc::new(InMemoryQueryService::new(fixture(4)));
        let client = Arc::new(GatedClient {
            inner: DefaultQueryClient::new(service.clone())
                .with_poll_strategy(Arc::new(FixedInterval::new(Duration::ZERO))),
            fetched: Notify::new(),
            release: Notify::new(),
        });
        let reader = PagingQueryReader::new(
            Arc::clone(&client),
            QueryRequest::new("SELECT id, page, tags FROM visits", "web"),
            2,
            SerdeDecoder::<Visit>::new(),
        );
        reader.open().await.unwrap();

        let (stale, ()) = tokio::join!(reader.read_page(), async {
            client.fetched.notified().await;
            reader.close().await.unwrap();
            reader.open().await.unwrap();
            client.release.notify_one();
        });

        assert!(matches!(stale.unwrap_err(), ReaderError::CursorChanged));
        let cursor = reader.cursor().unwrap();
        assert!(cursor.is_first_page);
        assert_eq!(cursor.continuation_token, None);
        assert_eq!(cursor.execution_handle.unwrap().as_str(), "exec-2");
        assert!(reader.current_page().unwrap().is_empty());

        // the reopened cycle still starts from the first page
        client.release.notify_one();
        let page = reader.read_page().await.unwrap();
        assert_eq!(page.iter().map(|v| v.id).collect::<Vec<_>>(), vec![1, 2]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_observers_only_see_whole_pages() {
        let service = Arc::new(InMemoryQueryService::new(fixture(40)));
        let reader = Arc::new(reader(&service, 4));
        reader.open().await.unwrap();

        let observer = {
            let reader = Arc::clone(&reader);
            std::thread::spawn(move || {
                for _ in 0..2_000 {
                    let page = reader.current_page().unwrap();
                    assert!(page.is_empty() || page.len() == 4);
                    if let Some(first) = page.first() {
                        let ids: Vec<i32> = page.iter().map(|v| v.id).collect();
                        let expected: Vec<i32> = (first.id..first.id + 4).collect();
                        assert_eq!(ids, expected);
                    }
                    let cursor = reader.cursor().unwrap();
                    assert!(cursor.execution_handle.is_some());
                }
            })
        };

        let pages = drain(&reader).await;
        observer.join().unwrap();
        assert_eq!(pages.len(), 10);
    }
}
