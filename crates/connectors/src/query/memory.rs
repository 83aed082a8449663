use crate::{
    error::ServiceError,
    query::service::{
        ColumnInfo, GetResultsRequest, QueryExecutionStatus, QueryService, QueryState, ResultPage,
        StartQueryRequest,
    },
};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{
    collections::{HashMap, VecDeque},
    path::Path,
    sync::Mutex,
};
use tracing::debug;

/// Page size the service falls back to when a request does not set one.
pub const DEFAULT_MAX_RESULTS: usize = 1000;

/// Canned result set served by [`InMemoryQueryService`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultFixture {
    pub columns: Vec<ColumnInfo>,
    #[serde(default)]
    pub rows: Vec<Vec<Option<String>>>,
    /// Status sequence reported by successive polls. The last entry repeats
    /// forever; an empty list means the query succeeds immediately.
    #[serde(default)]
    pub states: Vec<QueryState>,
    #[serde(default)]
    pub state_change_reason: Option<String>,
}

impl ResultFixture {
    pub fn new(columns: Vec<ColumnInfo>, rows: Vec<Vec<Option<String>>>) -> Self {
        ResultFixture {
            columns,
            rows,
            ..Default::default()
        }
    }

    pub fn with_states(mut self, states: Vec<QueryState>) -> Self {
        self.states = states;
        self
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.state_change_reason = Some(reason.into());
        self
    }

    /// The rows exactly as the service emits them: header row first.
    fn raw_rows(&self) -> Vec<Vec<Option<String>>> {
        let header = self.columns.iter().map(|c| Some(c.name.clone())).collect();
        std::iter::once(header).chain(self.rows.iter().cloned()).collect()
    }
}

/// Every call the service has seen, in order.
#[derive(Debug, Clone, Default)]
pub struct CallLog {
    pub submissions: Vec<StartQueryRequest>,
    pub status_polls: Vec<String>,
    pub results_requests: Vec<GetResultsRequest>,
}

#[derive(Debug)]
struct Execution {
    states: VecDeque<QueryState>,
    raw_rows: Vec<Vec<Option<String>>>,
}

#[derive(Debug, Default)]
struct Inner {
    next_id: u64,
    executions: HashMap<String, Execution>,
    log: CallLog,
    fail_submissions: usize,
    fail_fetches: usize,
}

/// Replays a fixed result set through the [`QueryService`] contract.
///
/// Continuation tokens are opaque to callers and only valid for the execution
/// that issued them.
#[derive(Debug)]
pub struct InMemoryQueryService {
    fixture: ResultFixture,
    inner: Mutex<Inner>,
}

impl InMemoryQueryService {
    pub fn new(fixture: ResultFixture) -> Self {
        InMemoryQueryService {
            fixture,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn from_json(json: &str) -> Result<Self, ServiceError> {
        let fixture: ResultFixture = serde_json::from_str(json)?;
        Ok(Self::new(fixture))
    }

    pub fn from_fixture_file<P: AsRef<Path>>(path: P) -> Result<Self, ServiceError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json(&content)
    }

    /// Makes the next `count` submissions fail with a transport error.
    pub fn fail_next_submissions(&self, count: usize) -> Result<(), ServiceError> {
        self.lock()?.fail_submissions = count;
        Ok(())
    }

    /// Makes the next `count` result fetches fail with a transport error.
    pub fn fail_next_fetches(&self, count: usize) -> Result<(), ServiceError> {
        self.lock()?.fail_fetches = count;
        Ok(())
    }

    pub fn calls(&self) -> Result<CallLog, ServiceError> {
        Ok(self.lock()?.log.clone())
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Inner>, ServiceError> {
        self.inner
            .lock()
            .map_err(|_| ServiceError::LockError("Failed to lock query service state".into()))
    }

    fn encode_token(execution_id: &str, offset: usize) -> String {
        format!("{execution_id}/{offset}")
    }

    fn decode_token(execution_id: &str, token: &str) -> Result<usize, ServiceError> {
        token
            .strip_prefix(execution_id)
            .and_then(|rest| rest.strip_prefix('/'))
            .and_then(|offset| offset.parse::<usize>().ok())
            .ok_or_else(|| ServiceError::InvalidToken(token.to_string()))
    }
}

fn transport_failure(what: &str) -> ServiceError {
    ServiceError::Transport(Box::new(std::io::Error::new(
        std::io::ErrorKind::ConnectionReset,
        format!("{what} failed: connection reset"),
    )))
}

#[async_trait]
impl QueryService for InMemoryQueryService {
    async fn start_query_execution(
        &self,
        request: StartQueryRequest,
    ) -> Result<String, ServiceError> {
        let mut inner = self.lock()?;
        inner.log.submissions.push(request);

        if inner.fail_submissions > 0 {
            inner.fail_submissions -= 1;
            return Err(transport_failure("StartQueryExecution"));
        }

        inner.next_id += 1;
        let execution_id = format!("exec-{}", inner.next_id);
        let states = if self.fixture.states.is_empty() {
            VecDeque::from([QueryState::Succeeded])
        } else {
            self.fixture.states.iter().copied().collect()
        };
        inner.executions.insert(
            execution_id.clone(),
            Execution {
                states,
                raw_rows: self.fixture.raw_rows(),
            },
        );

        debug!("Started in-memory execution {}", execution_id);
        Ok(execution_id)
    }

    async fn get_query_execution(
        &self,
        execution_id: &str,
    ) -> Result<QueryExecutionStatus, ServiceError> {
        let mut inner = self.lock()?;
        inner.log.status_polls.push(execution_id.to_string());

        let execution = inner
            .executions
            .get_mut(execution_id)
            .ok_or_else(|| ServiceError::UnknownExecution(execution_id.to_string()))?;

        let state = if execution.states.len() > 1 {
            execution.states.pop_front()
        } else {
            execution.states.front().copied()
        }
        .unwrap_or(QueryState::Succeeded);

        let state_change_reason = match state {
            QueryState::Failed | QueryState::Cancelled => self.fixture.state_change_reason.clone(),
            _ => None,
        };

        Ok(QueryExecutionStatus {
            state,
            state_change_reason,
        })
    }

    async fn get_query_results(
        &self,
        request: GetResultsRequest,
    ) -> Result<ResultPage, ServiceError> {
        let mut inner = self.lock()?;
        inner.log.results_requests.push(request.clone());

        if inner.fail_fetches > 0 {
            inner.fail_fetches -= 1;
            return Err(transport_failure("GetQueryResults"));
        }

        let execution = inner
            .executions
            .get(&request.execution_id)
            .ok_or_else(|| ServiceError::UnknownExecution(request.execution_id.clone()))?;

        if execution.states.front() != Some(&QueryState::Succeeded) {
            return Err(ServiceError::Rejected(format!(
                "execution {} has not succeeded",
                request.execution_id
            )));
        }

        let offset = match &request.next_token {
            Some(token) => Self::decode_token(&request.execution_id, token)?,
            None => 0,
        };
        let max_results = request.max_results.unwrap_or(DEFAULT_MAX_RESULTS);
        let total = execution.raw_rows.len();
        let start = offset.min(total);
        let end = start.saturating_add(max_results).min(total);

        let next_token =
            (end < total).then(|| Self::encode_token(&request.execution_id, end));

        Ok(ResultPage {
            columns: self.fixture.columns.clone(),
            rows: execution.raw_rows[start..end].to_vec(),
            next_token,
        })
    }
}
