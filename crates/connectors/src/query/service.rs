use crate::error::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Lifecycle state of a remote query execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum QueryState {
    Queued,
    Running,
    Succeeded,
    Failed,
    Cancelled,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryExecutionStatus {
    pub state: QueryState,
    pub state_change_reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StartQueryRequest {
    pub query: String,
    pub database: String,
    pub work_group: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetResultsRequest {
    pub execution_id: String,
    pub next_token: Option<String>,
    pub max_results: Option<usize>,
}

/// Column metadata as the service reports it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub declared_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        ColumnInfo {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// One raw page: every cell is a string or null until coerced.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResultPage {
    pub columns: Vec<ColumnInfo>,
    pub rows: Vec<Vec<Option<String>>>,
    pub next_token: Option<String>,
}

/// Minimal contract of a remote query-execution service.
///
/// Implementations are expected to be stateless with respect to any single
/// query so that one instance can back many readers.
#[async_trait]
pub trait QueryService: Send + Sync {
    /// Starts a query and returns its execution id without waiting for it.
    async fn start_query_execution(&self, request: StartQueryRequest)
    -> Result<String, ServiceError>;

    async fn get_query_execution(
        &self,
        execution_id: &str,
    ) -> Result<QueryExecutionStatus, ServiceError>;

    /// Fetches one page of raw rows. On the very first page of a result set
    /// the service emits a header row carrying the column names.
    async fn get_query_results(&self, request: GetResultsRequest)
    -> Result<ResultPage, ServiceError>;
}
