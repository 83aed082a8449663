use crate::settings::ReaderSettings;
use model::pagination::page::QueryRequest;
use std::time::Duration;

/// Immutable, validated configuration of one reader.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedSettings {
    /// Query submitted once per open cycle
    pub query: QueryRequest,
    /// Data rows per page, always positive
    pub page_size: usize,
    /// Delay between execution status polls
    pub poll_interval: Duration,
}

impl ValidatedSettings {
    pub(crate) fn from_settings(settings: ReaderSettings) -> Self {
        let mut query = QueryRequest::new(settings.query, settings.database);
        query.work_group = settings.work_group;

        Self {
            query,
            page_size: settings.page_size,
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
        }
    }

    pub fn query(&self) -> &QueryRequest {
        &self.query
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    pub fn poll_interval(&self) -> Duration {
        self.poll_interval
    }
}
