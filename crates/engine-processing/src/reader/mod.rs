use crate::error::ReaderError;
use async_trait::async_trait;
use std::sync::Arc;

pub mod item;
pub mod paging;

/// Page-iteration lifecycle expected by a batch host: `open` once,
/// `read_page` until a page comes back empty, then `close` once.
#[async_trait]
pub trait PageReader: Send + Sync {
    type Item: Send + Sync;

    async fn open(&self) -> Result<(), ReaderError>;

    /// Replaces the current page with the next one and returns it. An empty
    /// page means the result set is exhausted.
    async fn read_page(&self) -> Result<Arc<Vec<Self::Item>>, ReaderError>;

    async fn close(&self) -> Result<(), ReaderError>;

    /// Seek to an arbitrary page. Readers that can only move forward treat
    /// this as a no-op.
    fn jump_to_page(&self, page_index: usize);

    fn page_size(&self) -> usize;
}
