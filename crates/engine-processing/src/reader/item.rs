use crate::{error::ReaderError, reader::PageReader};
use std::sync::Arc;
use tracing::debug;

/// Item-at-a-time view over a [`PageReader`].
///
/// Pulls a new page whenever the current one is used up and stops at the
/// first empty page.
pub struct PagedItemReader<R: PageReader> {
    reader: R,
    page: Arc<Vec<R::Item>>,
    current: usize,
    item_index: usize,
    page_loaded: bool,
    exhausted: bool,
}

impl<R> PagedItemReader<R>
where
    R: PageReader,
    R::Item: Clone,
{
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            page: Arc::new(Vec::new()),
            current: 0,
            item_index: 0,
            page_loaded: false,
            exhausted: false,
        }
    }

    pub fn inner(&self) -> &R {
        &self.reader
    }

    /// Number of items handed out since the last `open`.
    pub fn item_index(&self) -> usize {
        self.item_index
    }

    pub async fn open(&mut self) -> Result<(), ReaderError> {
        self.reset();
        self.reader.open().await
    }

    pub async fn read(&mut self) -> Result<Option<R::Item>, ReaderError> {
        if self.exhausted {
            return Ok(None);
        }

        if !self.page_loaded || self.current >= self.page.len() {
            self.page = self.reader.read_page().await?;
            self.current = 0;
            self.page_loaded = true;

            if self.page.is_empty() {
                debug!("Reached end of results after {} items", self.item_index);
                self.exhausted = true;
                return Ok(None);
            }
        }

        let item = self.page[self.current].clone();
        self.current += 1;
        self.item_index += 1;
        Ok(Some(item))
    }

    /// Reads every remaining item.
    pub async fn read_all(&mut self) -> Result<Vec<R::Item>, ReaderError> {
        let mut items = Vec::new();
        while let Some(item) = self.read().await? {
            items.push(item);
        }
        Ok(items)
    }

    /// Forwards the seek to the page reader. Position is left as-is when the
    /// page reader cannot seek.
    pub fn jump_to_item(&mut self, item_index: usize) {
        let page_size = self.reader.page_size().max(1);
        self.reader.jump_to_page(item_index / page_size);
    }

    pub async fn close(&mut self) -> Result<(), ReaderError> {
        self.reset();
        self.reader.close().await
    }

    fn reset(&mut self) {
        self.page = Arc::new(Vec::new());
        self.current = 0;
        self.item_index = 0;
        self.page_loaded = false;
        self.exhausted = false;
    }
}
