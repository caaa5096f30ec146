//! The page store interface consumed by the index and the heap.

use crate::common::{PageId, Result};
use crate::storage::page::Page;

/// A store of fixed-size pages with append-only allocation.
///
/// Pages are numbered from 0. A page id is allocated by writing to
/// [`end_pid`](PageStore::end_pid); there is no free list and no page reuse.
pub trait PageStore {
    /// Read page `page_id`.
    ///
    /// # Errors
    /// `Error::PageNotFound` if `page_id >= end_pid()`.
    fn read_page(&mut self, page_id: PageId) -> Result<Page>;

    /// Write page `page_id`.
    ///
    /// Writing at `end_pid()` appends the page and advances `end_pid()` by one.
    ///
    /// # Errors
    /// `Error::PageNotFound` if `page_id > end_pid()`.
    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()>;

    /// The next never-before-used page id.
    fn end_pid(&self) -> PageId;

    /// Flush buffered writes to durable storage.
    fn sync(&mut self) -> Result<()>;

    /// True if no page has ever been written.
    fn is_empty(&self) -> bool {
        self.end_pid().0 == 0
    }
}

impl<S: PageStore + ?Sized> PageStore for Box<S> {
    fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        (**self).read_page(page_id)
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        (**self).write_page(page_id, page)
    }

    fn end_pid(&self) -> PageId {
        (**self).end_pid()
    }

    fn sync(&mut self) -> Result<()> {
        (**self).sync()
    }
}
