//! In-memory [`PageStore`].

use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PageStore;

/// RAM-backed page store.
///
/// Page numbers map directly to `Vec` indices. Nothing survives the value
/// being dropped, which makes it a cheap backing store for tests and
/// throwaway indexes.
#[derive(Default)]
pub struct InMemoryPageStore {
    pages: Vec<Box<Page>>,
}

impl InMemoryPageStore {
    /// Creates a new empty page store.
    pub fn new() -> Self {
        Self { pages: Vec::new() }
    }

    /// Number of pages written so far.
    #[inline]
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl PageStore for InMemoryPageStore {
    fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        let stored = self
            .pages
            .get(page_id.0 as usize)
            .ok_or(Error::PageNotFound(page_id.0))?;

        let mut page = Page::new();
        page.copy_from(stored);
        Ok(page)
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        let index = page_id.0 as usize;
        if !page_id.is_valid() || index > self.pages.len() {
            return Err(Error::PageNotFound(page_id.0));
        }

        if index == self.pages.len() {
            self.pages.push(Box::new(Page::new()));
        }
        self.pages[index].copy_from(page);
        Ok(())
    }

    #[inline]
    fn end_pid(&self) -> PageId {
        PageId::new(self.pages.len() as u32)
    }

    fn sync(&mut self) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_append_and_read() {
        let mut store = InMemoryPageStore::new();
        assert!(store.is_empty());

        let mut page = Page::new();
        page.as_mut_slice()[5] = 9;
        store.write_page(store.end_pid(), &page).unwrap();

        assert_eq!(store.page_count(), 1);
        assert_eq!(store.read_page(PageId::new(0)).unwrap().as_slice()[5], 9);
    }

    #[test]
    fn test_out_of_range() {
        let mut store = InMemoryPageStore::new();
        assert!(matches!(
            store.read_page(PageId::new(0)),
            Err(Error::PageNotFound(0))
        ));
        assert!(store.write_page(PageId::new(2), &Page::new()).is_err());
        assert!(store.write_page(PageId::INVALID, &Page::new()).is_err());
    }

    #[test]
    fn test_reads_are_copies() {
        let mut store = InMemoryPageStore::new();
        store.write_page(PageId::new(0), &Page::new()).unwrap();

        let mut copy = store.read_page(PageId::new(0)).unwrap();
        copy.as_mut_slice()[0] = 0xFF;

        assert_eq!(store.read_page(PageId::new(0)).unwrap().as_slice()[0], 0);
    }
}
