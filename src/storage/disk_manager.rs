//! Disk Manager - file-backed [`PageStore`].
//!
//! The [`DiskManager`] handles all direct file operations:
//! - Reading and writing pages
//! - Appending new pages at the end of the file
//! - Read-only and read-write access modes

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::Page;
use crate::storage::PageStore;

/// Manages disk I/O for a single page file.
///
/// # File Layout
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬─────────┐
/// │ Page 0  │ Page 1  │ Page 2  │  ...    │ Page N  │
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)   │
/// └─────────┴─────────┴─────────┴─────────┴─────────┘
/// Offset:  0      4096     8192    ...    N×4096
/// ```
///
/// Page N is located at file offset `N × PAGE_SIZE`. Writing page
/// `end_pid()` extends the file by one page.
///
/// # Thread Safety
/// `DiskManager` is **single-threaded**. The index serializes access to it
/// through a mutex.
///
/// # Durability
/// All writes are followed by `fsync()`.
pub struct DiskManager {
    file: File,
    /// Number of pages in the file.
    page_count: u32,
    read_only: bool,
}

impl DiskManager {
    /// Create a new page file.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;

        Ok(Self {
            file,
            page_count: 0,
            read_only: false,
        })
    }

    /// Open an existing page file for reading and writing.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist or cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;
        Self::from_file(file, false)
    }

    /// Open an existing page file for reading only.
    ///
    /// Writes on the returned manager fail with `Error::ReadOnly`.
    pub fn open_read_only<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).open(&path)?;
        Self::from_file(file, true)
    }

    /// Open an existing page file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    fn from_file(file: File, read_only: bool) -> Result<Self> {
        // A torn trailing page is ignored
        let file_size = file.metadata()?.len();
        let page_count = (file_size / PAGE_SIZE as u64) as u32;

        Ok(Self {
            file,
            page_count,
            read_only,
        })
    }

    /// Get the number of pages in the file.
    #[inline]
    pub fn page_count(&self) -> u32 {
        self.page_count
    }

    /// Get the total size of the file in bytes.
    #[inline]
    pub fn file_size(&self) -> u64 {
        (self.page_count as u64) * (PAGE_SIZE as u64)
    }

    /// True if this manager was opened with [`DiskManager::open_read_only`].
    #[inline]
    pub fn is_read_only(&self) -> bool {
        self.read_only
    }
}

impl PageStore for DiskManager {
    fn read_page(&mut self, page_id: PageId) -> Result<Page> {
        if page_id.0 >= self.page_count {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;

        let mut page = Page::new();
        self.file.read_exact(page.as_mut_slice())?;

        Ok(page)
    }

    fn write_page(&mut self, page_id: PageId, page: &Page) -> Result<()> {
        if self.read_only {
            return Err(Error::ReadOnly);
        }
        if page_id.0 > self.page_count || !page_id.is_valid() {
            return Err(Error::PageNotFound(page_id.0));
        }

        let offset = (page_id.0 as u64) * (PAGE_SIZE as u64);
        self.file.seek(SeekFrom::Start(offset))?;
        self.file.write_all(page.as_slice())?;
        self.file.sync_all()?; // fsync for durability

        if page_id.0 == self.page_count {
            self.page_count += 1;
        }
        Ok(())
    }

    #[inline]
    fn end_pid(&self) -> PageId {
        PageId::new(self.page_count)
    }

    fn sync(&mut self) -> Result<()> {
        if !self.read_only {
            self.file.sync_all()?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_new_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let dm = DiskManager::create(&path).unwrap();
        assert_eq!(dm.page_count(), 0);
        assert_eq!(dm.file_size(), 0);
        assert!(dm.is_empty());
    }

    #[test]
    fn test_create_existing_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        DiskManager::create(&path).unwrap();
        assert!(DiskManager::create(&path).is_err());
    }

    #[test]
    fn test_open_nonexistent_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nonexistent.idx");

        assert!(DiskManager::open(&path).is_err());
        assert!(DiskManager::open_read_only(&path).is_err());
    }

    #[test]
    fn test_append_at_end_pid() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let mut dm = DiskManager::create(&path).unwrap();
        assert_eq!(dm.end_pid(), PageId::new(0));

        let mut page = Page::new();
        page.as_mut_slice()[0] = 0xAB;
        page.as_mut_slice()[4095] = 0xEF;
        dm.write_page(dm.end_pid(), &page).unwrap();

        assert_eq!(dm.end_pid(), PageId::new(1));
        let read_page = dm.read_page(PageId::new(0)).unwrap();
        assert_eq!(read_page.as_slice()[0], 0xAB);
        assert_eq!(read_page.as_slice()[4095], 0xEF);
    }

    #[test]
    fn test_overwrite_does_not_allocate() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let mut dm = DiskManager::create(&path).unwrap();
        dm.write_page(PageId::new(0), &Page::new()).unwrap();

        let mut page = Page::new();
        page.as_mut_slice()[100] = 0xCD;
        dm.write_page(PageId::new(0), &page).unwrap();

        assert_eq!(dm.page_count(), 1);
        assert_eq!(dm.read_page(PageId::new(0)).unwrap().as_slice()[100], 0xCD);
    }

    #[test]
    fn test_persistence() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        // Create and write
        {
            let mut dm = DiskManager::create(&path).unwrap();
            let mut page = Page::new();
            page.as_mut_slice()[0] = 0x42;
            dm.write_page(dm.end_pid(), &page).unwrap();
        }

        // Reopen and verify
        {
            let mut dm = DiskManager::open(&path).unwrap();
            assert_eq!(dm.page_count(), 1);

            let page = dm.read_page(PageId::new(0)).unwrap();
            assert_eq!(page.as_slice()[0], 0x42);
        }
    }

    #[test]
    fn test_multiple_pages() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let mut dm = DiskManager::create(&path).unwrap();

        for i in 0..10 {
            let page_id = dm.end_pid();
            assert_eq!(page_id.0, i);

            let mut page = Page::new();
            page.as_mut_slice()[0] = i as u8;
            dm.write_page(page_id, &page).unwrap();
        }

        assert_eq!(dm.page_count(), 10);
        assert_eq!(dm.file_size(), 10 * PAGE_SIZE as u64);

        for i in 0..10 {
            let page = dm.read_page(PageId::new(i)).unwrap();
            assert_eq!(page.as_slice()[0], i as u8);
        }
    }

    #[test]
    fn test_read_past_end() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let mut dm = DiskManager::create(&path).unwrap();
        dm.write_page(PageId::new(0), &Page::new()).unwrap();

        assert!(matches!(
            dm.read_page(PageId::new(1)),
            Err(Error::PageNotFound(1))
        ));
    }

    #[test]
    fn test_write_with_gap_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        let mut dm = DiskManager::create(&path).unwrap();
        let result = dm.write_page(PageId::new(1), &Page::new());
        assert!(matches!(result, Err(Error::PageNotFound(1))));
        assert_eq!(dm.page_count(), 0);
    }

    #[test]
    fn test_read_only_rejects_writes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        {
            let mut dm = DiskManager::create(&path).unwrap();
            dm.write_page(PageId::new(0), &Page::new()).unwrap();
        }

        let mut dm = DiskManager::open_read_only(&path).unwrap();
        assert!(dm.is_read_only());
        assert!(dm.read_page(PageId::new(0)).is_ok());
        assert!(matches!(
            dm.write_page(PageId::new(0), &Page::new()),
            Err(Error::ReadOnly)
        ));
        assert!(dm.sync().is_ok());
    }

    #[test]
    fn test_open_or_create() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.idx");

        // First call creates
        {
            let mut dm = DiskManager::open_or_create(&path).unwrap();
            assert_eq!(dm.page_count(), 0);
            dm.write_page(PageId::new(0), &Page::new()).unwrap();
        }

        // Second call opens existing
        {
            let dm = DiskManager::open_or_create(&path).unwrap();
            assert_eq!(dm.page_count(), 1);
        }
    }
}
