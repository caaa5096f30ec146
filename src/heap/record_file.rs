//! Append-only tuple file with fixed-size slots.

use std::path::Path;

use crate::common::config::PAGE_SIZE;
use crate::common::{Error, PageId, RecordId, Result};
use crate::index::btree::OpenMode;
use crate::storage::page::{Page, PageHeader, PageType};
use crate::storage::{DiskManager, PageStore};

use super::TupleHeap;

/// Longest value a slot can hold, in bytes.
pub const MAX_VALUE_LEN: usize = 100;

/// Bytes per slot: key (4) + value length (2) + value bytes.
const SLOT_SIZE: usize = 4 + 2 + MAX_VALUE_LEN;

/// A heap file of `(key, value)` tuples.
///
/// # Page Layout
/// ```text
/// Offset          Size   Field
/// ------          ----   -----
/// 0               13     PageHeader (type = Heap)
/// 13              4      slot count (u32)
/// 17 + 106·i      106    slot i: key (i32) | len (u16) | value bytes
/// ```
///
/// Tuples are only appended, never updated or removed, so a [`RecordId`] stays
/// valid for the life of the file. Every page is a heap page; page 0 holds
/// the first tuples.
pub struct RecordFile<S: PageStore = DiskManager> {
    store: S,
    /// Locator the next appended tuple will get.
    end_rid: RecordId,
}

impl RecordFile<DiskManager> {
    /// Open the heap file at `path`.
    ///
    /// `OpenMode::Write` creates the file if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        let store = match mode {
            OpenMode::Read => DiskManager::open_read_only(&path)?,
            OpenMode::Write => DiskManager::open_or_create(&path)?,
        };
        Self::open_with(store)
    }
}

impl<S: PageStore> RecordFile<S> {
    /// Slots that fit in one page.
    pub const SLOTS_PER_PAGE: usize = (PAGE_SIZE - PageHeader::SIZE - 4) / SLOT_SIZE;

    const OFFSET_COUNT: usize = PageHeader::SIZE;
    const OFFSET_SLOTS: usize = PageHeader::SIZE + 4;

    /// Wrap a page store, locating the append position after the last tuple.
    pub fn open_with(mut store: S) -> Result<Self> {
        let end_rid = if store.is_empty() {
            RecordId::new(PageId::new(0), 0)
        } else {
            let last = PageId::new(store.end_pid().0 - 1);
            let page = store.read_page(last)?;
            page.check(last, PageType::Heap)?;
            let count = Self::slot_count(&page);
            if count >= Self::SLOTS_PER_PAGE {
                RecordId::new(store.end_pid(), 0)
            } else {
                RecordId::new(last, count as u32)
            }
        };

        Ok(Self { store, end_rid })
    }

    /// Locator the next appended tuple will get.
    pub fn end_rid(&self) -> RecordId {
        self.end_rid
    }

    /// Sync and release the file.
    pub fn close(mut self) -> Result<()> {
        self.store.sync()
    }

    fn slot_count(page: &Page) -> usize {
        let d = &page.as_slice()[Self::OFFSET_COUNT..];
        u32::from_le_bytes([d[0], d[1], d[2], d[3]]) as usize
    }

    fn set_slot_count(page: &mut Page, count: usize) {
        page.as_mut_slice()[Self::OFFSET_COUNT..Self::OFFSET_COUNT + 4]
            .copy_from_slice(&(count as u32).to_le_bytes());
    }
}

impl<S: PageStore> TupleHeap for RecordFile<S> {
    fn append(&mut self, key: i32, value: &str) -> Result<RecordId> {
        let bytes = value.as_bytes();
        if bytes.len() > MAX_VALUE_LEN {
            return Err(Error::ValueTooLarge(bytes.len()));
        }

        let rid = self.end_rid;
        let mut page = if rid.slot == 0 {
            Page::new()
        } else {
            let page = self.store.read_page(rid.page_id)?;
            page.check(rid.page_id, PageType::Heap)?;
            page
        };

        let off = Self::OFFSET_SLOTS + rid.slot as usize * SLOT_SIZE;
        let data = page.as_mut_slice();
        data[off..off + SLOT_SIZE].fill(0);
        data[off..off + 4].copy_from_slice(&key.to_le_bytes());
        data[off + 4..off + 6].copy_from_slice(&(bytes.len() as u16).to_le_bytes());
        data[off + 6..off + 6 + bytes.len()].copy_from_slice(bytes);
        Self::set_slot_count(&mut page, rid.slot as usize + 1);
        page.seal(PageType::Heap);

        self.store.write_page(rid.page_id, &page)?;

        self.end_rid = if rid.slot as usize + 1 >= Self::SLOTS_PER_PAGE {
            RecordId::new(PageId::new(rid.page_id.0 + 1), 0)
        } else {
            RecordId::new(rid.page_id, rid.slot + 1)
        };
        Ok(rid)
    }

    fn read(&mut self, rid: RecordId) -> Result<(i32, String)> {
        if rid.page_id >= self.store.end_pid() {
            return Err(Error::NoSuchRecord);
        }
        let page = self.store.read_page(rid.page_id)?;
        page.check(rid.page_id, PageType::Heap)?;
        if rid.slot as usize >= Self::slot_count(&page) {
            return Err(Error::NoSuchRecord);
        }

        let off = Self::OFFSET_SLOTS + rid.slot as usize * SLOT_SIZE;
        let data = page.as_slice();
        let key = i32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]]);
        let len = u16::from_le_bytes([data[off + 4], data[off + 5]]) as usize;
        let value = String::from_utf8_lossy(&data[off + 6..off + 6 + len.min(MAX_VALUE_LEN)]);

        Ok((key, value.into_owned()))
    }
}
