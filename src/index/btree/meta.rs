//! Index header stored on page 0.

use crate::common::config::{IndexOptions, META_PAGE_ID};
use crate::common::{PageId, Result};
use crate::storage::page::{Page, PageHeader, PageType};
use crate::storage::PageStore;

/// Tree-shape metadata persisted in the reserved header page.
///
/// # Page Layout
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       13    PageHeader (type = Meta)
/// 13      4     root_pid (u32, INVALID when empty)
/// 17      4     tree_height (u32)
/// 21      4     leaf_capacity (u32)
/// 25      4     internal_capacity (u32)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexMeta {
    pub root_pid: PageId,
    /// Number of internal levels above the leaves. Zero means empty.
    pub tree_height: u32,
    pub leaf_capacity: usize,
    pub internal_capacity: usize,
}

impl IndexMeta {
    const OFFSET_ROOT: usize = PageHeader::SIZE;
    const OFFSET_HEIGHT: usize = PageHeader::SIZE + 4;
    const OFFSET_LEAF_CAPACITY: usize = PageHeader::SIZE + 8;
    const OFFSET_INTERNAL_CAPACITY: usize = PageHeader::SIZE + 12;

    /// Header of an empty tree.
    pub fn empty(options: IndexOptions) -> Self {
        Self {
            root_pid: PageId::INVALID,
            tree_height: 0,
            leaf_capacity: options.leaf_capacity,
            internal_capacity: options.internal_capacity,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tree_height == 0
    }

    pub fn options(&self) -> IndexOptions {
        IndexOptions::new(self.leaf_capacity, self.internal_capacity)
    }

    pub fn from_page(page: &Page) -> Self {
        let data = page.as_slice();
        let read_u32 = |off: usize| u32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]]);

        Self {
            root_pid: PageId::new(read_u32(Self::OFFSET_ROOT)),
            tree_height: read_u32(Self::OFFSET_HEIGHT),
            leaf_capacity: read_u32(Self::OFFSET_LEAF_CAPACITY) as usize,
            internal_capacity: read_u32(Self::OFFSET_INTERNAL_CAPACITY) as usize,
        }
    }

    pub fn write_to(&self, page: &mut Page) {
        page.reset();
        let data = page.as_mut_slice();
        let fields = [
            (Self::OFFSET_ROOT, self.root_pid.0),
            (Self::OFFSET_HEIGHT, self.tree_height),
            (Self::OFFSET_LEAF_CAPACITY, self.leaf_capacity as u32),
            (Self::OFFSET_INTERNAL_CAPACITY, self.internal_capacity as u32),
        ];
        for (off, value) in fields {
            data[off..off + 4].copy_from_slice(&value.to_le_bytes());
        }
        page.seal(PageType::Meta);
    }

    /// Load the header from page 0, validating its capacities.
    pub fn read<S: PageStore + ?Sized>(store: &mut S) -> Result<Self> {
        let page = store.read_page(META_PAGE_ID)?;
        page.check(META_PAGE_ID, PageType::Meta)?;
        let meta = Self::from_page(&page);
        meta.options().validate()?;
        Ok(meta)
    }

    /// Persist the header to page 0.
    pub fn write<S: PageStore + ?Sized>(&self, store: &mut S) -> Result<()> {
        let mut page = Page::new();
        self.write_to(&mut page);
        store.write_page(META_PAGE_ID, &page)
    }
}
