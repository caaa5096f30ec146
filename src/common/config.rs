//! Configuration constants and index options.

use crate::common::{Error, PageId, Result};

/// Size of a page in bytes (4KB).
///
/// Every page in an index file, the metadata page included, has this size.
pub const PAGE_SIZE: usize = 4096;

/// Page reserved for the index header (root page id, tree height, capacities).
pub const META_PAGE_ID: PageId = PageId(0);

/// Bytes taken by one leaf entry: key (4) + record page id (4) + slot (4).
pub const LEAF_ENTRY_SIZE: usize = 12;

/// Bytes taken by one internal (key, child) pair.
pub const INTERNAL_ENTRY_SIZE: usize = 8;

/// Most entries a leaf page can hold.
///
/// Header (13) + count (4) + trailing sibling pointer (4) leave 4075 bytes.
pub const MAX_LEAF_CAPACITY: usize = (PAGE_SIZE - 13 - 4 - 4) / LEAF_ENTRY_SIZE;

/// Most separator keys an internal page can hold.
///
/// Header (13) + count (4) + leftmost child (4) leave 4075 bytes.
pub const MAX_INTERNAL_CAPACITY: usize = (PAGE_SIZE - 13 - 4 - 4) / INTERNAL_ENTRY_SIZE;

/// Smallest capacity that still lets a split leave both halves non-empty.
pub const MIN_CAPACITY: usize = 2;

/// Node capacities for a new index.
///
/// Small capacities are useful in tests to force splits with few keys.
/// An existing index file always uses the capacities recorded in its header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexOptions {
    /// Maximum (key, RecordId) entries per leaf.
    pub leaf_capacity: usize,
    /// Maximum separator keys per internal node.
    pub internal_capacity: usize,
}

impl IndexOptions {
    /// Options with explicit capacities.
    pub fn new(leaf_capacity: usize, internal_capacity: usize) -> Self {
        Self {
            leaf_capacity,
            internal_capacity,
        }
    }

    /// Check both capacities fit in a page.
    pub fn validate(&self) -> Result<()> {
        check_capacity(self.leaf_capacity, MAX_LEAF_CAPACITY)?;
        check_capacity(self.internal_capacity, MAX_INTERNAL_CAPACITY)
    }
}

impl Default for IndexOptions {
    fn default() -> Self {
        Self::new(MAX_LEAF_CAPACITY, MAX_INTERNAL_CAPACITY)
    }
}

fn check_capacity(capacity: usize, max: usize) -> Result<()> {
    if (MIN_CAPACITY..=max).contains(&capacity) {
        Ok(())
    } else {
        Err(Error::InvalidCapacity { capacity, max })
    }
}
