//! B+tree leaf node codec.
//!
//! A [`LeafNode`] is the decoded form of one leaf page: sorted
//! (key, [`RecordId`]) entries plus the page id of the next leaf in key order.

use crate::common::config::{LEAF_ENTRY_SIZE, PAGE_SIZE};
use crate::common::{Error, PageId, RecordId, Result};
use crate::storage::page::{Page, PageHeader, PageType};
use crate::storage::PageStore;

/// One (key, RecordId) pair stored in a leaf.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafEntry {
    pub key: i32,
    pub rid: RecordId,
}

impl LeafEntry {
    pub fn new(key: i32, rid: RecordId) -> Self {
        Self { key, rid }
    }
}

/// A decoded leaf page.
///
/// # Page Layout
/// ```text
/// Offset        Size   Field
/// ------        ----   -----
/// 0             13     PageHeader (type = BTreeLeaf)
/// 13            4      count (u32)
/// 17 + 12·i     12     entry i: key (i32) | rid.page_id (u32) | rid.slot (u32)
/// 4092          4      next leaf PageId (INVALID for the last leaf)
/// ```
///
/// Keys are non-decreasing. Equal keys keep insertion order: a later insert
/// lands after every existing entry with the same key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafNode {
    entries: Vec<LeafEntry>,
    next: PageId,
    capacity: usize,
}

impl LeafNode {
    const OFFSET_COUNT: usize = PageHeader::SIZE;
    const OFFSET_ENTRIES: usize = PageHeader::SIZE + 4;
    const OFFSET_NEXT: usize = PAGE_SIZE - 4;

    /// Create an empty leaf with no next sibling.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(
            Self::OFFSET_ENTRIES + capacity * LEAF_ENTRY_SIZE <= Self::OFFSET_NEXT,
            "leaf capacity {} does not fit in a page",
            capacity
        );
        Self {
            entries: Vec::with_capacity(capacity + 1),
            next: PageId::INVALID,
            capacity,
        }
    }

    // ========================================================================
    // Codec
    // ========================================================================

    /// Decode a leaf from page bytes.
    ///
    /// The header is not checked here; see [`LeafNode::read`].
    pub fn from_page(page: &Page, capacity: usize) -> Result<Self> {
        let data = page.as_slice();
        let c = Self::OFFSET_COUNT;
        let count = u32::from_le_bytes([data[c], data[c + 1], data[c + 2], data[c + 3]]) as usize;
        if count > capacity {
            return Err(Error::InvalidCapacity {
                capacity: count,
                max: capacity,
            });
        }

        let mut node = Self::new(capacity);
        for i in 0..count {
            let off = Self::OFFSET_ENTRIES + i * LEAF_ENTRY_SIZE;
            let key = i32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]]);
            let rid = RecordId::from_le_slice(&data[off + 4..off + LEAF_ENTRY_SIZE]);
            node.entries.push(LeafEntry::new(key, rid));
        }
        node.next = PageId::from_le_slice(&data[Self::OFFSET_NEXT..]);

        Ok(node)
    }

    /// Encode this leaf into `page`, sealing the header.
    pub fn write_to(&self, page: &mut Page) {
        page.reset();
        let data = page.as_mut_slice();

        data[Self::OFFSET_COUNT..Self::OFFSET_COUNT + 4]
            .copy_from_slice(&(self.entries.len() as u32).to_le_bytes());
        for (i, entry) in self.entries.iter().enumerate() {
            let off = Self::OFFSET_ENTRIES + i * LEAF_ENTRY_SIZE;
            data[off..off + 4].copy_from_slice(&entry.key.to_le_bytes());
            data[off + 4..off + LEAF_ENTRY_SIZE].copy_from_slice(&entry.rid.to_le_bytes());
        }
        data[Self::OFFSET_NEXT..].copy_from_slice(&self.next.to_le_bytes());

        page.seal(PageType::BTreeLeaf);
    }

    /// Read and decode leaf `page_id` from `store`.
    pub fn read<S: PageStore + ?Sized>(store: &mut S, page_id: PageId, capacity: usize) -> Result<Self> {
        let page = store.read_page(page_id)?;
        page.check(page_id, PageType::BTreeLeaf)?;
        Self::from_page(&page, capacity)
    }

    /// Encode and write this leaf to `page_id` in `store`.
    pub fn write<S: PageStore + ?Sized>(&self, store: &mut S, page_id: PageId) -> Result<()> {
        let mut page = Page::new();
        self.write_to(&mut page);
        store.write_page(page_id, &page)
    }

    // ========================================================================
    // Node operations
    // ========================================================================

    /// Insert a (key, rid) pair in key order.
    ///
    /// # Errors
    /// `Error::NodeFull` if the leaf already holds `capacity` entries.
    pub fn insert(&mut self, key: i32, rid: RecordId) -> Result<()> {
        if self.is_full() {
            return Err(Error::NodeFull);
        }
        self.insert_unchecked(key, rid);
        Ok(())
    }

    /// Insert a (key, rid) pair and move the upper half into a new sibling.
    ///
    /// After the insert the node holds `count + 1` entries; the last
    /// `(count + 1) / 2` of them move to the sibling. The sibling takes over
    /// this node's next pointer and this node's next pointer becomes
    /// `sibling_pid`. Returns the sibling and its first key, which the parent
    /// uses as the separator.
    pub fn insert_and_split(
        &mut self,
        key: i32,
        rid: RecordId,
        sibling_pid: PageId,
    ) -> Result<(LeafNode, i32)> {
        self.insert_unchecked(key, rid);

        let num_move = self.entries.len() / 2;
        let num_stay = self.entries.len() - num_move;

        let mut sibling = LeafNode::new(self.capacity);
        sibling.entries = self.entries.split_off(num_stay);
        sibling.next = self.next;
        self.next = sibling_pid;

        let promoted = sibling.first_key().ok_or(Error::InvalidCursor)?;
        Ok((sibling, promoted))
    }

    /// Index of the first entry whose key is `>= search_key`.
    ///
    /// Only this node is searched; following the sibling chain is the
    /// caller's job.
    ///
    /// # Errors
    /// `Error::NoSuchRecord` if every key here is smaller (or the node is
    /// empty).
    pub fn locate(&self, search_key: i32) -> Result<usize> {
        let eid = self.entries.partition_point(|e| e.key < search_key);
        if eid == self.entries.len() {
            Err(Error::NoSuchRecord)
        } else {
            Ok(eid)
        }
    }

    /// Read the entry at `eid`.
    ///
    /// # Errors
    /// `Error::InvalidCursor` if `eid` is outside `[0, count)`.
    pub fn read_entry(&self, eid: usize) -> Result<(i32, RecordId)> {
        self.entries
            .get(eid)
            .map(|e| (e.key, e.rid))
            .ok_or(Error::InvalidCursor)
    }

    /// Page id of the next leaf, or `PageId::INVALID` for the last leaf.
    #[inline]
    pub fn next_node_ptr(&self) -> PageId {
        self.next
    }

    #[inline]
    pub fn set_next_node_ptr(&mut self, page_id: PageId) {
        self.next = page_id;
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() >= self.capacity
    }

    #[inline]
    pub fn entries(&self) -> &[LeafEntry] {
        &self.entries
    }

    /// Key of the first entry, if any.
    pub fn first_key(&self) -> Option<i32> {
        self.entries.first().map(|e| e.key)
    }

    // Upper-bound position keeps equal keys in insertion order.
    fn insert_unchecked(&mut self, key: i32, rid: RecordId) {
        let pos = self.entries.partition_point(|e| e.key <= key);
        self.entries.insert(pos, LeafEntry::new(key, rid));
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::InMemoryPageStore;

    fn rid(n: u32) -> RecordId {
        RecordId::new(PageId::new(n), n)
    }

    fn keys(node: &LeafNode) -> Vec<i32> {
        node.entries().iter().map(|e| e.key).collect()
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut leaf = LeafNode::new(8);
        for k in [5, 1, 4, 2, 3] {
            leaf.insert(k, rid(k as u32)).unwrap();
        }

        assert_eq!(keys(&leaf), vec![1, 2, 3, 4, 5]);
        assert_eq!(leaf.read_entry(2).unwrap(), (3, rid(3)));
    }

    #[test]
    fn test_duplicates_keep_insertion_order() {
        let mut leaf = LeafNode::new(8);
        leaf.insert(7, rid(1)).unwrap();
        leaf.insert(3, rid(2)).unwrap();
        leaf.insert(7, rid(3)).unwrap();
        leaf.insert(7, rid(4)).unwrap();

        let rids: Vec<u32> = leaf.entries().iter().map(|e| e.rid.slot).collect();
        assert_eq!(rids, vec![2, 1, 3, 4]);
    }

    #[test]
    fn test_insert_full_node() {
        let mut leaf = LeafNode::new(2);
        leaf.insert(1, rid(1)).unwrap();
        leaf.insert(2, rid(2)).unwrap();

        assert!(leaf.is_full());
        assert!(matches!(leaf.insert(3, rid(3)), Err(Error::NodeFull)));
        assert_eq!(leaf.key_count(), 2);
    }

    #[test]
    fn test_split_capacity_four() {
        let mut leaf = LeafNode::new(4);
        for k in 1..=4 {
            leaf.insert(k, rid(k as u32)).unwrap();
        }
        leaf.set_next_node_ptr(PageId::new(77));

        let (sibling, promoted) = leaf.insert_and_split(5, rid(5), PageId::new(9)).unwrap();

        assert_eq!(keys(&leaf), vec![1, 2, 3]);
        assert_eq!(keys(&sibling), vec![4, 5]);
        assert_eq!(promoted, 4);
        assert_eq!(sibling.first_key(), Some(promoted));
        assert_eq!(LeafNode::new(4).first_key(), None);
        assert_eq!(leaf.next_node_ptr(), PageId::new(9));
        assert_eq!(sibling.next_node_ptr(), PageId::new(77));
    }

    #[test]
    fn test_split_conservation_and_order() {
        for new_key in [0, 3, 6, 10, 21] {
            let mut leaf = LeafNode::new(7);
            for k in [2, 4, 6, 8, 10, 12, 14] {
                leaf.insert(k, rid(k as u32)).unwrap();
            }
            let n = leaf.key_count();

            let (sibling, promoted) = leaf.insert_and_split(new_key, rid(99), PageId::new(3)).unwrap();

            assert_eq!(leaf.key_count() + sibling.key_count(), n + 1);
            assert_eq!(sibling.key_count(), (n + 1) / 2);
            let max_left = leaf.entries().last().unwrap().key;
            assert!(max_left <= promoted);
            assert!(keys(&sibling).iter().all(|&k| k >= promoted));
        }
    }

    #[test]
    fn test_locate_within_node() {
        let mut leaf = LeafNode::new(8);
        for k in [10, 20, 30] {
            leaf.insert(k, rid(k as u32)).unwrap();
        }

        assert_eq!(leaf.locate(5).unwrap(), 0);
        assert_eq!(leaf.locate(10).unwrap(), 0);
        assert_eq!(leaf.locate(11).unwrap(), 1);
        assert_eq!(leaf.locate(30).unwrap(), 2);
        assert!(matches!(leaf.locate(31), Err(Error::NoSuchRecord)));
    }

    #[test]
    fn test_locate_empty_node() {
        let leaf = LeafNode::new(4);
        assert!(matches!(leaf.locate(0), Err(Error::NoSuchRecord)));
    }

    #[test]
    fn test_read_entry_out_of_range() {
        let mut leaf = LeafNode::new(4);
        assert!(matches!(leaf.read_entry(0), Err(Error::InvalidCursor)));

        leaf.insert(1, rid(1)).unwrap();
        assert!(leaf.read_entry(0).is_ok());
        assert!(matches!(leaf.read_entry(1), Err(Error::InvalidCursor)));
    }

    #[test]
    fn test_page_roundtrip() {
        let mut leaf = LeafNode::new(16);
        for k in [-3, 0, 8, 8, 1 << 20] {
            leaf.insert(k, RecordId::new(PageId::new(k as u32 & 0xFF), 2)).unwrap();
        }
        leaf.set_next_node_ptr(PageId::new(12));

        let mut page = Page::new();
        leaf.write_to(&mut page);

        assert!(page.check(PageId::new(1), PageType::BTreeLeaf).is_ok());
        let decoded = LeafNode::from_page(&page, 16).unwrap();
        assert_eq!(decoded, leaf);
    }

    #[test]
    fn test_empty_leaf_roundtrip_keeps_sentinel() {
        let leaf = LeafNode::new(4);
        let mut page = Page::new();
        leaf.write_to(&mut page);

        let decoded = LeafNode::from_page(&page, 4).unwrap();
        assert_eq!(decoded.key_count(), 0);
        assert_eq!(decoded.next_node_ptr(), PageId::INVALID);
        assert_eq!(&page.as_slice()[PAGE_SIZE - 4..], &(-1i32).to_le_bytes());
    }

    #[test]
    fn test_byte_layout() {
        let mut leaf = LeafNode::new(4);
        leaf.insert(0x01020304, RecordId::new(PageId::new(5), 6)).unwrap();

        let mut page = Page::new();
        leaf.write_to(&mut page);
        let data = page.as_slice();

        assert_eq!(&data[13..17], &1u32.to_le_bytes());
        assert_eq!(&data[17..21], &0x01020304i32.to_le_bytes());
        assert_eq!(&data[21..25], &5u32.to_le_bytes());
        assert_eq!(&data[25..29], &6u32.to_le_bytes());
    }

    #[test]
    fn test_decode_count_over_capacity() {
        let mut leaf = LeafNode::new(8);
        for k in 0..5 {
            leaf.insert(k, rid(k as u32)).unwrap();
        }
        let mut page = Page::new();
        leaf.write_to(&mut page);

        assert!(matches!(
            LeafNode::from_page(&page, 4),
            Err(Error::InvalidCapacity { capacity: 5, max: 4 })
        ));
    }

    #[test]
    fn test_store_read_write() {
        let mut store = InMemoryPageStore::new();
        let mut leaf = LeafNode::new(4);
        leaf.insert(42, rid(42)).unwrap();
        leaf.write(&mut store, PageId::new(0)).unwrap();

        let back = LeafNode::read(&mut store, PageId::new(0), 4).unwrap();
        assert_eq!(back.read_entry(0).unwrap(), (42, rid(42)));
    }

    #[test]
    fn test_full_capacity_fits_page() {
        use crate::common::config::MAX_LEAF_CAPACITY;

        let mut leaf = LeafNode::new(MAX_LEAF_CAPACITY);
        for k in 0..MAX_LEAF_CAPACITY as i32 {
            leaf.insert(k, rid(k as u32)).unwrap();
        }
        leaf.set_next_node_ptr(PageId::new(3));

        let mut page = Page::new();
        leaf.write_to(&mut page);
        let decoded = LeafNode::from_page(&page, MAX_LEAF_CAPACITY).unwrap();
        assert_eq!(decoded.key_count(), MAX_LEAF_CAPACITY);
        assert_eq!(decoded.next_node_ptr(), PageId::new(3));
        assert_eq!(decoded.read_entry(MAX_LEAF_CAPACITY - 1).unwrap().0, MAX_LEAF_CAPACITY as i32 - 1);
    }
}
