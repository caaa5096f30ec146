//! B+tree internal (non-leaf) node codec.

use crate::common::config::INTERNAL_ENTRY_SIZE;
use crate::common::{Error, PageId, Result};
use crate::storage::page::{Page, PageHeader, PageType};
use crate::storage::PageStore;

/// A decoded internal page: `n` separator keys routing to `n + 1` children.
///
/// Logically the node reads `child0, key0, child1, key1, …, key(n-1), child(n)`.
/// `key(i)` is the smallest key reachable through `child(i + 1)`; keys
/// reachable through `child(i)` are below it.
///
/// # Page Layout
/// ```text
/// Offset        Size   Field
/// ------        ----   -----
/// 0             13     PageHeader (type = BTreeInternal)
/// 13            4      count n (u32)
/// 17            4      child0 (u32)
/// 21 + 8·i      8      pair i: key(i) (i32) | child(i + 1) (u32)
/// ```
///
/// A node that has never been initialized has no children and stores
/// `child0 = INVALID`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InternalNode {
    keys: Vec<i32>,
    /// Empty, or exactly `keys.len() + 1` entries.
    children: Vec<PageId>,
    capacity: usize,
}

impl InternalNode {
    const OFFSET_COUNT: usize = PageHeader::SIZE;
    const OFFSET_CHILD0: usize = PageHeader::SIZE + 4;
    const OFFSET_PAIRS: usize = PageHeader::SIZE + 8;

    /// Create an empty, uninitialized node.
    pub fn new(capacity: usize) -> Self {
        debug_assert!(
            Self::OFFSET_PAIRS + capacity * INTERNAL_ENTRY_SIZE <= Page::size(),
            "internal capacity {} does not fit in a page",
            capacity
        );
        Self {
            keys: Vec::with_capacity(capacity + 1),
            children: Vec::with_capacity(capacity + 2),
            capacity,
        }
    }

    /// Set this node to exactly `[child_a, key, child_b]`.
    ///
    /// Used when the tree gains its first level or grows a new root.
    pub fn initialize_root(&mut self, child_a: PageId, key: i32, child_b: PageId) {
        self.keys.clear();
        self.children.clear();
        self.keys.push(key);
        self.children.push(child_a);
        self.children.push(child_b);
    }

    // ========================================================================
    // Codec
    // ========================================================================

    /// Decode an internal node from page bytes.
    ///
    /// The header is not checked here; see [`InternalNode::read`].
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
        let child0 = PageId::from_le_slice(&data[Self::OFFSET_CHILD0..]);
        if count == 0 && !child0.is_valid() {
            return Ok(node);
        }

        node.children.push(child0);
        for i in 0..count {
            let off = Self::OFFSET_PAIRS + i * INTERNAL_ENTRY_SIZE;
            let key = i32::from_le_bytes([data[off], data[off + 1], data[off + 2], data[off + 3]]);
            node.keys.push(key);
            node.children.push(PageId::from_le_slice(&data[off + 4..]));
        }

        Ok(node)
    }

    /// Encode this node into `page`, sealing the header.
    pub fn write_to(&self, page: &mut Page) {
        page.reset();
        let data = page.as_mut_slice();

        data[Self::OFFSET_COUNT..Self::OFFSET_COUNT + 4]
            .copy_from_slice(&(self.keys.len() as u32).to_le_bytes());

        let child0 = self.children.first().copied().unwrap_or(PageId::INVALID);
        data[Self::OFFSET_CHILD0..Self::OFFSET_CHILD0 + 4].copy_from_slice(&child0.to_le_bytes());

        for (i, (key, child)) in self.keys.iter().zip(self.children.iter().skip(1)).enumerate() {
            let off = Self::OFFSET_PAIRS + i * INTERNAL_ENTRY_SIZE;
            data[off..off + 4].copy_from_slice(&key.to_le_bytes());
            data[off + 4..off + 8].copy_from_slice(&child.to_le_bytes());
        }

        page.seal(PageType::BTreeInternal);
    }

    /// Read and decode internal node `page_id` from `store`.
    pub fn read<S: PageStore + ?Sized>(store: &mut S, page_id: PageId, capacity: usize) -> Result<Self> {
        let page = store.read_page(page_id)?;
        page.check(page_id, PageType::BTreeInternal)?;
        Self::from_page(&page, capacity)
    }

    /// Encode and write this node to `page_id` in `store`.
    pub fn write<S: PageStore + ?Sized>(&self, store: &mut S, page_id: PageId) -> Result<()> {
        let mut page = Page::new();
        self.write_to(&mut page);
        store.write_page(page_id, &page)
    }

    // ========================================================================
    // Node operations
    // ========================================================================

    /// Child to follow for `search_key`.
    ///
    /// Returns the child just before the first key strictly greater than
    /// `search_key`, or the last child if there is none. A key equal to a
    /// separator routes right.
    ///
    /// # Errors
    /// `Error::InvalidCursor` if the node has no keys.
    pub fn locate_child_ptr(&self, search_key: i32) -> Result<PageId> {
        let slot = self.locate_child_slot(search_key)?;
        Ok(self.children[slot])
    }

    /// Index into [`children`](Self::children) of the child
    /// [`locate_child_ptr`](Self::locate_child_ptr) returns.
    pub fn locate_child_slot(&self, search_key: i32) -> Result<usize> {
        if self.keys.is_empty() {
            return Err(Error::InvalidCursor);
        }
        Ok(self.keys.partition_point(|&k| k <= search_key))
    }

    /// Leftmost child whose subtree may hold a key `>= search_key`.
    ///
    /// Same as [`locate_child_ptr`](Self::locate_child_ptr) except that a key
    /// equal to a separator routes left. Duplicates of a separator can sit at
    /// the tail of the left subtree after a leaf split, so a lookup that must
    /// find the first such entry descends here and walks the sibling chain.
    ///
    /// # Errors
    /// `Error::InvalidCursor` if the node has no keys.
    pub fn locate_lower_child_ptr(&self, search_key: i32) -> Result<PageId> {
        if self.keys.is_empty() {
            return Err(Error::InvalidCursor);
        }
        let idx = self.keys.partition_point(|&k| k < search_key);
        Ok(self.children[idx])
    }

    /// Insert `key` with `page_id` as its right child.
    ///
    /// The pair lands after every existing key `<= key`.
    ///
    /// # Errors
    /// - `Error::NodeFull` if the node already holds `capacity` keys
    /// - `Error::InvalidCursor` if the node was never initialized
    pub fn insert(&mut self, key: i32, page_id: PageId) -> Result<()> {
        if self.is_full() {
            return Err(Error::NodeFull);
        }
        self.place(self.keys.partition_point(|&k| k <= key), key, page_id)
    }

    /// Insert `key` with `page_id` as its right child, directly after
    /// `children()[slot]`.
    ///
    /// This is how a split child hands its separator up. When duplicates
    /// make the separator equal to a neighbouring key, only the slot the
    /// descent went through says where the new child belongs.
    ///
    /// # Errors
    /// Same as [`insert`](Self::insert).
    pub fn insert_after_child(&mut self, slot: usize, key: i32, page_id: PageId) -> Result<()> {
        if self.is_full() {
            return Err(Error::NodeFull);
        }
        self.place(slot, key, page_id)
    }

    /// Insert a (key, page_id) pair into a full node and split it.
    ///
    /// The pair is placed first, giving `n + 1` keys. The key at position
    /// `(n + 1) / 2` is the middle key: it is removed from this node and
    /// returned for the parent. Keys and children after it move to the
    /// returned sibling. This node keeps `(n + 1) / 2` keys, the sibling
    /// `n - (n + 1) / 2`, so together they hold `n`.
    ///
    /// The new pair ends up here when `key < mid_key` and in the sibling
    /// otherwise; when it is itself the middle key, `page_id` becomes the
    /// sibling's first child.
    pub fn insert_and_split(&mut self, key: i32, page_id: PageId) -> Result<(InternalNode, i32)> {
        self.place(self.keys.partition_point(|&k| k <= key), key, page_id)?;
        self.split()
    }

    /// [`insert_after_child`](Self::insert_after_child) for a full node,
    /// splitting it like [`insert_and_split`](Self::insert_and_split).
    pub fn insert_after_child_and_split(
        &mut self,
        slot: usize,
        key: i32,
        page_id: PageId,
    ) -> Result<(InternalNode, i32)> {
        self.place(slot, key, page_id)?;
        self.split()
    }

    #[inline]
    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn is_full(&self) -> bool {
        self.keys.len() >= self.capacity
    }

    #[inline]
    pub fn keys(&self) -> &[i32] {
        &self.keys
    }

    #[inline]
    pub fn children(&self) -> &[PageId] {
        &self.children
    }

    /// Put `key` at `keys[pos]` and `page_id` at `children[pos + 1]`.
    fn place(&mut self, pos: usize, key: i32, page_id: PageId) -> Result<()> {
        if self.children.is_empty() || pos > self.keys.len() {
            return Err(Error::InvalidCursor);
        }
        self.keys.insert(pos, key);
        self.children.insert(pos + 1, page_id);
        Ok(())
    }

    fn split(&mut self) -> Result<(InternalNode, i32)> {
        let mid = self.keys.len() / 2;

        let mut sibling = InternalNode::new(self.capacity);
        sibling.keys = self.keys.split_off(mid + 1);
        sibling.children = self.children.split_off(mid + 1);
        let mid_key = self.keys.pop().ok_or(Error::InvalidCursor)?;

        Ok((sibling, mid_key))
    }
}

// ============================================================================
// TESTS
// ============================================================================
