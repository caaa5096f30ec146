//! B+tree index coordinator.
//!
//! [`BTreeIndex`] owns the tree metadata (root page id and height), drives
//! root-to-leaf descent for insert and lookup, propagates splits upward and
//! grows the root. Per-node work is delegated to [`LeafNode`] and
//! [`InternalNode`]; only this module changes the tree's shape.

use std::path::Path;

use log::{debug, trace};
use parking_lot::Mutex;

use crate::common::config::IndexOptions;
use crate::common::{Error, PageId, RecordId, Result};
use crate::storage::{DiskManager, PageStore};

use super::cursor::{scan_start, IndexCursor, RangeScan};
use super::meta::IndexMeta;
use super::{InternalNode, LeafNode};

/// Access mode of an open index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenMode {
    /// Existing index, lookups and scans only.
    Read,
    /// Index is created if missing; inserts allowed.
    Write,
}

/// Result of inserting into one node, carried up the descent path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InsertOutcome {
    /// The node absorbed the entry; nothing to propagate.
    Fit,
    /// The node split. The parent must add `separator` with `sibling` as its
    /// right child.
    Split { separator: i32, sibling: PageId },
}

/// A disk-resident B+tree mapping `i32` keys to [`RecordId`]s.
///
/// # Structure
/// ```text
///                    ┌──────────────────────┐
///   height 2         │ c0 │ 40 │ c1         │   root (internal)
///                    └──┬───────────┬───────┘
///              ┌────────┘           └────────┐
///   height 1   │ c0 │ 20 │ c1 │              │ c0 │ 60 │ c1 │
///              └──┬────────┬─┘               └──┬────────┬─┘
///   leaves     [5,10]→[20,30]→─────────────→[40,50]→[60,70]→ INVALID
/// ```
///
/// Page 0 holds the [`IndexMeta`] header; nodes live on pages `>= 1`, each
/// allocated at the store's `end_pid()` when first written.
///
/// # Concurrency
/// One writer. Inserts take `&mut self`; [`locate`](Self::locate),
/// [`read_forward`](Self::read_forward) and scans take `&self`, so several
/// cursors can read through one handle. The store sits behind a mutex held
/// for one page read at a time.
///
/// # Example
/// ```no_run
/// use pagetree::{BTreeIndex, OpenMode, PageId, RecordId};
///
/// let mut index = BTreeIndex::open("movies.idx", OpenMode::Write).unwrap();
/// index.insert(42, RecordId::new(PageId::new(1), 0)).unwrap();
///
/// for entry in index.scan_from(40).unwrap() {
///     let (key, rid) = entry.unwrap();
///     println!("{} -> {}", key, rid);
/// }
/// index.close().unwrap();
/// ```
pub struct BTreeIndex<S: PageStore = DiskManager> {
    store: Mutex<S>,
    meta: IndexMeta,
    mode: OpenMode,
}

impl BTreeIndex<DiskManager> {
    /// Open the index file at `path` with default node capacities.
    ///
    /// `OpenMode::Read` requires the file to exist and opens it read-only.
    /// `OpenMode::Write` creates the file if it does not exist.
    pub fn open<P: AsRef<Path>>(path: P, mode: OpenMode) -> Result<Self> {
        Self::open_with_options(path, mode, IndexOptions::default())
    }

    /// Open the index file at `path`.
    ///
    /// `options` only applies when the file is created; an existing index
    /// keeps the capacities recorded in its header.
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        mode: OpenMode,
        options: IndexOptions,
    ) -> Result<Self> {
        let store = match mode {
            OpenMode::Read => DiskManager::open_read_only(&path)?,
            OpenMode::Write => DiskManager::open_or_create(&path)?,
        };
        debug!("opening index {} ({:?})", path.as_ref().display(), mode);
        Self::open_with(store, mode, options)
    }
}

impl<S: PageStore> BTreeIndex<S> {
    /// Open an index over an arbitrary page store.
    ///
    /// An empty store gets a fresh header (root = INVALID, height = 0) written
    /// to page 0 in write mode. Otherwise the header is loaded from page 0.
    pub fn open_with(mut store: S, mode: OpenMode, options: IndexOptions) -> Result<Self> {
        let meta = if store.is_empty() {
            options.validate()?;
            let meta = IndexMeta::empty(options);
            if mode == OpenMode::Write {
                meta.write(&mut store)?;
            }
            meta
        } else {
            IndexMeta::read(&mut store)?
        };

        debug!(
            "index open: root={} height={} leaf_capacity={} internal_capacity={}",
            meta.root_pid, meta.tree_height, meta.leaf_capacity, meta.internal_capacity
        );

        Ok(Self {
            store: Mutex::new(store),
            meta,
            mode,
        })
    }

    /// Persist the header and release the store.
    pub fn close(self) -> Result<()> {
        self.into_inner().map(|_| ())
    }

    /// Persist the header and hand back the underlying store.
    pub fn into_inner(mut self) -> Result<S> {
        self.flush()?;
        debug!(
            "index closed: root={} height={}",
            self.meta.root_pid, self.meta.tree_height
        );
        Ok(self.store.into_inner())
    }

    /// Write the header to page 0 and sync the store.
    ///
    /// A no-op in read mode.
    pub fn flush(&mut self) -> Result<()> {
        if self.mode == OpenMode::Read {
            return Ok(());
        }
        let store = self.store.get_mut();
        self.meta.write(store)?;
        store.sync()
    }

    // ========================================================================
    // Public API: Insert
    // ========================================================================

    /// Insert a (key, rid) pair.
    ///
    /// Duplicate keys are allowed and keep insertion order.
    ///
    /// # Errors
    /// - `Error::ReadOnly` in read mode
    /// - storage errors, propagated unchanged. A failure in the middle of a
    ///   split can leave some pages written and others not.
    pub fn insert(&mut self, key: i32, rid: RecordId) -> Result<()> {
        if self.mode == OpenMode::Read {
            return Err(Error::ReadOnly);
        }

        let meta = &mut self.meta;
        let store = self.store.get_mut();

        if meta.is_empty() {
            return bootstrap(store, meta, key, rid);
        }

        // Descend, remembering every internal node and the slot taken
        let mut path: Vec<(PageId, InternalNode, usize)> =
            Vec::with_capacity(meta.tree_height as usize);
        let mut pid = meta.root_pid;
        for level in 0..meta.tree_height {
            let node = InternalNode::read(store, pid, meta.internal_capacity)?;
            let slot = node.locate_child_slot(key)?;
            let child = node.children()[slot];
            trace!("insert {}: level {} {} -> {}", key, level, pid, child);
            path.push((pid, node, slot));
            pid = child;
        }

        let mut outcome = insert_into_leaf(store, pid, meta.leaf_capacity, key, rid)?;

        while let InsertOutcome::Split { separator, sibling } = outcome {
            outcome = match path.pop() {
                Some((parent_pid, parent, slot)) => {
                    insert_into_internal(store, parent_pid, parent, slot, separator, sibling)?
                }
                None => {
                    grow_root(store, meta, separator, sibling)?;
                    InsertOutcome::Fit
                }
            };
        }

        Ok(())
    }

    // ========================================================================
    // Public API: Lookup and scan
    // ========================================================================

    /// Find the first entry whose key is `>= search_key`.
    ///
    /// # Errors
    /// `Error::NoSuchRecord` if every key in the index is smaller, or the
    /// index is empty.
    pub fn locate(&self, search_key: i32) -> Result<IndexCursor> {
        if self.meta.is_empty() {
            return Err(Error::NoSuchRecord);
        }

        let mut store = self.store.lock();
        let mut pid = self.meta.root_pid;
        for _ in 0..self.meta.tree_height {
            let node = InternalNode::read(&mut *store, pid, self.meta.internal_capacity)?;
            pid = node.locate_lower_child_ptr(search_key)?;
        }

        loop {
            let leaf = LeafNode::read(&mut *store, pid, self.meta.leaf_capacity)?;
            match leaf.locate(search_key) {
                Ok(eid) => return Ok(IndexCursor::new(pid, eid)),
                Err(Error::NoSuchRecord) => {
                    pid = leaf.next_node_ptr();
                    if !pid.is_valid() {
                        return Err(Error::NoSuchRecord);
                    }
                    trace!("locate {}: following sibling {}", search_key, pid);
                }
                Err(e) => return Err(e),
            }
        }
    }

    /// Read the entry under `cursor` and advance the cursor.
    ///
    /// The cursor moves to the next slot in the same leaf, or to slot 0 of
    /// the next leaf. After the last entry of the last leaf it holds
    /// `PageId::INVALID` (see [`IndexCursor::is_end`]).
    ///
    /// # Errors
    /// `Error::InvalidCursor` if the cursor is at the end or its slot is out
    /// of range.
    pub fn read_forward(&self, cursor: &mut IndexCursor) -> Result<(i32, RecordId)> {
        if cursor.is_end() {
            return Err(Error::InvalidCursor);
        }

        let leaf = LeafNode::read(&mut *self.store.lock(), cursor.pid, self.meta.leaf_capacity)?;
        let entry = leaf.read_entry(cursor.eid)?;

        if cursor.eid + 1 < leaf.key_count() {
            cursor.eid += 1;
        } else {
            cursor.pid = leaf.next_node_ptr();
            cursor.eid = 0;
        }

        Ok(entry)
    }

    /// Ascending scan starting at the first key `>= search_key`.
    ///
    /// The scan is empty when no such key exists.
    pub fn scan_from(&self, search_key: i32) -> Result<RangeScan<'_, S>> {
        let start = scan_start(self.locate(search_key))?;
        Ok(RangeScan::new(self, start))
    }

    /// Ascending scan over every entry.
    pub fn scan_all(&self) -> Result<RangeScan<'_, S>> {
        self.scan_from(i32::MIN)
    }

    // ========================================================================
    // Public API: Introspection
    // ========================================================================

    #[inline]
    pub fn root_page_id(&self) -> PageId {
        self.meta.root_pid
    }

    /// Number of internal levels above the leaves; zero for an empty index.
    #[inline]
    pub fn tree_height(&self) -> u32 {
        self.meta.tree_height
    }

    /// Node capacities this index was built with.
    #[inline]
    pub fn options(&self) -> IndexOptions {
        self.meta.options()
    }

    #[inline]
    pub fn mode(&self) -> OpenMode {
        self.mode
    }
}

// ============================================================================
// Internal: structural changes
// ============================================================================

/// First insert: an empty left leaf, a right leaf holding the entry and an
/// internal root `[left, key, right]` above them.
fn bootstrap<S: PageStore>(store: &mut S, meta: &mut IndexMeta, key: i32, rid: RecordId) -> Result<()> {
    let mut left = LeafNode::new(meta.leaf_capacity);
    let left_pid = store.end_pid();
    left.write(store, left_pid)?;

    let mut right = LeafNode::new(meta.leaf_capacity);
    right.insert(key, rid)?;
    let right_pid = store.end_pid();
    right.write(store, right_pid)?;

    left.set_next_node_ptr(right_pid);
    left.write(store, left_pid)?;

    let mut root = InternalNode::new(meta.internal_capacity);
    root.initialize_root(left_pid, key, right_pid);
    let root_pid = store.end_pid();
    root.write(store, root_pid)?;

    meta.root_pid = root_pid;
    meta.tree_height = 1;
    debug!(
        "bootstrapped tree: root={} leaves=[{}, {}]",
        root_pid, left_pid, right_pid
    );
    Ok(())
}

fn insert_into_leaf<S: PageStore>(
    store: &mut S,
    pid: PageId,
    capacity: usize,
    key: i32,
    rid: RecordId,
) -> Result<InsertOutcome> {
    let mut leaf = LeafNode::read(store, pid, capacity)?;
    match leaf.insert(key, rid) {
        Ok(()) => {
            leaf.write(store, pid)?;
            Ok(InsertOutcome::Fit)
        }
        Err(Error::NodeFull) => {
            let sibling_pid = store.end_pid();
            let (sibling, separator) = leaf.insert_and_split(key, rid, sibling_pid)?;
            sibling.write(store, sibling_pid)?;
            leaf.write(store, pid)?;
            debug!(
                "leaf split: {} keeps {} entries, {} takes {} from key {}",
                pid,
                leaf.key_count(),
                sibling_pid,
                sibling.key_count(),
                separator
            );
            Ok(InsertOutcome::Split {
                separator,
                sibling: sibling_pid,
            })
        }
        Err(e) => Err(e),
    }
}

fn insert_into_internal<S: PageStore>(
    store: &mut S,
    pid: PageId,
    mut node: InternalNode,
    slot: usize,
    key: i32,
    child: PageId,
) -> Result<InsertOutcome> {
    match node.insert_after_child(slot, key, child) {
        Ok(()) => {
            node.write(store, pid)?;
            Ok(InsertOutcome::Fit)
        }
        Err(Error::NodeFull) => {
            let (sibling, mid_key) = node.insert_after_child_and_split(slot, key, child)?;
            let sibling_pid = store.end_pid();
            sibling.write(store, sibling_pid)?;
            node.write(store, pid)?;
            debug!(
                "internal split: {} keeps {} keys, {} takes {}, promoting {}",
                pid,
                node.key_count(),
                sibling_pid,
                sibling.key_count(),
                mid_key
            );
            Ok(InsertOutcome::Split {
                separator: mid_key,
                sibling: sibling_pid,
            })
        }
        Err(e) => Err(e),
    }
}

/// The old root split: put a new root above both halves.
fn grow_root<S: PageStore>(
    store: &mut S,
    meta: &mut IndexMeta,
    separator: i32,
    sibling: PageId,
) -> Result<()> {
    let mut root = InternalNode::new(meta.internal_capacity);
    root.initialize_root(meta.root_pid, separator, sibling);
    let root_pid = store.end_pid();
    root.write(store, root_pid)?;

    meta.root_pid = root_pid;
    meta.tree_height += 1;
    debug!(
        "root grew: new root={} height={}",
        root_pid, meta.tree_height
    );
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
