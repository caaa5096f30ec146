//! pagetree - a disk-resident B+tree index over `i32` keys.
//!
//! # Architecture
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                           pagetree                              │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │                Loader (loader.rs)                        │   │
//! │  │        load file → RecordFile (+ BTreeIndex)             │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! │                 ↓                           ↓                   │
//! │  ┌──────────────────────────┐  ┌──────────────────────────┐    │
//! │  │  Index Layer (index/)    │  │  Heap Layer (heap/)      │    │
//! │  │  BTreeIndex              │  │  RecordFile              │    │
//! │  │  LeafNode, InternalNode  │  │  (key, value) slots      │    │
//! │  │  IndexCursor, RangeScan  │  │  addressed by RecordId   │    │
//! │  └──────────────────────────┘  └──────────────────────────┘    │
//! │                 ↓                           ↓                   │
//! │  ┌─────────────────────────────────────────────────────────┐   │
//! │  │           Storage Layer (storage/)                       │   │
//! │  │   PageStore: DiskManager | InMemoryPageStore             │   │
//! │  │   Page + PageHeader (type, CRC32 checksum)               │   │
//! │  └─────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//! - [`common`] - Shared primitives (PageId, RecordId, Error, config)
//! - [`storage`] - Page stores and page formats
//! - [`index`] - The B+tree index
//! - [`heap`] - Tuple storage the index points into
//! - [`loader`] - Bulk load from `key, value` text files
//!
//! # Quick Start
//! ```no_run
//! use pagetree::{BTreeIndex, OpenMode, PageId, RecordId};
//!
//! let mut index = BTreeIndex::open("movie.idx", OpenMode::Write)?;
//! index.insert(42, RecordId::new(PageId::new(0), 3))?;
//!
//! let mut cursor = index.locate(40)?;
//! let (key, rid) = index.read_forward(&mut cursor)?;
//! assert_eq!((key, rid.slot), (42, 3));
//!
//! index.close()?;
//! # Ok::<(), pagetree::Error>(())
//! ```

pub mod common;
pub mod heap;
pub mod index;
pub mod loader;
pub mod storage;

// Re-export commonly used items at crate root for convenience
pub use common::config::{IndexOptions, PAGE_SIZE};
pub use common::{Error, PageId, RecordId, Result};

pub use heap::{RecordFile, TupleHeap};
pub use index::btree::{BTreeIndex, IndexCursor, InternalNode, LeafNode, OpenMode, RangeScan};
pub use storage::page::{Page, PageHeader, PageType};
pub use storage::{DiskManager, InMemoryPageStore, PageStore};
