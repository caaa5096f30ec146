//! B+tree index implementation.
//!
//! # Components
//! - [`LeafNode`] - leaf page codec: sorted (key, RecordId) entries and a
//!   sibling pointer
//! - [`InternalNode`] - internal page codec: separator keys and child pointers
//! - [`BTreeIndex`] - the coordinator: descent, split propagation, root growth
//! - [`IndexCursor`] / [`RangeScan`] - forward range scans over the leaf chain

mod cursor;
mod internal_node;
mod leaf_node;
mod meta;
mod tree;

pub use cursor::{IndexCursor, RangeScan};
pub use internal_node::InternalNode;
pub use leaf_node::{LeafEntry, LeafNode};
pub use meta::IndexMeta;
pub use tree::{BTreeIndex, OpenMode};
