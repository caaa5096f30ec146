//! Error types for pagetree.

use thiserror::Error;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write `Result<T>`.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in pagetree.
///
/// Node-level kinds (`NodeFull`, `InvalidCursor`, `NoSuchRecord`) are returned
/// to the immediate caller without local recovery. Storage errors are
/// propagated verbatim.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from disk operations.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Requested page does not exist in the page store.
    #[error("Page {0} not found")]
    PageNotFound(u32),

    /// The node is at capacity.
    ///
    /// This is the expected trigger for a split and never leaves
    /// [`BTreeIndex::insert`](crate::index::btree::BTreeIndex::insert).
    #[error("Node is full")]
    NodeFull,

    /// Entry index outside `[0, count)`, or an operation on an empty node.
    #[error("Invalid cursor")]
    InvalidCursor,

    /// No entry with a key greater than or equal to the search key.
    #[error("No such record")]
    NoSuchRecord,

    /// Stored page checksum does not match its contents.
    #[error("Checksum mismatch on page {0}")]
    ChecksumMismatch(u32),

    /// Page header carries a different page type than the reader expected.
    #[error("Page {page_id} is a {found} page, expected {expected}")]
    UnexpectedPageType {
        page_id: u32,
        expected: crate::storage::page::PageType,
        found: crate::storage::page::PageType,
    },

    /// Mutation attempted on a handle opened for reading.
    #[error("Index or file is opened read-only")]
    ReadOnly,

    /// Node capacity outside what a page can hold.
    #[error("Invalid capacity {capacity}: must be between 2 and {max}")]
    InvalidCapacity { capacity: usize, max: usize },

    /// Tuple value does not fit in a record slot.
    #[error("Value of {0} bytes does not fit in a record slot")]
    ValueTooLarge(usize),

    /// Malformed line in a load file.
    #[error("Invalid load file format: {0:?}")]
    InvalidFileFormat(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::PageNotFound(42);
        assert_eq!(format!("{}", err), "Page 42 not found");

        assert_eq!(format!("{}", Error::NodeFull), "Node is full");
        assert_eq!(format!("{}", Error::NoSuchRecord), "No such record");

        let err = Error::UnexpectedPageType {
            page_id: 3,
            expected: crate::storage::page::PageType::BTreeLeaf,
            found: crate::storage::page::PageType::Heap,
        };
        assert_eq!(err.to_string(), "Page 3 is a heap page, expected leaf");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();

        match err {
            Error::Io(_) => {} // Success
            _ => panic!("Expected Io error"),
        }
    }

    #[test]
    fn test_io_error_has_source() {
        use std::error::Error as _;

        let io_err = std::io::Error::new(std::io::ErrorKind::Other, "disk on fire");
        let err = Error::from(io_err);
        assert!(err.source().is_some());
        assert!(Error::InvalidCursor.source().is_none());
    }
}
