//! Tuple heap - where indexed records actually live.
//!
//! The index only stores [`RecordId`]s; the heap hands them out on append and
//! resolves them on read.

mod record_file;

pub use record_file::{RecordFile, MAX_VALUE_LEN};

use crate::common::{RecordId, Result};

/// Storage for `(key, value)` tuples addressed by [`RecordId`].
pub trait TupleHeap {
    /// Store a tuple and return its locator.
    fn append(&mut self, key: i32, value: &str) -> Result<RecordId>;

    /// Fetch the tuple at `rid`.
    ///
    /// # Errors
    /// `Error::NoSuchRecord` if nothing was stored at `rid`.
    fn read(&mut self, rid: RecordId) -> Result<(i32, String)>;
}
