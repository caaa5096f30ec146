//! Tuple locator type.

use std::fmt;

use super::PageId;

/// Locates one tuple in a heap file.
///
/// The index stores record ids verbatim inside leaf entries and never
/// interprets them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordId {
    /// Heap page holding the tuple.
    pub page_id: PageId,
    /// Slot of the tuple within that page.
    pub slot: u32,
}

impl RecordId {
    /// Size of an encoded record id in bytes.
    pub const SIZE: usize = 8;

    /// Create a new RecordId.
    #[inline]
    pub fn new(page_id: PageId, slot: u32) -> Self {
        Self { page_id, slot }
    }

    /// Encode as `page_id | slot`, little-endian.
    pub fn to_le_bytes(self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[..4].copy_from_slice(&self.page_id.to_le_bytes());
        buf[4..].copy_from_slice(&self.slot.to_le_bytes());
        buf
    }

    /// Decode from the first eight bytes of `bytes`.
    ///
    /// # Panics
    /// Panics if `bytes.len() < 8`.
    pub fn from_le_slice(bytes: &[u8]) -> Self {
        Self {
            page_id: PageId::from_le_slice(&bytes[..4]),
            slot: u32::from_le_bytes([bytes[4], bytes[5], bytes[6], bytes[7]]),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Record({}, {})", self.page_id.0, self.slot)
    }
}
