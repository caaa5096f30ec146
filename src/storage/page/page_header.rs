//! Page header and type definitions.
//!
//! Every page written by pagetree starts with a [`PageHeader`]: the kind of
//! page and a CRC32 of its contents. Readers check both before decoding.

use std::fmt;

/// What a page holds.
///
/// Stored as one byte at offset 0. A zeroed page reads as `Invalid`, so a
/// page that was never sealed is never mistaken for a node.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum PageType {
    #[default]
    Invalid = 0,
    /// Index header, page 0 of an index file.
    Meta = 1,
    /// B+tree internal node.
    BTreeInternal = 2,
    /// B+tree leaf node.
    BTreeLeaf = 3,
    /// Tuple heap page.
    Heap = 4,
}

impl From<u8> for PageType {
    /// Unknown tags decode as `Invalid`.
    fn from(tag: u8) -> Self {
        match tag {
            1 => PageType::Meta,
            2 => PageType::BTreeInternal,
            3 => PageType::BTreeLeaf,
            4 => PageType::Heap,
            _ => PageType::Invalid,
        }
    }
}

impl fmt::Display for PageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            PageType::Invalid => "invalid",
            PageType::Meta => "meta",
            PageType::BTreeInternal => "internal",
            PageType::BTreeLeaf => "leaf",
            PageType::Heap => "heap",
        };
        f.write_str(name)
    }
}

/// Metadata at the start of every page.
///
/// # Layout (13 bytes)
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       1     page_type (PageType as u8)
/// 1       4     checksum (CRC32, little-endian)
/// 5       8     reserved, written as zero
/// ```
///
/// The checksum covers the whole page with bytes 1..5 read as zero.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PageHeader {
    pub page_type: PageType,
    pub checksum: u32,
}

impl PageHeader {
    /// Size of the header in bytes.
    pub const SIZE: usize = 13;

    pub const OFFSET_PAGE_TYPE: usize = 0;
    pub const OFFSET_CHECKSUM: usize = 1;
    const OFFSET_RESERVED: usize = 5;

    /// Header for a page of `page_type` whose checksum is not yet computed.
    pub fn new(page_type: PageType) -> Self {
        Self {
            page_type,
            checksum: 0,
        }
    }

    /// Decode the header at the start of `data`.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn from_bytes(data: &[u8]) -> Self {
        assert!(data.len() >= Self::SIZE, "page too small for header");

        let c = Self::OFFSET_CHECKSUM;
        Self {
            page_type: PageType::from(data[Self::OFFSET_PAGE_TYPE]),
            checksum: u32::from_le_bytes([data[c], data[c + 1], data[c + 2], data[c + 3]]),
        }
    }

    /// Encode the header at the start of `data`, zeroing the reserved bytes.
    ///
    /// # Panics
    /// Panics if `data.len() < PageHeader::SIZE`.
    pub fn write_to(&self, data: &mut [u8]) {
        assert!(data.len() >= Self::SIZE, "page too small for header");

        data[Self::OFFSET_PAGE_TYPE] = self.page_type as u8;
        data[Self::OFFSET_CHECKSUM..Self::OFFSET_RESERVED]
            .copy_from_slice(&self.checksum.to_le_bytes());
        data[Self::OFFSET_RESERVED..Self::SIZE].fill(0);
    }

    /// CRC32 of `page_data` with the checksum field read as zero.
    pub fn compute_checksum(page_data: &[u8]) -> u32 {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&page_data[..Self::OFFSET_CHECKSUM]);
        hasher.update(&[0u8; 4]);
        hasher.update(&page_data[Self::OFFSET_RESERVED..]);
        hasher.finalize()
    }

    /// Whether the stored checksum matches `page_data`.
    pub fn verify_checksum(&self, page_data: &[u8]) -> bool {
        self.checksum == Self::compute_checksum(page_data)
    }
}

// ============================================================================
// TESTS
// ============================================================================
