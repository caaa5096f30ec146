//! Range-scan cursor and iterator.

use std::fmt;

use crate::common::{Error, PageId, RecordId, Result};
use crate::storage::PageStore;

use super::BTreeIndex;

/// Position of one leaf entry: the leaf's page id and the entry index in it.
///
/// A cursor is a passive reference. Any split or root growth after it was
/// issued may leave it pointing at the wrong entry; callers must not
/// interleave inserts with an in-flight scan.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IndexCursor {
    pub pid: PageId,
    pub eid: usize,
}

impl IndexCursor {
    pub fn new(pid: PageId, eid: usize) -> Self {
        Self { pid, eid }
    }

    /// True once the cursor has moved past the last entry of the last leaf.
    #[inline]
    pub fn is_end(&self) -> bool {
        !self.pid.is_valid()
    }
}

impl fmt::Display for IndexCursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Cursor({}, {})", self.pid, self.eid)
    }
}

/// Lazy ascending scan over `(key, RecordId)` pairs.
///
/// Created by [`BTreeIndex::scan_from`]. Each call to `next` reads one leaf
/// page. After the first error the scan yields nothing more.
pub struct RangeScan<'a, S: PageStore> {
    index: &'a BTreeIndex<S>,
    cursor: Option<IndexCursor>,
}

impl<'a, S: PageStore> RangeScan<'a, S> {
    pub(crate) fn new(index: &'a BTreeIndex<S>, cursor: Option<IndexCursor>) -> Self {
        Self { index, cursor }
    }

    /// The position the next item will be read from, if any.
    pub fn cursor(&self) -> Option<IndexCursor> {
        self.cursor.filter(|c| !c.is_end())
    }
}

impl<S: PageStore> Iterator for RangeScan<'_, S> {
    type Item = Result<(i32, RecordId)>;

    fn next(&mut self) -> Option<Self::Item> {
        let cursor = self.cursor.as_mut()?;
        if cursor.is_end() {
            self.cursor = None;
            return None;
        }

        match self.index.read_forward(cursor) {
            Ok(entry) => Some(Ok(entry)),
            Err(e) => {
                self.cursor = None;
                Some(Err(e))
            }
        }
    }
}

impl<S: PageStore> fmt::Debug for RangeScan<'_, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeScan").field("cursor", &self.cursor).finish()
    }
}

/// Map a `locate` result to the starting cursor of a scan.
pub(crate) fn scan_start(located: Result<IndexCursor>) -> Result<Option<IndexCursor>> {
    match located {
        Ok(cursor) => Ok(Some(cursor)),
        Err(Error::NoSuchRecord) => Ok(None),
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cursor_end() {
        assert!(!IndexCursor::new(PageId::new(2), 0).is_end());
        assert!(IndexCursor::new(PageId::INVALID, 0).is_end());
    }

    #[test]
    fn test_cursor_display() {
        let cursor = IndexCursor::new(PageId::new(4), 2);
        assert_eq!(format!("{}", cursor), "Cursor(Page(4), 2)");
    }

    #[test]
    fn test_scan_start() {
        let cursor = IndexCursor::new(PageId::new(1), 0);
        assert_eq!(scan_start(Ok(cursor)).unwrap(), Some(cursor));
        assert_eq!(scan_start(Err(Error::NoSuchRecord)).unwrap(), None);
        assert!(scan_start(Err(Error::PageNotFound(3))).is_err());
    }
}
