//! Bulk load of `key, value` lines into a table and, optionally, its index.
//!
//! A load file holds one tuple per line:
//! ```text
//! 2244, 'Die Hard'
//!   17,"Casablanca"
//! 300 , Goodfellas
//! ```
//! The key is an integer before the first comma. The value is the rest of
//! the line after leading blanks; when it starts with `'` or `"` it runs to
//! the matching quote.

use std::ffi::OsString;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, info};

use crate::common::{Error, Result};
use crate::heap::{RecordFile, TupleHeap};
use crate::index::btree::{BTreeIndex, OpenMode};
use crate::storage::PageStore;

/// Counts reported by a finished load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadSummary {
    /// Tuples appended to the heap.
    pub tuples: usize,
    /// Entries inserted into the index (zero when loading without one).
    pub indexed: usize,
}

/// Split one load-file line into its key and value.
///
/// # Errors
/// `Error::InvalidFileFormat` if there is no comma or the key is not an
/// `i32`.
pub fn parse_load_line(line: &str) -> Result<(i32, String)> {
    let invalid = || Error::InvalidFileFormat(line.to_string());

    let (key_text, rest) = line.split_once(',').ok_or_else(invalid)?;
    let key = key_text
        .trim_matches(is_blank)
        .parse::<i32>()
        .map_err(|_| invalid())?;

    let rest = rest.trim_start_matches(is_blank);
    let value = match rest.chars().next() {
        Some(quote @ ('\'' | '"')) => {
            let quoted = &rest[1..];
            match quoted.find(quote) {
                Some(end) => &quoted[..end],
                None => quoted,
            }
        }
        _ => rest,
    };

    Ok((key, value.to_string()))
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

/// Load every line of `reader` into `heap`, indexing each tuple when `index`
/// is given.
///
/// Blank lines are skipped. The first malformed line aborts the load; tuples
/// before it stay loaded.
pub fn load_into<R, H, S>(
    reader: R,
    heap: &mut H,
    mut index: Option<&mut BTreeIndex<S>>,
) -> Result<LoadSummary>
where
    R: BufRead,
    H: TupleHeap,
    S: PageStore,
{
    let mut summary = LoadSummary::default();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim_end_matches('\r');
        if line.trim_matches(is_blank).is_empty() {
            continue;
        }

        let (key, value) = parse_load_line(line)?;
        let rid = heap.append(key, &value)?;
        summary.tuples += 1;

        if let Some(index) = index.as_deref_mut() {
            index.insert(key, rid)?;
            summary.indexed += 1;
        }
    }

    Ok(summary)
}

/// Load `load_file` into `<table>.tbl`, and into `<table>.idx` when
/// `with_index` is set.
///
/// Both files are created if missing; existing files are appended to.
/// Both are closed even when the load fails part way, so the index header
/// always covers the tuples already in the table. The first error wins.
pub fn load<T, P>(table: T, load_file: P, with_index: bool) -> Result<LoadSummary>
where
    T: AsRef<Path>,
    P: AsRef<Path>,
{
    let table = table.as_ref();
    let reader = BufReader::new(File::open(load_file.as_ref())?);
    let mut heap = RecordFile::open(table_file(table, "tbl"), OpenMode::Write)?;

    let loaded = if with_index {
        match BTreeIndex::open(table_file(table, "idx"), OpenMode::Write) {
            Ok(mut index) => {
                let loaded = load_into(reader, &mut heap, Some(&mut index));
                let closed = index.close();
                loaded.and_then(|summary| closed.map(|()| summary))
            }
            Err(e) => Err(e),
        }
    } else {
        load_into::<_, _, crate::storage::DiskManager>(reader, &mut heap, None)
    };
    let closed = heap.close();
    let summary = loaded?;
    closed?;

    info!(
        "loaded {} tuples into {} ({} indexed)",
        summary.tuples,
        table.display(),
        summary.indexed
    );
    Ok(summary)
}

/// `<table>.<ext>`, keeping any dots already in the table name.
pub fn table_file(table: &Path, ext: &str) -> PathBuf {
    let mut name = OsString::from(table.as_os_str());
    name.push(".");
    name.push(ext);
    debug!("table file {:?}", name);
    PathBuf::from(name)
}
