//! Package `sift` implement a full-text search library built around an
//! immutable, segmented, log-structured inverted index.
//!
//! Documents are applied in [batches][index::Batch]. Each batch is analyzed
//! into an in-memory [segment][codec::Segment] and introduced into the index
//! as a new [snapshot][index::Snapshot], identified by a monotonically
//! increasing `epoch`. Segments are immutable once built; deletions are
//! expressed as per-segment bitmaps carried by the snapshot. Background
//! workers persist snapshots to a [directory][directory::Directory] and merge
//! small segments into larger ones, obsoleting their inputs.
//!
//! Readers never block writers. A [reader][index::IndexReader] holds a
//! reference-counted snapshot and composes per-segment term dictionaries,
//! postings and document values into [searchers][search::Searcher], scored
//! by BM25 and collected into top-N results with optional
//! [aggregations][search::aggregations].
//!
//! **Epochs and retention**. Every introduction, merge and persist rotates
//! the root snapshot with a strictly greater epoch. Older epochs remain on
//! disk until the [deletion policy][index::KeepNLatest] marks them deletable
//! and no live reader holds a reference to them.

#![allow(clippy::len_without_is_empty)]

use std::{error, fmt, result};

/// Type alias for Result return type, used by this package.
pub type Result<T> = result::Result<T, Error>;

/// Error variants that can be returned by this package's API.
///
/// Each variant carries a prefix, typically identifying the error location,
/// and a message describing the error.
pub enum Error {
    Fatal(String, String),
    FailConvert(String, String),
    FailCbor(String, String),
    IOError(String, String),
    IPCFail(String, String),
    ThreadFail(String, String),
    InvalidFile(String, String),
    InvalidInput(String, String),
    KeyNotFound(String, String),
    /// Another writer holds the exclusive lock on the directory.
    DirectoryLocked(String, String),
    /// Snapshot file failed checksum/version validation.
    SnapshotCorrupt(String, String),
    /// A segment referenced by a snapshot is absent from the directory.
    SegmentMissing(String, String),
    /// Automaton expansion exceeded the configured clause limit.
    QueryTooBroad(String, String),
    /// Search was canceled, timed out, or rejected by the start hook.
    SearchAborted(String, String),
    /// Operation attempted on a closed or failed writer.
    WriterClosed(String, String),
    /// Batch exceeded the configured resource bound.
    BatchTooLarge(String, String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        use Error::*;

        match self {
            Fatal(p, m) => write!(f, "{} Fatal: {}", p, m),
            FailConvert(p, m) => write!(f, "{} FailConvert: {}", p, m),
            FailCbor(p, m) => write!(f, "{} FailCbor: {}", p, m),
            IOError(p, m) => write!(f, "{} IOError: {}", p, m),
            IPCFail(p, m) => write!(f, "{} IPCFail: {}", p, m),
            ThreadFail(p, m) => write!(f, "{} ThreadFail: {}", p, m),
            InvalidFile(p, m) => write!(f, "{} InvalidFile: {}", p, m),
            InvalidInput(p, m) => write!(f, "{} InvalidInput: {}", p, m),
            KeyNotFound(p, m) => write!(f, "{} KeyNotFound: {}", p, m),
            DirectoryLocked(p, m) => write!(f, "{} DirectoryLocked: {}", p, m),
            SnapshotCorrupt(p, m) => write!(f, "{} SnapshotCorrupt: {}", p, m),
            SegmentMissing(p, m) => write!(f, "{} SegmentMissing: {}", p, m),
            QueryTooBroad(p, m) => write!(f, "{} QueryTooBroad: {}", p, m),
            SearchAborted(p, m) => write!(f, "{} SearchAborted: {}", p, m),
            WriterClosed(p, m) => write!(f, "{} WriterClosed: {}", p, m),
            BatchTooLarge(p, m) => write!(f, "{} BatchTooLarge: {}", p, m),
        }
    }
}

impl fmt::Debug for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> result::Result<(), fmt::Error> {
        write!(f, "{}", self)
    }
}

impl error::Error for Error {}

impl Error {
    /// Return true if this error maps to the same variant as `other`,
    /// ignoring the location prefix and message.
    pub fn is_kind(&self, other: &Error) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

/// Macro to construct [Error] values annotated with the call-site.
///
/// Can be used in three forms,
///
/// ```ignore
/// err_at!(IOError, msg: "failure {}", reason);      // create a new error
/// err_at!(IOError, fd.sync_all());                  // wrap a foreign error
/// err_at!(IOError, fd.sync_all(), "at {:?}", loc);  // wrap, with context
/// ```
#[macro_export]
macro_rules! err_at {
    ($v:ident, msg: $($arg:expr),+) => {{
        let prefix = format!("{}:{}", file!(), line!());
        Err(Error::$v(prefix, format!($($arg),+)))
    }};
    ($v:ident, $e:expr) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                Err(Error::$v(prefix, format!("{}", err)))
            }
        }
    }};
    ($v:ident, $e:expr, $($arg:expr),+) => {{
        match $e {
            Ok(val) => Ok(val),
            Err(err) => {
                let prefix = format!("{}:{}", file!(), line!());
                let msg = format!($($arg),+);
                Err(Error::$v(prefix, format!("{} {}", err, msg)))
            }
        }
    }};
}

#[macro_use]
pub mod util;

pub mod analysis;
pub mod bitmap;
pub mod codec;
pub mod directory;
pub mod doc;
pub mod index;
pub mod query;
pub mod search;

pub use crate::index::{Batch, Config, IndexReader, Writer};
pub use crate::query::Query;
