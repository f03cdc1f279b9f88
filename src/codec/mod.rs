//! Module `codec` define the segment contract and ship the default
//! disk format.
//!
//! A segment is an immutable unit of indexed data with dense local document
//! numbers in `[0, count)`. Two instances exist: the in-memory
//! [MemSegment][mem::MemSegment] produced by batch analysis and merging, and
//! the mmap/heap backed [disk segment][disk::DiskSegment] produced by sealing
//! a memory segment through a [Codec]. Both serve the same [Segment] trait;
//! nothing above this module distinguishes them.
//!
//! The codec itself is pluggable: given segment bytes produce a reader,
//! given a memory segment produce bytes, deterministically.

use std::sync::Arc;

use crate::{directory::Data, Error, Result};

pub mod disk;
pub mod mem;

/// Object-safe finite-state automaton over byte-strings, used to intersect
/// term dictionaries. States are opaque `u32` values.
pub trait Automaton: Send + Sync {
    fn start(&self) -> u32;
    fn is_match(&self, state: u32) -> bool;
    fn can_match(&self, state: u32) -> bool;
    fn accept(&self, state: u32, byte: u8) -> u32;

    /// Run the automaton over a full term.
    fn matches(&self, term: &[u8]) -> bool {
        let mut state = self.start();
        for byte in term.iter() {
            if !self.can_match(state) {
                return false;
            }
            state = self.accept(state, *byte);
        }
        self.is_match(state)
    }
}

/// What a postings cursor should decode. Skipping unwanted payloads keeps
/// iteration cheap.
#[derive(Clone, Copy, Debug, Default)]
pub struct PostingOptions {
    pub freq: bool,
    pub norm: bool,
    pub locations: bool,
}

impl PostingOptions {
    pub fn all() -> PostingOptions {
        PostingOptions {
            freq: true,
            norm: true,
            locations: true,
        }
    }

    pub fn scoring() -> PostingOptions {
        PostingOptions {
            freq: true,
            norm: true,
            locations: false,
        }
    }
}

/// Token location within a document, for one posting.
#[derive(Clone, Debug, PartialEq)]
pub struct Location {
    pub field: String,
    /// 1-based token position, the running sum of position increments.
    pub pos: u32,
    pub start: u32,
    pub end: u32,
}

/// One `(doc, freq, norm, locations)` entry of a postings list. At the
/// segment level `doc` is local; the snapshot composition rebases it to the
/// global number space.
#[derive(Clone, Debug, Default)]
pub struct Posting {
    pub doc: u64,
    pub freq: u32,
    /// Raw bits of `f32(field length in tokens)`.
    pub norm: u32,
    pub locations: Vec<Location>,
}

impl Posting {
    /// Field length in tokens, decoded from the norm bits.
    pub fn field_length(&self) -> f64 {
        f32::from_bits(self.norm) as f64
    }
}

/// Ordered traversal of postings for one `(field, term)`.
pub trait PostingsCursor: Send {
    fn next(&mut self) -> Result<Option<Posting>>;

    /// Skip forward to the first posting with `doc >= target`.
    fn advance(&mut self, target: u64) -> Result<Option<Posting>>;

    /// Upper-bound of postings remaining, a cost estimate.
    fn count(&self) -> u64;
}

/// An empty postings list.
pub struct EmptyPostings;

impl PostingsCursor for EmptyPostings {
    fn next(&mut self) -> Result<Option<Posting>> {
        Ok(None)
    }

    fn advance(&mut self, _target: u64) -> Result<Option<Posting>> {
        Ok(None)
    }

    fn count(&self) -> u64 {
        0
    }
}

/// One term of a field dictionary, with the number of documents carrying it
/// in the segment.
#[derive(Clone, Debug, PartialEq)]
pub struct DictEntry {
    pub term: Vec<u8>,
    pub doc_count: u64,
}

/// Lazy ordered traversal of a field's terms.
pub trait DictCursor: Send {
    fn next(&mut self) -> Result<Option<DictEntry>>;
}

/// Per-field collection statistics used by similarity scoring.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct FieldStats {
    /// Number of documents carrying the field.
    pub doc_count: u64,
    /// Total analyzed token count across those documents.
    pub sum_length: u64,
}

impl FieldStats {
    pub fn merge(&mut self, other: &FieldStats) {
        self.doc_count += other.doc_count;
        self.sum_length += other.sum_length;
    }
}

/// The segment reader contract. Implementations must be cheap to share
/// across threads; cursors own whatever they need to outlive the borrow.
pub trait Segment: Send + Sync {
    /// Number of documents in the segment, including deleted ones. Deletions
    /// live in the enclosing snapshot, not here.
    fn count(&self) -> u64;

    /// Sorted field names present in this segment.
    fn fields(&self) -> Vec<String>;

    fn field_stats(&self, field: &str) -> Option<FieldStats>;

    /// Number of documents carrying `(field, term)`.
    fn doc_frequency(&self, field: &str, term: &[u8]) -> Result<u64>;

    /// Ordered terms of `field` within `[start, end)`, intersected with the
    /// automaton when one is given.
    fn dictionary(
        &self,
        field: &str,
        automaton: Option<Arc<dyn Automaton>>,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<Box<dyn DictCursor>>;

    fn postings(
        &self,
        field: &str,
        term: &[u8],
        opts: PostingOptions,
    ) -> Result<Box<dyn PostingsCursor>>;

    /// Visit stored `(field, value)` pairs of a document, in field order.
    /// Stop early when the visitor returns false.
    fn visit_stored(
        &self,
        local: u64,
        visit: &mut dyn FnMut(&str, &[u8]) -> bool,
    ) -> Result<()>;

    /// Visit doc-values of a document for the requested fields.
    fn visit_doc_values(
        &self,
        local: u64,
        fields: &[String],
        visit: &mut dyn FnMut(&str, &[u8]),
    ) -> Result<()>;
}

/// Segment codec contract: seal a memory segment into bytes, open bytes
/// into a reader.
pub trait Codec: Send + Sync {
    fn name(&self) -> &'static str;
    fn version(&self) -> u32;

    fn seal(&self, segment: &mem::MemSegment) -> Result<Vec<u8>>;
    fn open(&self, data: Data, id: u64) -> Result<Arc<dyn Segment>>;
}

/// Resolve a codec by `(name, version)`.
pub fn resolve(name: &str, version: u32) -> Result<Arc<dyn Codec>> {
    match (name, version) {
        (disk::CODEC_NAME, disk::CODEC_VERSION) => Ok(Arc::new(disk::DiskCodec)),
        (name, version) => {
            err_at!(InvalidInput, msg: "no codec for {}/{}", name, version)
        }
    }
}
