//! Snapshots: immutable observations of the index.
//!
//! A snapshot is an ordered list of `(segment, deleted-bitmap, id)` plus its
//! epoch and a running offset table assigning every segment its first global
//! document number. Readers hold a snapshot alive by reference count; the
//! write pipeline replaces the root snapshot, never mutates one.

use log::warn;

use std::{
    cmp,
    collections::BinaryHeap,
    convert::TryInto,
    sync::{atomic::AtomicBool, atomic::Ordering::SeqCst, Arc},
};

use crate::{
    bitmap::DeleteBitmap,
    codec::{
        mem::MemSegment, Automaton, Codec, DictCursor, DictEntry, FieldStats, Posting,
        PostingOptions, PostingsCursor, Segment,
    },
    directory::{Data, Directory, Kind},
    doc::ID_FIELD,
    Error, Result,
};

const SNAPSHOT_MAGIC: u32 = 0x5346_534e;
const SNAPSHOT_VERSION: u32 = 1;

/// One segment of a snapshot: the immutable segment, its identity and the
/// deletions visible at this epoch.
#[derive(Clone)]
pub struct SegmentSnapshot {
    pub(crate) id: u64,
    /// Kept until the segment is persisted; the persister seals it.
    pub(crate) mem: Option<Arc<MemSegment>>,
    pub(crate) segment: Arc<dyn Segment>,
    pub(crate) deleted: Option<DeleteBitmap>,
}

impl SegmentSnapshot {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn deleted(&self) -> Option<&DeleteBitmap> {
        self.deleted.as_ref()
    }

    pub(crate) fn count(&self) -> u64 {
        self.segment.count()
    }

    pub(crate) fn live_count(&self) -> u64 {
        let deleted = self.deleted.as_ref().map(|d| d.cardinality()).unwrap_or(0);
        self.segment.count() - deleted
    }

    pub(crate) fn is_deleted(&self, local: u64) -> bool {
        match &self.deleted {
            Some(bitmap) => bitmap.contains(local as u32),
            None => false,
        }
    }
}

/// Immutable observation of the whole index at one epoch.
pub struct Snapshot {
    pub(crate) epoch: u64,
    pub(crate) segments: Vec<SegmentSnapshot>,
    /// `offsets[i]` is the first global doc number of segment `i`; the last
    /// entry is the total (deleted included).
    pub(crate) offsets: Vec<u64>,
}

impl Snapshot {
    pub(crate) fn new(epoch: u64, segments: Vec<SegmentSnapshot>) -> Snapshot {
        let mut offsets = Vec::with_capacity(segments.len() + 1);
        let mut off = 0_u64;
        for seg in segments.iter() {
            offsets.push(off);
            off += seg.count();
        }
        offsets.push(off);

        Snapshot {
            epoch,
            segments,
            offsets,
        }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn segments(&self) -> &[SegmentSnapshot] {
        &self.segments
    }

    /// Live document count across segments.
    pub fn count(&self) -> u64 {
        self.segments.iter().map(|s| s.live_count()).sum()
    }

    /// Resolve a global doc number to `(segment-index, local)`.
    pub(crate) fn segment_of(&self, global: u64) -> Result<(usize, u64)> {
        if global >= *self.offsets.last().unwrap() {
            return err_at!(InvalidInput, msg: "doc {} out of bounds", global);
        }
        let idx = match self.offsets.binary_search(&global) {
            Ok(idx) => idx,
            Err(idx) => idx - 1,
        };
        Ok((idx, global - self.offsets[idx]))
    }

    /// Sorted union of fields across segments.
    pub fn fields(&self) -> Vec<String> {
        let mut fields: Vec<String> = vec![];
        for seg in self.segments.iter() {
            for field in seg.segment.fields().into_iter() {
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
        }
        fields.sort();
        fields
    }

    pub(crate) fn field_stats(&self, field: &str) -> FieldStats {
        let mut stats = FieldStats::default();
        for seg in self.segments.iter() {
            if let Some(s) = seg.segment.field_stats(field) {
                stats.merge(&s);
            }
        }
        stats
    }

    pub(crate) fn doc_frequency(&self, field: &str, term: &[u8]) -> Result<u64> {
        let mut df = 0;
        for seg in self.segments.iter() {
            df += seg.segment.doc_frequency(field, term)?;
        }
        Ok(df)
    }

    /// Serialize the snapshot descriptor: segment ids and deleted bitmaps,
    /// checksummed. Segment payloads live in their own files.
    pub(crate) fn encode_file(&self) -> Vec<u8> {
        let mut body = vec![];
        body.extend_from_slice(&self.epoch.to_be_bytes());
        body.extend_from_slice(&(self.segments.len() as u32).to_be_bytes());
        for seg in self.segments.iter() {
            body.extend_from_slice(&seg.id.to_be_bytes());
            let bitmap = match &seg.deleted {
                Some(bitmap) => bitmap.to_bytes(),
                None => vec![],
            };
            body.extend_from_slice(&(bitmap.len() as u32).to_be_bytes());
            body.extend_from_slice(&bitmap);
        }

        let crc = {
            let mut hasher = crc32fast::Hasher::new();
            hasher.update(&body);
            hasher.finalize()
        };

        let mut buf = vec![];
        buf.extend_from_slice(&SNAPSHOT_MAGIC.to_be_bytes());
        buf.extend_from_slice(&SNAPSHOT_VERSION.to_be_bytes());
        buf.extend_from_slice(&crc.to_be_bytes());
        buf.extend_from_slice(&body);
        buf
    }
}

/// Decoded form of a snapshot descriptor file.
pub struct SnapshotFile {
    pub epoch: u64,
    pub segments: Vec<(u64, Option<DeleteBitmap>)>,
}

impl SnapshotFile {
    /// Decode and validate a snapshot descriptor. Partially written or
    /// corrupted files fail with `SnapshotCorrupt`.
    pub fn decode(data: &[u8]) -> Result<SnapshotFile> {
        if data.len() < 12 {
            return err_at!(SnapshotCorrupt, msg: "short file {}", data.len());
        }
        let magic = u32::from_be_bytes(data[0..4].try_into().unwrap());
        if magic != SNAPSHOT_MAGIC {
            return err_at!(SnapshotCorrupt, msg: "bad magic {:x}", magic);
        }
        let version = u32::from_be_bytes(data[4..8].try_into().unwrap());
        if version != SNAPSHOT_VERSION {
            return err_at!(SnapshotCorrupt, msg: "bad version {}", version);
        }
        let crc = u32::from_be_bytes(data[8..12].try_into().unwrap());
        let body = &data[12..];
        let computed = {
            let mut hasher = crc32fast::Hasher::new();
            hasher.update(body);
            hasher.finalize()
        };
        if crc != computed {
            return err_at!(SnapshotCorrupt, msg: "checksum {:x}/{:x}", crc, computed);
        }

        check_remaining!(body, 12, "snapshot header")?;
        let epoch = u64::from_be_bytes(body[0..8].try_into().unwrap());
        let count = u32::from_be_bytes(body[8..12].try_into().unwrap()) as usize;

        let mut segments = vec![];
        let mut off = 12_usize;
        for _ in 0..count {
            check_remaining!(&body[off..], 12, "snapshot segment")?;
            let id = u64::from_be_bytes(body[off..off + 8].try_into().unwrap());
            let len = u32::from_be_bytes(body[off + 8..off + 12].try_into().unwrap()) as usize;
            off += 12;
            check_remaining!(&body[off..], len, "snapshot bitmap")?;
            let deleted = match len {
                0 => None,
                _ => Some(DeleteBitmap::from_bytes(&body[off..off + len])),
            };
            off += len;
            segments.push((id, deleted));
        }

        Ok(SnapshotFile { epoch, segments })
    }
}

/// Open the snapshot with the given epoch from a directory, materializing
/// its segments through the codec.
pub(crate) fn load_snapshot(
    directory: &dyn Directory,
    codec: &dyn Codec,
    epoch: u64,
) -> Result<Snapshot> {
    let data = directory.load(Kind::Snapshot, epoch)?;
    let file = SnapshotFile::decode(data.as_slice())?;

    let mut segments = vec![];
    for (id, deleted) in file.segments.into_iter() {
        let seg_data = directory.load(Kind::Segment, id)?;
        let segment = codec.open(seg_data, id)?;
        segments.push(SegmentSnapshot {
            id,
            mem: None,
            segment,
            deleted,
        });
    }

    Ok(Snapshot::new(file.epoch, segments))
}

/// Open the latest valid snapshot, falling back to older epochs past
/// corrupted descriptors. Returns an empty snapshot when none exists.
pub(crate) fn load_latest_snapshot(
    directory: &dyn Directory,
    codec: &dyn Codec,
) -> Result<Snapshot> {
    let mut epochs = directory.list(Kind::Snapshot)?;
    epochs.reverse();

    for epoch in epochs.into_iter() {
        match load_snapshot(directory, codec, epoch) {
            Ok(snapshot) => return Ok(snapshot),
            Err(err @ Error::SnapshotCorrupt(_, _)) => {
                warn!(target: "index", "snapshot {} corrupt, falling back: {}", epoch, err);
            }
            Err(err) => return Err(err),
        }
    }

    Ok(Snapshot::new(0, vec![]))
}

/// A reader over one refcounted snapshot. All operations see exactly the
/// epoch captured at creation; concurrent writes never disturb it.
pub struct IndexReader {
    pub(crate) snapshot: Arc<Snapshot>,
    pub(crate) directory: Arc<dyn Directory>,
    pub(crate) codec: Arc<dyn Codec>,
    pub(crate) config: crate::index::Config,
}

impl Clone for IndexReader {
    fn clone(&self) -> IndexReader {
        IndexReader {
            snapshot: Arc::clone(&self.snapshot),
            directory: Arc::clone(&self.directory),
            codec: Arc::clone(&self.codec),
            config: self.config.clone(),
        }
    }
}

impl IndexReader {
    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    pub fn epoch(&self) -> u64 {
        self.snapshot.epoch
    }

    /// Live document count.
    pub fn count(&self) -> Result<u64> {
        Ok(self.snapshot.count())
    }

    /// Sorted union of fields across segments.
    pub fn fields(&self) -> Result<Vec<String>> {
        Ok(self.snapshot.fields())
    }

    pub fn config(&self) -> &crate::index::Config {
        &self.config
    }

    /// Visit stored `(field, value)` pairs of a live document.
    pub fn visit_stored_fields(
        &self,
        global: u64,
        visit: &mut dyn FnMut(&str, &[u8]) -> bool,
    ) -> Result<()> {
        let (idx, local) = self.snapshot.segment_of(global)?;
        let seg = &self.snapshot.segments[idx];
        if seg.is_deleted(local) {
            return err_at!(KeyNotFound, msg: "doc {} deleted", global);
        }
        seg.segment.visit_stored(local, visit)
    }

    /// Lazy ordered union of matching terms across segments, with per-term
    /// document counts summed.
    pub fn dictionary_iterator(
        &self,
        field: &str,
        automaton: Option<Arc<dyn Automaton>>,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<Box<dyn DictCursor>> {
        let mut cursors = vec![];
        for seg in self.snapshot.segments.iter() {
            cursors.push(
                seg.segment
                    .dictionary(field, automaton.clone(), start, end)?,
            );
        }
        SnapshotDictCursor::new(cursors).map(|c| Box::new(c) as Box<dyn DictCursor>)
    }

    /// Postings for `(field, term)` across all segments, rebased to global
    /// doc numbers, deleted documents skipped. A `None` term enumerates all
    /// live documents.
    pub fn postings_iterator(
        &self,
        field: &str,
        term: Option<&[u8]>,
        opts: PostingOptions,
    ) -> Result<Box<dyn PostingsCursor>> {
        match term {
            Some(term) => {
                let mut cursors = vec![];
                for seg in self.snapshot.segments.iter() {
                    cursors.push(seg.segment.postings(field, term, opts)?);
                }
                Ok(Box::new(SnapshotPostingsCursor {
                    snapshot: Arc::clone(&self.snapshot),
                    cursors,
                    cur: 0,
                }))
            }
            None => Ok(Box::new(AllDocsCursor {
                snapshot: Arc::clone(&self.snapshot),
                seg: 0,
                local: 0,
            })),
        }
    }

    /// Reader for columnar doc-values covering `fields`.
    pub fn doc_values_reader(&self, fields: &[String]) -> DocumentValueReader {
        DocumentValueReader {
            snapshot: Arc::clone(&self.snapshot),
            fields: fields.to_vec(),
        }
    }

    /// Global doc number of the live document carrying `id`, if any.
    pub fn doc_number(&self, id: &[u8]) -> Result<Option<u64>> {
        let mut cursor =
            self.postings_iterator(ID_FIELD, Some(id), PostingOptions::default())?;
        Ok(cursor.next()?.map(|p| p.doc))
    }

    /// Copy this snapshot into `dest`, producing a self-contained index.
    /// Cancellation is polled between items.
    pub fn backup(&self, dest: &dyn Directory, cancel: Option<&AtomicBool>) -> Result<()> {
        for seg in self.snapshot.segments.iter() {
            if let Some(cancel) = cancel {
                if cancel.load(SeqCst) {
                    return err_at!(SearchAborted, msg: "backup canceled");
                }
            }
            let data: Data = match &seg.mem {
                Some(mem) => Data::from_vec(self.codec.seal(mem)?),
                None => self.directory.load(Kind::Segment, seg.id)?,
            };
            dest.persist(Kind::Segment, seg.id, data.as_slice())?;
        }

        let descriptor = self.snapshot.encode_file();
        dest.persist(Kind::Snapshot, self.snapshot.epoch, &descriptor)
    }

    /// Release the reference on the snapshot.
    pub fn close(self) -> Result<()> {
        Ok(())
    }
}

/// Per-document doc-value access for a fixed set of fields.
pub struct DocumentValueReader {
    snapshot: Arc<Snapshot>,
    fields: Vec<String>,
}

impl DocumentValueReader {
    pub fn visit(
        &self,
        global: u64,
        visit: &mut dyn FnMut(&str, &[u8]),
    ) -> Result<()> {
        if self.fields.is_empty() {
            return Ok(());
        }
        let (idx, local) = self.snapshot.segment_of(global)?;
        let seg = &self.snapshot.segments[idx];
        seg.segment.visit_doc_values(local, &self.fields, visit)
    }
}

struct SnapshotPostingsCursor {
    snapshot: Arc<Snapshot>,
    cursors: Vec<Box<dyn PostingsCursor>>,
    cur: usize,
}

impl PostingsCursor for SnapshotPostingsCursor {
    fn next(&mut self) -> Result<Option<Posting>> {
        while self.cur < self.cursors.len() {
            match self.cursors[self.cur].next()? {
                Some(posting) => {
                    let seg = &self.snapshot.segments[self.cur];
                    if seg.is_deleted(posting.doc) {
                        continue;
                    }
                    let mut posting = posting;
                    posting.doc += self.snapshot.offsets[self.cur];
                    return Ok(Some(posting));
                }
                None => self.cur += 1,
            }
        }
        Ok(None)
    }

    fn advance(&mut self, target: u64) -> Result<Option<Posting>> {
        // skip whole segments below the target
        while self.cur < self.cursors.len() && self.snapshot.offsets[self.cur + 1] <= target
        {
            self.cur += 1;
        }
        if self.cur >= self.cursors.len() {
            return Ok(None);
        }

        let local_target = target.saturating_sub(self.snapshot.offsets[self.cur]);
        match self.cursors[self.cur].advance(local_target)? {
            Some(posting) => {
                let seg = &self.snapshot.segments[self.cur];
                if seg.is_deleted(posting.doc) {
                    let global = posting.doc + self.snapshot.offsets[self.cur];
                    return self.advance(global + 1);
                }
                let mut posting = posting;
                posting.doc += self.snapshot.offsets[self.cur];
                Ok(Some(posting))
            }
            None => {
                self.cur += 1;
                self.next()
            }
        }
    }

    fn count(&self) -> u64 {
        self.cursors.iter().map(|c| c.count()).sum()
    }
}

// enumerates every live document; freq 1, no norm, no locations.
struct AllDocsCursor {
    snapshot: Arc<Snapshot>,
    seg: usize,
    local: u64,
}

impl PostingsCursor for AllDocsCursor {
    fn next(&mut self) -> Result<Option<Posting>> {
        while self.seg < self.snapshot.segments.len() {
            let seg = &self.snapshot.segments[self.seg];
            if self.local >= seg.count() {
                self.seg += 1;
                self.local = 0;
                continue;
            }
            let local = self.local;
            self.local += 1;
            if seg.is_deleted(local) {
                continue;
            }
            return Ok(Some(Posting {
                doc: self.snapshot.offsets[self.seg] + local,
                freq: 1,
                norm: 0,
                locations: vec![],
            }));
        }
        Ok(None)
    }

    fn advance(&mut self, target: u64) -> Result<Option<Posting>> {
        while self.seg < self.snapshot.segments.len()
            && self.snapshot.offsets[self.seg + 1] <= target
        {
            self.seg += 1;
            self.local = 0;
        }
        if self.seg < self.snapshot.segments.len() {
            let base = self.snapshot.offsets[self.seg];
            self.local = cmp::max(self.local, target.saturating_sub(base));
        }
        self.next()
    }

    fn count(&self) -> u64 {
        *self.snapshot.offsets.last().unwrap()
    }
}

struct HeapEntry {
    term: Vec<u8>,
    doc_count: u64,
    src: usize,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.term == other.term && self.src == other.src
    }
}

impl Eq for HeapEntry {}

impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> cmp::Ordering {
        // reversed for a min-heap on (term, src)
        other
            .term
            .cmp(&self.term)
            .then_with(|| other.src.cmp(&self.src))
    }
}

/// Min-heap merge of per-segment dictionary cursors, summing doc counts of
/// equal terms.
pub(crate) struct SnapshotDictCursor {
    cursors: Vec<Box<dyn DictCursor>>,
    heap: BinaryHeap<HeapEntry>,
}

impl SnapshotDictCursor {
    pub(crate) fn new(mut cursors: Vec<Box<dyn DictCursor>>) -> Result<SnapshotDictCursor> {
        let mut heap = BinaryHeap::new();
        for (src, cursor) in cursors.iter_mut().enumerate() {
            if let Some(entry) = cursor.next()? {
                heap.push(HeapEntry {
                    term: entry.term,
                    doc_count: entry.doc_count,
                    src,
                });
            }
        }
        Ok(SnapshotDictCursor { cursors, heap })
    }
}

impl DictCursor for SnapshotDictCursor {
    fn next(&mut self) -> Result<Option<DictEntry>> {
        let head = match self.heap.pop() {
            Some(head) => head,
            None => return Ok(None),
        };
        if let Some(entry) = self.cursors[head.src].next()? {
            self.heap.push(HeapEntry {
                term: entry.term,
                doc_count: entry.doc_count,
                src: head.src,
            });
        }

        let mut doc_count = head.doc_count;
        while let Some(peek) = self.heap.peek() {
            if peek.term != head.term {
                break;
            }
            let dup = self.heap.pop().unwrap();
            doc_count += dup.doc_count;
            if let Some(entry) = self.cursors[dup.src].next()? {
                self.heap.push(HeapEntry {
                    term: entry.term,
                    doc_count: entry.doc_count,
                    src: dup.src,
                });
            }
        }

        Ok(Some(DictEntry {
            term: head.term,
            doc_count,
        }))
    }
}

#[cfg(test)]
#[path = "snapshot_test.rs"]
mod snapshot_test;
