//! Default on-disk segment format, version 1.
//!
//! Layout, in file order:
//!
//! ```text
//! +------------------+ stored-field chunks (zstd-compressed cbor)
//! +------------------+ doc-value chunks (zstd-compressed cbor)
//! +------------------+ per field: norms column, postings blob, fst term dict
//! +------------------+ field metadata (cbor list)
//! +------------------+ fixed footer: offsets, doc count, version, crc32, magic
//! ```
//!
//! Term dictionaries are FSTs mapping term bytes to the offset of that
//! term's postings entry within the field's postings blob. Postings entries
//! are delta-coded varints. The whole file is validated by a crc32 footer;
//! sealing the same memory segment twice yields identical bytes.

use cbordata::Cborize;
use fst::{IntoStreamer, Streamer};
use log::debug;

use std::{
    cmp,
    collections::BTreeMap,
    convert::TryInto,
    sync::{Arc, Mutex},
};

use crate::{
    codec::{
        mem::MemSegment, Automaton, Codec, DictCursor, DictEntry, FieldStats, Location,
        Posting, PostingOptions, PostingsCursor, Segment,
    },
    directory::Data,
    util, Error, Result,
};

pub const CODEC_NAME: &str = "sift";
pub const CODEC_VERSION: u32 = 1;

const MAGIC: u32 = 0x5349_4654;
const FOOTER_SIZE: usize = 72;
const CHUNK_SIZE: u32 = 128;
const ZSTD_LEVEL: i32 = 3;

const STORED_FIELD_ID: &str = "sift/stored/0.0.1";
const STORED_DOC_ID: &str = "sift/stored-doc/0.0.1";
const DV_FIELD_ID: &str = "sift/docvalues/0.0.1";
const DV_DOC_ID: &str = "sift/docvalues-doc/0.0.1";
const FIELD_META_ID: &str = "sift/field-meta/0.0.1";

#[derive(Clone, Cborize)]
struct StoredField {
    name: String,
    value: Vec<u8>,
}

impl StoredField {
    const ID: &'static str = STORED_FIELD_ID;
}

#[derive(Clone, Cborize)]
struct StoredDoc {
    fields: Vec<StoredField>,
}

impl StoredDoc {
    const ID: &'static str = STORED_DOC_ID;
}

#[derive(Clone, Cborize)]
struct DocValuesField {
    name: String,
    values: Vec<Vec<u8>>,
}

impl DocValuesField {
    const ID: &'static str = DV_FIELD_ID;
}

#[derive(Clone, Cborize)]
struct DocValuesDoc {
    fields: Vec<DocValuesField>,
}

impl DocValuesDoc {
    const ID: &'static str = DV_DOC_ID;
}

#[derive(Clone, Cborize)]
struct FieldMeta {
    name: String,
    has_locations: bool,
    doc_count: u64,
    sum_length: u64,
    norms_off: u64,
    norms_len: u64,
    postings_off: u64,
    postings_len: u64,
    fst_off: u64,
    fst_len: u64,
}

impl FieldMeta {
    const ID: &'static str = FIELD_META_ID;
}

/// The shipping codec.
pub struct DiskCodec;

impl Codec for DiskCodec {
    fn name(&self) -> &'static str {
        CODEC_NAME
    }

    fn version(&self) -> u32 {
        CODEC_VERSION
    }

    fn seal(&self, segment: &MemSegment) -> Result<Vec<u8>> {
        seal_segment(segment)
    }

    fn open(&self, data: Data, id: u64) -> Result<Arc<dyn Segment>> {
        Ok(Arc::new(DiskSegment::open(data, id)?))
    }
}

fn zstd_compress(data: &[u8]) -> Result<Vec<u8>> {
    err_at!(Fatal, zstd::encode_all(data, ZSTD_LEVEL))
}

fn zstd_decompress(data: &[u8]) -> Result<Vec<u8>> {
    err_at!(InvalidFile, zstd::decode_all(data))
}

// chunked section: u32 chunk-count, then chunk-count u64 end-offsets
// (relative to the start of the chunk payload), then the payload.
fn write_chunked_section(chunks: Vec<Vec<u8>>, buf: &mut Vec<u8>) {
    buf.extend_from_slice(&(chunks.len() as u32).to_be_bytes());
    let mut end = 0_u64;
    for chunk in chunks.iter() {
        end += chunk.len() as u64;
        buf.extend_from_slice(&end.to_be_bytes());
    }
    for chunk in chunks.into_iter() {
        buf.extend_from_slice(&chunk);
    }
}

fn seal_segment(segment: &MemSegment) -> Result<Vec<u8>> {
    let mut buf: Vec<u8> = vec![];
    let doc_count = segment.doc_count as usize;

    // stored-field chunks
    let stored_off = buf.len() as u64;
    {
        let mut chunks = vec![];
        for chunk_docs in segment.stored.chunks(CHUNK_SIZE as usize) {
            let docs: Vec<StoredDoc> = chunk_docs
                .iter()
                .map(|fields| StoredDoc {
                    fields: fields
                        .iter()
                        .map(|(name, value)| StoredField {
                            name: name.clone(),
                            value: value.clone(),
                        })
                        .collect(),
                })
                .collect();
            chunks.push(zstd_compress(&util::into_cbor_bytes(docs)?)?);
        }
        write_chunked_section(chunks, &mut buf);
    }
    let stored_len = buf.len() as u64 - stored_off;

    // doc-value chunks
    let dv_off = buf.len() as u64;
    {
        let mut chunks = vec![];
        for chunk_docs in segment.doc_values.chunks(CHUNK_SIZE as usize) {
            let docs: Vec<DocValuesDoc> = chunk_docs
                .iter()
                .map(|fields| DocValuesDoc {
                    fields: fields
                        .iter()
                        .map(|(name, values)| DocValuesField {
                            name: name.clone(),
                            values: values.clone(),
                        })
                        .collect(),
                })
                .collect();
            chunks.push(zstd_compress(&util::into_cbor_bytes(docs)?)?);
        }
        write_chunked_section(chunks, &mut buf);
    }
    let dv_len = buf.len() as u64 - dv_off;

    // per-field norms, postings and term dictionary
    let mut metas = vec![];
    for (name, fd) in segment.fields.iter() {
        let norms_off = buf.len() as u64;
        for norm in fd.norms.iter() {
            buf.extend_from_slice(&norm.to_be_bytes());
        }
        let norms_len = buf.len() as u64 - norms_off;

        let postings_off = buf.len() as u64;
        let mut offsets: Vec<(&[u8], u64)> = Vec::with_capacity(fd.terms.len());
        {
            let mut blob = vec![];
            for (term, list) in fd.terms.iter() {
                offsets.push((term, blob.len() as u64));
                util::encode_varint(list.len() as u64, &mut blob);
                let mut prev = 0_u64;
                for (i, p) in list.iter().enumerate() {
                    let doc = p.doc as u64;
                    let delta = if i == 0 { doc } else { doc - prev };
                    prev = doc;
                    util::encode_varint(delta, &mut blob);
                    util::encode_varint(p.freq as u64, &mut blob);
                    if fd.has_locations {
                        util::encode_varint(p.locations.len() as u64, &mut blob);
                        for loc in p.locations.iter() {
                            util::encode_varint(loc.pos as u64, &mut blob);
                            util::encode_varint(loc.start as u64, &mut blob);
                            util::encode_varint(loc.end as u64, &mut blob);
                        }
                    }
                }
            }
            buf.extend_from_slice(&blob);
        }
        let postings_len = buf.len() as u64 - postings_off;

        let fst_off = buf.len() as u64;
        {
            let mut builder = fst::MapBuilder::memory();
            for (term, off) in offsets.into_iter() {
                err_at!(Fatal, builder.insert(term, off))?;
            }
            let bytes = err_at!(Fatal, builder.into_inner())?;
            buf.extend_from_slice(&bytes);
        }
        let fst_len = buf.len() as u64 - fst_off;

        metas.push(FieldMeta {
            name: name.clone(),
            has_locations: fd.has_locations,
            doc_count: fd.stats.doc_count,
            sum_length: fd.stats.sum_length,
            norms_off,
            norms_len,
            postings_off,
            postings_len,
            fst_off,
            fst_len,
        });
    }

    let fields_off = buf.len() as u64;
    buf.extend_from_slice(&util::into_cbor_bytes(metas)?);
    let fields_len = buf.len() as u64 - fields_off;

    // footer
    buf.extend_from_slice(&fields_off.to_be_bytes());
    buf.extend_from_slice(&fields_len.to_be_bytes());
    buf.extend_from_slice(&stored_off.to_be_bytes());
    buf.extend_from_slice(&stored_len.to_be_bytes());
    buf.extend_from_slice(&dv_off.to_be_bytes());
    buf.extend_from_slice(&dv_len.to_be_bytes());
    buf.extend_from_slice(&(doc_count as u64).to_be_bytes());
    buf.extend_from_slice(&CHUNK_SIZE.to_be_bytes());
    buf.extend_from_slice(&CODEC_VERSION.to_be_bytes());

    let crc = {
        let mut hasher = crc32fast::Hasher::new();
        hasher.update(&buf);
        hasher.finalize()
    };
    buf.extend_from_slice(&crc.to_be_bytes());
    buf.extend_from_slice(&MAGIC.to_be_bytes());

    Ok(buf)
}

/// Sub-slice of loaded segment bytes, shared with the mmap/heap allocation.
#[derive(Clone)]
struct SliceData {
    data: Data,
    start: usize,
    end: usize,
}

impl AsRef<[u8]> for SliceData {
    fn as_ref(&self) -> &[u8] {
        &self.data.as_slice()[self.start..self.end]
    }
}

struct ChunkTable {
    payload_start: usize,
    // absolute (start, end) per chunk
    chunks: Vec<(usize, usize)>,
}

impl ChunkTable {
    fn parse(data: &[u8], off: usize, len: usize) -> Result<ChunkTable> {
        let section = &data[off..off + len];
        check_remaining!(section, 4, "chunk table")?;
        let n = u32::from_be_bytes(section[..4].try_into().unwrap()) as usize;
        check_remaining!(section, 4 + n * 8, "chunk offsets")?;

        let payload_start = off + 4 + n * 8;
        let mut chunks = vec![];
        let mut prev = 0_usize;
        for i in 0..n {
            let o = 4 + i * 8;
            let end = u64::from_be_bytes(section[o..o + 8].try_into().unwrap()) as usize;
            chunks.push((payload_start + prev, payload_start + end));
            prev = end;
        }

        Ok(ChunkTable {
            payload_start,
            chunks,
        })
    }
}

struct DiskField {
    stats: FieldStats,
    has_locations: bool,
    norms_start: usize,
    postings_start: usize,
    postings_len: usize,
    fst_start: usize,
    fst_end: usize,
    map: fst::Map<SliceData>,
}

/// Read-only segment over sealed bytes, heap or mmap backed.
pub struct DiskSegment {
    id: u64,
    data: Data,
    doc_count: u64,
    chunk_size: u32,
    stored: ChunkTable,
    doc_values: ChunkTable,
    fields: BTreeMap<String, DiskField>,
    // single-chunk caches; doc-value loads cluster by document
    stored_cache: Mutex<Option<(usize, Arc<Vec<StoredDoc>>)>>,
    dv_cache: Mutex<Option<(usize, Arc<Vec<DocValuesDoc>>)>>,
}

impl DiskSegment {
    pub fn open(data: Data, id: u64) -> Result<DiskSegment> {
        let bytes = data.as_slice();
        if bytes.len() < FOOTER_SIZE {
            return err_at!(InvalidFile, msg: "segment {} too short", id);
        }

        let foot = &bytes[bytes.len() - FOOTER_SIZE..];
        let magic = u32::from_be_bytes(foot[68..72].try_into().unwrap());
        if magic != MAGIC {
            return err_at!(InvalidFile, msg: "segment {} bad magic {:x}", id, magic);
        }
        let version = u32::from_be_bytes(foot[60..64].try_into().unwrap());
        if version != CODEC_VERSION {
            return err_at!(InvalidFile, msg: "segment {} version {}", id, version);
        }
        let crc = u32::from_be_bytes(foot[64..68].try_into().unwrap());
        let computed = {
            let mut hasher = crc32fast::Hasher::new();
            hasher.update(&bytes[..bytes.len() - 8]);
            hasher.finalize()
        };
        if crc != computed {
            return err_at!(InvalidFile, msg: "segment {} crc {:x}/{:x}", id, crc, computed);
        }

        let fields_off = u64::from_be_bytes(foot[0..8].try_into().unwrap()) as usize;
        let fields_len = u64::from_be_bytes(foot[8..16].try_into().unwrap()) as usize;
        let stored_off = u64::from_be_bytes(foot[16..24].try_into().unwrap()) as usize;
        let stored_len = u64::from_be_bytes(foot[24..32].try_into().unwrap()) as usize;
        let dv_off = u64::from_be_bytes(foot[32..40].try_into().unwrap()) as usize;
        let dv_len = u64::from_be_bytes(foot[40..48].try_into().unwrap()) as usize;
        let doc_count = u64::from_be_bytes(foot[48..56].try_into().unwrap());
        let chunk_size = u32::from_be_bytes(foot[56..60].try_into().unwrap());

        let metas: Vec<FieldMeta> =
            util::from_cbor_bytes(&bytes[fields_off..fields_off + fields_len])?.0;

        let mut fields = BTreeMap::new();
        for meta in metas.into_iter() {
            let fst_start = meta.fst_off as usize;
            let fst_end = fst_start + meta.fst_len as usize;
            let map = err_at!(
                InvalidFile,
                fst::Map::new(SliceData {
                    data: data.clone(),
                    start: fst_start,
                    end: fst_end,
                }),
                "segment {} field {} term dict", id, meta.name
            )?;
            fields.insert(
                meta.name.clone(),
                DiskField {
                    stats: FieldStats {
                        doc_count: meta.doc_count,
                        sum_length: meta.sum_length,
                    },
                    has_locations: meta.has_locations,
                    norms_start: meta.norms_off as usize,
                    postings_start: meta.postings_off as usize,
                    postings_len: meta.postings_len as usize,
                    fst_start,
                    fst_end,
                    map,
                },
            );
        }

        debug!(target: "codec", "opened segment {} docs:{} fields:{}", id, doc_count, fields.len());

        let stored = ChunkTable::parse(bytes, stored_off, stored_len)?;
        let doc_values = ChunkTable::parse(bytes, dv_off, dv_len)?;

        Ok(DiskSegment {
            id,
            data,
            doc_count,
            chunk_size,
            stored,
            doc_values,
            fields,
            stored_cache: Mutex::new(None),
            dv_cache: Mutex::new(None),
        })
    }

    pub fn to_id(&self) -> u64 {
        self.id
    }

    fn load_stored_chunk(&self, chunk: usize) -> Result<Arc<Vec<StoredDoc>>> {
        {
            let cache = self.stored_cache.lock().unwrap();
            if let Some((cached, docs)) = cache.as_ref() {
                if *cached == chunk {
                    return Ok(Arc::clone(docs));
                }
            }
        }

        let (start, end) = match self.stored.chunks.get(chunk) {
            Some(range) => *range,
            None => return err_at!(InvalidFile, msg: "stored chunk {}", chunk),
        };
        let raw = zstd_decompress(&self.data.as_slice()[start..end])?;
        let docs: Arc<Vec<StoredDoc>> = Arc::new(util::from_cbor_bytes(&raw)?.0);

        *self.stored_cache.lock().unwrap() = Some((chunk, Arc::clone(&docs)));
        Ok(docs)
    }

    fn load_dv_chunk(&self, chunk: usize) -> Result<Arc<Vec<DocValuesDoc>>> {
        {
            let cache = self.dv_cache.lock().unwrap();
            if let Some((cached, docs)) = cache.as_ref() {
                if *cached == chunk {
                    return Ok(Arc::clone(docs));
                }
            }
        }

        let (start, end) = match self.doc_values.chunks.get(chunk) {
            Some(range) => *range,
            None => return err_at!(InvalidFile, msg: "doc-value chunk {}", chunk),
        };
        let raw = zstd_decompress(&self.data.as_slice()[start..end])?;
        let docs: Arc<Vec<DocValuesDoc>> = Arc::new(util::from_cbor_bytes(&raw)?.0);

        *self.dv_cache.lock().unwrap() = Some((chunk, Arc::clone(&docs)));
        Ok(docs)
    }
}

impl Segment for DiskSegment {
    fn count(&self) -> u64 {
        self.doc_count
    }

    fn fields(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    fn field_stats(&self, field: &str) -> Option<FieldStats> {
        self.fields.get(field).map(|df| df.stats)
    }

    fn doc_frequency(&self, field: &str, term: &[u8]) -> Result<u64> {
        let df = match self.fields.get(field) {
            Some(df) => df,
            None => return Ok(0),
        };
        match df.map.get(term) {
            Some(off) => {
                let entry = &self.data.as_slice()[df.postings_start + off as usize..];
                Ok(util::decode_varint(entry)?.0)
            }
            None => Ok(0),
        }
    }

    fn dictionary(
        &self,
        field: &str,
        automaton: Option<Arc<dyn Automaton>>,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<Box<dyn DictCursor>> {
        let df = match self.fields.get(field) {
            Some(df) => df,
            None => {
                return Ok(Box::new(DiskDictCursor {
                    map: None,
                    data: self.data.clone(),
                    postings_start: 0,
                    automaton: None,
                    start: None,
                    end: None,
                    last: None,
                }))
            }
        };

        // the cursor owns its own fst view over the shared bytes
        let map = err_at!(
            InvalidFile,
            fst::Map::new(SliceData {
                data: self.data.clone(),
                start: df.fst_start,
                end: df.fst_end,
            })
        )?;

        Ok(Box::new(DiskDictCursor {
            map: Some(map),
            data: self.data.clone(),
            postings_start: df.postings_start,
            automaton,
            start: start.map(|s| s.to_vec()),
            end: end.map(|e| e.to_vec()),
            last: None,
        }))
    }

    fn postings(
        &self,
        field: &str,
        term: &[u8],
        opts: PostingOptions,
    ) -> Result<Box<dyn PostingsCursor>> {
        let df = match self.fields.get(field) {
            Some(df) => df,
            None => return Ok(Box::new(crate::codec::EmptyPostings)),
        };
        let off = match df.map.get(term) {
            Some(off) => df.postings_start + off as usize,
            None => return Ok(Box::new(crate::codec::EmptyPostings)),
        };

        let (count, n) = util::decode_varint(&self.data.as_slice()[off..])?;
        Ok(Box::new(DiskPostingsCursor {
            data: self.data.clone(),
            field: field.to_string(),
            has_locations: df.has_locations,
            norms_start: df.norms_start,
            pos: off + n,
            remaining: count,
            count,
            prev_doc: 0,
            first: true,
            opts,
        }))
    }

    fn visit_stored(
        &self,
        local: u64,
        visit: &mut dyn FnMut(&str, &[u8]) -> bool,
    ) -> Result<()> {
        if local >= self.doc_count {
            return err_at!(InvalidInput, msg: "doc {} out of bounds", local);
        }
        let chunk = (local / self.chunk_size as u64) as usize;
        let within = (local % self.chunk_size as u64) as usize;

        let docs = self.load_stored_chunk(chunk)?;
        match docs.get(within) {
            Some(doc) => {
                for sf in doc.fields.iter() {
                    if !visit(&sf.name, &sf.value) {
                        break;
                    }
                }
                Ok(())
            }
            None => err_at!(InvalidFile, msg: "stored doc {} missing", local),
        }
    }

    fn visit_doc_values(
        &self,
        local: u64,
        fields: &[String],
        visit: &mut dyn FnMut(&str, &[u8]),
    ) -> Result<()> {
        if local >= self.doc_count {
            return err_at!(InvalidInput, msg: "doc {} out of bounds", local);
        }
        let chunk = (local / self.chunk_size as u64) as usize;
        let within = (local % self.chunk_size as u64) as usize;

        let docs = self.load_dv_chunk(chunk)?;
        match docs.get(within) {
            Some(doc) => {
                for dvf in doc.fields.iter() {
                    if fields.iter().any(|f| f == &dvf.name) {
                        for value in dvf.values.iter() {
                            visit(&dvf.name, value);
                        }
                    }
                }
                Ok(())
            }
            None => err_at!(InvalidFile, msg: "doc-value doc {} missing", local),
        }
    }
}

// adapter exposing the object-safe automaton to fst streams. absent
// automaton matches everything.
struct FstAut<'a> {
    inner: Option<&'a dyn Automaton>,
}

impl<'a> fst::Automaton for FstAut<'a> {
    type State = u32;

    fn start(&self) -> u32 {
        self.inner.map(|a| a.start()).unwrap_or(0)
    }

    fn is_match(&self, state: &u32) -> bool {
        self.inner.map(|a| a.is_match(*state)).unwrap_or(true)
    }

    fn can_match(&self, state: &u32) -> bool {
        self.inner.map(|a| a.can_match(*state)).unwrap_or(true)
    }

    fn accept(&self, state: &u32, byte: u8) -> u32 {
        self.inner.map(|a| a.accept(*state, byte)).unwrap_or(0)
    }
}

// Lazy dictionary traversal. Each step re-seeks the fst past the last
// returned term, so the cursor holds no borrow into the map between calls.
struct DiskDictCursor {
    map: Option<fst::Map<SliceData>>,
    data: Data,
    postings_start: usize,
    automaton: Option<Arc<dyn Automaton>>,
    start: Option<Vec<u8>>,
    end: Option<Vec<u8>>,
    last: Option<Vec<u8>>,
}

impl DictCursor for DiskDictCursor {
    fn next(&mut self) -> Result<Option<DictEntry>> {
        let map = match &self.map {
            Some(map) => map,
            None => return Ok(None),
        };

        let aut = FstAut {
            inner: self.automaton.as_deref(),
        };
        let mut sb = map.search(aut);
        match (&self.last, &self.start) {
            (Some(last), _) => sb = sb.gt(last),
            (None, Some(start)) => sb = sb.ge(start),
            (None, None) => (),
        }
        if let Some(end) = &self.end {
            sb = sb.lt(end);
        }

        let mut stream = sb.into_stream();
        match stream.next() {
            Some((term, off)) => {
                let entry = &self.data.as_slice()[self.postings_start + off as usize..];
                let (doc_count, _) = util::decode_varint(entry)?;
                let term = term.to_vec();
                self.last = Some(term.clone());
                Ok(Some(DictEntry { term, doc_count }))
            }
            None => Ok(None),
        }
    }
}

struct DiskPostingsCursor {
    data: Data,
    field: String,
    has_locations: bool,
    norms_start: usize,
    pos: usize,
    remaining: u64,
    count: u64,
    prev_doc: u64,
    first: bool,
    opts: PostingOptions,
}

impl DiskPostingsCursor {
    fn decode_next(&mut self) -> Result<Option<Posting>> {
        if self.remaining == 0 {
            return Ok(None);
        }
        self.remaining -= 1;

        let bytes = self.data.as_slice();

        let (delta, n) = util::decode_varint(&bytes[self.pos..])?;
        self.pos += n;
        let doc = if self.first { delta } else { self.prev_doc + delta };
        self.first = false;
        self.prev_doc = doc;

        let (freq, n) = util::decode_varint(&bytes[self.pos..])?;
        self.pos += n;

        let mut locations = vec![];
        if self.has_locations {
            let (n_locs, n) = util::decode_varint(&bytes[self.pos..])?;
            self.pos += n;
            for _ in 0..n_locs {
                let (pos, n) = util::decode_varint(&bytes[self.pos..])?;
                self.pos += n;
                let (start, n) = util::decode_varint(&bytes[self.pos..])?;
                self.pos += n;
                let (end, n) = util::decode_varint(&bytes[self.pos..])?;
                self.pos += n;
                if self.opts.locations {
                    locations.push(Location {
                        field: self.field.clone(),
                        pos: pos as u32,
                        start: start as u32,
                        end: end as u32,
                    });
                }
            }
        }

        let norm = if self.opts.norm {
            let off = self.norms_start + (doc as usize) * 4;
            u32::from_be_bytes(bytes[off..off + 4].try_into().unwrap())
        } else {
            0
        };

        Ok(Some(Posting {
            doc,
            freq: if self.opts.freq { freq as u32 } else { 1 },
            norm,
            locations,
        }))
    }
}

impl PostingsCursor for DiskPostingsCursor {
    fn next(&mut self) -> Result<Option<Posting>> {
        self.decode_next()
    }

    fn advance(&mut self, target: u64) -> Result<Option<Posting>> {
        loop {
            match self.decode_next()? {
                Some(posting) if posting.doc < target => continue,
                item => break Ok(item),
            }
        }
    }

    fn count(&self) -> u64 {
        cmp::max(self.count, 1)
    }
}

#[cfg(test)]
#[path = "disk_test.rs"]
mod disk_test;
