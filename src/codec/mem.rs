//! In-memory segment, built from a batch of analyzed documents. Serves the
//! same [Segment] contract as its sealed on-disk form, so the read path
//! never distinguishes freshly-introduced data from persisted data.

use std::{cmp, collections::BTreeMap, sync::Arc};

use crate::{
    analysis::AnalyzedDocument,
    codec::{
        Automaton, DictCursor, DictEntry, FieldStats, Location, Posting, PostingOptions,
        PostingsCursor, Segment,
    },
    Error, Result,
};

#[derive(Clone, Debug)]
pub(crate) struct MemPosting {
    pub(crate) doc: u32,
    pub(crate) freq: u32,
    pub(crate) locations: Vec<Location>,
}

#[derive(Clone)]
pub(crate) struct FieldData {
    pub(crate) stats: FieldStats,
    pub(crate) has_locations: bool,
    pub(crate) norms: Arc<Vec<u32>>,
    pub(crate) terms: BTreeMap<Vec<u8>, Arc<Vec<MemPosting>>>,
}

#[derive(Default)]
struct FieldBuilder {
    stats: FieldStats,
    has_locations: bool,
    norms: Vec<u32>,
    terms: BTreeMap<Vec<u8>, Vec<MemPosting>>,
}

/// Immutable in-memory segment. Local document numbers are dense in
/// `[0, count)`, assigned in batch order.
pub struct MemSegment {
    pub(crate) doc_count: u64,
    pub(crate) fields: BTreeMap<String, FieldData>,
    pub(crate) stored: Vec<Vec<(String, Vec<u8>)>>,
    pub(crate) doc_values: Vec<Vec<(String, Vec<Vec<u8>>)>>,
}

impl MemSegment {
    /// Build a segment from analyzed documents, one local doc number per
    /// document in order.
    pub fn build(docs: &[AnalyzedDocument]) -> MemSegment {
        let mut builders: BTreeMap<String, FieldBuilder> = BTreeMap::new();
        let mut stored: Vec<Vec<(String, Vec<u8>)>> = Vec::with_capacity(docs.len());
        let mut doc_values: Vec<Vec<(String, Vec<Vec<u8>>)>> =
            Vec::with_capacity(docs.len());

        for (local, doc) in docs.iter().enumerate() {
            let local = local as u32;
            let mut doc_stored = vec![];
            let mut doc_dv = vec![];

            for af in doc.fields.iter() {
                if let Some(value) = &af.stored {
                    doc_stored.push((af.name.clone(), value.clone()));
                }
                if !af.doc_values.is_empty() {
                    doc_dv.push((af.name.clone(), af.doc_values.clone()));
                }
                if !af.options.is_index() {
                    continue;
                }

                let fb = builders.entry(af.name.clone()).or_default();
                fb.has_locations = fb.has_locations || af.options.is_locations();
                fb.stats.doc_count += 1;
                fb.stats.sum_length += af.length as u64;
                if fb.norms.len() <= local as usize {
                    fb.norms.resize(local as usize + 1, 0);
                }
                fb.norms[local as usize] = (af.length as f32).to_bits();

                let mut pos = 0_u32;
                for token in af.tokens.iter() {
                    pos += token.position_incr;
                    let list = fb.terms.entry(token.term.clone()).or_default();
                    match list.last_mut() {
                        Some(p) if p.doc == local => {
                            p.freq += 1;
                            if af.options.is_locations() {
                                p.locations.push(Location {
                                    field: af.name.clone(),
                                    pos,
                                    start: token.start as u32,
                                    end: token.end as u32,
                                });
                            }
                        }
                        _ => {
                            let locations = if af.options.is_locations() {
                                vec![Location {
                                    field: af.name.clone(),
                                    pos,
                                    start: token.start as u32,
                                    end: token.end as u32,
                                }]
                            } else {
                                vec![]
                            };
                            list.push(MemPosting {
                                doc: local,
                                freq: 1,
                                locations,
                            });
                        }
                    }
                }
            }

            stored.push(doc_stored);
            doc_values.push(doc_dv);
        }

        let doc_count = docs.len() as u64;
        let fields = builders
            .into_iter()
            .map(|(name, mut fb)| {
                fb.norms.resize(doc_count as usize, 0);
                let fd = FieldData {
                    stats: fb.stats,
                    has_locations: fb.has_locations,
                    norms: Arc::new(fb.norms),
                    terms: fb
                        .terms
                        .into_iter()
                        .map(|(term, list)| (term, Arc::new(list)))
                        .collect(),
                };
                (name, fd)
            })
            .collect();

        MemSegment {
            doc_count,
            fields,
            stored,
            doc_values,
        }
    }

    pub(crate) fn from_parts(
        doc_count: u64,
        fields: BTreeMap<String, FieldData>,
        stored: Vec<Vec<(String, Vec<u8>)>>,
        doc_values: Vec<Vec<(String, Vec<Vec<u8>>)>>,
    ) -> MemSegment {
        MemSegment {
            doc_count,
            fields,
            stored,
            doc_values,
        }
    }
}

impl Segment for MemSegment {
    fn count(&self) -> u64 {
        self.doc_count
    }

    fn fields(&self) -> Vec<String> {
        self.fields.keys().cloned().collect()
    }

    fn field_stats(&self, field: &str) -> Option<FieldStats> {
        self.fields.get(field).map(|fd| fd.stats)
    }

    fn doc_frequency(&self, field: &str, term: &[u8]) -> Result<u64> {
        let df = self
            .fields
            .get(field)
            .and_then(|fd| fd.terms.get(term))
            .map(|list| list.len() as u64)
            .unwrap_or(0);
        Ok(df)
    }

    fn dictionary(
        &self,
        field: &str,
        automaton: Option<Arc<dyn Automaton>>,
        start: Option<&[u8]>,
        end: Option<&[u8]>,
    ) -> Result<Box<dyn DictCursor>> {
        let entries = match self.fields.get(field) {
            Some(fd) => {
                let mut entries = vec![];
                for (term, list) in fd.terms.iter() {
                    if let Some(start) = start {
                        if term.as_slice() < start {
                            continue;
                        }
                    }
                    if let Some(end) = end {
                        if term.as_slice() >= end {
                            break;
                        }
                    }
                    if let Some(aut) = &automaton {
                        if !aut.matches(term) {
                            continue;
                        }
                    }
                    entries.push(DictEntry {
                        term: term.clone(),
                        doc_count: list.len() as u64,
                    });
                }
                entries
            }
            None => vec![],
        };

        Ok(Box::new(MemDictCursor {
            entries: entries.into_iter(),
        }))
    }

    fn postings(
        &self,
        field: &str,
        term: &[u8],
        opts: PostingOptions,
    ) -> Result<Box<dyn PostingsCursor>> {
        let found = self.fields.get(field).and_then(|fd| {
            let list = fd.terms.get(term)?;
            Some((Arc::clone(list), Arc::clone(&fd.norms)))
        });
        match found {
            Some((list, norms)) => Ok(Box::new(MemPostingsCursor {
                list,
                norms,
                idx: 0,
                opts,
            })),
            None => Ok(Box::new(crate::codec::EmptyPostings)),
        }
    }

    fn visit_stored(
        &self,
        local: u64,
        visit: &mut dyn FnMut(&str, &[u8]) -> bool,
    ) -> Result<()> {
        match self.stored.get(local as usize) {
            Some(fields) => {
                for (name, value) in fields.iter() {
                    if !visit(name, value) {
                        break;
                    }
                }
                Ok(())
            }
            None => err_at!(InvalidInput, msg: "doc {} out of bounds", local),
        }
    }

    fn visit_doc_values(
        &self,
        local: u64,
        fields: &[String],
        visit: &mut dyn FnMut(&str, &[u8]),
    ) -> Result<()> {
        match self.doc_values.get(local as usize) {
            Some(doc) => {
                for (name, values) in doc.iter() {
                    if fields.iter().any(|f| f == name) {
                        for value in values.iter() {
                            visit(name, value);
                        }
                    }
                }
                Ok(())
            }
            None => err_at!(InvalidInput, msg: "doc {} out of bounds", local),
        }
    }
}

struct MemDictCursor {
    entries: std::vec::IntoIter<DictEntry>,
}

impl DictCursor for MemDictCursor {
    fn next(&mut self) -> Result<Option<DictEntry>> {
        Ok(self.entries.next())
    }
}

struct MemPostingsCursor {
    list: Arc<Vec<MemPosting>>,
    norms: Arc<Vec<u32>>,
    idx: usize,
    opts: PostingOptions,
}

impl MemPostingsCursor {
    fn make(&self, p: &MemPosting) -> Posting {
        Posting {
            doc: p.doc as u64,
            freq: if self.opts.freq { p.freq } else { 1 },
            norm: if self.opts.norm {
                self.norms.get(p.doc as usize).copied().unwrap_or(0)
            } else {
                0
            },
            locations: if self.opts.locations {
                p.locations.clone()
            } else {
                vec![]
            },
        }
    }
}

impl PostingsCursor for MemPostingsCursor {
    fn next(&mut self) -> Result<Option<Posting>> {
        match self.list.get(self.idx) {
            Some(p) => {
                self.idx += 1;
                Ok(Some(self.make(p)))
            }
            None => Ok(None),
        }
    }

    fn advance(&mut self, target: u64) -> Result<Option<Posting>> {
        let target = cmp::min(target, u32::MAX as u64) as u32;
        // postings are sorted by doc; skip forward from the cursor
        let rest = &self.list[self.idx..];
        let off = rest.partition_point(|p| p.doc < target);
        self.idx += off;
        self.next()
    }

    fn count(&self) -> u64 {
        self.list.len() as u64
    }
}

#[cfg(test)]
#[path = "mem_test.rs"]
mod mem_test;
