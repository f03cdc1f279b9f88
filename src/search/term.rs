//! Term searcher: postings of one `(field, term)` scored by the field's
//! similarity, plus the multi-term disjunction built from candidate term
//! sets (fuzzy, regexp, prefix, ranges).

use crate::{
    codec::{PostingOptions, PostingsCursor},
    index::IndexReader,
    search::{
        disjunction::DisjunctionSearcher, CollectionStats, Context, DocumentMatch,
        Searcher, SearcherOptions, TermScorer,
    },
    Error, Result,
};

pub struct TermSearcher {
    field: String,
    term: Vec<u8>,
    cursor: Box<dyn PostingsCursor>,
    scorer: Box<dyn TermScorer>,
    options: SearcherOptions,
    count: u64,
}

impl TermSearcher {
    pub fn new(
        reader: &IndexReader,
        field: &str,
        term: &[u8],
        boost: f64,
        options: SearcherOptions,
    ) -> Result<TermSearcher> {
        let stats = reader.snapshot().field_stats(field);
        let collection = CollectionStats {
            doc_count: stats.doc_count,
            avg_length: match stats.doc_count {
                0 => 1.0,
                n => stats.sum_length as f64 / n as f64,
            },
        };
        let doc_freq = reader.snapshot().doc_frequency(field, term)?;

        let similarity = reader.config().similarity_for_field(field);
        let scorer = similarity.scorer(boost, collection, doc_freq);

        let opts = PostingOptions {
            freq: true,
            norm: true,
            locations: options.include_locations,
        };
        let cursor = reader.postings_iterator(field, Some(term), opts)?;
        let count = cursor.count();

        Ok(TermSearcher {
            field: field.to_string(),
            term: term.to_vec(),
            cursor,
            scorer,
            options,
            count,
        })
    }

    fn make(&self, posting: crate::codec::Posting) -> DocumentMatch {
        let mut dm = DocumentMatch {
            number: posting.doc,
            score: self.scorer.score(posting.freq, posting.norm),
            ..DocumentMatch::default()
        };
        if self.options.explain {
            dm.explanation = Some(self.scorer.explain(posting.freq, posting.norm));
        }
        if self.options.include_locations {
            dm.add_locations(&self.field, &self.term, &posting.locations);
        }
        dm
    }
}

impl Searcher for TermSearcher {
    fn next(&mut self, ctx: &Context) -> Result<Option<DocumentMatch>> {
        ctx.check()?;
        Ok(self.cursor.next()?.map(|p| self.make(p)))
    }

    fn advance(&mut self, ctx: &Context, target: u64) -> Result<Option<DocumentMatch>> {
        ctx.check()?;
        Ok(self.cursor.advance(target)?.map(|p| self.make(p)))
    }

    fn count(&self) -> u64 {
        self.count
    }
}

/// Disjunction over a set of candidate terms in one field. When the caller
/// needs no scoring payloads the candidates collapse into a single unadorned
/// union cursor, unless that optimization is disabled in the config.
pub fn multi_term_searcher(
    reader: &IndexReader,
    field: &str,
    terms: Vec<Vec<u8>>,
    boost: f64,
    options: SearcherOptions,
    scoring: bool,
) -> Result<Box<dyn Searcher>> {
    let max = reader.config().max_clause_count();
    if terms.len() > max {
        return err_at!(QueryTooBroad, msg: "field {} expands to {} terms", field, terms.len());
    }

    let unadorned = !scoring
        && !options.include_locations
        && !reader.config().disable_optimize_disjunction_unadorned;
    if unadorned {
        let mut cursors = vec![];
        for term in terms.iter() {
            cursors.push(reader.postings_iterator(
                field,
                Some(term),
                PostingOptions::default(),
            )?);
        }
        return Ok(Box::new(UnadornedUnionSearcher::new(cursors, boost)));
    }

    let mut searchers: Vec<Box<dyn Searcher>> = vec![];
    for term in terms.iter() {
        searchers.push(Box::new(TermSearcher::new(
            reader, field, term, boost, options,
        )?));
    }
    Ok(Box::new(DisjunctionSearcher::new(searchers, 1, false)?))
}

/// Union of raw postings cursors with a constant score. Used where a match
/// only needs to exist, not carry term statistics.
pub struct UnadornedUnionSearcher {
    cursors: Vec<(Box<dyn PostingsCursor>, Option<u64>)>,
    score: f64,
    count: u64,
}

impl UnadornedUnionSearcher {
    pub fn new(cursors: Vec<Box<dyn PostingsCursor>>, score: f64) -> UnadornedUnionSearcher {
        let count = cursors.iter().map(|c| c.count()).sum();
        UnadornedUnionSearcher {
            cursors: cursors.into_iter().map(|c| (c, None)).collect(),
            score,
            count,
        }
    }

    fn prime(&mut self) -> Result<()> {
        for (cursor, head) in self.cursors.iter_mut() {
            if head.is_none() {
                *head = cursor.next()?.map(|p| p.doc);
            }
        }
        Ok(())
    }

    fn emit(&mut self, doc: u64) -> Result<DocumentMatch> {
        // pop every head at this doc so each doc emits once
        for (cursor, head) in self.cursors.iter_mut() {
            if *head == Some(doc) {
                *head = cursor.next()?.map(|p| p.doc);
            }
        }
        Ok(DocumentMatch {
            number: doc,
            score: self.score,
            ..DocumentMatch::default()
        })
    }
}

impl Searcher for UnadornedUnionSearcher {
    fn next(&mut self, ctx: &Context) -> Result<Option<DocumentMatch>> {
        ctx.check()?;
        self.prime()?;

        match self.cursors.iter().filter_map(|(_, head)| *head).min() {
            Some(doc) => Ok(Some(self.emit(doc)?)),
            None => Ok(None),
        }
    }

    fn advance(&mut self, ctx: &Context, target: u64) -> Result<Option<DocumentMatch>> {
        ctx.check()?;
        for (cursor, head) in self.cursors.iter_mut() {
            let stale = match head {
                Some(doc) => *doc < target,
                None => true,
            };
            if stale {
                *head = cursor.advance(target)?.map(|p| p.doc);
            }
        }

        match self.cursors.iter().filter_map(|(_, head)| *head).min() {
            Some(doc) => Ok(Some(self.emit(doc)?)),
            None => Ok(None),
        }
    }

    fn count(&self) -> u64 {
        self.count
    }
}

#[cfg(test)]
#[path = "term_test.rs"]
mod term_test;
