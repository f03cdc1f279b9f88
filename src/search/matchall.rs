//! Match-all and match-none searchers.

use crate::{
    codec::{PostingOptions, PostingsCursor},
    index::IndexReader,
    search::{Context, DocumentMatch, Searcher},
    Result,
};

/// Every live document, constant score.
pub struct MatchAllSearcher {
    cursor: Box<dyn PostingsCursor>,
    score: f64,
    count: u64,
}

impl MatchAllSearcher {
    pub fn new(reader: &IndexReader, boost: f64) -> Result<MatchAllSearcher> {
        let cursor = reader.postings_iterator("", None, PostingOptions::default())?;
        let count = cursor.count();
        Ok(MatchAllSearcher {
            cursor,
            score: boost,
            count,
        })
    }

    fn make(&self, doc: u64) -> DocumentMatch {
        DocumentMatch {
            number: doc,
            score: self.score,
            ..DocumentMatch::default()
        }
    }
}

impl Searcher for MatchAllSearcher {
    fn next(&mut self, ctx: &Context) -> Result<Option<DocumentMatch>> {
        ctx.check()?;
        Ok(self.cursor.next()?.map(|p| self.make(p.doc)))
    }

    fn advance(&mut self, ctx: &Context, target: u64) -> Result<Option<DocumentMatch>> {
        ctx.check()?;
        Ok(self.cursor.advance(target)?.map(|p| self.make(p.doc)))
    }

    fn count(&self) -> u64 {
        self.count
    }
}

/// No documents.
pub struct MatchNoneSearcher;

impl Searcher for MatchNoneSearcher {
    fn next(&mut self, _ctx: &Context) -> Result<Option<DocumentMatch>> {
        Ok(None)
    }

    fn advance(&mut self, _ctx: &Context, _target: u64) -> Result<Option<DocumentMatch>> {
        Ok(None)
    }

    fn count(&self) -> u64 {
        0
    }
}
