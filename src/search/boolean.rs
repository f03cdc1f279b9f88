//! Boolean searcher: `must` conjunction, `should` disjunction with a
//! minimum, `must_not` as a score-less filter.
//!
//! The current `should` and `must_not` matches are cached so both advance in
//! lockstep with the driving clause; an overshoot stays buffered for the
//! next candidate instead of being dropped.

use crate::{
    search::{conjunction::merge, Context, DocumentMatch, Searcher},
    Result,
};

/// Composition rules:
///
/// * with a `must`, iteration drives on it; `should` contributes score and,
///   when `min_should` > 0, must be satisfied;
/// * without a `must`, iteration drives on `should` with an implicit
///   minimum of one;
/// * `must_not` suppresses matches and contributes nothing to the score;
///   alone it matches nothing — there is no anchor to iterate.
pub struct BooleanSearcher {
    must: Option<Box<dyn Searcher>>,
    should: Option<Box<dyn Searcher>>,
    must_not: Option<Box<dyn Searcher>>,
    min_should: usize,
    curr_should: Option<DocumentMatch>,
    should_done: bool,
    curr_must_not: Option<DocumentMatch>,
    must_not_done: bool,
    count: u64,
}

impl BooleanSearcher {
    pub fn new(
        must: Option<Box<dyn Searcher>>,
        should: Option<Box<dyn Searcher>>,
        must_not: Option<Box<dyn Searcher>>,
        min_should: usize,
    ) -> Result<BooleanSearcher> {
        let count = match (&must, &should) {
            (Some(must), _) => must.count(),
            (None, Some(should)) => should.count(),
            (None, None) => 0,
        };
        Ok(BooleanSearcher {
            must,
            should,
            must_not,
            min_should,
            curr_should: None,
            should_done: false,
            curr_must_not: None,
            must_not_done: false,
            count,
        })
    }

    fn excluded(&mut self, ctx: &Context, doc: u64) -> Result<bool> {
        let must_not = match &mut self.must_not {
            Some(must_not) => must_not,
            None => return Ok(false),
        };

        loop {
            match &self.curr_must_not {
                Some(dm) if dm.number == doc => return Ok(true),
                Some(dm) if dm.number > doc => return Ok(false),
                _ if self.must_not_done => return Ok(false),
                _ => {
                    self.curr_must_not = must_not.advance(ctx, doc)?;
                    if self.curr_must_not.is_none() {
                        self.must_not_done = true;
                    }
                }
            }
        }
    }

    // the buffered should-match for `doc`, consumed on hit. Only used when
    // `must` drives the iteration.
    fn should_at(&mut self, ctx: &Context, doc: u64) -> Result<Option<DocumentMatch>> {
        let should = match &mut self.should {
            Some(should) => should,
            None => return Ok(None),
        };

        loop {
            match &self.curr_should {
                Some(dm) if dm.number == doc => return Ok(self.curr_should.take()),
                Some(dm) if dm.number > doc => return Ok(None),
                _ if self.should_done => return Ok(None),
                _ => {
                    self.curr_should = should.advance(ctx, doc)?;
                    if self.curr_should.is_none() {
                        self.should_done = true;
                    }
                }
            }
        }
    }

    fn validate_must(
        &mut self,
        ctx: &Context,
        candidate: DocumentMatch,
    ) -> Result<Option<DocumentMatch>> {
        if self.excluded(ctx, candidate.number)? {
            return Ok(None);
        }
        match self.should_at(ctx, candidate.number)? {
            Some(should_match) => Ok(Some(merge(candidate, should_match))),
            None if self.min_should == 0 => Ok(Some(candidate)),
            None => Ok(None),
        }
    }
}

impl Searcher for BooleanSearcher {
    fn next(&mut self, ctx: &Context) -> Result<Option<DocumentMatch>> {
        ctx.check()?;

        if self.must.is_some() {
            loop {
                let candidate = match self.must.as_mut().unwrap().next(ctx)? {
                    Some(candidate) => candidate,
                    None => return Ok(None),
                };
                if let Some(dm) = self.validate_must(ctx, candidate)? {
                    return Ok(Some(dm));
                }
            }
        }

        if self.should.is_some() {
            loop {
                let candidate = match self.should.as_mut().unwrap().next(ctx)? {
                    Some(candidate) => candidate,
                    None => return Ok(None),
                };
                if !self.excluded(ctx, candidate.number)? {
                    return Ok(Some(candidate));
                }
            }
        }

        // only must_not: nothing anchors the iteration
        Ok(None)
    }

    fn advance(&mut self, ctx: &Context, target: u64) -> Result<Option<DocumentMatch>> {
        ctx.check()?;

        if self.must.is_some() {
            let candidate = match self.must.as_mut().unwrap().advance(ctx, target)? {
                Some(candidate) => candidate,
                None => return Ok(None),
            };
            return match self.validate_must(ctx, candidate)? {
                Some(dm) => Ok(Some(dm)),
                None => self.next(ctx),
            };
        }

        if self.should.is_some() {
            let candidate = match self.should.as_mut().unwrap().advance(ctx, target)? {
                Some(candidate) => candidate,
                None => return Ok(None),
            };
            if !self.excluded(ctx, candidate.number)? {
                return Ok(Some(candidate));
            }
            return self.next(ctx);
        }

        Ok(None)
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn doc_match_pool_size(&self) -> usize {
        3
    }

    fn close(&mut self) -> Result<()> {
        for searcher in [&mut self.must, &mut self.should, &mut self.must_not]
            .iter_mut()
            .filter_map(|s| s.as_mut())
        {
            searcher.close()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "boolean_test.rs"]
mod boolean_test;
