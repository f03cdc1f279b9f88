//! Conjunction searcher: documents matching every child, scores summed.
//!
//! Each child's current match is cached so children advance in lockstep;
//! a child's overshoot becomes the next alignment target instead of a lost
//! match.

use crate::{
    search::{Context, DocumentMatch, Searcher},
    Result,
};

pub struct ConjunctionSearcher {
    searchers: Vec<Box<dyn Searcher>>,
    currs: Vec<Option<DocumentMatch>>,
    primed: bool,
    count: u64,
}

impl ConjunctionSearcher {
    pub fn new(searchers: Vec<Box<dyn Searcher>>) -> Result<ConjunctionSearcher> {
        let count = searchers.iter().map(|s| s.count()).min().unwrap_or(0);
        let currs = searchers.iter().map(|_| None).collect();
        Ok(ConjunctionSearcher {
            searchers,
            currs,
            primed: false,
            count,
        })
    }

    fn prime(&mut self, ctx: &Context) -> Result<()> {
        if !self.primed {
            for (i, searcher) in self.searchers.iter_mut().enumerate() {
                self.currs[i] = searcher.next(ctx)?;
            }
            self.primed = true;
        }
        Ok(())
    }

    // advance children until every cached match sits on the same doc, then
    // emit it and refill.
    fn align(&mut self, ctx: &Context) -> Result<Option<DocumentMatch>> {
        loop {
            ctx.check()?;

            let mut target = 0_u64;
            for curr in self.currs.iter() {
                match curr {
                    Some(dm) => target = target.max(dm.number),
                    None => return Ok(None),
                }
            }

            for i in 0..self.searchers.len() {
                let behind = matches!(&self.currs[i], Some(dm) if dm.number < target);
                if behind {
                    self.currs[i] = self.searchers[i].advance(ctx, target)?;
                    if self.currs[i].is_none() {
                        return Ok(None);
                    }
                }
            }

            let aligned = self
                .currs
                .iter()
                .all(|curr| matches!(curr, Some(dm) if dm.number == target));
            if !aligned {
                continue;
            }

            let mut acc: Option<DocumentMatch> = None;
            for i in 0..self.searchers.len() {
                let dm = self.currs[i].take().unwrap();
                acc = Some(match acc {
                    Some(acc) => merge(acc, dm),
                    None => dm,
                });
                self.currs[i] = self.searchers[i].next(ctx)?;
            }
            return Ok(acc.map(|mut dm| {
                dm.number = target;
                dm
            }));
        }
    }
}

pub(crate) fn merge(mut acc: DocumentMatch, other: DocumentMatch) -> DocumentMatch {
    acc.score += other.score;
    for (field, terms) in other.locations.into_iter() {
        let slot = acc.locations.entry(field).or_default();
        for (term, locs) in terms.into_iter() {
            slot.entry(term).or_default().extend(locs);
        }
    }
    if let Some(explanation) = other.explanation {
        match &mut acc.explanation {
            Some(acc_expl) => {
                acc_expl.value = acc.score;
                acc_expl.children.push(explanation);
            }
            None => acc.explanation = Some(explanation),
        }
    }
    acc
}

impl Searcher for ConjunctionSearcher {
    fn next(&mut self, ctx: &Context) -> Result<Option<DocumentMatch>> {
        ctx.check()?;
        if self.searchers.is_empty() {
            return Ok(None);
        }
        self.prime(ctx)?;
        self.align(ctx)
    }

    fn advance(&mut self, ctx: &Context, target: u64) -> Result<Option<DocumentMatch>> {
        ctx.check()?;
        if self.searchers.is_empty() {
            return Ok(None);
        }
        self.prime(ctx)?;

        for i in 0..self.searchers.len() {
            let behind = matches!(&self.currs[i], Some(dm) if dm.number < target);
            if behind {
                self.currs[i] = self.searchers[i].advance(ctx, target)?;
            }
        }
        self.align(ctx)
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn doc_match_pool_size(&self) -> usize {
        self.searchers.len() + 1
    }

    fn close(&mut self) -> Result<()> {
        for searcher in self.searchers.iter_mut() {
            searcher.close()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "conjunction_test.rs"]
mod conjunction_test;
