//! Disjunction searcher: documents matching at least `min` children,
//! matching children's scores summed.

use crate::{
    search::{conjunction::merge, Context, DocumentMatch, Searcher},
    Result,
};

pub struct DisjunctionSearcher {
    searchers: Vec<Box<dyn Searcher>>,
    heads: Vec<Option<DocumentMatch>>,
    min: usize,
    /// Multiply scores by matched/total.
    coord: bool,
    primed: bool,
    count: u64,
}

impl DisjunctionSearcher {
    pub fn new(
        searchers: Vec<Box<dyn Searcher>>,
        min: usize,
        coord: bool,
    ) -> Result<DisjunctionSearcher> {
        let count = searchers.iter().map(|s| s.count()).sum();
        let heads = searchers.iter().map(|_| None).collect();
        Ok(DisjunctionSearcher {
            searchers,
            heads,
            min: min.max(1),
            coord,
            primed: false,
            count,
        })
    }

    fn prime(&mut self, ctx: &Context) -> Result<()> {
        if !self.primed {
            for (i, searcher) in self.searchers.iter_mut().enumerate() {
                self.heads[i] = searcher.next(ctx)?;
            }
            self.primed = true;
        }
        Ok(())
    }

    fn min_doc(&self) -> Option<u64> {
        self.heads
            .iter()
            .filter_map(|head| head.as_ref().map(|dm| dm.number))
            .min()
    }

    // gather every head at `doc`, refill those children, and yield when
    // enough children matched.
    fn gather(&mut self, ctx: &Context, doc: u64) -> Result<Option<DocumentMatch>> {
        let mut acc: Option<DocumentMatch> = None;
        let mut matched = 0;

        for i in 0..self.searchers.len() {
            let hit = matches!(&self.heads[i], Some(dm) if dm.number == doc);
            if hit {
                let dm = self.heads[i].take().unwrap();
                acc = Some(match acc {
                    Some(acc) => merge(acc, dm),
                    None => dm,
                });
                matched += 1;
                self.heads[i] = self.searchers[i].next(ctx)?;
            }
        }

        match acc {
            Some(mut dm) if matched >= self.min => {
                if self.coord {
                    dm.score *= matched as f64 / self.searchers.len() as f64;
                }
                Ok(Some(dm))
            }
            _ => Ok(None),
        }
    }
}

impl Searcher for DisjunctionSearcher {
    fn next(&mut self, ctx: &Context) -> Result<Option<DocumentMatch>> {
        ctx.check()?;
        self.prime(ctx)?;

        while let Some(doc) = self.min_doc() {
            ctx.check()?;
            if let Some(dm) = self.gather(ctx, doc)? {
                return Ok(Some(dm));
            }
        }
        Ok(None)
    }

    fn advance(&mut self, ctx: &Context, target: u64) -> Result<Option<DocumentMatch>> {
        ctx.check()?;
        self.prime(ctx)?;

        for i in 0..self.searchers.len() {
            let stale = match &self.heads[i] {
                Some(dm) => dm.number < target,
                None => false,
            };
            if stale {
                self.heads[i] = self.searchers[i].advance(ctx, target)?;
            }
        }

        while let Some(doc) = self.min_doc() {
            ctx.check()?;
            if let Some(dm) = self.gather(ctx, doc)? {
                return Ok(Some(dm));
            }
        }
        Ok(None)
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
#[path = "disjunction_test.rs"]
mod disjunction_test;
