//! Phrase and sloppy-phrase searcher.
//!
//! A phrase is a sequence of positions, each accepting any of several terms;
//! an empty position is a gap matching any single token. Candidate documents
//! come from a conjunction over per-position term disjunctions (locations
//! forced on); a candidate matches when at least one ordered path through
//! its token locations satisfies the slop budget.

use std::collections::HashMap;

use crate::{
    codec::Location,
    index::IndexReader,
    search::{
        conjunction::ConjunctionSearcher, disjunction::DisjunctionSearcher,
        term::TermSearcher, Context, DocumentMatch, LocationMap, Searcher,
        SearcherOptions,
    },
    Result,
};

/// One position of a phrase: the acceptable terms, or a gap.
#[derive(Clone, Debug)]
pub enum PhrasePart {
    Terms(Vec<Vec<u8>>),
    Gap,
}

pub struct PhraseSearcher {
    inner: ConjunctionSearcher,
    field: String,
    parts: Vec<PhrasePart>,
    slop: u32,
    count: u64,
}

impl PhraseSearcher {
    pub fn new(
        reader: &IndexReader,
        field: &str,
        parts: Vec<PhrasePart>,
        slop: u32,
        boost: f64,
        options: SearcherOptions,
    ) -> Result<PhraseSearcher> {
        // phrase validation needs term locations regardless of the request
        let options = SearcherOptions {
            include_locations: true,
            ..options
        };

        let mut children: Vec<Box<dyn Searcher>> = vec![];
        for part in parts.iter() {
            if let PhrasePart::Terms(terms) = part {
                let mut alts: Vec<Box<dyn Searcher>> = vec![];
                for term in terms.iter() {
                    alts.push(Box::new(TermSearcher::new(
                        reader, field, term, boost, options,
                    )?));
                }
                children.push(Box::new(DisjunctionSearcher::new(alts, 1, false)?));
            }
        }

        let inner = ConjunctionSearcher::new(children)?;
        let count = inner.count();

        Ok(PhraseSearcher {
            inner,
            field: field.to_string(),
            parts,
            slop,
            count,
        })
    }

    // check a candidate against the location constraint, rewriting its
    // locations to the participating ones when it matches.
    fn validate(&self, mut dm: DocumentMatch) -> Option<DocumentMatch> {
        let by_term = dm.locations.get(&self.field)?;

        let paths = find_phrase_paths(&self.parts, by_term, self.slop);
        if paths.is_empty() {
            return None;
        }

        let mut locations: LocationMap = HashMap::new();
        let slot = locations.entry(self.field.clone()).or_default();
        for (term, loc) in paths.into_iter().flatten() {
            let locs = slot.entry(term).or_default();
            if !locs.contains(&loc) {
                locs.push(loc);
            }
        }
        dm.locations = locations;
        Some(dm)
    }
}

impl Searcher for PhraseSearcher {
    fn next(&mut self, ctx: &Context) -> Result<Option<DocumentMatch>> {
        loop {
            ctx.check()?;
            match self.inner.next(ctx)? {
                Some(dm) => {
                    if let Some(dm) = self.validate(dm) {
                        return Ok(Some(dm));
                    }
                }
                None => return Ok(None),
            }
        }
    }

    fn advance(&mut self, ctx: &Context, target: u64) -> Result<Option<DocumentMatch>> {
        ctx.check()?;
        match self.inner.advance(ctx, target)? {
            Some(dm) => match self.validate(dm) {
                Some(dm) => Ok(Some(dm)),
                None => self.next(ctx),
            },
            None => Ok(None),
        }
    }

    fn count(&self) -> u64 {
        self.count
    }

    fn doc_match_pool_size(&self) -> usize {
        self.parts.len() + 1
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

/// Enumerate ordered location sequences satisfying the phrase. A step from
/// position `i` to `i+1` costs `|posDiff - expected|` slop, where gaps raise
/// the expected difference. Paths whose accumulated cost exceeds `slop` are
/// pruned.
pub fn find_phrase_paths(
    parts: &[PhrasePart],
    by_term: &HashMap<Vec<u8>, Vec<Location>>,
    slop: u32,
) -> Vec<Vec<(Vec<u8>, Location)>> {
    // locations of the terms acceptable at each non-gap position, plus the
    // gap widths preceding them
    let mut steps: Vec<(u32, Vec<(&Vec<u8>, &Location)>)> = vec![];
    let mut gap = 0_u32;
    for part in parts.iter() {
        match part {
            PhrasePart::Gap => gap += 1,
            PhrasePart::Terms(terms) => {
                let mut options = vec![];
                for term in terms.iter() {
                    if let Some(locs) = by_term.get(term) {
                        for loc in locs.iter() {
                            options.push((term, loc));
                        }
                    }
                }
                steps.push((gap, options));
                gap = 0;
            }
        }
    }
    if steps.is_empty() {
        return vec![];
    }

    let mut paths = vec![];
    for (_, first_options) in steps.first().iter() {
        for (term, loc) in first_options.iter() {
            let path = vec![((*term).clone(), (*loc).clone())];
            descend(&steps, 1, loc.pos, 0, path, slop, &mut paths);
        }
    }
    paths
}

fn descend(
    steps: &[(u32, Vec<(&Vec<u8>, &Location)>)],
    depth: usize,
    prev_pos: u32,
    used_slop: u32,
    path: Vec<(Vec<u8>, Location)>,
    slop: u32,
    paths: &mut Vec<Vec<(Vec<u8>, Location)>>,
) {
    if depth == steps.len() {
        paths.push(path);
        return;
    }

    let (gap, options) = &steps[depth];
    let expected = prev_pos + 1 + gap;
    for (term, loc) in options.iter() {
        if loc.pos <= prev_pos && slop == 0 {
            continue;
        }
        let cost = (loc.pos as i64 - expected as i64).unsigned_abs() as u32;
        if used_slop + cost > slop {
            continue;
        }
        let mut path = path.clone();
        path.push(((*term).clone(), (*loc).clone()));
        descend(steps, depth + 1, loc.pos, used_slop + cost, path, slop, paths);
    }
}

#[cfg(test)]
#[path = "phrase_test.rs"]
mod phrase_test;
