//! Collectors: consume a searcher's matches into a bounded, sorted result
//! set, feeding aggregations inline.

use std::cmp::Ordering;

use crate::{
    index::IndexReader,
    search::{
        aggregations::{Aggregations, Bucket},
        Context, DocumentMatch, Searcher, SortOrder,
    },
    Result,
};

/// Finished search output: the selected matches plus the aggregation
/// bucket computed over every match the searcher produced.
pub struct SearchResults {
    matches: Vec<DocumentMatch>,
    cursor: usize,
    aggregations: Bucket,
}

impl SearchResults {
    pub(crate) fn new(matches: Vec<DocumentMatch>, aggregations: Bucket) -> SearchResults {
        SearchResults {
            matches,
            cursor: 0,
            aggregations,
        }
    }

    /// Matches in result order.
    pub fn matches(&self) -> &[DocumentMatch] {
        &self.matches
    }

    /// Iterate matches one at a time.
    pub fn next(&mut self) -> Option<&DocumentMatch> {
        let dm = self.matches.get(self.cursor)?;
        self.cursor += 1;
        Some(dm)
    }

    pub fn aggregations(&self) -> &Bucket {
        &self.aggregations
    }

    pub(crate) fn aggregations_mut(&mut self) -> &mut Bucket {
        &mut self.aggregations
    }

    pub(crate) fn into_parts(self) -> (Vec<DocumentMatch>, Bucket) {
        (self.matches, self.aggregations)
    }
}

/// Bounded collector keeping the top `n` matches after `skip`, ordered by
/// `sort`. Supports cursor pagination: [TopNCollector::after] resumes past
/// a key, [TopNCollector::before] reverses the order and flips the result
/// back at the end.
pub struct TopNCollector {
    n: usize,
    skip: usize,
    sort: SortOrder,
    after: Option<Vec<Vec<u8>>>,
    reversed: bool,
}

impl TopNCollector {
    pub fn new(n: usize, skip: usize, sort: SortOrder) -> TopNCollector {
        TopNCollector {
            n,
            skip,
            sort,
            after: None,
            reversed: false,
        }
    }

    pub fn after(mut self, key: Vec<Vec<u8>>) -> TopNCollector {
        self.after = Some(key);
        self.reversed = false;
        self
    }

    pub fn before(mut self, key: Vec<Vec<u8>>) -> TopNCollector {
        self.after = Some(key);
        self.reversed = true;
        self
    }

    pub fn backing_size(&self) -> usize {
        self.n + self.skip + 1
    }

    pub fn collect(
        &self,
        ctx: &Context,
        searcher: &mut dyn Searcher,
        reader: &IndexReader,
        aggregations: &Aggregations,
    ) -> Result<SearchResults> {
        // cursor pagination walks the reversed order when paging backwards
        let order = match self.reversed {
            true => self.sort.reversed(),
            false => self.sort.clone(),
        };

        let mut needed_fields = order.fields();
        for field in aggregations.fields().into_iter() {
            if !needed_fields.contains(&field) {
                needed_fields.push(field);
            }
        }
        let dv_reader = reader.doc_values_reader(&needed_fields);

        let mut bucket = Bucket::new("", aggregations);
        let keep = self.n + self.skip;
        let prune_at = (keep * 2).max(1024);
        let mut kept: Vec<DocumentMatch> = vec![];

        while let Some(mut dm) = searcher.next(ctx)? {
            ctx.check()?;

            if !needed_fields.is_empty() {
                let values = &mut dm.doc_values;
                dv_reader.visit(dm.number, &mut |field, value| {
                    values
                        .entry(field.to_string())
                        .or_default()
                        .push(value.to_vec());
                })?;
            }
            dm.sort_value = order.key(&dm);

            // aggregations see every match, paginated or not
            bucket.consume(&dm);

            if let Some(after) = &self.after {
                if order.compare(&dm.sort_value, after) != Ordering::Greater {
                    continue;
                }
            }

            kept.push(dm);
            if kept.len() >= prune_at {
                kept.sort_by(|a, b| order.compare(&a.sort_value, &b.sort_value));
                kept.truncate(keep);
            }
        }
        searcher.close()?;
        bucket.finish();

        kept.sort_by(|a, b| order.compare(&a.sort_value, &b.sort_value));
        let mut matches: Vec<DocumentMatch> = kept
            .into_iter()
            .skip(self.skip)
            .take(self.n)
            .collect();
        if self.reversed {
            matches.reverse();
        }

        Ok(SearchResults::new(matches, bucket))
    }
}

/// Unbounded collector: every match, in ascending doc order.
pub struct AllCollector;

impl AllCollector {
    pub fn collect(
        &self,
        ctx: &Context,
        searcher: &mut dyn Searcher,
        reader: &IndexReader,
        aggregations: &Aggregations,
    ) -> Result<SearchResults> {
        let needed_fields = aggregations.fields();
        let dv_reader = reader.doc_values_reader(&needed_fields);

        let mut bucket = Bucket::new("", aggregations);
        let mut matches = vec![];

        while let Some(mut dm) = searcher.next(ctx)? {
            ctx.check()?;
            if !needed_fields.is_empty() {
                let values = &mut dm.doc_values;
                dv_reader.visit(dm.number, &mut |field, value| {
                    values
                        .entry(field.to_string())
                        .or_default()
                        .push(value.to_vec());
                })?;
            }
            bucket.consume(&dm);
            matches.push(dm);
        }
        searcher.close()?;
        bucket.finish();

        Ok(SearchResults::new(matches, bucket))
    }
}

#[cfg(test)]
#[path = "collector_test.rs"]
mod collector_test;
