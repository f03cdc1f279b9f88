//! Range searchers: raw term ranges, numeric trie ranges and date ranges.

use chrono::{DateTime, Utc};

use crate::{
    doc::numeric::{self, PRECISION_STEP},
    index::IndexReader,
    search::{term::multi_term_searcher, Searcher, SearcherOptions},
    util, Error, Result,
};

// collect dictionary terms within [start, end), bounded by the clause
// budget.
fn range_terms(
    reader: &IndexReader,
    field: &str,
    start: Option<&[u8]>,
    end: Option<&[u8]>,
    terms: &mut Vec<Vec<u8>>,
) -> Result<()> {
    let max = reader.config().max_clause_count();
    let mut cursor = reader.dictionary_iterator(field, None, start, end)?;
    while let Some(entry) = cursor.next()? {
        terms.push(entry.term);
        if terms.len() > max {
            return err_at!(QueryTooBroad, msg: "field {} range expands past {}", field, max);
        }
    }
    Ok(())
}

/// Searcher over terms within `[min, max]` with inclusive/exclusive bounds.
pub fn term_range_searcher(
    reader: &IndexReader,
    field: &str,
    min: Option<&[u8]>,
    max: Option<&[u8]>,
    min_inclusive: bool,
    max_inclusive: bool,
    boost: f64,
    options: SearcherOptions,
) -> Result<Box<dyn Searcher>> {
    // normalize to the half-open [start, end) the dictionary understands;
    // term + 0x00 is the smallest strict successor
    let start = min.map(|min| match min_inclusive {
        true => min.to_vec(),
        false => {
            let mut t = min.to_vec();
            t.push(0);
            t
        }
    });
    let end = max.map(|max| match max_inclusive {
        true => {
            let mut t = max.to_vec();
            t.push(0);
            t
        }
        false => max.to_vec(),
    });

    let mut terms = vec![];
    range_terms(reader, field, start.as_deref(), end.as_deref(), &mut terms)?;
    multi_term_searcher(reader, field, terms, boost, options, true)
}

fn trie_range_terms(
    reader: &IndexReader,
    field: &str,
    min: i64,
    max: i64,
) -> Result<Vec<Vec<u8>>> {
    let mut terms = vec![];
    for range in numeric::split_range_i64(min, max, PRECISION_STEP).into_iter() {
        // the split yields inclusive bounds per trie level
        let end = util::increment_bytes(&range.high).unwrap_or_default();
        range_terms(reader, field, Some(&range.low), Some(&end), &mut terms)?;
    }
    Ok(terms)
}

/// Numeric range searcher over the prefix-coded trie terms.
pub fn numeric_range_searcher(
    reader: &IndexReader,
    field: &str,
    min: Option<f64>,
    max: Option<f64>,
    min_inclusive: bool,
    max_inclusive: bool,
    boost: f64,
    options: SearcherOptions,
) -> Result<Box<dyn Searcher>> {
    let min = match (min, min_inclusive) {
        (None, _) => i64::MIN,
        (Some(v), true) => numeric::f64_to_i64(v),
        (Some(v), false) => numeric::f64_to_i64(v).saturating_add(1),
    };
    let max = match (max, max_inclusive) {
        (None, _) => i64::MAX,
        (Some(v), true) => numeric::f64_to_i64(v),
        (Some(v), false) => numeric::f64_to_i64(v).saturating_sub(1),
    };

    let terms = trie_range_terms(reader, field, min, max)?;
    multi_term_searcher(reader, field, terms, boost, options, true)
}

/// Date range searcher; bounds in UNIX nanoseconds on the same trie.
pub fn date_range_searcher(
    reader: &IndexReader,
    field: &str,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    start_inclusive: bool,
    end_inclusive: bool,
    boost: f64,
    options: SearcherOptions,
) -> Result<Box<dyn Searcher>> {
    let min = match (start, start_inclusive) {
        (None, _) => i64::MIN,
        (Some(dt), true) => dt.timestamp_nanos(),
        (Some(dt), false) => dt.timestamp_nanos().saturating_add(1),
    };
    let max = match (end, end_inclusive) {
        (None, _) => i64::MAX,
        (Some(dt), true) => dt.timestamp_nanos(),
        (Some(dt), false) => dt.timestamp_nanos().saturating_sub(1),
    };

    let terms = trie_range_terms(reader, field, min, max)?;
    multi_term_searcher(reader, field, terms, boost, options, true)
}

#[cfg(test)]
#[path = "range_test.rs"]
mod range_test;
