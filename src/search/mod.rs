//! Module `search` implement search execution over a snapshot.
//!
//! A query compiles into a tree of [Searcher]s driven in ascending global
//! document number order. Matches are scored by a pluggable [Similarity]
//! (BM25 by default), gathered by a [collector][collector::TopNCollector],
//! and optionally folded into [aggregations].

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicBool, Ordering::SeqCst},
        Arc,
    },
    time::{Duration, Instant},
};

use crate::{codec::Location, Error, Result};

pub mod aggregations;
pub mod automaton;
pub mod boolean;
pub mod collector;
pub mod conjunction;
pub mod disjunction;
pub mod geo;
pub mod matchall;
pub mod multi;
pub mod phrase;
pub mod range;
pub mod sort;
pub mod term;

pub use collector::{AllCollector, SearchResults, TopNCollector};
pub use sort::{SortBy, SortOrder};

/// Cancellation and deadline context threaded through search execution.
/// Every searcher polls it at natural iteration boundaries.
#[derive(Clone, Default)]
pub struct Context {
    deadline: Option<Instant>,
    cancel: Option<Arc<AtomicBool>>,
}

impl Context {
    /// A context that never expires.
    pub fn background() -> Context {
        Context::default()
    }

    pub fn with_deadline(deadline: Instant) -> Context {
        Context {
            deadline: Some(deadline),
            cancel: None,
        }
    }

    pub fn with_timeout(timeout: Duration) -> Context {
        Context::with_deadline(Instant::now() + timeout)
    }

    pub fn with_cancel(cancel: Arc<AtomicBool>) -> Context {
        Context {
            deadline: None,
            cancel: Some(cancel),
        }
    }

    /// Fail with `SearchAborted` once canceled or past the deadline.
    pub fn check(&self) -> Result<()> {
        if let Some(cancel) = &self.cancel {
            if cancel.load(SeqCst) {
                return err_at!(SearchAborted, msg: "canceled");
            }
        }
        if let Some(deadline) = &self.deadline {
            if Instant::now() >= *deadline {
                return err_at!(SearchAborted, msg: "deadline exceeded");
            }
        }
        Ok(())
    }
}

/// Per-field, per-term locations of a match.
pub type LocationMap = HashMap<String, HashMap<Vec<u8>, Vec<Location>>>;

/// One matching document, in global doc number space.
#[derive(Clone, Debug, Default)]
pub struct DocumentMatch {
    pub number: u64,
    pub score: f64,
    pub locations: LocationMap,
    pub sort_value: Vec<Vec<u8>>,
    pub explanation: Option<Explanation>,
    /// Doc-values loaded for sorting/aggregation, keyed by field.
    pub doc_values: HashMap<String, Vec<Vec<u8>>>,
}

impl DocumentMatch {
    pub(crate) fn add_locations(&mut self, field: &str, term: &[u8], locs: &[Location]) {
        if locs.is_empty() {
            return;
        }
        self.locations
            .entry(field.to_string())
            .or_default()
            .entry(term.to_vec())
            .or_default()
            .extend_from_slice(locs);
    }

    /// First doc-value for a field, if loaded.
    pub fn doc_value(&self, field: &str) -> Option<&[u8]> {
        self.doc_values
            .get(field)
            .and_then(|values| values.first())
            .map(|v| v.as_slice())
    }
}

/// Tree-shaped account of how a score came to be.
#[derive(Clone, Debug, Default)]
pub struct Explanation {
    pub value: f64,
    pub message: String,
    pub children: Vec<Explanation>,
}

impl Explanation {
    pub fn new(value: f64, message: String) -> Explanation {
        Explanation {
            value,
            message,
            children: vec![],
        }
    }

    pub fn with_children(
        value: f64,
        message: String,
        children: Vec<Explanation>,
    ) -> Explanation {
        Explanation {
            value,
            message,
            children,
        }
    }

    fn render(&self, f: &mut std::fmt::Formatter, depth: usize) -> std::fmt::Result {
        writeln!(f, "{}{} ({})", "  ".repeat(depth), self.value, self.message)?;
        for child in self.children.iter() {
            child.render(f, depth + 1)?;
        }
        Ok(())
    }
}

impl std::fmt::Display for Explanation {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        self.render(f, 0)
    }
}

/// Options resolved from the request before compiling searchers.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearcherOptions {
    pub explain: bool,
    pub include_locations: bool,
}

/// A stream of matches in ascending global doc number order.
pub trait Searcher: Send {
    fn next(&mut self, ctx: &Context) -> Result<Option<DocumentMatch>>;

    /// Skip to the first match with `number >= target`.
    fn advance(&mut self, ctx: &Context, target: u64) -> Result<Option<DocumentMatch>>;

    /// Upper-bound cost estimate of the match count.
    fn count(&self) -> u64;

    /// Hint for pre-sizing match allocation pools.
    fn doc_match_pool_size(&self) -> usize {
        1
    }

    fn close(&mut self) -> Result<()> {
        Ok(())
    }
}

/// Collection-level statistics handed to a [Similarity].
#[derive(Clone, Copy, Debug, Default)]
pub struct CollectionStats {
    /// Documents carrying the field.
    pub doc_count: u64,
    /// Mean field length in tokens.
    pub avg_length: f64,
}

/// Per-term scoring rule produced by a [Similarity].
pub trait TermScorer: Send + Sync {
    fn score(&self, freq: u32, norm: u32) -> f64;
    fn explain(&self, freq: u32, norm: u32) -> Explanation;
}

/// Pluggable scoring model.
pub trait Similarity: Send + Sync {
    fn scorer(
        &self,
        boost: f64,
        stats: CollectionStats,
        doc_freq: u64,
    ) -> Box<dyn TermScorer>;
}

/// BM25 with the standard parameters.
#[derive(Clone, Copy, Debug)]
pub struct Bm25Similarity {
    pub k1: f64,
    pub b: f64,
}

impl Default for Bm25Similarity {
    fn default() -> Bm25Similarity {
        Bm25Similarity { k1: 1.2, b: 0.75 }
    }
}

impl Similarity for Bm25Similarity {
    fn scorer(
        &self,
        boost: f64,
        stats: CollectionStats,
        doc_freq: u64,
    ) -> Box<dyn TermScorer> {
        let n = stats.doc_count.max(1) as f64;
        let df = doc_freq as f64;
        let idf = (1.0 + (n - df + 0.5) / (df + 0.5)).ln();

        Box::new(Bm25Scorer {
            k1: self.k1,
            b: self.b,
            boost,
            idf,
            avg_length: stats.avg_length.max(1.0),
        })
    }
}

struct Bm25Scorer {
    k1: f64,
    b: f64,
    boost: f64,
    idf: f64,
    avg_length: f64,
}

impl Bm25Scorer {
    fn tf(&self, freq: u32, norm: u32) -> f64 {
        // norm carries the raw bits of f32(field length in tokens)
        let dl = (f32::from_bits(norm) as f64).max(1.0);
        let freq = freq as f64;
        freq * (self.k1 + 1.0)
            / (freq + self.k1 * (1.0 - self.b + self.b * dl / self.avg_length))
    }
}

impl TermScorer for Bm25Scorer {
    fn score(&self, freq: u32, norm: u32) -> f64 {
        self.boost * self.idf * self.tf(freq, norm)
    }

    fn explain(&self, freq: u32, norm: u32) -> Explanation {
        let tf = self.tf(freq, norm);
        Explanation::with_children(
            self.score(freq, norm),
            format!("score(boost={})", self.boost),
            vec![
                Explanation::new(self.idf, "idf".to_string()),
                Explanation::new(tf, format!("tf(freq={})", freq)),
            ],
        )
    }
}
