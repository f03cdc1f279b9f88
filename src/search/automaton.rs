//! Automaton-backed searchers: fuzzy, regexp, prefix and wildcard queries
//! compile to finite automata intersected with the per-field term
//! dictionaries; the surviving candidate terms feed a multi-term searcher.

use lazy_static::lazy_static;
use levenshtein_automata::{Distance, LevenshteinAutomatonBuilder, DFA, SINK_STATE};
use regex_automata::{dense, DFA as RegexDfa};

use std::sync::Arc;

use crate::{
    codec::Automaton,
    index::IndexReader,
    search::{term::multi_term_searcher, Searcher, SearcherOptions},
    util, Error, Result,
};

pub const MAX_FUZZINESS: u8 = 2;

lazy_static! {
    // reusable, thread-safe levenshtein builders, transposition-aware
    static ref LEV_BUILDERS: Vec<LevenshteinAutomatonBuilder> = vec![
        LevenshteinAutomatonBuilder::new(1, true),
        LevenshteinAutomatonBuilder::new(2, true),
    ];
}

/// Levenshtein DFA adapted to the dictionary-intersection contract.
pub struct LevAutomaton {
    dfa: DFA,
}

impl LevAutomaton {
    pub fn new(term: &str, fuzziness: u8) -> Result<LevAutomaton> {
        if fuzziness == 0 || fuzziness > MAX_FUZZINESS {
            return err_at!(InvalidInput, msg: "fuzziness {} out of range", fuzziness);
        }
        let dfa = LEV_BUILDERS[(fuzziness - 1) as usize].build_dfa(term);
        Ok(LevAutomaton { dfa })
    }
}

impl Automaton for LevAutomaton {
    fn start(&self) -> u32 {
        self.dfa.initial_state()
    }

    fn is_match(&self, state: u32) -> bool {
        matches!(self.dfa.distance(state), Distance::Exact(_))
    }

    fn can_match(&self, state: u32) -> bool {
        state != SINK_STATE
    }

    fn accept(&self, state: u32, byte: u8) -> u32 {
        self.dfa.transition(state, byte)
    }
}

/// Anchored regular expression DFA.
pub struct RegexAutomaton {
    dfa: dense::DenseDFA<Vec<u32>, u32>,
}

impl RegexAutomaton {
    pub fn new(pattern: &str) -> Result<RegexAutomaton> {
        let dfa = err_at!(
            InvalidInput,
            dense::Builder::new()
                .anchored(true)
                .build_with_size::<u32>(pattern),
            "pattern {:?}", pattern
        )?;
        Ok(RegexAutomaton { dfa })
    }
}

impl Automaton for RegexAutomaton {
    fn start(&self) -> u32 {
        self.dfa.start_state()
    }

    fn is_match(&self, state: u32) -> bool {
        self.dfa.is_match_state(state)
    }

    fn can_match(&self, state: u32) -> bool {
        !self.dfa.is_dead_state(state)
    }

    fn accept(&self, state: u32, byte: u8) -> u32 {
        self.dfa.next_state(state, byte)
    }
}

/// Matches every term carrying the given prefix.
pub struct PrefixAutomaton {
    prefix: Vec<u8>,
}

const PREFIX_DEAD: u32 = u32::MAX;

impl PrefixAutomaton {
    pub fn new(prefix: &[u8]) -> PrefixAutomaton {
        PrefixAutomaton {
            prefix: prefix.to_vec(),
        }
    }
}

impl Automaton for PrefixAutomaton {
    fn start(&self) -> u32 {
        0
    }

    fn is_match(&self, state: u32) -> bool {
        state != PREFIX_DEAD && state as usize >= self.prefix.len()
    }

    fn can_match(&self, state: u32) -> bool {
        state != PREFIX_DEAD
    }

    fn accept(&self, state: u32, byte: u8) -> u32 {
        let at = state as usize;
        if state == PREFIX_DEAD {
            PREFIX_DEAD
        } else if at >= self.prefix.len() {
            state // inside the subtree, everything matches
        } else if self.prefix[at] == byte {
            state + 1
        } else {
            PREFIX_DEAD
        }
    }
}

// collect dictionary terms matching the automaton, bounded by the clause
// budget. `prefix` narrows the scanned key range when known.
fn candidate_terms(
    reader: &IndexReader,
    field: &str,
    automaton: Arc<dyn Automaton>,
    prefix: &[u8],
) -> Result<Vec<Vec<u8>>> {
    let max = reader.config().max_clause_count();

    let (start, end) = match prefix.is_empty() {
        true => (None, None),
        false => (Some(prefix.to_vec()), util::increment_bytes(prefix)),
    };

    let mut cursor = reader.dictionary_iterator(
        field,
        Some(automaton),
        start.as_deref(),
        end.as_deref(),
    )?;

    let mut terms = vec![];
    while let Some(entry) = cursor.next()? {
        terms.push(entry.term);
        if terms.len() > max {
            return err_at!(
                QueryTooBroad, msg: "field {} expands past {} terms", field, max
            );
        }
    }
    Ok(terms)
}

/// Fuzzy searcher: terms within edit distance `fuzziness` of `term`,
/// optionally anchored on a literal prefix.
pub fn fuzzy_searcher(
    reader: &IndexReader,
    field: &str,
    term: &str,
    fuzziness: u8,
    prefix_len: usize,
    boost: f64,
    options: SearcherOptions,
) -> Result<Box<dyn Searcher>> {
    // the prefix is runes, not bytes
    let prefix: String = term.chars().take(prefix_len).collect();
    let automaton = Arc::new(LevAutomaton::new(term, fuzziness)?);

    let terms = candidate_terms(reader, field, automaton, prefix.as_bytes())?;
    multi_term_searcher(reader, field, terms, boost, options, true)
}

/// Regexp searcher over one field's dictionary.
pub fn regexp_searcher(
    reader: &IndexReader,
    field: &str,
    pattern: &str,
    boost: f64,
    options: SearcherOptions,
) -> Result<Box<dyn Searcher>> {
    let automaton = Arc::new(RegexAutomaton::new(pattern)?);
    let terms = candidate_terms(reader, field, automaton, b"")?;
    multi_term_searcher(reader, field, terms, boost, options, true)
}

/// Prefix searcher.
pub fn prefix_searcher(
    reader: &IndexReader,
    field: &str,
    prefix: &[u8],
    boost: f64,
    options: SearcherOptions,
) -> Result<Box<dyn Searcher>> {
    let automaton = Arc::new(PrefixAutomaton::new(prefix));
    let terms = candidate_terms(reader, field, automaton, prefix)?;
    multi_term_searcher(reader, field, terms, boost, options, true)
}

/// Wildcard searcher; `*` matches any run, `?` any single character.
pub fn wildcard_searcher(
    reader: &IndexReader,
    field: &str,
    wildcard: &str,
    boost: f64,
    options: SearcherOptions,
) -> Result<Box<dyn Searcher>> {
    let pattern = wildcard_to_regex(wildcard);
    regexp_searcher(reader, field, &pattern, boost, options)
}

fn wildcard_to_regex(wildcard: &str) -> String {
    let mut pattern = String::with_capacity(wildcard.len() * 2);
    for ch in wildcard.chars() {
        match ch {
            '*' => pattern.push_str(".*"),
            '?' => pattern.push('.'),
            ch => pattern.push_str(&regex::escape(&ch.to_string())),
        }
    }
    pattern
}

#[cfg(test)]
#[path = "automaton_test.rs"]
mod automaton_test;
