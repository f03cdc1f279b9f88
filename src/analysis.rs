//! Module `analysis` define the contract between documents and the text
//! analysis pipeline, along with a minimal default tokenizer.
//!
//! Tokenizers, token filters and language-specific stemmers are external
//! collaborators; this package only consumes their output: a stream of
//! [Token]s per field. Position information is carried as deltas
//! ([Token::position_incr]); absolute positions are recovered by a running
//! sum while building a segment.

use crate::doc::{self, Document, Field, FieldOptions, FieldValue};

/// Classification tag assigned by the tokenizer.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum TokenType {
    Alphanumeric,
    Ideographic,
    Numeric,
    DateTime,
    /// Single CJK character token.
    Single,
    /// Shingle/bigram token assembled from adjacent tokens.
    Shingle,
}

/// One token produced by analysis.
#[derive(Clone, Debug)]
pub struct Token {
    pub term: Vec<u8>,
    /// Byte offset of the first byte of this token in the source text.
    pub start: usize,
    /// Byte offset one past the last byte of this token.
    pub end: usize,
    /// 1 advances to the next position, 0 overlays at the current position.
    pub position_incr: u32,
    pub typ: TokenType,
    /// Keyword tokens are exempt from downstream stemming.
    pub keyword: bool,
}

impl Token {
    pub fn new(term: Vec<u8>, start: usize, end: usize) -> Token {
        Token {
            term,
            start,
            end,
            position_incr: 1,
            typ: TokenType::Alphanumeric,
            keyword: false,
        }
    }
}

/// Analyzers turn field text into a token stream.
pub trait Analyzer: Send + Sync {
    fn analyze(&self, text: &str) -> Vec<Token>;
}

/// Default analyzer: split on non-alphanumeric boundaries, lowercase.
#[derive(Clone, Copy, Debug, Default)]
pub struct SimpleAnalyzer;

impl Analyzer for SimpleAnalyzer {
    fn analyze(&self, text: &str) -> Vec<Token> {
        let mut tokens = vec![];
        let mut start: Option<usize> = None;

        for (i, ch) in text.char_indices() {
            if ch.is_alphanumeric() {
                start.get_or_insert(i);
            } else if let Some(s) = start.take() {
                tokens.push(Token::new(text[s..i].to_lowercase().into_bytes(), s, i));
            }
        }
        if let Some(s) = start.take() {
            let end = text.len();
            tokens.push(Token::new(text[s..end].to_lowercase().into_bytes(), s, end));
        }

        tokens
    }
}

/// Analyzed form of one field: its token stream, options and the sideband
/// payloads destined for the stored-field and doc-value columns.
#[derive(Clone, Debug)]
pub struct AnalyzedField {
    pub name: String,
    pub options: FieldOptions,
    pub tokens: Vec<Token>,
    /// Total analyzed token count, the field length used for the norm.
    pub length: usize,
    /// Raw value for the stored-field column, when the field opted in.
    pub stored: Option<Vec<u8>>,
    /// Terms for the doc-value column, when the field opted in.
    pub doc_values: Vec<Vec<u8>>,
}

/// Analyzed form of a whole document.
#[derive(Clone, Debug)]
pub struct AnalyzedDocument {
    pub id: Vec<u8>,
    pub fields: Vec<AnalyzedField>,
}

/// Analyze every field of `doc`. Composite fields are assembled last, from
/// the token streams of the other indexed fields minus their exclusions; the
/// `_id` field never contributes to composites.
pub fn analyze_document(doc: &Document, analyzer: &dyn Analyzer) -> AnalyzedDocument {
    let id = doc.id();

    let mut fields: Vec<AnalyzedField> = vec![];
    let mut composites: Vec<&Field> = vec![];

    for field in doc.fields.iter() {
        match &field.value {
            FieldValue::Composite { .. } => composites.push(field),
            _ => fields.push(analyze_field(field, analyzer)),
        }
    }

    for composite in composites.into_iter() {
        let exclude = match &composite.value {
            FieldValue::Composite { exclude } => exclude,
            _ => unreachable!(),
        };

        let mut tokens = vec![];
        let mut length = 0;
        for af in fields.iter() {
            let excluded = af.name == doc::ID_FIELD || exclude.contains(&af.name);
            if excluded || !af.options.is_index() {
                continue;
            }
            // positions renumber contiguously across source fields
            for (i, token) in af.tokens.iter().enumerate() {
                let mut token = token.clone();
                if i == 0 {
                    token.position_incr = 1;
                }
                tokens.push(token);
            }
            length += af.length;
        }

        fields.push(AnalyzedField {
            name: composite.name.clone(),
            options: composite.options,
            tokens,
            length,
            stored: None,
            doc_values: vec![],
        });
    }

    AnalyzedDocument { id, fields }
}

fn analyze_field(field: &Field, analyzer: &dyn Analyzer) -> AnalyzedField {
    let (tokens, length) = match &field.value {
        FieldValue::Text(text) if field.options.is_keyword() => {
            let token = Token {
                term: text.as_bytes().to_vec(),
                start: 0,
                end: text.len(),
                position_incr: 1,
                typ: TokenType::Alphanumeric,
                keyword: true,
            };
            (vec![token], 1)
        }
        FieldValue::Text(text) => {
            let tokens = analyzer.analyze(text);
            let length = tokens.len();
            (tokens, length)
        }
        FieldValue::Numeric(num) => {
            let value = doc::numeric::f64_to_i64(*num);
            (trie_tokens(doc::numeric::trie_terms(value), TokenType::Numeric), 1)
        }
        FieldValue::Date(dt) => {
            let nanos = dt.timestamp_nanos();
            (trie_tokens(doc::numeric::trie_terms(nanos), TokenType::DateTime), 1)
        }
        FieldValue::GeoPoint { lng, lat } => {
            (trie_tokens(doc::geo::trie_terms(*lng, *lat), TokenType::Numeric), 1)
        }
        FieldValue::Composite { .. } => unreachable!(),
    };

    let stored = if field.options.is_store() {
        Some(field.value_bytes())
    } else {
        None
    };

    let doc_values = if field.options.is_doc_values() {
        match &field.value {
            // numeric-style fields record only the full-precision term
            FieldValue::Numeric(_) | FieldValue::Date(_) | FieldValue::GeoPoint { .. } => {
                vec![tokens[0].term.clone()]
            }
            _ => tokens.iter().map(|t| t.term.clone()).collect(),
        }
    } else {
        vec![]
    };

    AnalyzedField {
        name: field.name.clone(),
        options: field.options,
        tokens,
        length,
        stored,
        doc_values,
    }
}

// every trie level overlays at the same position.
fn trie_tokens(terms: Vec<Vec<u8>>, typ: TokenType) -> Vec<Token> {
    terms
        .into_iter()
        .enumerate()
        .map(|(i, term)| Token {
            term,
            start: 0,
            end: 0,
            position_incr: if i == 0 { 1 } else { 0 },
            typ,
            keyword: false,
        })
        .collect()
}

#[cfg(test)]
#[path = "analysis_test.rs"]
mod analysis_test;
