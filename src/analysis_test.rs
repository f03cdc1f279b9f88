use super::*;
use crate::doc::{Document, Field};

#[test]
fn test_simple_analyzer() {
    let tokens = SimpleAnalyzer.analyze("Angst beer, couch database");
    let terms: Vec<&[u8]> = tokens.iter().map(|t| t.term.as_slice()).collect();
    assert_eq!(
        terms,
        vec![
            b"angst".as_ref(),
            b"beer".as_ref(),
            b"couch".as_ref(),
            b"database".as_ref()
        ]
    );

    // offsets address the source text
    assert_eq!((tokens[0].start, tokens[0].end), (0, 5));
    assert_eq!((tokens[1].start, tokens[1].end), (6, 10));
    for token in tokens.iter() {
        assert_eq!(token.position_incr, 1);
    }
}

#[test]
fn test_analyze_document() {
    let doc = Document::new("a")
        .add_field(Field::text("name", "marty").store_value())
        .add_field(Field::text("desc", "gophercon india"))
        .add_field(Field::composite("_all", vec![]));

    let analyzed = analyze_document(&doc, &SimpleAnalyzer);
    assert_eq!(analyzed.id, b"a".to_vec());

    let names: Vec<&str> = analyzed.fields.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["_id", "name", "desc", "_all"]);

    let name = &analyzed.fields[1];
    assert_eq!(name.length, 1);
    assert_eq!(name.stored.as_deref(), Some(b"marty".as_ref()));

    // composite spans name and desc but never _id
    let all = analyzed.fields.last().unwrap();
    assert_eq!(all.length, 3);
    let terms: Vec<&[u8]> = all.tokens.iter().map(|t| t.term.as_slice()).collect();
    assert_eq!(
        terms,
        vec![b"marty".as_ref(), b"gophercon".as_ref(), b"india".as_ref()]
    );
}

#[test]
fn test_keyword_field() {
    let doc = Document::new("a").add_field(Field::keyword("tag", "Exact Phrase"));
    let analyzed = analyze_document(&doc, &SimpleAnalyzer);

    let tag = &analyzed.fields[1];
    assert_eq!(tag.tokens.len(), 1);
    assert_eq!(tag.tokens[0].term, b"Exact Phrase".to_vec());
    assert!(tag.tokens[0].keyword);
}

#[test]
fn test_numeric_field_tokens() {
    let doc = Document::new("a").add_field(Field::numeric("count", 42.0));
    let analyzed = analyze_document(&doc, &SimpleAnalyzer);

    let count = &analyzed.fields[1];
    assert_eq!(count.tokens.len(), crate::doc::numeric::N_TRIE_LEVELS);
    assert_eq!(count.length, 1);
    // trie levels overlay at one position
    assert_eq!(count.tokens[0].position_incr, 1);
    for token in count.tokens[1..].iter() {
        assert_eq!(token.position_incr, 0);
    }
    // doc values carry only the full-precision term
    assert_eq!(count.doc_values.len(), 1);
    assert_eq!(count.doc_values[0], count.tokens[0].term);
}

#[test]
fn test_composite_excludes() {
    let doc = Document::new("a")
        .add_field(Field::text("name", "marty"))
        .add_field(Field::text("secret", "hidden"))
        .add_field(Field::composite("_all", vec!["secret".to_string()]));

    let analyzed = analyze_document(&doc, &SimpleAnalyzer);
    let all = analyzed.fields.last().unwrap();
    let terms: Vec<&[u8]> = all.tokens.iter().map(|t| t.term.as_slice()).collect();
    assert_eq!(terms, vec![b"marty".as_ref()]);
}
