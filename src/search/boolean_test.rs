use super::*;

use crate::{
    doc::{Document, Field},
    index::{Config, IndexReader, Writer},
    search::{disjunction::DisjunctionSearcher, term::TermSearcher, SearcherOptions},
};

fn sample_reader() -> (Writer, IndexReader) {
    let writer = Writer::open(Config::in_memory()).unwrap();
    let docs = vec![
        ("a", "angst beer couch database"),
        ("b", "angst couch"),
        ("c", "beer database"),
        ("d", "angst beer"),
    ];
    for (id, desc) in docs.into_iter() {
        let doc = Document::new(id).add_field(Field::text("desc", desc));
        writer.update(id.as_bytes(), doc).unwrap();
    }
    let reader = writer.reader().unwrap();
    (writer, reader)
}

fn term(reader: &IndexReader, term: &[u8]) -> Box<dyn Searcher> {
    Box::new(
        TermSearcher::new(reader, "desc", term, 1.0, SearcherOptions::default()).unwrap(),
    )
}

fn collect(searcher: &mut dyn Searcher) -> Vec<u64> {
    let ctx = Context::background();
    let mut docs = vec![];
    while let Some(dm) = searcher.next(&ctx).unwrap() {
        docs.push(dm.number);
    }
    docs
}

#[test]
fn test_must_with_must_not() {
    let (writer, reader) = sample_reader();

    // angst AND NOT beer -> doc b only
    let mut searcher = BooleanSearcher::new(
        Some(term(&reader, b"angst")),
        None,
        Some(term(&reader, b"beer")),
        0,
    )
    .unwrap();
    assert_eq!(collect(&mut searcher), vec![1]);

    writer.close().unwrap();
}

#[test]
fn test_must_with_should() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    // must couch, should database: both docs match, doc a scores higher
    let should = Box::new(
        DisjunctionSearcher::new(vec![term(&reader, b"database")], 1, false).unwrap(),
    );
    let mut searcher =
        BooleanSearcher::new(Some(term(&reader, b"couch")), Some(should), None, 0).unwrap();

    let first = searcher.next(&ctx).unwrap().unwrap();
    let second = searcher.next(&ctx).unwrap().unwrap();
    assert!(searcher.next(&ctx).unwrap().is_none());

    assert_eq!(first.number, 0);
    assert_eq!(second.number, 1);
    assert!(first.score > second.score);

    writer.close().unwrap();
}

#[test]
fn test_min_should_required() {
    let (writer, reader) = sample_reader();

    // must angst, min 1 should of database -> only doc a
    let should = Box::new(
        DisjunctionSearcher::new(vec![term(&reader, b"database")], 1, false).unwrap(),
    );
    let mut searcher =
        BooleanSearcher::new(Some(term(&reader, b"angst")), Some(should), None, 1).unwrap();
    assert_eq!(collect(&mut searcher), vec![0]);

    writer.close().unwrap();
}

#[test]
fn test_should_only() {
    let (writer, reader) = sample_reader();

    let should = Box::new(
        DisjunctionSearcher::new(vec![term(&reader, b"database")], 1, false).unwrap(),
    );
    let mut searcher = BooleanSearcher::new(None, Some(should), None, 0).unwrap();
    assert_eq!(collect(&mut searcher), vec![0, 2]);

    writer.close().unwrap();
}

#[test]
fn test_must_not_only_yields_nothing() {
    let (writer, reader) = sample_reader();

    // no anchor to iterate from
    let mut searcher =
        BooleanSearcher::new(None, None, Some(term(&reader, b"angst")), 0).unwrap();
    assert_eq!(collect(&mut searcher), Vec::<u64>::new());

    writer.close().unwrap();
}

#[test]
fn test_should_with_must_not() {
    let (writer, reader) = sample_reader();

    let should = Box::new(
        DisjunctionSearcher::new(vec![term(&reader, b"beer")], 1, false).unwrap(),
    );
    let mut searcher =
        BooleanSearcher::new(None, Some(should), Some(term(&reader, b"couch")), 0).unwrap();
    // beer: a,c,d; couch removes a
    assert_eq!(collect(&mut searcher), vec![2, 3]);

    writer.close().unwrap();
}
