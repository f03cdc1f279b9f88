use super::*;

use crate::{
    doc::{Document, Field},
    index::{Config, IndexReader, Writer},
    search::{term::TermSearcher, SearcherOptions},
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

#[test]
fn test_conjunction() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    let mut searcher = ConjunctionSearcher::new(vec![
        term(&reader, b"angst"),
        term(&reader, b"beer"),
    ])
    .unwrap();

    let mut docs = vec![];
    while let Some(dm) = searcher.next(&ctx).unwrap() {
        docs.push(dm.number);
    }
    // docs a and d carry both terms
    assert_eq!(docs, vec![0, 3]);

    writer.close().unwrap();
}

#[test]
fn test_conjunction_scores_sum() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    let mut angst = term(&reader, b"angst");
    let mut beer = term(&reader, b"beer");
    let (a, b) = (
        angst.next(&ctx).unwrap().unwrap(),
        beer.next(&ctx).unwrap().unwrap(),
    );
    assert_eq!(a.number, 0);
    assert_eq!(b.number, 0);

    let mut searcher = ConjunctionSearcher::new(vec![
        term(&reader, b"angst"),
        term(&reader, b"beer"),
    ])
    .unwrap();
    let dm = searcher.next(&ctx).unwrap().unwrap();
    assert_eq!(dm.number, 0);
    assert!((dm.score - (a.score + b.score)).abs() < 1e-9);

    writer.close().unwrap();
}

#[test]
fn test_conjunction_advance() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    let mut searcher = ConjunctionSearcher::new(vec![
        term(&reader, b"angst"),
        term(&reader, b"beer"),
    ])
    .unwrap();

    let dm = searcher.advance(&ctx, 1).unwrap().unwrap();
    assert_eq!(dm.number, 3);
    assert!(searcher.next(&ctx).unwrap().is_none());

    writer.close().unwrap();
}

#[test]
fn test_conjunction_no_overlap() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    let mut searcher = ConjunctionSearcher::new(vec![
        term(&reader, b"couch"),
        term(&reader, b"database"),
    ])
    .unwrap();
    // couch: docs a,b; database: docs a,c — only a overlaps
    let dm = searcher.next(&ctx).unwrap().unwrap();
    assert_eq!(dm.number, 0);
    assert!(searcher.next(&ctx).unwrap().is_none());

    writer.close().unwrap();
}
