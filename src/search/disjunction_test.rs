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
fn test_disjunction() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    let mut searcher = DisjunctionSearcher::new(
        vec![term(&reader, b"couch"), term(&reader, b"database")],
        1,
        false,
    )
    .unwrap();

    let mut docs = vec![];
    while let Some(dm) = searcher.next(&ctx).unwrap() {
        docs.push(dm.number);
    }
    // couch: a,b; database: a,c; union ascending, no duplicates
    assert_eq!(docs, vec![0, 1, 2]);

    writer.close().unwrap();
}

#[test]
fn test_disjunction_min() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    let mut searcher = DisjunctionSearcher::new(
        vec![
            term(&reader, b"angst"),
            term(&reader, b"beer"),
            term(&reader, b"couch"),
        ],
        2,
        false,
    )
    .unwrap();

    let mut docs = vec![];
    while let Some(dm) = searcher.next(&ctx).unwrap() {
        docs.push(dm.number);
    }
    // a matches 3, b matches 2, c matches 1, d matches 2
    assert_eq!(docs, vec![0, 1, 3]);

    writer.close().unwrap();
}

#[test]
fn test_disjunction_coord() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    let plain = DisjunctionSearcher::new(
        vec![term(&reader, b"couch"), term(&reader, b"database")],
        1,
        false,
    )
    .unwrap();
    let coord = DisjunctionSearcher::new(
        vec![term(&reader, b"couch"), term(&reader, b"database")],
        1,
        true,
    )
    .unwrap();

    let (mut plain, mut coord) = (plain, coord);
    let a = plain.next(&ctx).unwrap().unwrap(); // doc a matches both
    let b = coord.next(&ctx).unwrap().unwrap();
    assert_eq!(a.number, b.number);
    assert!((b.score - a.score).abs() < 1e-9); // 2/2 coord

    let a = plain.next(&ctx).unwrap().unwrap(); // doc b matches couch only
    let b = coord.next(&ctx).unwrap().unwrap();
    assert!((b.score - a.score / 2.0).abs() < 1e-9); // 1/2 coord

    writer.close().unwrap();
}

#[test]
fn test_disjunction_advance() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    let mut searcher = DisjunctionSearcher::new(
        vec![term(&reader, b"angst"), term(&reader, b"database")],
        1,
        false,
    )
    .unwrap();

    let dm = searcher.advance(&ctx, 2).unwrap().unwrap();
    assert_eq!(dm.number, 2);
    let dm = searcher.next(&ctx).unwrap().unwrap();
    assert_eq!(dm.number, 3);
    assert!(searcher.next(&ctx).unwrap().is_none());

    writer.close().unwrap();
}
