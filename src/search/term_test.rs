use super::*;

use crate::{
    doc::{Document, Field},
    index::{Config, IndexReader, Writer},
};

fn sample_reader() -> (Writer, IndexReader) {
    let writer = Writer::open(Config::in_memory()).unwrap();
    let docs = vec![
        ("a", "angst beer couch database"),
        ("b", "angst couch"),
        ("c", "beer database"),
    ];
    for (id, desc) in docs.into_iter() {
        let doc = Document::new(id).add_field(Field::text("desc", desc));
        writer.update(id.as_bytes(), doc).unwrap();
    }
    let reader = writer.reader().unwrap();
    (writer, reader)
}

#[test]
fn test_term_searcher() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    let options = SearcherOptions::default();
    let mut searcher = TermSearcher::new(&reader, "desc", b"angst", 1.0, options).unwrap();

    let mut docs = vec![];
    while let Some(dm) = searcher.next(&ctx).unwrap() {
        assert!(dm.score > 0.0);
        docs.push(dm.number);
    }
    assert_eq!(docs.len(), 2);
    // ascending global order
    assert!(docs.windows(2).all(|w| w[0] < w[1]));

    writer.close().unwrap();
}

#[test]
fn test_term_scores_length_normalized() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();
    let options = SearcherOptions::default();

    // "angst" appears in docs a (4 tokens) and b (2 tokens); the shorter
    // field wins on the BM25 length normalization
    let mut searcher = TermSearcher::new(&reader, "desc", b"angst", 1.0, options).unwrap();
    let dm_a = searcher.next(&ctx).unwrap().unwrap();
    let dm_b = searcher.next(&ctx).unwrap().unwrap();
    assert_eq!((dm_a.number, dm_b.number), (0, 1));
    assert!(dm_b.score > dm_a.score, "{} vs {}", dm_b.score, dm_a.score);

    writer.close().unwrap();
}

#[test]
fn test_term_boost() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();
    let options = SearcherOptions::default();

    let mut plain = TermSearcher::new(&reader, "desc", b"beer", 1.0, options).unwrap();
    let mut boosted = TermSearcher::new(&reader, "desc", b"beer", 2.0, options).unwrap();

    let a = plain.next(&ctx).unwrap().unwrap();
    let b = boosted.next(&ctx).unwrap().unwrap();
    assert!((b.score - 2.0 * a.score).abs() < 1e-9);

    writer.close().unwrap();
}

#[test]
fn test_multi_term_unadorned() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    let terms = vec![b"angst".to_vec(), b"beer".to_vec()];
    let mut searcher = multi_term_searcher(
        &reader,
        "desc",
        terms,
        1.0,
        SearcherOptions::default(),
        false,
    )
    .unwrap();

    // every doc matches, each exactly once, constant score
    let mut docs = vec![];
    while let Some(dm) = searcher.next(&ctx).unwrap() {
        assert!((dm.score - 1.0).abs() < 1e-9);
        docs.push(dm.number);
    }
    assert_eq!(docs, vec![0, 1, 2]);

    writer.close().unwrap();
}

#[test]
fn test_multi_term_too_broad() {
    let writer = Writer::open(Config::in_memory().set_max_clause_count(2)).unwrap();
    let doc = Document::new("a").add_field(Field::text("desc", "one two three"));
    writer.update(b"a", doc).unwrap();
    let reader = writer.reader().unwrap();

    let terms = vec![b"one".to_vec(), b"two".to_vec(), b"three".to_vec()];
    match multi_term_searcher(&reader, "desc", terms, 1.0, SearcherOptions::default(), true)
    {
        Err(crate::Error::QueryTooBroad(_, _)) => (),
        other => panic!("expected QueryTooBroad, got {:?}", other.map(|_| ())),
    }

    writer.close().unwrap();
}
