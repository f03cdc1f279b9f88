use super::*;

use crate::{
    doc::{Document, Field},
    index::{Config, IndexReader, Writer},
};

fn sample_reader() -> (Writer, IndexReader) {
    let writer = Writer::open(Config::in_memory()).unwrap();
    let docs = vec![
        ("a", "angst beer couch database"),
        ("b", "beer angst couch"),
        ("c", "angst couch beer"),
    ];
    for (id, desc) in docs.into_iter() {
        let doc =
            Document::new(id).add_field(Field::text("desc", desc).include_locations());
        writer.update(id.as_bytes(), doc).unwrap();
    }
    let reader = writer.reader().unwrap();
    (writer, reader)
}

fn phrase(terms: Vec<&str>) -> Vec<PhrasePart> {
    terms
        .into_iter()
        .map(|t| match t.is_empty() {
            true => PhrasePart::Gap,
            false => PhrasePart::Terms(vec![t.as_bytes().to_vec()]),
        })
        .collect()
}

#[test]
fn test_exact_phrase() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    let mut searcher = PhraseSearcher::new(
        &reader,
        "desc",
        phrase(vec!["angst", "beer"]),
        0,
        1.0,
        SearcherOptions::default(),
    )
    .unwrap();

    // only doc a has "angst beer" adjacent in order
    let dm = searcher.next(&ctx).unwrap().unwrap();
    assert_eq!(dm.number, 0);

    // locations cover exactly the participating terms
    let by_term = dm.locations.get("desc").unwrap();
    let angst = &by_term[&b"angst".to_vec()];
    assert_eq!(angst.len(), 1);
    assert_eq!((angst[0].pos, angst[0].start, angst[0].end), (1, 0, 5));
    let beer = &by_term[&b"beer".to_vec()];
    assert_eq!(beer.len(), 1);
    assert_eq!((beer[0].pos, beer[0].start, beer[0].end), (2, 6, 10));

    assert!(searcher.next(&ctx).unwrap().is_none());

    writer.close().unwrap();
}

#[test]
fn test_phrase_with_gap() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    // "angst _ couch": one token between them
    let mut searcher = PhraseSearcher::new(
        &reader,
        "desc",
        phrase(vec!["angst", "", "couch"]),
        0,
        1.0,
        SearcherOptions::default(),
    )
    .unwrap();

    let dm = searcher.next(&ctx).unwrap().unwrap();
    assert_eq!(dm.number, 0); // angst(1) beer(2) couch(3)
    assert!(searcher.next(&ctx).unwrap().is_none());

    writer.close().unwrap();
}

#[test]
fn test_sloppy_phrase() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    // slop 1 lets one extra token sit between the terms
    let mut searcher = PhraseSearcher::new(
        &reader,
        "desc",
        phrase(vec!["angst", "couch"]),
        1,
        1.0,
        SearcherOptions::default(),
    )
    .unwrap();

    let mut docs = vec![];
    while let Some(dm) = searcher.next(&ctx).unwrap() {
        docs.push(dm.number);
    }
    // b: adjacent (cost 0); c: adjacent; a: one token between (cost 1)
    assert_eq!(docs, vec![0, 1, 2]);

    writer.close().unwrap();
}

#[test]
fn test_phrase_reorder_costs_slop() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    // doc b has "beer angst": reversed "angst beer" costs 2 slop
    let collect = |slop: u32| -> Vec<u64> {
        let mut searcher = PhraseSearcher::new(
            &reader,
            "desc",
            phrase(vec!["angst", "beer"]),
            slop,
            1.0,
            SearcherOptions::default(),
        )
        .unwrap();
        let mut docs = vec![];
        while let Some(dm) = searcher.next(&Context::background()).unwrap() {
            docs.push(dm.number);
        }
        docs
    };
    let _ = ctx;

    assert_eq!(collect(0), vec![0]);
    assert_eq!(collect(1), vec![0, 2]); // c: angst couch beer, one between
    assert_eq!(collect(2), vec![0, 1, 2]); // b: reversed adjacent

    writer.close().unwrap();
}

#[test]
fn test_multi_term_position() {
    let (writer, reader) = sample_reader();
    let ctx = Context::background();

    // any-of per position
    let parts = vec![
        PhrasePart::Terms(vec![b"angst".to_vec(), b"beer".to_vec()]),
        PhrasePart::Terms(vec![b"couch".to_vec()]),
    ];
    let mut searcher =
        PhraseSearcher::new(&reader, "desc", parts, 0, 1.0, SearcherOptions::default())
            .unwrap();

    let mut docs = vec![];
    while let Some(dm) = searcher.next(&ctx).unwrap() {
        docs.push(dm.number);
    }
    // b: "angst couch"; c: "angst couch"
    assert_eq!(docs, vec![1, 2]);

    writer.close().unwrap();
}

#[test]
fn test_find_phrase_paths() {
    use std::collections::HashMap;

    let mk = |pos: u32, start: u32, end: u32| Location {
        field: "desc".to_string(),
        pos,
        start,
        end,
    };

    let mut by_term: HashMap<Vec<u8>, Vec<Location>> = HashMap::new();
    by_term.insert(b"one".to_vec(), vec![mk(1, 0, 3), mk(5, 20, 23)]);
    by_term.insert(b"two".to_vec(), vec![mk(2, 4, 7)]);

    let parts = vec![
        PhrasePart::Terms(vec![b"one".to_vec()]),
        PhrasePart::Terms(vec![b"two".to_vec()]),
    ];

    let paths = find_phrase_paths(&parts, &by_term, 0);
    assert_eq!(paths.len(), 1);
    assert_eq!(paths[0][0].1.pos, 1);
    assert_eq!(paths[0][1].1.pos, 2);

    // no ordered adjacent pair from position 5
    let parts_rev = vec![
        PhrasePart::Terms(vec![b"two".to_vec()]),
        PhrasePart::Terms(vec![b"one".to_vec()]),
    ];
    let paths = find_phrase_paths(&parts_rev, &by_term, 0);
    assert!(paths.is_empty());

    // slop 2 admits both continuations: backwards to one@1 and forward to
    // one@5, each costing 2
    let mut paths = find_phrase_paths(&parts_rev, &by_term, 2);
    paths.sort_by_key(|p| p[1].1.pos);
    assert_eq!(paths.len(), 2);
    assert_eq!(paths[0][1].1.pos, 1);
    assert_eq!(paths[1][1].1.pos, 5);
}
