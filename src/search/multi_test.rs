use super::*;

use crate::{
    doc::{Document, Field},
    index::{Config, Writer},
    query::TermQuery,
    search::aggregations,
};

#[test]
fn test_multi_search() {
    let writer1 = Writer::open(Config::in_memory()).unwrap();
    writer1
        .update(
            b"a",
            Document::new("a").add_field(Field::text("desc", "bluge search library")),
        )
        .unwrap();

    let writer2 = Writer::open(Config::in_memory()).unwrap();
    writer2
        .update(
            b"b",
            Document::new("b").add_field(Field::text("desc", "search engine core")),
        )
        .unwrap();

    let readers = vec![writer1.reader().unwrap(), writer2.reader().unwrap()];

    let request = Arc::new(
        TopNSearch::new(10, Arc::new(TermQuery::new("search").set_field("desc")))
            .with_standard_aggregations(),
    );
    let results = multi_search(&Context::background(), readers, request).unwrap();

    assert_eq!(results.matches().len(), 2);
    assert_eq!(results.aggregations().metric("count"), 2.0);
    assert!(results.aggregations().metric("max_score") > 0.0);

    writer1.close().unwrap();
    writer2.close().unwrap();
}

#[test]
fn test_multi_search_window() {
    let writer1 = Writer::open(Config::in_memory()).unwrap();
    let writer2 = Writer::open(Config::in_memory()).unwrap();
    for i in 0..5 {
        let id = format!("a-{}", i);
        writer1
            .update(
                id.as_bytes(),
                Document::new(&id).add_field(Field::text("desc", "shared term")),
            )
            .unwrap();
        let id = format!("b-{}", i);
        writer2
            .update(
                id.as_bytes(),
                Document::new(&id).add_field(Field::text("desc", "shared term")),
            )
            .unwrap();
    }

    let readers = vec![writer1.reader().unwrap(), writer2.reader().unwrap()];
    let request = Arc::new(
        TopNSearch::new(4, Arc::new(TermQuery::new("shared").set_field("desc")))
            .sort_by(&["_id"])
            .set_from(2)
            .with_standard_aggregations(),
    );
    let results = multi_search(&Context::background(), readers, request).unwrap();

    // global window over the merged order
    assert_eq!(results.matches().len(), 4);
    let ids: Vec<&[u8]> = results
        .matches()
        .iter()
        .map(|m| m.doc_value("_id").unwrap())
        .collect();
    assert_eq!(
        ids,
        vec![
            b"a-2".as_ref(),
            b"a-3".as_ref(),
            b"a-4".as_ref(),
            b"b-0".as_ref()
        ]
    );
    // aggregations span every shard match
    assert_eq!(results.aggregations().metric("count"), 10.0);

    writer1.close().unwrap();
    writer2.close().unwrap();
}

#[test]
fn test_multi_search_cancellation() {
    use std::sync::atomic::{AtomicBool, Ordering::SeqCst};

    let writer = Writer::open(Config::in_memory()).unwrap();
    writer
        .update(
            b"a",
            Document::new("a").add_field(Field::text("desc", "text")),
        )
        .unwrap();

    let cancel = Arc::new(AtomicBool::new(true));
    let ctx = Context::with_cancel(cancel);
    let request = Arc::new(TopNSearch::new(
        1,
        Arc::new(TermQuery::new("text").set_field("desc")),
    ));

    match multi_search(&ctx, vec![writer.reader().unwrap()], request) {
        Err(Error::SearchAborted(_, _)) => (),
        other => panic!("expected SearchAborted, got {:?}", other.map(|_| ())),
    }

    writer.close().unwrap();
}

#[test]
fn test_multi_search_merges_buckets() {
    let writer1 = Writer::open(Config::in_memory()).unwrap();
    let writer2 = Writer::open(Config::in_memory()).unwrap();
    for (writer, value) in [(&writer1, 10.0), (&writer2, 32.0)].iter() {
        let doc = Document::new("x").add_field(Field::numeric("num", *value));
        writer.update(b"x", doc).unwrap();
    }

    let readers = vec![writer1.reader().unwrap(), writer2.reader().unwrap()];
    let request = Arc::new(
        TopNSearch::new(10, Arc::new(crate::query::MatchAllQuery)).add_aggregation(
            "total",
            aggregations::sum(aggregations::Source::field("num")),
        ),
    );
    let results = multi_search(&Context::background(), readers, request).unwrap();
    assert_eq!(results.aggregations().metric("total"), 42.0);

    writer1.close().unwrap();
    writer2.close().unwrap();
}
