use super::*;

use std::sync::Arc;

use crate::{
    doc::{Document, Field},
    index::{Config, IndexReader, Writer},
    query::{MatchAllQuery, Query, TopNSearch},
    search::{aggregations::Aggregations, Context, SearcherOptions},
};

// 84 docs across 7 names and 4 days and 3 numbers
fn sorted_reader() -> (Writer, IndexReader) {
    let names = ["marty", "steve", "jasper", "ravi", "bob", "nina", "abhi"];
    let days = ["2014-11-01", "2014-11-02", "2014-11-03", "2014-11-04"];

    let writer = Writer::open(Config::in_memory()).unwrap();
    let mut batch = crate::index::Batch::new();
    let mut i = 0;
    for number in 0..3 {
        for day in days.iter() {
            for name in names.iter() {
                let id = format!("doc-{:03}", i);
                i += 1;
                let doc = Document::new(&id)
                    .add_field(Field::keyword("Name", name).sortable())
                    .add_field(Field::keyword("Day", day).sortable())
                    .add_field(Field::numeric("Number", number as f64));
                batch.update(id.as_bytes(), doc);
            }
        }
    }
    writer.batch(&batch).unwrap();
    let reader = writer.reader().unwrap();
    (writer, reader)
}

#[test]
fn test_topn_sorted_by_fields() {
    let (writer, reader) = sorted_reader();

    let request = TopNSearch::new(10, Arc::new(MatchAllQuery)).sort_by(&["Day", "Name"]);
    let results = reader.search(&Context::background(), &request).unwrap();
    let matches = results.matches();
    assert_eq!(matches.len(), 10);

    // Day values never decrease across the page
    let days: Vec<&[u8]> = matches
        .iter()
        .map(|dm| dm.doc_value("Day").unwrap())
        .collect();
    assert!(days.windows(2).all(|w| w[0] <= w[1]));
    // within a day, names never decrease either
    for w in matches.windows(2) {
        let (a, b) = (&w[0], &w[1]);
        if a.doc_value("Day") == b.doc_value("Day") {
            assert!(a.doc_value("Name") <= b.doc_value("Name"));
        }
    }

    writer.close().unwrap();
}

#[test]
fn test_topn_skip() {
    let (writer, reader) = sorted_reader();

    let all = TopNSearch::new(20, Arc::new(MatchAllQuery)).sort_by(&["Day", "Name", "_id"]);
    let all_results = reader.search(&Context::background(), &all).unwrap();

    let paged = TopNSearch::new(5, Arc::new(MatchAllQuery))
        .sort_by(&["Day", "Name", "_id"])
        .set_from(5);
    let paged_results = reader.search(&Context::background(), &paged).unwrap();

    let expect: Vec<u64> = all_results.matches()[5..10].iter().map(|m| m.number).collect();
    let got: Vec<u64> = paged_results.matches().iter().map(|m| m.number).collect();
    assert_eq!(got, expect);

    writer.close().unwrap();
}

#[test]
fn test_topn_after_cursor() {
    let (writer, reader) = sorted_reader();
    let ctx = Context::background();

    let first = TopNSearch::new(5, Arc::new(MatchAllQuery)).sort_by(&["Day", "Name", "_id"]);
    let first_results = reader.search(&ctx, &first).unwrap();
    let last_key = first_results.matches().last().unwrap().sort_value.clone();

    let second = TopNSearch::new(5, Arc::new(MatchAllQuery))
        .sort_by(&["Day", "Name", "_id"])
        .after(last_key);
    let second_results = reader.search(&ctx, &second).unwrap();

    let all = TopNSearch::new(10, Arc::new(MatchAllQuery)).sort_by(&["Day", "Name", "_id"]);
    let all_results = reader.search(&ctx, &all).unwrap();

    let expect: Vec<u64> = all_results.matches()[5..10].iter().map(|m| m.number).collect();
    let got: Vec<u64> = second_results.matches().iter().map(|m| m.number).collect();
    assert_eq!(got, expect);

    writer.close().unwrap();
}

#[test]
fn test_topn_before_cursor() {
    let (writer, reader) = sorted_reader();
    let ctx = Context::background();

    let all = TopNSearch::new(10, Arc::new(MatchAllQuery)).sort_by(&["Day", "Name", "_id"]);
    let all_results = reader.search(&ctx, &all).unwrap();
    let cursor_key = all_results.matches()[5].sort_value.clone();

    let before = TopNSearch::new(3, Arc::new(MatchAllQuery))
        .sort_by(&["Day", "Name", "_id"])
        .before(cursor_key);
    let before_results = reader.search(&ctx, &before).unwrap();

    // the three entries immediately preceding the cursor, forward order
    let expect: Vec<u64> = all_results.matches()[2..5].iter().map(|m| m.number).collect();
    let got: Vec<u64> = before_results.matches().iter().map(|m| m.number).collect();
    assert_eq!(got, expect);

    writer.close().unwrap();
}

#[test]
fn test_all_collector() {
    let (writer, reader) = sorted_reader();

    let mut searcher = MatchAllQuery
        .searcher(&reader, SearcherOptions::default())
        .unwrap();
    let results = AllCollector
        .collect(
            &Context::background(),
            searcher.as_mut(),
            &reader,
            &Aggregations::new(),
        )
        .unwrap();

    assert_eq!(results.matches().len(), 84);
    // ascending doc order, unbounded
    let numbers: Vec<u64> = results.matches().iter().map(|m| m.number).collect();
    assert!(numbers.windows(2).all(|w| w[0] < w[1]));

    writer.close().unwrap();
}

#[test]
fn test_results_iteration() {
    let (writer, reader) = sorted_reader();

    let request = TopNSearch::new(3, Arc::new(MatchAllQuery)).sort_by(&["_id"]);
    let mut results = reader.search(&Context::background(), &request).unwrap();

    let mut seen = 0;
    while results.next().is_some() {
        seen += 1;
    }
    assert_eq!(seen, 3);

    writer.close().unwrap();
}
