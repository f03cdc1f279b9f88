use super::*;

use std::sync::Arc;

use crate::{
    doc::{numeric, Document, Field},
    index::{Config, Writer},
    query::{MatchAllQuery, TopNSearch},
    search::{Context, DocumentMatch},
};

fn dm_with_value(field: &str, value: f64, score: f64) -> DocumentMatch {
    let term = numeric::prefix_coded_i64(numeric::f64_to_i64(value), 0);
    let mut dm = DocumentMatch {
        score,
        ..DocumentMatch::default()
    };
    dm.doc_values.insert(field.to_string(), vec![term]);
    dm
}

#[test]
fn test_metric_calculators() {
    let mut aggs = Aggregations::new();
    aggs.add("min", min(Source::field("num")));
    aggs.add("max", max(Source::field("num")));
    aggs.add("sum", sum(Source::field("num")));
    aggs.add("avg", avg(Source::field("num")));
    aggs.add("count", count_matches());

    let mut bucket = Bucket::new("", &aggs);
    for value in [3.0, 1.0, 4.0, 1.0, 5.0].iter() {
        bucket.consume(&dm_with_value("num", *value, 0.0));
    }
    bucket.finish();

    assert_eq!(bucket.metric("min"), 1.0);
    assert_eq!(bucket.metric("max"), 5.0);
    assert_eq!(bucket.metric("sum"), 14.0);
    assert!((bucket.metric("avg") - 2.8).abs() < 1e-9);
    assert_eq!(bucket.metric("count"), 5.0);
    assert_eq!(bucket.count(), 5);
}

#[test]
fn test_metric_merge() {
    let mut aggs = Aggregations::new();
    aggs.add("sum", sum(Source::field("num")));
    aggs.add("max", max(Source::field("num")));

    let mut shard1 = Bucket::new("", &aggs);
    shard1.consume(&dm_with_value("num", 2.0, 0.0));
    shard1.finish();

    let mut shard2 = Bucket::new("", &aggs);
    shard2.consume(&dm_with_value("num", 5.0, 0.0));
    shard2.consume(&dm_with_value("num", 1.0, 0.0));
    shard2.finish();

    shard1.merge(&shard2);
    assert_eq!(shard1.metric("sum"), 8.0);
    assert_eq!(shard1.metric("max"), 5.0);
    assert_eq!(shard1.count(), 3);
}

#[test]
fn test_score_source() {
    let mut aggs = Aggregations::new();
    aggs.add("max_score", max(Source::Score));

    let mut bucket = Bucket::new("", &aggs);
    bucket.consume(&dm_with_value("x", 0.0, 0.5));
    bucket.consume(&dm_with_value("x", 0.0, 2.5));
    bucket.finish();

    assert_eq!(bucket.metric("max_score"), 2.5);
}

#[test]
fn test_quantiles() {
    let mut aggs = Aggregations::new();
    aggs.add("q", quantiles(Source::field("num")));

    let mut bucket = Bucket::new("", &aggs);
    for i in 0..1000 {
        bucket.consume(&dm_with_value("num", i as f64, 0.0));
    }
    bucket.finish();

    let calc = bucket.aggregation("q").unwrap();
    let q = calc
        .as_any()
        .downcast_ref::<QuantilesCalculator>()
        .unwrap();

    let median = q.quantile(0.5);
    assert!((median - 500.0).abs() < 50.0, "median {}", median);
    let p90 = q.quantile(0.9);
    assert!((p90 - 900.0).abs() < 50.0, "p90 {}", p90);
    assert!(q.quantile(0.0) <= q.quantile(1.0));
}

#[test]
fn test_ranges() {
    let mut aggs = Aggregations::new();
    aggs.add(
        "sizes",
        ranges(
            "num",
            vec![
                NamedRange::new("small", 0.0, 3.0),
                NamedRange::new("large", 3.0, 10.0),
            ],
        ),
    );

    let mut bucket = Bucket::new("", &aggs);
    for value in [1.0, 2.0, 3.0, 7.0].iter() {
        bucket.consume(&dm_with_value("num", *value, 0.0));
    }
    bucket.finish();

    let buckets = bucket.buckets("sizes");
    assert_eq!(buckets.len(), 2);
    assert_eq!(buckets[0].name(), "small");
    assert_eq!(buckets[0].count(), 2);
    assert_eq!(buckets[1].name(), "large");
    assert_eq!(buckets[1].count(), 2); // 3.0 lands in [3, 10)
}

#[test]
fn test_terms_with_other() {
    let mut aggs = Aggregations::new();
    aggs.add("names", terms("name", 2));

    let mut bucket = Bucket::new("", &aggs);
    let consume = |bucket: &mut Bucket, name: &str, times: usize| {
        for _ in 0..times {
            let mut dm = DocumentMatch::default();
            dm.doc_values
                .insert("name".to_string(), vec![name.as_bytes().to_vec()]);
            bucket.consume(&dm);
        }
    };
    consume(&mut bucket, "marty", 5);
    consume(&mut bucket, "steve", 3);
    consume(&mut bucket, "jasper", 2);
    consume(&mut bucket, "ravi", 1);
    bucket.finish();

    let names = bucket.buckets("names");
    assert_eq!(names.len(), 2);
    assert_eq!((names[0].name(), names[0].count()), ("marty", 5));
    assert_eq!((names[1].name(), names[1].count()), ("steve", 3));

    let calc = bucket.aggregation("names").unwrap();
    let tc = calc.as_any().downcast_ref::<TermsCalculator>().unwrap();
    assert_eq!(tc.other(), 3);
}

#[test]
fn test_date_ranges() {
    use chrono::TimeZone;

    let mut aggs = Aggregations::new();
    aggs.add(
        "when",
        date_ranges(
            "ts",
            vec![NamedDateRange::new(
                "november",
                Some(chrono::Utc.ymd(2014, 11, 1).and_hms(0, 0, 0)),
                Some(chrono::Utc.ymd(2014, 12, 1).and_hms(0, 0, 0)),
            )],
        ),
    );

    let in_range = chrono::Utc.ymd(2014, 11, 15).and_hms(12, 0, 0);
    let out_of_range = chrono::Utc.ymd(2015, 1, 1).and_hms(0, 0, 0);

    let mut bucket = Bucket::new("", &aggs);
    for when in [in_range, out_of_range].iter() {
        let term = numeric::prefix_coded_i64(when.timestamp_nanos(), 0);
        let mut dm = DocumentMatch::default();
        dm.doc_values.insert("ts".to_string(), vec![term]);
        bucket.consume(&dm);
    }
    bucket.finish();

    let buckets = bucket.buckets("when");
    assert_eq!(buckets[0].count(), 1);
}

#[test]
fn test_aggregations_in_search() {
    let writer = Writer::open(Config::in_memory()).unwrap();
    for i in 0..10 {
        let id = format!("doc-{}", i);
        let doc = Document::new(&id).add_field(Field::numeric("num", i as f64));
        writer.update(id.as_bytes(), doc).unwrap();
    }
    let reader = writer.reader().unwrap();

    let request = TopNSearch::new(3, Arc::new(MatchAllQuery))
        .with_standard_aggregations()
        .add_aggregation("total", sum(Source::field("num")));
    let results = reader.search(&Context::background(), &request).unwrap();

    // aggregations cover every match, not just the page
    assert_eq!(results.matches().len(), 3);
    assert_eq!(results.aggregations().metric("count"), 10.0);
    assert_eq!(results.aggregations().metric("total"), 45.0);

    writer.close().unwrap();
}
