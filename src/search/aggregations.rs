//! Aggregation framework: metric and bucket calculators consumed inline as
//! matches are collected, with merge rules for combining shards.

use chrono::{DateTime, Utc};

use std::{any::Any, collections::HashMap, sync::Arc};

use crate::{doc::numeric, search::DocumentMatch};

/// Where a numeric aggregation reads its values from.
#[derive(Clone, Debug)]
pub enum Source {
    /// Doc-values of a field, decoded from full-precision trie terms.
    Field(String),
    /// The match's relevance score.
    Score,
}

impl Source {
    pub fn field(name: &str) -> Source {
        Source::Field(name.to_string())
    }

    fn fields(&self) -> Vec<String> {
        match self {
            Source::Field(name) => vec![name.clone()],
            Source::Score => vec![],
        }
    }

    fn values(&self, dm: &DocumentMatch) -> Vec<f64> {
        match self {
            Source::Score => vec![dm.score],
            Source::Field(name) => match dm.doc_values.get(name) {
                Some(values) => values
                    .iter()
                    .filter_map(|term| decode_numeric_term(term))
                    .collect(),
                None => vec![],
            },
        }
    }

    fn ints(&self, dm: &DocumentMatch) -> Vec<i64> {
        match self {
            Source::Score => vec![dm.score as i64],
            Source::Field(name) => match dm.doc_values.get(name) {
                Some(values) => values
                    .iter()
                    .filter_map(|term| decode_int_term(term))
                    .collect(),
                None => vec![],
            },
        }
    }
}

fn decode_int_term(term: &[u8]) -> Option<i64> {
    match numeric::prefix_coded_to_i64(term) {
        Ok((value, 0)) => Some(value),
        _ => None,
    }
}

fn decode_numeric_term(term: &[u8]) -> Option<f64> {
    decode_int_term(term).map(numeric::i64_to_f64)
}

/// A named aggregation producing a fresh [Calculator] per search.
pub trait Aggregation: Send + Sync {
    /// Doc-value fields the calculator needs loaded on each match.
    fn fields(&self) -> Vec<String>;
    fn calculator(&self) -> Box<dyn Calculator>;
}

/// Ordered name-to-aggregation map.
#[derive(Clone, Default)]
pub struct Aggregations {
    aggs: Vec<(String, Arc<dyn Aggregation>)>,
}

impl Aggregations {
    pub fn new() -> Aggregations {
        Aggregations::default()
    }

    pub fn add(&mut self, name: &str, aggregation: Arc<dyn Aggregation>) {
        self.aggs.retain(|(n, _)| n != name);
        self.aggs.push((name.to_string(), aggregation));
    }

    pub fn fields(&self) -> Vec<String> {
        let mut fields = vec![];
        for (_, agg) in self.aggs.iter() {
            for field in agg.fields().into_iter() {
                if !fields.contains(&field) {
                    fields.push(field);
                }
            }
        }
        fields
    }

    pub fn is_empty(&self) -> bool {
        self.aggs.is_empty()
    }

    fn calculators(&self) -> Vec<(String, Box<dyn Calculator>)> {
        self.aggs
            .iter()
            .map(|(name, agg)| (name.clone(), agg.calculator()))
            .collect()
    }
}

/// Running state of one aggregation. `value` serves metric calculators,
/// `buckets` serves bucket calculators; each returns its identity for the
/// other kind.
pub trait Calculator: Send {
    fn consume(&mut self, dm: &DocumentMatch);
    fn finish(&mut self);

    /// Fold another shard's calculator of the same type into this one.
    fn merge(&mut self, other: &dyn Calculator);
    fn as_any(&self) -> &dyn Any;

    fn value(&self) -> f64 {
        0.0
    }

    fn buckets(&self) -> &[Bucket] {
        &[]
    }
}

/// A bucket owns a document count and a map of named calculators,
/// recursively.
pub struct Bucket {
    name: String,
    count: u64,
    calculators: Vec<(String, Box<dyn Calculator>)>,
}

impl Bucket {
    pub fn new(name: &str, aggregations: &Aggregations) -> Bucket {
        Bucket {
            name: name.to_string(),
            count: 0,
            calculators: aggregations.calculators(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn consume(&mut self, dm: &DocumentMatch) {
        self.count += 1;
        for (_, calc) in self.calculators.iter_mut() {
            calc.consume(dm);
        }
    }

    pub fn finish(&mut self) {
        for (_, calc) in self.calculators.iter_mut() {
            calc.finish();
        }
    }

    /// Merge another shard's bucket, calculator by calculator.
    pub fn merge(&mut self, other: &Bucket) {
        self.count += other.count;
        for (name, calc) in self.calculators.iter_mut() {
            if let Some((_, theirs)) = other.calculators.iter().find(|(n, _)| n == name) {
                calc.merge(theirs.as_ref());
            }
        }
    }

    pub fn aggregation(&self, name: &str) -> Option<&dyn Calculator> {
        self.calculators
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, calc)| calc.as_ref())
    }

    pub fn metric(&self, name: &str) -> f64 {
        self.aggregation(name).map(|calc| calc.value()).unwrap_or(0.0)
    }

    pub fn buckets(&self, name: &str) -> &[Bucket] {
        self.aggregation(name).map(|calc| calc.buckets()).unwrap_or(&[])
    }
}

// ---- metric aggregations

#[derive(Clone, Copy, Debug, PartialEq)]
enum MetricOp {
    Min,
    Max,
    Sum,
    Avg,
    Count,
}

pub struct MetricAggregation {
    source: Option<Source>,
    op: MetricOp,
}

/// Smallest value of the source across matches.
pub fn min(source: Source) -> Arc<MetricAggregation> {
    Arc::new(MetricAggregation {
        source: Some(source),
        op: MetricOp::Min,
    })
}

/// Largest value of the source across matches.
pub fn max(source: Source) -> Arc<MetricAggregation> {
    Arc::new(MetricAggregation {
        source: Some(source),
        op: MetricOp::Max,
    })
}

pub fn sum(source: Source) -> Arc<MetricAggregation> {
    Arc::new(MetricAggregation {
        source: Some(source),
        op: MetricOp::Sum,
    })
}

pub fn avg(source: Source) -> Arc<MetricAggregation> {
    Arc::new(MetricAggregation {
        source: Some(source),
        op: MetricOp::Avg,
    })
}

/// Number of matches consumed.
pub fn count_matches() -> Arc<MetricAggregation> {
    Arc::new(MetricAggregation {
        source: None,
        op: MetricOp::Count,
    })
}

impl Aggregation for MetricAggregation {
    fn fields(&self) -> Vec<String> {
        self.source.as_ref().map(|s| s.fields()).unwrap_or_default()
    }

    fn calculator(&self) -> Box<dyn Calculator> {
        Box::new(MetricCalculator {
            source: self.source.clone(),
            op: self.op,
            sum: 0.0,
            count: 0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
        })
    }
}

pub struct MetricCalculator {
    source: Option<Source>,
    op: MetricOp,
    sum: f64,
    count: u64,
    min: f64,
    max: f64,
}

impl Calculator for MetricCalculator {
    fn consume(&mut self, dm: &DocumentMatch) {
        match &self.source {
            None => self.count += 1,
            Some(source) => {
                for value in source.values(dm).into_iter() {
                    self.count += 1;
                    self.sum += value;
                    self.min = self.min.min(value);
                    self.max = self.max.max(value);
                }
            }
        }
    }

    fn finish(&mut self) {}

    fn merge(&mut self, other: &dyn Calculator) {
        if let Some(other) = other.as_any().downcast_ref::<MetricCalculator>() {
            self.count += other.count;
            self.sum += other.sum;
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value(&self) -> f64 {
        match self.op {
            MetricOp::Count => self.count as f64,
            MetricOp::Sum => self.sum,
            MetricOp::Avg if self.count > 0 => self.sum / self.count as f64,
            MetricOp::Avg => 0.0,
            MetricOp::Min if self.count > 0 => self.min,
            MetricOp::Max if self.count > 0 => self.max,
            MetricOp::Min | MetricOp::Max => 0.0,
        }
    }
}

// ---- quantiles over an online t-digest

pub struct QuantilesAggregation {
    source: Source,
}

pub fn quantiles(source: Source) -> Arc<QuantilesAggregation> {
    Arc::new(QuantilesAggregation { source })
}

impl Aggregation for QuantilesAggregation {
    fn fields(&self) -> Vec<String> {
        self.source.fields()
    }

    fn calculator(&self) -> Box<dyn Calculator> {
        Box::new(QuantilesCalculator {
            source: self.source.clone(),
            digest: TDigest::new(100.0),
        })
    }
}

pub struct QuantilesCalculator {
    source: Source,
    digest: TDigest,
}

impl QuantilesCalculator {
    /// Estimated value at quantile `q` in `[0, 1]`.
    pub fn quantile(&self, q: f64) -> f64 {
        self.digest.quantile(q)
    }
}

impl Calculator for QuantilesCalculator {
    fn consume(&mut self, dm: &DocumentMatch) {
        for value in self.source.values(dm).into_iter() {
            self.digest.add(value);
        }
    }

    fn finish(&mut self) {
        self.digest.compress();
    }

    fn merge(&mut self, other: &dyn Calculator) {
        if let Some(other) = other.as_any().downcast_ref::<QuantilesCalculator>() {
            self.digest.merge(&other.digest);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn value(&self) -> f64 {
        self.quantile(0.5)
    }
}

/// Merging t-digest: centroids capped by a scale function concentrating
/// resolution at the distribution tails.
pub struct TDigest {
    compression: f64,
    centroids: Vec<(f64, f64)>, // (mean, weight), sorted by mean
    buffer: Vec<f64>,
    total: f64,
}

impl TDigest {
    pub fn new(compression: f64) -> TDigest {
        TDigest {
            compression,
            centroids: vec![],
            buffer: vec![],
            total: 0.0,
        }
    }

    pub fn add(&mut self, value: f64) {
        if value.is_nan() {
            return;
        }
        self.buffer.push(value);
        self.total += 1.0;
        if self.buffer.len() >= 512 {
            self.compress();
        }
    }

    pub fn merge(&mut self, other: &TDigest) {
        for value in other.buffer.iter() {
            self.buffer.push(*value);
        }
        for (mean, weight) in other.centroids.iter() {
            self.centroids.push((*mean, *weight));
        }
        self.total += other.total;
        self.centroids.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());
        self.compress();
    }

    pub fn compress(&mut self) {
        if self.buffer.is_empty() && self.centroids.len() <= self.compression as usize {
            return;
        }

        let mut points = std::mem::take(&mut self.centroids);
        for value in self.buffer.drain(..) {
            points.push((value, 1.0));
        }
        points.sort_by(|a, b| a.0.partial_cmp(&b.0).unwrap());

        let total: f64 = points.iter().map(|(_, w)| w).sum();
        if total <= 0.0 {
            return;
        }

        let mut merged: Vec<(f64, f64)> = vec![];
        let mut seen = 0.0;
        for (mean, weight) in points.into_iter() {
            match merged.last_mut() {
                Some((m, w)) => {
                    let q = (seen + *w / 2.0) / total;
                    let limit = 4.0 * total * q * (1.0 - q) / self.compression;
                    if *w + weight <= limit.max(1.0) {
                        // fold into the current centroid
                        *m = (*m * *w + mean * weight) / (*w + weight);
                        *w += weight;
                    } else {
                        seen += *w;
                        merged.push((mean, weight));
                    }
                }
                None => merged.push((mean, weight)),
            }
        }

        self.centroids = merged;
        self.total = total;
    }

    pub fn quantile(&self, q: f64) -> f64 {
        let mut digest = TDigest {
            compression: self.compression,
            centroids: self.centroids.clone(),
            buffer: self.buffer.clone(),
            total: self.total,
        };
        digest.compress();

        if digest.centroids.is_empty() {
            return 0.0;
        }
        let total: f64 = digest.centroids.iter().map(|(_, w)| w).sum();
        let target = q.clamp(0.0, 1.0) * total;

        let mut seen = 0.0;
        for (i, (mean, weight)) in digest.centroids.iter().enumerate() {
            if seen + weight >= target {
                // interpolate toward the neighboring centroid
                let fraction = match weight {
                    w if *w > 0.0 => (target - seen) / w,
                    _ => 0.5,
                };
                let next = digest
                    .centroids
                    .get(i + 1)
                    .map(|(m, _)| *m)
                    .unwrap_or(*mean);
                return mean + (next - mean) * fraction.clamp(0.0, 1.0) * 0.5;
            }
            seen += weight;
        }
        digest.centroids.last().map(|(m, _)| *m).unwrap_or(0.0)
    }
}

// ---- bucket aggregations

/// Numeric half-open range `[min, max)`.
#[derive(Clone, Debug)]
pub struct NamedRange {
    pub name: String,
    pub min: f64,
    pub max: f64,
}

impl NamedRange {
    pub fn new(name: &str, min: f64, max: f64) -> NamedRange {
        NamedRange {
            name: name.to_string(),
            min,
            max,
        }
    }
}

pub struct RangesAggregation {
    source: Source,
    ranges: Vec<NamedRange>,
    nested: Aggregations,
}

pub fn ranges(field: &str, ranges: Vec<NamedRange>) -> Arc<RangesAggregation> {
    ranges_with(field, ranges, Aggregations::new())
}

pub fn ranges_with(
    field: &str,
    ranges: Vec<NamedRange>,
    nested: Aggregations,
) -> Arc<RangesAggregation> {
    Arc::new(RangesAggregation {
        source: Source::field(field),
        ranges,
        nested,
    })
}

impl Aggregation for RangesAggregation {
    fn fields(&self) -> Vec<String> {
        let mut fields = self.source.fields();
        for field in self.nested.fields().into_iter() {
            if !fields.contains(&field) {
                fields.push(field);
            }
        }
        fields
    }

    fn calculator(&self) -> Box<dyn Calculator> {
        Box::new(RangesCalculator {
            source: self.source.clone(),
            ranges: self.ranges.clone(),
            buckets: self
                .ranges
                .iter()
                .map(|r| Bucket::new(&r.name, &self.nested))
                .collect(),
        })
    }
}

pub struct RangesCalculator {
    source: Source,
    ranges: Vec<NamedRange>,
    buckets: Vec<Bucket>,
}

impl Calculator for RangesCalculator {
    fn consume(&mut self, dm: &DocumentMatch) {
        for value in self.source.values(dm).into_iter() {
            for (i, range) in self.ranges.iter().enumerate() {
                if value >= range.min && value < range.max {
                    self.buckets[i].consume(dm);
                }
            }
        }
    }

    fn finish(&mut self) {
        for bucket in self.buckets.iter_mut() {
            bucket.finish();
        }
    }

    fn merge(&mut self, other: &dyn Calculator) {
        if let Some(other) = other.as_any().downcast_ref::<RangesCalculator>() {
            for (mine, theirs) in self.buckets.iter_mut().zip(other.buckets.iter()) {
                mine.merge(theirs);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }
}

/// Date range with optional open ends, over UNIX nanoseconds.
#[derive(Clone, Debug)]
pub struct NamedDateRange {
    pub name: String,
    pub start: Option<DateTime<Utc>>,
    pub end: Option<DateTime<Utc>>,
}

impl NamedDateRange {
    pub fn new(
        name: &str,
        start: Option<DateTime<Utc>>,
        end: Option<DateTime<Utc>>,
    ) -> NamedDateRange {
        NamedDateRange {
            name: name.to_string(),
            start,
            end,
        }
    }
}

pub struct DateRangesAggregation {
    source: Source,
    ranges: Vec<NamedDateRange>,
    nested: Aggregations,
}

pub fn date_ranges(field: &str, ranges: Vec<NamedDateRange>) -> Arc<DateRangesAggregation> {
    Arc::new(DateRangesAggregation {
        source: Source::field(field),
        ranges,
        nested: Aggregations::new(),
    })
}

impl Aggregation for DateRangesAggregation {
    fn fields(&self) -> Vec<String> {
        self.source.fields()
    }

    fn calculator(&self) -> Box<dyn Calculator> {
        Box::new(DateRangesCalculator {
            source: self.source.clone(),
            ranges: self.ranges.clone(),
            buckets: self
                .ranges
                .iter()
                .map(|r| Bucket::new(&r.name, &self.nested))
                .collect(),
        })
    }
}

pub struct DateRangesCalculator {
    source: Source,
    ranges: Vec<NamedDateRange>,
    buckets: Vec<Bucket>,
}

impl Calculator for DateRangesCalculator {
    fn consume(&mut self, dm: &DocumentMatch) {
        for nanos in self.source.ints(dm).into_iter() {
            for (i, range) in self.ranges.iter().enumerate() {
                let after_start = range
                    .start
                    .map(|s| nanos >= s.timestamp_nanos())
                    .unwrap_or(true);
                let before_end = range
                    .end
                    .map(|e| nanos < e.timestamp_nanos())
                    .unwrap_or(true);
                if after_start && before_end {
                    self.buckets[i].consume(dm);
                }
            }
        }
    }

    fn finish(&mut self) {
        for bucket in self.buckets.iter_mut() {
            bucket.finish();
        }
    }

    fn merge(&mut self, other: &dyn Calculator) {
        if let Some(other) = other.as_any().downcast_ref::<DateRangesCalculator>() {
            for (mine, theirs) in self.buckets.iter_mut().zip(other.buckets.iter()) {
                mine.merge(theirs);
            }
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }
}

/// Top-`size` distinct terms of a field by document count, with an `other`
/// count for the overflow.
pub struct TermsAggregation {
    field: String,
    size: usize,
    nested: Aggregations,
}

pub fn terms(field: &str, size: usize) -> Arc<TermsAggregation> {
    Arc::new(TermsAggregation {
        field: field.to_string(),
        size: size.max(1),
        nested: Aggregations::new(),
    })
}

impl Aggregation for TermsAggregation {
    fn fields(&self) -> Vec<String> {
        vec![self.field.clone()]
    }

    fn calculator(&self) -> Box<dyn Calculator> {
        Box::new(TermsCalculator {
            field: self.field.clone(),
            size: self.size,
            nested: self.nested.clone(),
            running: HashMap::new(),
            buckets: vec![],
            other: 0,
        })
    }
}

pub struct TermsCalculator {
    field: String,
    size: usize,
    nested: Aggregations,
    running: HashMap<String, Bucket>,
    buckets: Vec<Bucket>,
    other: u64,
}

impl TermsCalculator {
    /// Count of documents folded into buckets beyond the top `size`.
    pub fn other(&self) -> u64 {
        self.other
    }
}

impl Calculator for TermsCalculator {
    fn consume(&mut self, dm: &DocumentMatch) {
        if let Some(values) = dm.doc_values.get(&self.field) {
            for value in values.iter() {
                let term = String::from_utf8_lossy(value).to_string();
                let nested = &self.nested;
                self.running
                    .entry(term.clone())
                    .or_insert_with(|| Bucket::new(&term, nested))
                    .consume(dm);
            }
        }
    }

    fn finish(&mut self) {
        let mut buckets: Vec<Bucket> = self.running.drain().map(|(_, b)| b).collect();
        buckets.sort_by(|a, b| b.count().cmp(&a.count()).then(a.name().cmp(b.name())));
        for bucket in buckets.iter_mut() {
            bucket.finish();
        }

        self.other = buckets
            .iter()
            .skip(self.size)
            .map(|b| b.count())
            .sum();
        buckets.truncate(self.size);
        self.buckets = buckets;
    }

    fn merge(&mut self, other: &dyn Calculator) {
        if let Some(other) = other.as_any().downcast_ref::<TermsCalculator>() {
            // re-open finished buckets from the other shard
            for bucket in other.buckets.iter() {
                match self.buckets.iter_mut().find(|b| b.name() == bucket.name()) {
                    Some(mine) => mine.merge(bucket),
                    None => {
                        let mut fresh = Bucket::new(bucket.name(), &self.nested);
                        fresh.merge(bucket);
                        self.buckets.push(fresh);
                    }
                }
            }
            self.other += other.other;
            self.buckets.sort_by(|a, b| {
                b.count().cmp(&a.count()).then(a.name().cmp(b.name()))
            });
            self.other += self
                .buckets
                .iter()
                .skip(self.size)
                .map(|b| b.count())
                .sum::<u64>();
            self.buckets.truncate(self.size);
        }
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn buckets(&self) -> &[Bucket] {
        &self.buckets
    }
}

/// The standard aggregation pair most requests want: a match count and the
/// best score.
pub fn standard_aggregations() -> Aggregations {
    let mut aggs = Aggregations::new();
    aggs.add("count", count_matches());
    aggs.add("max_score", max(Source::Score));
    aggs
}

#[cfg(test)]
#[path = "aggregations_test.rs"]
mod aggregations_test;
