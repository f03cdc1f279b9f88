//! Module `query` implement the query model: composable value types that
//! compile into [searchers][crate::search::Searcher] against a reader.

use chrono::{DateTime, Utc};

use std::sync::Arc;

use crate::{
    doc::geo::{Point, Rect},
    index::IndexReader,
    search::{
        aggregations::{self, Aggregation, Aggregations},
        automaton, boolean::BooleanSearcher, collector::SearchResults,
        conjunction::ConjunctionSearcher, disjunction::DisjunctionSearcher, geo,
        matchall::{MatchAllSearcher, MatchNoneSearcher},
        phrase::{PhrasePart, PhraseSearcher},
        range, term::TermSearcher, AllCollector, Context, DocumentMatch, Searcher,
        SearcherOptions, SortOrder, TopNCollector,
    },
    Result,
};

/// A query compiles to a searcher over one reader.
pub trait Query: Send + Sync {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>>;
}

fn resolve_field<'a>(field: &'a Option<String>, reader: &'a IndexReader) -> &'a str {
    match field {
        Some(field) => field,
        None => reader.config().default_search_field(),
    }
}

// multiplies the wrapped searcher's scores.
struct BoostSearcher {
    inner: Box<dyn Searcher>,
    boost: f64,
}

impl Searcher for BoostSearcher {
    fn next(&mut self, ctx: &Context) -> Result<Option<DocumentMatch>> {
        Ok(self.inner.next(ctx)?.map(|mut dm| {
            dm.score *= self.boost;
            dm
        }))
    }

    fn advance(&mut self, ctx: &Context, target: u64) -> Result<Option<DocumentMatch>> {
        Ok(self.inner.advance(ctx, target)?.map(|mut dm| {
            dm.score *= self.boost;
            dm
        }))
    }

    fn count(&self) -> u64 {
        self.inner.count()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

fn boosted(searcher: Box<dyn Searcher>, boost: f64) -> Box<dyn Searcher> {
    match boost {
        b if (b - 1.0).abs() < f64::EPSILON => searcher,
        boost => Box::new(BoostSearcher {
            inner: searcher,
            boost,
        }),
    }
}

/// Single-term query, exact bytes against one field.
pub struct TermQuery {
    term: Vec<u8>,
    field: Option<String>,
    boost: f64,
}

impl TermQuery {
    pub fn new(term: &str) -> TermQuery {
        TermQuery {
            term: term.as_bytes().to_vec(),
            field: None,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> TermQuery {
        self.field = Some(field.to_string());
        self
    }

    pub fn set_boost(mut self, boost: f64) -> TermQuery {
        self.boost = boost;
        self
    }
}

impl Query for TermQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        Ok(Box::new(TermSearcher::new(
            reader, field, &self.term, self.boost, options,
        )?))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum MatchOperator {
    Or,
    And,
}

/// Analyzed text query: the text runs through the search analyzer and the
/// resulting terms combine per the operator.
pub struct MatchQuery {
    text: String,
    field: Option<String>,
    operator: MatchOperator,
    boost: f64,
}

impl MatchQuery {
    pub fn new(text: &str) -> MatchQuery {
        MatchQuery {
            text: text.to_string(),
            field: None,
            operator: MatchOperator::Or,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> MatchQuery {
        self.field = Some(field.to_string());
        self
    }

    pub fn set_operator(mut self, operator: MatchOperator) -> MatchQuery {
        self.operator = operator;
        self
    }

    pub fn set_boost(mut self, boost: f64) -> MatchQuery {
        self.boost = boost;
        self
    }
}

impl Query for MatchQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        let tokens = reader.config().analyzer().analyze(&self.text);
        if tokens.is_empty() {
            return Ok(Box::new(MatchNoneSearcher));
        }

        let mut children: Vec<Box<dyn Searcher>> = vec![];
        for token in tokens.iter() {
            children.push(Box::new(TermSearcher::new(
                reader,
                field,
                &token.term,
                self.boost,
                options,
            )?));
        }

        match (children.len(), self.operator) {
            (1, _) => Ok(children.pop().unwrap()),
            (_, MatchOperator::Or) => {
                Ok(Box::new(DisjunctionSearcher::new(children, 1, false)?))
            }
            (_, MatchOperator::And) => Ok(Box::new(ConjunctionSearcher::new(children)?)),
        }
    }
}

/// Boolean combination of sub-queries.
#[derive(Default)]
pub struct BooleanQuery {
    musts: Vec<Arc<dyn Query>>,
    shoulds: Vec<Arc<dyn Query>>,
    must_nots: Vec<Arc<dyn Query>>,
    min_should: usize,
    boost: f64,
}

impl BooleanQuery {
    pub fn new() -> BooleanQuery {
        BooleanQuery {
            boost: 1.0,
            ..BooleanQuery::default()
        }
    }

    pub fn add_must(mut self, query: Arc<dyn Query>) -> BooleanQuery {
        self.musts.push(query);
        self
    }

    pub fn add_should(mut self, query: Arc<dyn Query>) -> BooleanQuery {
        self.shoulds.push(query);
        self
    }

    pub fn add_must_not(mut self, query: Arc<dyn Query>) -> BooleanQuery {
        self.must_nots.push(query);
        self
    }

    /// Matching `should` clauses required; defaults to 0 with a `must`
    /// present, 1 otherwise.
    pub fn set_min_should(mut self, min: usize) -> BooleanQuery {
        self.min_should = min;
        self
    }

    pub fn set_boost(mut self, boost: f64) -> BooleanQuery {
        self.boost = boost;
        self
    }

    fn compile(
        queries: &[Arc<dyn Query>],
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Vec<Box<dyn Searcher>>> {
        let mut searchers = vec![];
        for query in queries.iter() {
            searchers.push(query.searcher(reader, options)?);
        }
        Ok(searchers)
    }
}

impl Query for BooleanQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let must = match self.musts.len() {
            0 => None,
            1 => Some(Self::compile(&self.musts, reader, options)?.pop().unwrap()),
            _ => Some(Box::new(ConjunctionSearcher::new(Self::compile(
                &self.musts,
                reader,
                options,
            )?)?) as Box<dyn Searcher>),
        };

        let should = match self.shoulds.len() {
            0 => None,
            _ => Some(Box::new(DisjunctionSearcher::new(
                Self::compile(&self.shoulds, reader, options)?,
                self.min_should.max(1),
                false,
            )?) as Box<dyn Searcher>),
        };

        let must_not = match self.must_nots.len() {
            0 => None,
            _ => Some(Box::new(DisjunctionSearcher::new(
                Self::compile(&self.must_nots, reader, options)?,
                1,
                false,
            )?) as Box<dyn Searcher>),
        };

        let searcher = BooleanSearcher::new(must, should, must_not, self.min_should)?;
        Ok(boosted(Box::new(searcher), self.boost))
    }
}

/// Exact term sequence with optional slop, one term per position.
pub struct PhraseQuery {
    terms: Vec<String>,
    field: Option<String>,
    slop: u32,
    boost: f64,
}

impl PhraseQuery {
    pub fn new(terms: Vec<&str>) -> PhraseQuery {
        PhraseQuery {
            terms: terms.into_iter().map(|t| t.to_string()).collect(),
            field: None,
            slop: 0,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> PhraseQuery {
        self.field = Some(field.to_string());
        self
    }

    pub fn set_slop(mut self, slop: u32) -> PhraseQuery {
        self.slop = slop;
        self
    }

    pub fn set_boost(mut self, boost: f64) -> PhraseQuery {
        self.boost = boost;
        self
    }
}

impl Query for PhraseQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        let parts: Vec<PhrasePart> = self
            .terms
            .iter()
            .map(|term| match term.is_empty() {
                true => PhrasePart::Gap,
                false => PhrasePart::Terms(vec![term.as_bytes().to_vec()]),
            })
            .collect();
        Ok(Box::new(PhraseSearcher::new(
            reader, field, parts, self.slop, self.boost, options,
        )?))
    }
}

/// Phrase with alternatives per position; an empty alternative list is a
/// single-token gap.
pub struct MultiPhraseQuery {
    parts: Vec<Vec<String>>,
    field: Option<String>,
    slop: u32,
    boost: f64,
}

impl MultiPhraseQuery {
    pub fn new(parts: Vec<Vec<&str>>) -> MultiPhraseQuery {
        MultiPhraseQuery {
            parts: parts
                .into_iter()
                .map(|terms| terms.into_iter().map(|t| t.to_string()).collect())
                .collect(),
            field: None,
            slop: 0,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> MultiPhraseQuery {
        self.field = Some(field.to_string());
        self
    }

    pub fn set_slop(mut self, slop: u32) -> MultiPhraseQuery {
        self.slop = slop;
        self
    }
}

impl Query for MultiPhraseQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        let parts: Vec<PhrasePart> = self
            .parts
            .iter()
            .map(|terms| {
                let terms: Vec<Vec<u8>> = terms
                    .iter()
                    .filter(|t| !t.is_empty())
                    .map(|t| t.as_bytes().to_vec())
                    .collect();
                match terms.is_empty() {
                    true => PhrasePart::Gap,
                    false => PhrasePart::Terms(terms),
                }
            })
            .collect();
        Ok(Box::new(PhraseSearcher::new(
            reader, field, parts, self.slop, self.boost, options,
        )?))
    }
}

/// Terms within edit distance `fuzziness` of the given term.
pub struct FuzzyQuery {
    term: String,
    field: Option<String>,
    fuzziness: u8,
    prefix_len: usize,
    boost: f64,
}

impl FuzzyQuery {
    pub fn new(term: &str) -> FuzzyQuery {
        FuzzyQuery {
            term: term.to_string(),
            field: None,
            fuzziness: 1,
            prefix_len: 0,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> FuzzyQuery {
        self.field = Some(field.to_string());
        self
    }

    pub fn set_fuzziness(mut self, fuzziness: u8) -> FuzzyQuery {
        self.fuzziness = fuzziness;
        self
    }

    pub fn set_prefix(mut self, prefix_len: usize) -> FuzzyQuery {
        self.prefix_len = prefix_len;
        self
    }
}

impl Query for FuzzyQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        automaton::fuzzy_searcher(
            reader,
            field,
            &self.term,
            self.fuzziness,
            self.prefix_len,
            self.boost,
            options,
        )
    }
}

/// Anchored regular expression over a field's terms.
pub struct RegexpQuery {
    pattern: String,
    field: Option<String>,
    boost: f64,
}

impl RegexpQuery {
    pub fn new(pattern: &str) -> RegexpQuery {
        RegexpQuery {
            pattern: pattern.to_string(),
            field: None,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> RegexpQuery {
        self.field = Some(field.to_string());
        self
    }
}

impl Query for RegexpQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        automaton::regexp_searcher(reader, field, &self.pattern, self.boost, options)
    }
}

pub struct PrefixQuery {
    prefix: String,
    field: Option<String>,
    boost: f64,
}

impl PrefixQuery {
    pub fn new(prefix: &str) -> PrefixQuery {
        PrefixQuery {
            prefix: prefix.to_string(),
            field: None,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> PrefixQuery {
        self.field = Some(field.to_string());
        self
    }
}

impl Query for PrefixQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        automaton::prefix_searcher(reader, field, self.prefix.as_bytes(), self.boost, options)
    }
}

/// `*` any run, `?` any single character.
pub struct WildcardQuery {
    wildcard: String,
    field: Option<String>,
    boost: f64,
}

impl WildcardQuery {
    pub fn new(wildcard: &str) -> WildcardQuery {
        WildcardQuery {
            wildcard: wildcard.to_string(),
            field: None,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> WildcardQuery {
        self.field = Some(field.to_string());
        self
    }
}

impl Query for WildcardQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        automaton::wildcard_searcher(reader, field, &self.wildcard, self.boost, options)
    }
}

pub struct TermRangeQuery {
    min: Option<Vec<u8>>,
    max: Option<Vec<u8>>,
    min_inclusive: bool,
    max_inclusive: bool,
    field: Option<String>,
    boost: f64,
}

impl TermRangeQuery {
    pub fn new(min: Option<&str>, max: Option<&str>) -> TermRangeQuery {
        TermRangeQuery {
            min: min.map(|t| t.as_bytes().to_vec()),
            max: max.map(|t| t.as_bytes().to_vec()),
            min_inclusive: true,
            max_inclusive: false,
            field: None,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> TermRangeQuery {
        self.field = Some(field.to_string());
        self
    }

    pub fn set_inclusive(mut self, min: bool, max: bool) -> TermRangeQuery {
        self.min_inclusive = min;
        self.max_inclusive = max;
        self
    }
}

impl Query for TermRangeQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        range::term_range_searcher(
            reader,
            field,
            self.min.as_deref(),
            self.max.as_deref(),
            self.min_inclusive,
            self.max_inclusive,
            self.boost,
            options,
        )
    }
}

pub struct NumericRangeQuery {
    min: Option<f64>,
    max: Option<f64>,
    min_inclusive: bool,
    max_inclusive: bool,
    field: Option<String>,
    boost: f64,
}

impl NumericRangeQuery {
    pub fn new(min: Option<f64>, max: Option<f64>) -> NumericRangeQuery {
        NumericRangeQuery {
            min,
            max,
            min_inclusive: true,
            max_inclusive: false,
            field: None,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> NumericRangeQuery {
        self.field = Some(field.to_string());
        self
    }

    pub fn set_inclusive(mut self, min: bool, max: bool) -> NumericRangeQuery {
        self.min_inclusive = min;
        self.max_inclusive = max;
        self
    }

    pub fn set_boost(mut self, boost: f64) -> NumericRangeQuery {
        self.boost = boost;
        self
    }
}

impl Query for NumericRangeQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        range::numeric_range_searcher(
            reader,
            field,
            self.min,
            self.max,
            self.min_inclusive,
            self.max_inclusive,
            self.boost,
            options,
        )
    }
}

pub struct DateRangeQuery {
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
    start_inclusive: bool,
    end_inclusive: bool,
    field: Option<String>,
    boost: f64,
}

impl DateRangeQuery {
    pub fn new(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> DateRangeQuery {
        DateRangeQuery {
            start,
            end,
            start_inclusive: true,
            end_inclusive: false,
            field: None,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> DateRangeQuery {
        self.field = Some(field.to_string());
        self
    }
}

impl Query for DateRangeQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        range::date_range_searcher(
            reader,
            field,
            self.start,
            self.end,
            self.start_inclusive,
            self.end_inclusive,
            self.boost,
            options,
        )
    }
}

pub struct GeoBoundingBoxQuery {
    rect: Rect,
    field: Option<String>,
    boost: f64,
}

impl GeoBoundingBoxQuery {
    pub fn new(min_lng: f64, min_lat: f64, max_lng: f64, max_lat: f64) -> GeoBoundingBoxQuery {
        GeoBoundingBoxQuery {
            rect: Rect {
                min_lng,
                min_lat,
                max_lng,
                max_lat,
            },
            field: None,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> GeoBoundingBoxQuery {
        self.field = Some(field.to_string());
        self
    }
}

impl Query for GeoBoundingBoxQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        geo::bounding_box_searcher(reader, field, self.rect, self.boost, options)
    }
}

pub struct GeoDistanceQuery {
    center: Point,
    radius_meters: f64,
    field: Option<String>,
    boost: f64,
}

impl GeoDistanceQuery {
    pub fn new(lng: f64, lat: f64, radius_meters: f64) -> GeoDistanceQuery {
        GeoDistanceQuery {
            center: Point { lng, lat },
            radius_meters,
            field: None,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> GeoDistanceQuery {
        self.field = Some(field.to_string());
        self
    }
}

impl Query for GeoDistanceQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        geo::point_distance_searcher(
            reader,
            field,
            self.center,
            self.radius_meters,
            self.boost,
            options,
        )
    }
}

pub struct GeoPolygonQuery {
    vertices: Vec<Point>,
    field: Option<String>,
    boost: f64,
}

impl GeoPolygonQuery {
    pub fn new(vertices: Vec<(f64, f64)>) -> GeoPolygonQuery {
        GeoPolygonQuery {
            vertices: vertices
                .into_iter()
                .map(|(lng, lat)| Point { lng, lat })
                .collect(),
            field: None,
            boost: 1.0,
        }
    }

    pub fn set_field(mut self, field: &str) -> GeoPolygonQuery {
        self.field = Some(field.to_string());
        self
    }
}

impl Query for GeoPolygonQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        let field = resolve_field(&self.field, reader);
        geo::polygon_searcher(reader, field, self.vertices.clone(), self.boost, options)
    }
}

pub struct MatchAllQuery;

impl Query for MatchAllQuery {
    fn searcher(
        &self,
        reader: &IndexReader,
        _options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        Ok(Box::new(MatchAllSearcher::new(reader, 1.0)?))
    }
}

pub struct MatchNoneQuery;

impl Query for MatchNoneQuery {
    fn searcher(
        &self,
        _reader: &IndexReader,
        _options: SearcherOptions,
    ) -> Result<Box<dyn Searcher>> {
        Ok(Box::new(MatchNoneSearcher))
    }
}

// approximate per-match footprint for the pre-search memory estimate.
const DOC_MATCH_SIZE: u64 = 512;

/// Top-N search request: query, result window, sort order, aggregations.
#[derive(Clone)]
pub struct TopNSearch {
    query: Arc<dyn Query>,
    n: usize,
    from: usize,
    sort: SortOrder,
    after: Option<Vec<Vec<u8>>>,
    reversed: bool,
    aggregations: Aggregations,
    explain: bool,
    include_locations: bool,
}

impl TopNSearch {
    pub fn new(n: usize, query: Arc<dyn Query>) -> TopNSearch {
        TopNSearch {
            query,
            n,
            from: 0,
            sort: SortOrder::by_score(),
            after: None,
            reversed: false,
            aggregations: Aggregations::new(),
            explain: false,
            include_locations: false,
        }
    }

    pub fn set_from(mut self, from: usize) -> TopNSearch {
        self.from = from;
        self
    }

    /// Resume after the given sort key (cursor pagination forward).
    pub fn after(mut self, key: Vec<Vec<u8>>) -> TopNSearch {
        self.after = Some(key);
        self.reversed = false;
        self
    }

    /// Page backwards from the given sort key; results keep the request's
    /// orientation.
    pub fn before(mut self, key: Vec<Vec<u8>>) -> TopNSearch {
        self.after = Some(key);
        self.reversed = true;
        self
    }

    pub fn sort_by(mut self, orders: &[&str]) -> TopNSearch {
        self.sort = SortOrder::parse(orders);
        self
    }

    pub fn sort_by_custom(mut self, sort: SortOrder) -> TopNSearch {
        self.sort = sort;
        self
    }

    pub fn with_standard_aggregations(mut self) -> TopNSearch {
        self.aggregations.add("count", aggregations::count_matches());
        self.aggregations
            .add("max_score", aggregations::max(aggregations::Source::Score));
        self
    }

    pub fn add_aggregation(mut self, name: &str, aggregation: Arc<dyn Aggregation>) -> TopNSearch {
        self.aggregations.add(name, aggregation);
        self
    }

    pub fn explain_scores(mut self) -> TopNSearch {
        self.explain = true;
        self
    }

    pub fn include_locations(mut self) -> TopNSearch {
        self.include_locations = true;
        self
    }

    pub fn size(&self) -> usize {
        self.n
    }

    pub fn from(&self) -> usize {
        self.from
    }

    pub fn sort_order(&self) -> &SortOrder {
        &self.sort
    }

    pub fn is_reversed(&self) -> bool {
        self.reversed
    }

    /// Comparison order in effect during collection.
    pub fn effective_order(&self) -> SortOrder {
        match self.reversed {
            true => self.sort.reversed(),
            false => self.sort.clone(),
        }
    }

    /// Shard-local form for multi-reader fan-out: collect enough matches to
    /// satisfy the global window.
    pub(crate) fn shard_form(mut self) -> TopNSearch {
        self.n += self.from;
        self.from = 0;
        self
    }

    fn options(&self) -> SearcherOptions {
        SearcherOptions {
            explain: self.explain,
            include_locations: self.include_locations,
        }
    }

    fn collector(&self) -> TopNCollector {
        let collector = TopNCollector::new(self.n, self.from, self.sort.clone());
        match (&self.after, self.reversed) {
            (Some(key), false) => collector.after(key.clone()),
            (Some(key), true) => collector.before(key.clone()),
            (None, _) => collector,
        }
    }
}

/// Unbounded request: every match in doc order.
pub struct AllMatches {
    query: Arc<dyn Query>,
    aggregations: Aggregations,
    explain: bool,
    include_locations: bool,
}

impl AllMatches {
    pub fn new(query: Arc<dyn Query>) -> AllMatches {
        AllMatches {
            query,
            aggregations: Aggregations::new(),
            explain: false,
            include_locations: false,
        }
    }

    pub fn add_aggregation(mut self, name: &str, aggregation: Arc<dyn Aggregation>) -> AllMatches {
        self.aggregations.add(name, aggregation);
        self
    }

    pub fn explain_scores(mut self) -> AllMatches {
        self.explain = true;
        self
    }

    pub fn include_locations(mut self) -> AllMatches {
        self.include_locations = true;
        self
    }
}

impl IndexReader {
    /// Execute a top-N request against this reader's snapshot.
    pub fn search(&self, ctx: &Context, request: &TopNSearch) -> Result<SearchResults> {
        let searcher = request.query.searcher(self, request.options())?;

        if let Some(hook) = &self.config().search_start {
            let estimate = (request.n + request.from + searcher.doc_match_pool_size())
                as u64
                * DOC_MATCH_SIZE;
            hook(estimate)?;
        }

        let mut searcher = searcher;
        request
            .collector()
            .collect(ctx, searcher.as_mut(), self, &request.aggregations)
    }

    /// Execute an unbounded request against this reader's snapshot.
    pub fn search_all(&self, ctx: &Context, request: &AllMatches) -> Result<SearchResults> {
        let options = SearcherOptions {
            explain: request.explain,
            include_locations: request.include_locations,
        };
        let mut searcher = request.query.searcher(self, options)?;

        if let Some(hook) = &self.config().search_start {
            let estimate = searcher.count() * DOC_MATCH_SIZE;
            hook(estimate)?;
        }

        AllCollector.collect(ctx, searcher.as_mut(), self, &request.aggregations)
    }
}

#[cfg(test)]
#[path = "query_test.rs"]
mod query_test;
