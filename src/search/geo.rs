//! Geo searchers: bounding box, point-distance and polygon containment.
//!
//! Candidates come from morton-cell terms. Cells entirely inside the target
//! shape's bounding box match unconditionally; boundary cells are re-checked
//! against the exact geometry using the point recovered from doc-values.

use crate::{
    codec::PostingOptions,
    doc::{
        geo::{self, Point, Rect},
        numeric,
    },
    index::{DocumentValueReader, IndexReader},
    search::{
        disjunction::DisjunctionSearcher,
        term::UnadornedUnionSearcher,
        Context, DocumentMatch, Searcher, SearcherOptions,
    },
    Error, Result,
};

const MAX_GEO_CELLS: usize = 1024;

// union searcher over a set of cell terms, constant score.
fn cell_union(
    reader: &IndexReader,
    field: &str,
    cells: &[geo::Cell],
    boost: f64,
) -> Result<UnadornedUnionSearcher> {
    let max = reader.config().max_clause_count();
    if cells.len() > max {
        return err_at!(QueryTooBroad, msg: "field {} expands to {} cells", field, cells.len());
    }

    let mut cursors = vec![];
    for cell in cells.iter() {
        cursors.push(reader.postings_iterator(
            field,
            Some(&cell.term()),
            PostingOptions::default(),
        )?);
    }
    Ok(UnadornedUnionSearcher::new(cursors, boost))
}

// decode the indexed morton point back to degrees.
fn doc_point(dm: &DocumentMatch, dv: &DocumentValueReader, field: &str) -> Result<Option<Point>> {
    let mut term: Option<Vec<u8>> = None;
    dv.visit(dm.number, &mut |name, value| {
        if name == field && term.is_none() {
            term = Some(value.to_vec());
        }
    })?;

    match term {
        Some(term) => {
            let (hash, _) = numeric::prefix_coded_to_i64(&term)?;
            Ok(Some(Point {
                lng: geo::morton_unhash_lng(hash as u64),
                lat: geo::morton_unhash_lat(hash as u64),
            }))
        }
        None => Ok(None),
    }
}

// wraps a candidate searcher with an exact-geometry re-check.
struct GeoFilterSearcher<F>
where
    F: Fn(Point) -> bool + Send,
{
    inner: Box<dyn Searcher>,
    dv: DocumentValueReader,
    field: String,
    keep: F,
}

impl<F> Searcher for GeoFilterSearcher<F>
where
    F: Fn(Point) -> bool + Send,
{
    fn next(&mut self, ctx: &Context) -> Result<Option<DocumentMatch>> {
        loop {
            ctx.check()?;
            match self.inner.next(ctx)? {
                Some(dm) => match doc_point(&dm, &self.dv, &self.field)? {
                    Some(point) if (self.keep)(point) => return Ok(Some(dm)),
                    _ => continue,
                },
                None => return Ok(None),
            }
        }
    }

    fn advance(&mut self, ctx: &Context, target: u64) -> Result<Option<DocumentMatch>> {
        ctx.check()?;
        match self.inner.advance(ctx, target)? {
            Some(dm) => match doc_point(&dm, &self.dv, &self.field)? {
                Some(point) if (self.keep)(point) => Ok(Some(dm)),
                _ => self.next(ctx),
            },
            None => Ok(None),
        }
    }

    fn count(&self) -> u64 {
        self.inner.count()
    }

    fn close(&mut self) -> Result<()> {
        self.inner.close()
    }
}

/// Bounding-box searcher. Off-boundary cells are accepted as-is;
/// on-boundary cells re-check the exact rectangle.
pub fn bounding_box_searcher(
    reader: &IndexReader,
    field: &str,
    rect: Rect,
    boost: f64,
    _options: SearcherOptions,
) -> Result<Box<dyn Searcher>> {
    let (off_boundary, on_boundary) = geo::decompose_rect(&rect, MAX_GEO_CELLS);

    let mut children: Vec<Box<dyn Searcher>> = vec![];
    if !off_boundary.is_empty() {
        children.push(Box::new(cell_union(reader, field, &off_boundary, boost)?));
    }
    if !on_boundary.is_empty() {
        let inner = Box::new(cell_union(reader, field, &on_boundary, boost)?);
        children.push(Box::new(GeoFilterSearcher {
            inner,
            dv: reader.doc_values_reader(&[field.to_string()]),
            field: field.to_string(),
            keep: move |p: Point| rect.contains(p.lng, p.lat),
        }));
    }

    match children.len() {
        0 => Ok(Box::new(crate::search::matchall::MatchNoneSearcher)),
        1 => Ok(children.pop().unwrap()),
        _ => Ok(Box::new(DisjunctionSearcher::new(children, 1, false)?)),
    }
}

/// Point-distance searcher: bounding box candidates post-filtered by
/// haversine distance.
pub fn point_distance_searcher(
    reader: &IndexReader,
    field: &str,
    center: Point,
    radius_meters: f64,
    boost: f64,
    _options: SearcherOptions,
) -> Result<Box<dyn Searcher>> {
    let rect = geo::rect_from_point_distance(center, radius_meters);
    let (mut cells, on_boundary) = geo::decompose_rect(&rect, MAX_GEO_CELLS);
    cells.extend(on_boundary);

    let inner = Box::new(cell_union(reader, field, &cells, boost)?);
    Ok(Box::new(GeoFilterSearcher {
        inner,
        dv: reader.doc_values_reader(&[field.to_string()]),
        field: field.to_string(),
        keep: move |p: Point| geo::haversine_distance(center, p) <= radius_meters,
    }))
}

/// Polygon searcher: bounding box candidates post-filtered by ray casting.
pub fn polygon_searcher(
    reader: &IndexReader,
    field: &str,
    vertices: Vec<Point>,
    boost: f64,
    _options: SearcherOptions,
) -> Result<Box<dyn Searcher>> {
    if vertices.len() < 3 {
        return err_at!(InvalidInput, msg: "polygon needs 3 vertices, got {}", vertices.len());
    }

    let rect = geo::rect_from_polygon(&vertices);
    let (mut cells, on_boundary) = geo::decompose_rect(&rect, MAX_GEO_CELLS);
    cells.extend(on_boundary);

    let inner = Box::new(cell_union(reader, field, &cells, boost)?);
    Ok(Box::new(GeoFilterSearcher {
        inner,
        dv: reader.doc_values_reader(&[field.to_string()]),
        field: field.to_string(),
        keep: move |p: Point| geo::point_in_polygon(p, &vertices),
    }))
}

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;
