//! Module `geo` implement morton-coded geo-point term encoding and the
//! exact-geometry predicates used to re-check boundary candidates.

use crate::doc::numeric::{self, prefix_coded_i64};

/// Trie levels emitted for an indexed geo-point, shifts `0,8,..,64`.
pub const N_GEO_LEVELS: usize = 9;

/// Number of morton bits dropped between successive geo trie levels.
pub const GEO_PRECISION_STEP: u8 = 8;

const MORTON_SCALE: f64 = (1_u64 << 32) as f64;

/// A geo-point, degrees. Longitude first, the order morton interleaving uses.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    pub lng: f64,
    pub lat: f64,
}

/// Interleave scaled (lng, lat) into a 64-bit morton hash. Longitude occupies
/// the even bits.
pub fn morton_hash(lng: f64, lat: f64) -> u64 {
    numeric::interleave(scale_lng(lng), scale_lat(lat))
}

/// Longitude component of a morton hash.
pub fn morton_unhash_lng(hash: u64) -> f64 {
    unscale_lng(numeric::deinterleave(hash))
}

/// Latitude component of a morton hash.
pub fn morton_unhash_lat(hash: u64) -> f64 {
    unscale_lat(numeric::deinterleave(hash >> 1))
}

fn scale_lng(lng: f64) -> u64 {
    ((lng + 180.0) / 360.0 * MORTON_SCALE) as u64
}

fn scale_lat(lat: f64) -> u64 {
    ((lat + 90.0) / 180.0 * MORTON_SCALE) as u64
}

fn unscale_lng(val: u64) -> f64 {
    (val as f64) / MORTON_SCALE * 360.0 - 180.0
}

fn unscale_lat(val: u64) -> f64 {
    (val as f64) / MORTON_SCALE * 180.0 - 90.0
}

/// Emit the geo trie-term set for an indexed point.
pub fn trie_terms(lng: f64, lat: f64) -> Vec<Vec<u8>> {
    let hash = morton_hash(lng, lat) as i64;
    (0..N_GEO_LEVELS)
        .map(|level| prefix_coded_i64(hash, (level as u8) * GEO_PRECISION_STEP))
        .collect()
}

/// Rectangle in degrees, inclusive bounds.
#[derive(Clone, Copy, Debug)]
pub struct Rect {
    pub min_lng: f64,
    pub min_lat: f64,
    pub max_lng: f64,
    pub max_lat: f64,
}

impl Rect {
    pub fn contains(&self, lng: f64, lat: f64) -> bool {
        lng >= self.min_lng && lng <= self.max_lng && lat >= self.min_lat && lat <= self.max_lat
    }
}

/// Morton-space cell at a given trie level. `value` is the morton hash of the
/// cell's first point, with the low `shift` bits zero.
#[derive(Clone, Copy, Debug)]
pub struct Cell {
    pub value: u64,
    pub shift: u8,
}

impl Cell {
    /// The prefix-coded term matching every point indexed inside this cell.
    pub fn term(&self) -> Vec<u8> {
        prefix_coded_i64(self.value as i64, self.shift)
    }

    fn bounds(&self) -> Rect {
        let first = self.value;
        let last = match self.shift {
            0 => self.value,
            s => self.value | ((1_u64 << s) - 1),
        };
        Rect {
            min_lng: morton_unhash_lng(first),
            min_lat: morton_unhash_lat(first),
            max_lng: morton_unhash_lng(last),
            max_lat: morton_unhash_lat(last),
        }
    }
}

/// Decompose `rect` into morton cells. Cells entirely inside the rectangle
/// land in `off_boundary` and their matches are accepted unconditionally;
/// cells overlapping the boundary land in `on_boundary` and their matches
/// must be re-checked against the exact rectangle. `max_cells` bounds the
/// decomposition; when reached, remaining cells stop splitting and are
/// treated as on-boundary.
pub fn decompose_rect(rect: &Rect, max_cells: usize) -> (Vec<Cell>, Vec<Cell>) {
    let mut off_boundary = vec![];
    let mut on_boundary = vec![];

    let root = Cell { value: 0, shift: 64 };
    split_cell(rect, root, max_cells, &mut off_boundary, &mut on_boundary);

    (off_boundary, on_boundary)
}

fn split_cell(
    rect: &Rect,
    cell: Cell,
    max_cells: usize,
    off_boundary: &mut Vec<Cell>,
    on_boundary: &mut Vec<Cell>,
) {
    let bounds = cell.bounds();

    let disjoint = bounds.min_lng > rect.max_lng
        || bounds.max_lng < rect.min_lng
        || bounds.min_lat > rect.max_lat
        || bounds.max_lat < rect.min_lat;
    if disjoint {
        return;
    }

    let within = bounds.min_lng >= rect.min_lng
        && bounds.max_lng <= rect.max_lng
        && bounds.min_lat >= rect.min_lat
        && bounds.max_lat <= rect.max_lat;
    if within {
        off_boundary.push(cell);
        return;
    }

    let budget_spent = off_boundary.len() + on_boundary.len() >= max_cells;
    if cell.shift == 0 || budget_spent {
        on_boundary.push(cell);
        return;
    }

    let shift = cell.shift - GEO_PRECISION_STEP;
    for child in 0..(1_u64 << GEO_PRECISION_STEP) {
        let value = cell.value | (child << shift);
        let child_cell = Cell { value, shift };
        split_cell(rect, child_cell, max_cells, off_boundary, on_boundary);
    }
}

const EARTH_RADIUS_METERS: f64 = 6_378_137.0;

/// Great-circle distance in meters between two points.
pub fn haversine_distance(a: Point, b: Point) -> f64 {
    let (lat1, lat2) = (a.lat.to_radians(), b.lat.to_radians());
    let dlat = (b.lat - a.lat).to_radians();
    let dlng = (b.lng - a.lng).to_radians();

    let h = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_METERS * h.sqrt().asin()
}

/// Axis-aligned rectangle covering every point within `radius_meters` of
/// `center`. Longitude span widens with latitude; poles and the date line are
/// clamped rather than wrapped.
pub fn rect_from_point_distance(center: Point, radius_meters: f64) -> Rect {
    let lat_delta = (radius_meters / EARTH_RADIUS_METERS).to_degrees();
    let lng_delta = {
        let cos = center.lat.to_radians().cos().max(1e-9);
        (radius_meters / (EARTH_RADIUS_METERS * cos)).to_degrees()
    };

    Rect {
        min_lng: (center.lng - lng_delta).max(-180.0),
        min_lat: (center.lat - lat_delta).max(-90.0),
        max_lng: (center.lng + lng_delta).min(180.0),
        max_lat: (center.lat + lat_delta).min(90.0),
    }
}

/// Bounding rectangle of a polygon's vertices.
pub fn rect_from_polygon(vertices: &[Point]) -> Rect {
    let mut rect = Rect {
        min_lng: f64::MAX,
        min_lat: f64::MAX,
        max_lng: f64::MIN,
        max_lat: f64::MIN,
    };
    for v in vertices.iter() {
        rect.min_lng = rect.min_lng.min(v.lng);
        rect.min_lat = rect.min_lat.min(v.lat);
        rect.max_lng = rect.max_lng.max(v.lng);
        rect.max_lat = rect.max_lat.max(v.lat);
    }
    rect
}

/// Ray-casting point-in-polygon test. Vertices may be open or closed.
pub fn point_in_polygon(point: Point, vertices: &[Point]) -> bool {
    if vertices.len() < 3 {
        return false;
    }

    let mut inside = false;
    let mut j = vertices.len() - 1;
    for i in 0..vertices.len() {
        let (vi, vj) = (vertices[i], vertices[j]);
        let crosses = (vi.lat > point.lat) != (vj.lat > point.lat)
            && point.lng
                < (vj.lng - vi.lng) * (point.lat - vi.lat) / (vj.lat - vi.lat) + vi.lng;
        if crosses {
            inside = !inside;
        }
        j = i;
    }
    inside
}

#[cfg(test)]
#[path = "geo_test.rs"]
mod geo_test;
