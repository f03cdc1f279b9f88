use super::*;

#[test]
fn test_morton_roundtrip() {
    let points = vec![
        (0.0, 0.0),
        (2.5, 48.8),
        (-122.4, 37.7),
        (179.9, 89.9),
        (-179.9, -89.9),
    ];

    for (lng, lat) in points.into_iter() {
        let hash = morton_hash(lng, lat);
        let (got_lng, got_lat) = (morton_unhash_lng(hash), morton_unhash_lat(hash));
        assert!((got_lng - lng).abs() < 1e-6, "{} vs {}", got_lng, lng);
        assert!((got_lat - lat).abs() < 1e-6, "{} vs {}", got_lat, lat);
    }
}

#[test]
fn test_trie_terms() {
    let terms = trie_terms(2.5, 48.8);
    assert_eq!(terms.len(), N_GEO_LEVELS);
}

#[test]
fn test_decompose_rect() {
    let rect = Rect {
        min_lng: 0.001,
        min_lat: 0.001,
        max_lng: 1.002,
        max_lat: 1.002,
    };
    let (off, on) = decompose_rect(&rect, 1024);
    assert!(!off.is_empty() || !on.is_empty());

    // off-boundary cells lie entirely within the rectangle
    for cell in off.iter() {
        let first = cell.value;
        let last = match cell.shift {
            0 => cell.value,
            s => cell.value | ((1_u64 << s) - 1),
        };
        for hash in [first, last].iter() {
            let (lng, lat) = (morton_unhash_lng(*hash), morton_unhash_lat(*hash));
            assert!(rect.contains(lng, lat), "cell {:?} corner ({}, {})", cell, lng, lat);
        }
    }

    // a point inside the rect lands in exactly one emitted cell
    let hash = morton_hash(0.5, 0.5);
    let mut hits = 0;
    for cell in off.iter().chain(on.iter()) {
        let masked = match cell.shift {
            0 => hash,
            64 => 0,
            s => hash & !((1_u64 << s) - 1),
        };
        if masked == cell.value {
            hits += 1;
        }
    }
    assert_eq!(hits, 1);
}

#[test]
fn test_haversine() {
    let paris = Point { lng: 2.35, lat: 48.85 };
    let london = Point { lng: -0.13, lat: 51.51 };
    let d = haversine_distance(paris, london);
    // roughly 344 km
    assert!(d > 330_000.0 && d < 360_000.0, "{}", d);
    assert!(haversine_distance(paris, paris) < 1.0);
}

#[test]
fn test_rect_from_point_distance() {
    let center = Point { lng: 2.35, lat: 48.85 };
    let rect = rect_from_point_distance(center, 10_000.0);
    assert!(rect.contains(center.lng, center.lat));
    assert!(rect.max_lat > center.lat && rect.min_lat < center.lat);
    // every point within the radius falls inside the box
    let east = Point { lng: center.lng + 0.05, lat: center.lat };
    assert!(haversine_distance(center, east) < 10_000.0);
    assert!(rect.contains(east.lng, east.lat));
}

#[test]
fn test_point_in_polygon() {
    let triangle = vec![
        Point { lng: 0.0, lat: 0.0 },
        Point { lng: 4.0, lat: 0.0 },
        Point { lng: 2.0, lat: 4.0 },
    ];

    assert!(point_in_polygon(Point { lng: 2.0, lat: 1.0 }, &triangle));
    assert!(!point_in_polygon(Point { lng: 3.9, lat: 3.9 }, &triangle));
    assert!(!point_in_polygon(Point { lng: -1.0, lat: 0.5 }, &triangle));
}
