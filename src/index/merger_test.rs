use super::*;

use crate::{
    analysis::{analyze_document, SimpleAnalyzer},
    codec::{PostingOptions, Segment},
    doc::{Document, Field},
    index::snapshot::{SegmentSnapshot, Snapshot},
};

fn mem_entry(id: u64, docs: Vec<Document>, deleted: Option<DeleteBitmap>) -> SegmentSnapshot {
    let analyzed: Vec<_> = docs
        .iter()
        .map(|doc| analyze_document(doc, &SimpleAnalyzer))
        .collect();
    let mem = Arc::new(MemSegment::build(&analyzed));
    let segment: Arc<dyn Segment> = Arc::clone(&mem) as Arc<dyn Segment>;
    SegmentSnapshot {
        id,
        mem: Some(mem),
        segment,
        deleted,
    }
}

fn doc(id: &str, name: &str) -> Document {
    Document::new(id).add_field(Field::text("name", name).store_value())
}

#[test]
fn test_plan_floor_tier() {
    let policy = TieredMergePolicy::default();

    let one = Snapshot::new(1, vec![mem_entry(1, vec![doc("a", "x")], None)]);
    assert_eq!(policy.plan(&one), None);

    let two = Snapshot::new(
        2,
        vec![
            mem_entry(1, vec![doc("a", "x")], None),
            mem_entry(2, vec![doc("b", "y")], None),
        ],
    );
    assert_eq!(policy.plan(&two), Some(vec![1, 2]));
}

#[test]
fn test_plan_deletions_rewrite() {
    let policy = TieredMergePolicy {
        floor_segment_size: 0,
        deletions_pct_allowed: 10.0,
        ..TieredMergePolicy::default()
    };

    // one segment, 3 of 4 docs deleted: 75% > 10%
    let deleted: DeleteBitmap = vec![0_u32, 1, 2].into_iter().collect();
    let snapshot = Snapshot::new(
        1,
        vec![mem_entry(
            5,
            vec![doc("a", "w"), doc("b", "x"), doc("c", "y"), doc("d", "z")],
            Some(deleted),
        )],
    );
    assert_eq!(policy.plan(&snapshot), Some(vec![5]));
}

#[test]
fn test_plan_respects_max_segment_size() {
    let policy = TieredMergePolicy {
        floor_segment_size: 10,
        max_segment_size: 2,
        ..TieredMergePolicy::default()
    };

    // both segments exceed max_segment_size, nothing merges
    let snapshot = Snapshot::new(
        1,
        vec![
            mem_entry(
                1,
                vec![doc("a", "u"), doc("b", "v"), doc("c", "w")],
                None,
            ),
            mem_entry(
                2,
                vec![doc("d", "x"), doc("e", "y"), doc("f", "z")],
                None,
            ),
        ],
    );
    assert_eq!(policy.plan(&snapshot), None);
}

#[test]
fn test_merge_preserves_live_postings() {
    let deleted: DeleteBitmap = vec![0_u32].into_iter().collect();
    let inputs = vec![
        mem_entry(
            1,
            vec![doc("a", "marty"), doc("b", "steve"), doc("c", "marty")],
            Some(deleted),
        ),
        mem_entry(2, vec![doc("d", "jasper")], None),
    ];

    let (merged, doc_maps) = merge_segments(&inputs).unwrap();

    // doc a was deleted at merge start
    assert_eq!(merged.doc_count, 3);
    assert_eq!(doc_maps[0], vec![None, Some(0), Some(1)]);
    assert_eq!(doc_maps[1], vec![Some(2)]);

    // live (id, term) postings survive with renumbered docs
    let mut cursor = merged
        .postings("name", b"marty", PostingOptions::all())
        .unwrap();
    let p = cursor.next().unwrap().unwrap();
    assert_eq!(p.doc, 1); // doc c
    assert_eq!(f32::from_bits(p.norm), 1.0);
    assert!(cursor.next().unwrap().is_none());

    let mut cursor = merged
        .postings("_id", b"a", PostingOptions::default())
        .unwrap();
    assert!(cursor.next().unwrap().is_none());

    // stored fields follow
    let mut stored = vec![];
    merged
        .visit_stored(2, &mut |name, value| {
            stored.push((name.to_string(), value.to_vec()));
            true
        })
        .unwrap();
    assert_eq!(
        stored,
        vec![
            ("_id".to_string(), b"d".to_vec()),
            ("name".to_string(), b"jasper".to_vec()),
        ]
    );

    // stats recomputed over live docs only
    let stats = merged.field_stats("name").unwrap();
    assert_eq!(stats.doc_count, 3);
}
