use super::*;

use crate::{
    analysis::{analyze_document, SimpleAnalyzer},
    codec::mem::MemSegment,
    doc::{Document, Field},
};

fn mem_segment(docs: Vec<Document>) -> Arc<MemSegment> {
    let analyzed: Vec<_> = docs
        .iter()
        .map(|doc| analyze_document(doc, &SimpleAnalyzer))
        .collect();
    Arc::new(MemSegment::build(&analyzed))
}

fn entry(id: u64, mem: Arc<MemSegment>, deleted: Option<DeleteBitmap>) -> SegmentSnapshot {
    let segment: Arc<dyn Segment> = Arc::clone(&mem) as Arc<dyn Segment>;
    SegmentSnapshot {
        id,
        mem: Some(mem),
        segment,
        deleted,
    }
}

fn two_segment_snapshot() -> Snapshot {
    let seg1 = mem_segment(vec![
        Document::new("a").add_field(Field::text("name", "marty")),
        Document::new("b").add_field(Field::text("name", "steve")),
        Document::new("c").add_field(Field::text("name", "jasper")),
    ]);
    let seg2 = mem_segment(vec![
        Document::new("d").add_field(Field::text("name", "marty")),
        Document::new("e").add_field(Field::text("desc", "clojure")),
    ]);

    let deleted: DeleteBitmap = vec![1_u32].into_iter().collect();
    Snapshot::new(
        3,
        vec![entry(10, seg1, Some(deleted)), entry(11, seg2, None)],
    )
}

#[test]
fn test_counts_and_offsets() {
    let snapshot = two_segment_snapshot();

    assert_eq!(snapshot.epoch(), 3);
    assert_eq!(snapshot.count(), 4); // five docs, one deleted
    assert_eq!(snapshot.offsets, vec![0, 3, 5]);

    assert_eq!(snapshot.segment_of(0).unwrap(), (0, 0));
    assert_eq!(snapshot.segment_of(2).unwrap(), (0, 2));
    assert_eq!(snapshot.segment_of(3).unwrap(), (1, 0));
    assert_eq!(snapshot.segment_of(4).unwrap(), (1, 1));
    assert!(snapshot.segment_of(5).is_err());
}

#[test]
fn test_fields_union() {
    let snapshot = two_segment_snapshot();
    assert_eq!(snapshot.fields(), vec!["_id", "desc", "name"]);
}

#[test]
fn test_doc_frequency_sums() {
    let snapshot = two_segment_snapshot();
    // deletions live in the snapshot, not the segment stats
    assert_eq!(snapshot.doc_frequency("name", b"marty").unwrap(), 2);
    assert_eq!(snapshot.doc_frequency("name", b"steve").unwrap(), 1);
}

#[test]
fn test_snapshot_file_roundtrip() {
    let snapshot = two_segment_snapshot();
    let data = snapshot.encode_file();

    let file = SnapshotFile::decode(&data).unwrap();
    assert_eq!(file.epoch, 3);
    assert_eq!(file.segments.len(), 2);
    assert_eq!(file.segments[0].0, 10);
    assert_eq!(
        file.segments[0].1.as_ref().map(|d| d.to_vec()),
        Some(vec![1])
    );
    assert_eq!(file.segments[1].0, 11);
    assert!(file.segments[1].1.is_none());
}

#[test]
fn test_snapshot_file_corrupt() {
    let snapshot = two_segment_snapshot();
    let mut data = snapshot.encode_file();

    // truncated
    match SnapshotFile::decode(&data[..8]) {
        Err(Error::SnapshotCorrupt(_, _)) => (),
        other => panic!("expected SnapshotCorrupt, got {:?}", other),
    }

    // bit flip in the body
    let last = data.len() - 1;
    data[last] ^= 0x01;
    match SnapshotFile::decode(&data) {
        Err(Error::SnapshotCorrupt(_, _)) => (),
        other => panic!("expected SnapshotCorrupt, got {:?}", other),
    }
}

#[test]
fn test_corrupt_snapshot_falls_back() {
    use crate::directory::{Directory, Kind, MemDirectory};

    let directory = MemDirectory::new();

    // epoch 1 is a valid (empty) snapshot, epoch 2 is garbage
    let older = Snapshot::new(1, vec![]).encode_file();
    directory.persist(Kind::Snapshot, 1, &older).unwrap();
    directory
        .persist(Kind::Snapshot, 2, b"not a snapshot at all")
        .unwrap();

    let codec = crate::codec::disk::DiskCodec;
    let snapshot = load_latest_snapshot(&directory, &codec).unwrap();
    assert_eq!(snapshot.epoch(), 1);
    assert_eq!(snapshot.count(), 0);
}

#[test]
fn test_postings_iterator_global() {
    let snapshot = two_segment_snapshot();
    let reader = IndexReader {
        snapshot: Arc::new(snapshot),
        directory: Arc::new(crate::directory::MemDirectory::new()),
        codec: Arc::new(crate::codec::disk::DiskCodec),
        config: crate::index::Config::in_memory(),
    };

    let mut cursor = reader
        .postings_iterator("name", Some(b"marty"), PostingOptions::scoring())
        .unwrap();
    let docs: Vec<u64> = {
        let mut docs = vec![];
        while let Some(p) = cursor.next().unwrap() {
            docs.push(p.doc);
        }
        docs
    };
    // doc 0 in segment one, doc 0 in segment two rebased to 3
    assert_eq!(docs, vec![0, 3]);
}

#[test]
fn test_postings_iterator_skips_deleted() {
    let snapshot = two_segment_snapshot();
    let reader = IndexReader {
        snapshot: Arc::new(snapshot),
        directory: Arc::new(crate::directory::MemDirectory::new()),
        codec: Arc::new(crate::codec::disk::DiskCodec),
        config: crate::index::Config::in_memory(),
    };

    // "steve" lives only in deleted doc 1 of segment one
    let mut cursor = reader
        .postings_iterator("name", Some(b"steve"), PostingOptions::default())
        .unwrap();
    assert!(cursor.next().unwrap().is_none());

    // match-all enumerates live docs only
    let mut cursor = reader.postings_iterator("", None, PostingOptions::default()).unwrap();
    let mut docs = vec![];
    while let Some(p) = cursor.next().unwrap() {
        docs.push(p.doc);
    }
    assert_eq!(docs, vec![0, 2, 3, 4]);
}

#[test]
fn test_dictionary_iterator_merges() {
    let snapshot = two_segment_snapshot();
    let reader = IndexReader {
        snapshot: Arc::new(snapshot),
        directory: Arc::new(crate::directory::MemDirectory::new()),
        codec: Arc::new(crate::codec::disk::DiskCodec),
        config: crate::index::Config::in_memory(),
    };

    let mut cursor = reader.dictionary_iterator("name", None, None, None).unwrap();
    let mut entries = vec![];
    while let Some(entry) = cursor.next().unwrap() {
        entries.push((entry.term, entry.doc_count));
    }
    assert_eq!(
        entries,
        vec![
            (b"jasper".to_vec(), 1),
            (b"marty".to_vec(), 2),
            (b"steve".to_vec(), 1),
        ]
    );
}

#[test]
fn test_visit_stored_deleted() {
    let seg = mem_segment(vec![
        Document::new("a").add_field(Field::text("name", "marty").store_value()),
        Document::new("b").add_field(Field::text("name", "steve").store_value()),
    ]);
    let deleted: DeleteBitmap = vec![1_u32].into_iter().collect();
    let snapshot = Snapshot::new(1, vec![entry(1, seg, Some(deleted))]);

    let reader = IndexReader {
        snapshot: Arc::new(snapshot),
        directory: Arc::new(crate::directory::MemDirectory::new()),
        codec: Arc::new(crate::codec::disk::DiskCodec),
        config: crate::index::Config::in_memory(),
    };

    let mut name = None;
    reader
        .visit_stored_fields(0, &mut |field, value| {
            if field == "name" {
                name = Some(value.to_vec());
            }
            true
        })
        .unwrap();
    assert_eq!(name, Some(b"marty".to_vec()));

    assert!(reader.visit_stored_fields(1, &mut |_, _| true).is_err());
}
