use super::*;

use crate::{
    analysis::{analyze_document, SimpleAnalyzer},
    codec::{mem::MemSegment, Codec, PostingOptions, Segment as _},
    doc::{Document, Field},
};

fn sample_segment() -> MemSegment {
    let mut docs = vec![];
    for i in 0..300 {
        let desc = match i % 3 {
            0 => "angst beer couch database",
            1 => "angst couch",
            _ => "beer database",
        };
        docs.push(
            Document::new(&format!("doc-{:03}", i))
                .add_field(Field::text("name", &format!("name {}", i)).store_value())
                .add_field(Field::text("desc", desc).include_locations())
                .add_field(Field::numeric("count", i as f64)),
        );
    }
    let analyzed: Vec<_> = docs
        .iter()
        .map(|doc| analyze_document(doc, &SimpleAnalyzer))
        .collect();
    MemSegment::build(&analyzed)
}

#[test]
fn test_seal_deterministic() {
    let segment = sample_segment();
    let a = DiskCodec.seal(&segment).unwrap();
    let b = DiskCodec.seal(&segment).unwrap();
    assert_eq!(a, b);
}

#[test]
fn test_seal_open_equivalence() {
    let mem = sample_segment();
    let bytes = DiskCodec.seal(&mem).unwrap();
    let disk = DiskSegment::open(crate::directory::Data::from_vec(bytes), 7).unwrap();

    assert_eq!(disk.to_id(), 7);
    assert_eq!(disk.count(), mem.count());
    assert_eq!(disk.fields(), mem.fields());
    assert_eq!(disk.field_stats("desc"), mem.field_stats("desc"));

    // dictionaries agree
    for field in mem.fields().into_iter() {
        let mut mc = mem.dictionary(&field, None, None, None).unwrap();
        let mut dc = disk.dictionary(&field, None, None, None).unwrap();
        loop {
            let (a, b) = (mc.next().unwrap(), dc.next().unwrap());
            assert_eq!(a, b, "field {}", field);
            if a.is_none() {
                break;
            }
        }
    }

    // postings agree, payloads included
    for term in [&b"angst"[..], b"beer", b"couch", b"database"].iter() {
        let mut mc = mem.postings("desc", term, PostingOptions::all()).unwrap();
        let mut dc = disk.postings("desc", term, PostingOptions::all()).unwrap();
        loop {
            let (a, b) = (mc.next().unwrap(), dc.next().unwrap());
            match (&a, &b) {
                (Some(a), Some(b)) => {
                    assert_eq!(a.doc, b.doc);
                    assert_eq!(a.freq, b.freq);
                    assert_eq!(a.norm, b.norm);
                    assert_eq!(a.locations, b.locations);
                }
                (None, None) => break,
                _ => panic!("postings diverge on {:?}", term),
            }
        }
    }

    // stored fields and doc values survive, chunk boundaries included
    for local in [0_u64, 127, 128, 255, 299].iter() {
        let mut mem_stored = vec![];
        mem.visit_stored(*local, &mut |name, value| {
            mem_stored.push((name.to_string(), value.to_vec()));
            true
        })
        .unwrap();
        let mut disk_stored = vec![];
        disk.visit_stored(*local, &mut |name, value| {
            disk_stored.push((name.to_string(), value.to_vec()));
            true
        })
        .unwrap();
        assert_eq!(mem_stored, disk_stored, "doc {}", local);

        let fields = vec!["count".to_string()];
        let mut mem_dv = vec![];
        mem.visit_doc_values(*local, &fields, &mut |_, value| {
            mem_dv.push(value.to_vec());
        })
        .unwrap();
        let mut disk_dv = vec![];
        disk.visit_doc_values(*local, &fields, &mut |_, value| {
            disk_dv.push(value.to_vec());
        })
        .unwrap();
        assert_eq!(mem_dv, disk_dv, "doc {}", local);
    }
}

#[test]
fn test_postings_advance() {
    let mem = sample_segment();
    let bytes = DiskCodec.seal(&mem).unwrap();
    let disk = DiskSegment::open(crate::directory::Data::from_vec(bytes), 1).unwrap();

    let mut cursor = disk.postings("desc", b"angst", PostingOptions::scoring()).unwrap();
    let p = cursor.advance(100).unwrap().unwrap();
    // angst appears in docs where i % 3 != 2
    assert!(p.doc >= 100);
    assert!(p.doc % 3 != 2);
}

#[test]
fn test_dictionary_automaton() {
    use crate::codec::Automaton;
    use std::sync::Arc;

    struct StartsWithB;
    impl Automaton for StartsWithB {
        fn start(&self) -> u32 {
            0
        }
        fn is_match(&self, state: u32) -> bool {
            state == 1
        }
        fn can_match(&self, state: u32) -> bool {
            state != 2
        }
        fn accept(&self, state: u32, byte: u8) -> u32 {
            match (state, byte) {
                (0, b'b') => 1,
                (0, _) => 2,
                (state, _) => state,
            }
        }
    }

    let mem = sample_segment();
    let bytes = DiskCodec.seal(&mem).unwrap();
    let disk = DiskSegment::open(crate::directory::Data::from_vec(bytes), 1).unwrap();

    let aut: Arc<dyn Automaton> = Arc::new(StartsWithB);
    let mut cursor = disk.dictionary("desc", Some(aut), None, None).unwrap();
    let entry = cursor.next().unwrap().unwrap();
    assert_eq!(entry.term, b"beer".to_vec());
    assert!(cursor.next().unwrap().is_none());
}

#[test]
fn test_corrupt_segment() {
    let mem = sample_segment();
    let mut bytes = DiskCodec.seal(&mem).unwrap();

    // short file
    assert!(DiskSegment::open(crate::directory::Data::from_vec(vec![1, 2, 3]), 1).is_err());

    // flipped byte breaks the checksum
    let mid = bytes.len() / 2;
    bytes[mid] ^= 0xff;
    assert!(DiskSegment::open(crate::directory::Data::from_vec(bytes), 1).is_err());
}
