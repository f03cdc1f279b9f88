use super::*;

use crate::directory::{Directory, Kind};

#[test]
fn test_persist_load_list() {
    let d = MemDirectory::new();

    d.persist(Kind::Segment, 3, b"three").unwrap();
    d.persist(Kind::Segment, 1, b"one").unwrap();
    d.persist(Kind::Snapshot, 1, b"snap").unwrap();

    assert_eq!(d.list(Kind::Segment).unwrap(), vec![1, 3]);
    assert_eq!(d.list(Kind::Snapshot).unwrap(), vec![1]);
    assert_eq!(d.load(Kind::Segment, 3).unwrap().as_slice(), b"three");

    d.remove(Kind::Segment, 3).unwrap();
    assert!(d.load(Kind::Segment, 3).is_err());
    assert_eq!(d.list(Kind::Segment).unwrap(), vec![1]);
}

#[test]
fn test_lock() {
    let d = MemDirectory::new();
    d.lock().unwrap();
    assert!(d.lock().is_err());
    d.unlock().unwrap();
    d.lock().unwrap();
}
