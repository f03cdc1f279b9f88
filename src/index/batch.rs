//! A batch aggregates updates and deletes that apply atomically in one
//! snapshot transition.

use crate::doc::Document;

#[derive(Clone, Debug)]
pub(crate) enum BatchOp {
    Update { id: Vec<u8>, doc: Document },
    Insert { doc: Document },
    Delete { id: Vec<u8> },
}

/// A set of document mutations applied in a single snapshot transition.
/// Either every effect of the batch appears in exactly one new snapshot, or
/// none does.
///
/// Within a batch the last `update` for a given id wins, and an `update`
/// followed by a `delete` of the same id deletes.
#[derive(Clone, Debug, Default)]
pub struct Batch {
    pub(crate) ops: Vec<BatchOp>,
}

impl Batch {
    pub fn new() -> Batch {
        Batch::default()
    }

    /// Replace the document identified by `id`. Earlier occurrences of the
    /// same id, in this batch or in the index, are obsoleted.
    pub fn update(&mut self, id: &[u8], doc: Document) {
        self.ops.push(BatchOp::Update {
            id: id.to_vec(),
            doc,
        });
    }

    /// Add a document without obsoleting earlier occurrences of its id.
    /// Callers must know the id to be fresh.
    pub fn insert(&mut self, doc: Document) {
        self.ops.push(BatchOp::Insert { doc });
    }

    /// Obsolete the document identified by `id`.
    pub fn delete(&mut self, id: &[u8]) {
        self.ops.push(BatchOp::Delete { id: id.to_vec() });
    }

    /// Empty the batch for reuse.
    pub fn reset(&mut self) {
        self.ops.clear();
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    /// Resolve batch ops into `(documents-to-add, ids-to-obsolete)` applying
    /// the last-write-wins rule.
    pub(crate) fn resolve(&self) -> (Vec<Document>, Vec<Vec<u8>>) {
        // order-preserving id -> slot mapping for updates
        let mut updates: Vec<(Vec<u8>, Option<Document>)> = vec![];
        let mut inserts: Vec<Document> = vec![];
        let mut deletes: Vec<Vec<u8>> = vec![];

        for op in self.ops.iter() {
            match op {
                BatchOp::Update { id, doc } => {
                    deletes.retain(|d| d != id);
                    match updates.iter_mut().find(|(uid, _)| uid == id) {
                        Some((_, slot)) => *slot = Some(doc.clone()),
                        None => updates.push((id.clone(), Some(doc.clone()))),
                    }
                }
                BatchOp::Insert { doc } => inserts.push(doc.clone()),
                BatchOp::Delete { id } => {
                    // an id already tracked as an update keeps its slot and
                    // is obsoleted from there; only untracked ids join the
                    // plain delete list
                    match updates.iter_mut().find(|(uid, _)| uid == id) {
                        Some((_, slot)) => *slot = None,
                        None if !deletes.contains(id) => deletes.push(id.clone()),
                        None => (),
                    }
                }
            }
        }

        let mut docs = vec![];
        let mut obsoletes = vec![];
        for (id, slot) in updates.into_iter() {
            obsoletes.push(id);
            if let Some(doc) = slot {
                docs.push(doc);
            }
        }
        obsoletes.extend(deletes);
        docs.extend(inserts);

        (docs, obsoletes)
    }
}

#[cfg(test)]
#[path = "batch_test.rs"]
mod batch_test;
