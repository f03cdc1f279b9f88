use std::{
    collections::BTreeMap,
    sync::{Arc, Mutex},
};

use crate::{
    directory::{Data, Directory, Kind},
    Error, Result,
};

/// Directory held entirely in memory. Exercises the full persister pipeline
/// without touching disk; useful for tests and ephemeral indexes.
#[derive(Default)]
pub struct MemDirectory {
    items: Mutex<BTreeMap<(Kind, u64), Arc<Vec<u8>>>>,
    locked: Mutex<bool>,
}

impl MemDirectory {
    pub fn new() -> MemDirectory {
        MemDirectory::default()
    }
}

impl Directory for MemDirectory {
    fn list(&self, kind: Kind) -> Result<Vec<u64>> {
        let items = self.items.lock().unwrap();
        Ok(items
            .range((kind, 0)..=(kind, u64::MAX))
            .map(|((_, id), _)| *id)
            .collect())
    }

    fn load(&self, kind: Kind, id: u64) -> Result<Data> {
        let items = self.items.lock().unwrap();
        match items.get(&(kind, id)) {
            Some(data) => Ok(Data::Heap(Arc::clone(data))),
            None if kind == Kind::Segment => {
                err_at!(SegmentMissing, msg: "segment {}", id)
            }
            None => err_at!(InvalidFile, msg: "snapshot {}", id),
        }
    }

    fn persist(&self, kind: Kind, id: u64, data: &[u8]) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        items.insert((kind, id), Arc::new(data.to_vec()));
        Ok(())
    }

    fn remove(&self, kind: Kind, id: u64) -> Result<()> {
        let mut items = self.items.lock().unwrap();
        items.remove(&(kind, id));
        Ok(())
    }

    fn lock(&self) -> Result<()> {
        let mut locked = self.locked.lock().unwrap();
        if *locked {
            err_at!(DirectoryLocked, msg: "in-memory directory")
        } else {
            *locked = true;
            Ok(())
        }
    }

    fn unlock(&self) -> Result<()> {
        *self.locked.lock().unwrap() = false;
        Ok(())
    }
}

#[cfg(test)]
#[path = "mem_test.rs"]
mod mem_test;
