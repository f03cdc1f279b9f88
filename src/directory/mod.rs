//! Module `directory` abstract the storage under an index.
//!
//! A directory stores two kinds of items, snapshots and segments, addressed
//! by `u64` identifiers (a snapshot's id is its epoch). Persisting an item
//! publishes it atomically; loading returns bytes that may be heap-backed or
//! mmap-backed. Exactly one writer may hold the directory lock at a time.

use std::{ops::Deref, sync::Arc};

use crate::Result;

mod fs;
mod mem;

pub use fs::FileSystemDirectory;
pub use mem::MemDirectory;

/// Kinds of items a directory stores.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Kind {
    Snapshot,
    Segment,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Snapshot => "snapshot",
            Kind::Segment => "segment",
        }
    }
}

/// Loaded item bytes. Heap buffers and memory maps serve the same slice
/// interface; clones share the underlying allocation.
#[derive(Clone)]
pub enum Data {
    Heap(Arc<Vec<u8>>),
    Mmap(Arc<memmap2::Mmap>),
}

impl Data {
    pub fn from_vec(data: Vec<u8>) -> Data {
        Data::Heap(Arc::new(data))
    }

    pub fn len(&self) -> usize {
        self.as_slice().len()
    }

    pub fn as_slice(&self) -> &[u8] {
        match self {
            Data::Heap(data) => data.as_slice(),
            Data::Mmap(mmap) => mmap.deref(),
        }
    }
}

impl AsRef<[u8]> for Data {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

/// Policy deciding whether an item is loaded through mmap.
#[derive(Clone)]
pub enum LoadMMap {
    Never,
    Always,
    Predicate(Arc<dyn Fn(Kind, u64) -> bool + Send + Sync>),
}

impl LoadMMap {
    fn applies(&self, kind: Kind, id: u64) -> bool {
        match self {
            LoadMMap::Never => false,
            LoadMMap::Always => true,
            LoadMMap::Predicate(f) => f(kind, id),
        }
    }
}

/// Storage contract for the index.
pub trait Directory: Send + Sync {
    /// Identifiers of all items of `kind`, ascending.
    fn list(&self, kind: Kind) -> Result<Vec<u64>>;

    fn load(&self, kind: Kind, id: u64) -> Result<Data>;

    /// Atomically publish an item. An item must never be observable in a
    /// partially written state.
    fn persist(&self, kind: Kind, id: u64, data: &[u8]) -> Result<()>;

    fn remove(&self, kind: Kind, id: u64) -> Result<()>;

    /// Acquire the exclusive writer lock. Fail with `DirectoryLocked` when
    /// another writer holds it.
    fn lock(&self) -> Result<()>;

    fn unlock(&self) -> Result<()>;
}
