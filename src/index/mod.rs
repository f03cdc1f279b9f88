//! Module `index` implement the write path and snapshot machinery.
//!
//! The [Writer] owns an exclusive directory lock and three long-lived
//! workers coordinated over channels:
//!
//! * the *introducer* — sole owner of the root snapshot pointer; applies
//!   batch introductions, merge reconciliations and persist swaps, each
//!   publishing a snapshot with a strictly greater epoch;
//! * the *persister* — seals memory segments, writes snapshot descriptors
//!   and runs the retention policy;
//! * the *merger* — plans tiered merges and stream-merges segments by term.
//!
//! Readers acquire a [refcounted snapshot][IndexReader] in a single atomic
//! capture and never block on writers.

mod batch;
mod config;
mod deletion;
mod event;
mod introducer;
mod merger;
mod persister;
mod snapshot;
mod stats;
mod writer;

pub use batch::Batch;
pub use config::{Config, SearchStartFn};
pub use deletion::KeepNLatest;
pub use event::{Event, EventCallback};
pub use merger::TieredMergePolicy;
pub use snapshot::{
    DocumentValueReader, IndexReader, SegmentSnapshot, Snapshot, SnapshotFile,
};
pub use stats::Stats;
pub use writer::{open_reader, Writer};
