//! Structured notifications emitted by the writer's background workers.

/// Index lifecycle events, delivered through
/// [Config::set_event_callback][crate::index::Config::set_event_callback].
///
/// Callbacks run on the worker threads; keep them cheap and never call back
/// into the writer from one.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// A batch introduction is about to mutate the root snapshot.
    BatchIntroductionStart,
    /// A batch introduction published the snapshot with this epoch.
    BatchIntroduction { epoch: u64 },
    /// A merged segment is about to be reconciled against the root.
    MergeTaskIntroductionStart,
    /// The merge task finished introduction (or was skipped as obsolete).
    MergeTaskIntroduction { epoch: u64 },
    /// A snapshot and its segments are durable in the directory.
    Persisted { epoch: u64 },
    /// A segment file was removed by the retention policy.
    SegmentDeleted { id: u64 },
}

pub type EventCallback = std::sync::Arc<dyn Fn(Event) + Send + Sync>;
