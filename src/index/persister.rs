//! The persister: makes snapshots durable.
//!
//! On every tick the persister captures the root, seals memory segments not
//! yet on disk, writes the snapshot descriptor, then asks the introducer to
//! swap the sealed segments for their disk-backed instances. Retention runs
//! after each successful persist; it is the only path that removes files.

use log::{debug, error, warn};

use std::{
    collections::HashSet,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::Arc,
    thread,
    time::Duration,
};

use crate::{
    codec::Segment,
    directory::Kind,
    index::{
        deletion::KeepNLatest,
        event::Event,
        snapshot::SnapshotFile,
        stats::Stats,
        writer::{IntroMsg, PersistMsg, WriterShared},
    },
    util::thread::{Rx, Tx},
    Error, Result,
};

const PERSIST_RETRIES: usize = 5;
const PERSIST_BACKOFF: Duration = Duration::from_millis(10);

pub(crate) fn run(
    shared: Arc<WriterShared>,
    intro_tx: Tx<IntroMsg, Result<u64>>,
    rx: Rx<PersistMsg, Result<()>>,
) -> impl FnOnce() {
    move || {
        let mut state = match State::new(&shared) {
            Ok(state) => state,
            Err(err) => {
                error!(target: "persister", "startup: {}", err);
                shared.set_fatal();
                return;
            }
        };

        for (PersistMsg::Tick, resp_tx) in rx {
            if shared.is_fatal() {
                if let Some(resp_tx) = resp_tx {
                    resp_tx.send(err_at!(WriterClosed, msg: "failed state")).ok();
                }
                continue;
            }

            let res = catch_unwind(AssertUnwindSafe(|| state.persist(&shared, &intro_tx)));
            let res = match res {
                Ok(res) => res,
                Err(err) => {
                    error!(target: "persister", "panic: {:?}", err);
                    err_at!(Fatal, msg: "persister panicked")
                }
            };
            if let Err(err) = &res {
                error!(target: "persister", "persist failed: {}", err);
                shared.set_fatal();
            }
            if let Some(resp_tx) = resp_tx {
                resp_tx.send(res).ok();
            }
        }
        debug!(target: "persister", "exited");
    }
}

struct State {
    policy: KeepNLatest,
    persisted_segments: HashSet<u64>,
    last_epoch: Option<u64>,
}

impl State {
    fn new(shared: &WriterShared) -> Result<State> {
        let directory = shared.directory.as_ref();

        let mut policy = KeepNLatest::new(shared.config.keep_n_latest);
        let epochs = directory.list(Kind::Snapshot)?;
        for epoch in epochs.iter() {
            policy.commit(*epoch);
        }

        Ok(State {
            policy,
            persisted_segments: directory.list(Kind::Segment)?.into_iter().collect(),
            last_epoch: epochs.last().copied(),
        })
    }

    fn persist(
        &mut self,
        shared: &WriterShared,
        intro_tx: &Tx<IntroMsg, Result<u64>>,
    ) -> Result<()> {
        let root = shared.root();
        let directory = shared.directory.as_ref();

        // seal memory segments that have no durable counterpart yet
        let mut swaps: Vec<(u64, Arc<dyn Segment>)> = vec![];
        for seg in root.segments.iter() {
            let mem = match &seg.mem {
                Some(mem) => mem,
                None => continue,
            };
            if !self.persisted_segments.contains(&seg.id) {
                let bytes = shared.codec.seal(mem)?;
                persist_with_retry(shared, Kind::Segment, seg.id, &bytes)?;
                self.persisted_segments.insert(seg.id);
                Stats::incr(&shared.stats.tot_persisted_segments);
            }
            let data = directory.load(Kind::Segment, seg.id)?;
            swaps.push((seg.id, shared.codec.open(data, seg.id)?));
        }

        if self.last_epoch != Some(root.epoch) {
            let descriptor = root.encode_file();
            persist_with_retry(shared, Kind::Snapshot, root.epoch, &descriptor)?;
            self.policy.commit(root.epoch);
            self.last_epoch = Some(root.epoch);
            Stats::incr(&shared.stats.tot_persisted_snapshots);
            shared.emit(Event::Persisted { epoch: root.epoch });
            debug!(target: "persister", "persisted snapshot {}", root.epoch);
        }

        if !swaps.is_empty() {
            intro_tx.request(IntroMsg::PersistSwap { swaps })??;
        }

        self.cleanup(shared)
    }

    // remove deletable epochs nobody references, then orphaned segments.
    fn cleanup(&mut self, shared: &WriterShared) -> Result<()> {
        let directory = shared.directory.as_ref();

        for epoch in self.policy.deletable().to_vec() {
            if shared.is_epoch_live(epoch) {
                continue;
            }
            match directory.remove(Kind::Snapshot, epoch) {
                Ok(()) => self.policy.removed(epoch),
                Err(err) => {
                    warn!(target: "persister", "remove snapshot {}: {}", epoch, err)
                }
            }
        }

        let mut referenced: HashSet<u64> = HashSet::new();
        for snapshot in shared.live_snapshots() {
            referenced.extend(snapshot.segments.iter().map(|s| s.id));
        }
        for epoch in directory.list(Kind::Snapshot)? {
            let data = directory.load(Kind::Snapshot, epoch)?;
            if let Ok(file) = SnapshotFile::decode(data.as_slice()) {
                referenced.extend(file.segments.iter().map(|(id, _)| *id));
            }
        }

        for id in directory.list(Kind::Segment)? {
            if referenced.contains(&id) {
                continue;
            }
            match directory.remove(Kind::Segment, id) {
                Ok(()) => {
                    self.persisted_segments.remove(&id);
                    shared.emit(Event::SegmentDeleted { id });
                    Stats::incr(&shared.stats.tot_deleted_segments);
                    debug!(target: "persister", "deleted segment {}", id);
                }
                Err(err) => warn!(target: "persister", "remove segment {}: {}", id, err),
            }
        }

        Ok(())
    }
}

// transient I/O errors back off exponentially; exhausting the retries is a
// fatal transition for the writer.
fn persist_with_retry(
    shared: &WriterShared,
    kind: Kind,
    id: u64,
    data: &[u8],
) -> Result<()> {
    let mut backoff = PERSIST_BACKOFF;
    let mut last_err = None;

    for attempt in 0..PERSIST_RETRIES {
        match shared.directory.persist(kind, id, data) {
            Ok(()) => return Ok(()),
            Err(err) => {
                warn!(
                    target: "persister",
                    "persist {} {} attempt {}: {}", kind.as_str(), id, attempt, err
                );
                last_err = Some(err);
                thread::sleep(backoff);
                backoff *= 2;
            }
        }
    }

    Err(last_err.unwrap())
}
