//! The writer: owns the directory lock, the root snapshot pointer and the
//! introducer/persister/merger workers.

use log::{error, info};

use std::{
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering::SeqCst},
        mpsc, Arc, RwLock, Weak,
    },
    thread,
};

use crate::{
    analysis::{analyze_document, AnalyzedDocument},
    bitmap::DeleteBitmap,
    codec::{mem::MemSegment, Codec, Segment},
    directory::{Directory, Kind},
    doc::Document,
    index::{
        batch::Batch,
        deletion::KeepNLatest,
        event::Event,
        introducer, merger, persister,
        snapshot::{load_latest_snapshot, IndexReader, Snapshot, SnapshotFile},
        stats::Stats,
        Config,
    },
    util::{thread::Tx, Thread},
    Error, Result,
};

/// Payload of a completed merge, reconciled by the introducer against the
/// current root.
pub(crate) struct MergeIntroduction {
    pub(crate) merged: Arc<MemSegment>,
    pub(crate) input_ids: Vec<u64>,
    pub(crate) deleted_at_start: Vec<Option<DeleteBitmap>>,
    /// Per input segment, old local doc number to merged local doc number;
    /// None for docs deleted at merge start.
    pub(crate) doc_maps: Vec<Vec<Option<u64>>>,
    /// Set true by the introducer when the introduction was skipped because
    /// everything in the merged segment was re-obsoleted.
    pub(crate) obsoleted: Arc<AtomicBool>,
}

pub(crate) enum IntroMsg {
    /// Hand the introducer its downstream channels.
    Wire {
        persister: Tx<PersistMsg, Result<()>>,
        merger: Tx<MergeMsg>,
    },
    Batch {
        segment: Option<Arc<MemSegment>>,
        obsoletes: Vec<Vec<u8>>,
    },
    Merge(MergeIntroduction),
    /// Swap persisted segments' in-memory instances for disk instances.
    PersistSwap { swaps: Vec<(u64, Arc<dyn Segment>)> },
    Close,
}

pub(crate) enum PersistMsg {
    Tick,
}

pub(crate) enum MergeMsg {
    Tick,
}

/// State shared between the writer handle and its workers.
pub(crate) struct WriterShared {
    pub(crate) config: Config,
    pub(crate) directory: Arc<dyn Directory>,
    pub(crate) codec: Arc<dyn Codec>,
    root: RwLock<Arc<Snapshot>>,
    epochs: std::sync::Mutex<Vec<(u64, Weak<Snapshot>)>>,
    next_segment_id: AtomicU64,
    pub(crate) stats: Stats,
    fatal: AtomicBool,
    closed: AtomicBool,
}

impl WriterShared {
    pub(crate) fn root(&self) -> Arc<Snapshot> {
        Arc::clone(&self.root.read().unwrap())
    }

    /// Swap in a new root snapshot and register its epoch. Only the
    /// introducer calls this; root updates are linearized through it.
    pub(crate) fn publish(&self, snapshot: Snapshot) -> Arc<Snapshot> {
        let snapshot = Arc::new(snapshot);
        {
            let mut root = self.root.write().unwrap();
            *root = Arc::clone(&snapshot);
        }
        let mut epochs = self.epochs.lock().unwrap();
        epochs.retain(|(_, weak)| weak.upgrade().is_some());
        epochs.push((snapshot.epoch, Arc::downgrade(&snapshot)));
        snapshot
    }

    pub(crate) fn next_segment_id(&self) -> u64 {
        self.next_segment_id.fetch_add(1, SeqCst)
    }

    pub(crate) fn emit(&self, event: Event) {
        if let Some(callback) = &self.config.event_callback {
            callback(event);
        }
    }

    pub(crate) fn is_epoch_live(&self, epoch: u64) -> bool {
        let epochs = self.epochs.lock().unwrap();
        epochs
            .iter()
            .any(|(e, weak)| *e == epoch && weak.upgrade().is_some())
    }

    pub(crate) fn live_snapshots(&self) -> Vec<Arc<Snapshot>> {
        let epochs = self.epochs.lock().unwrap();
        epochs.iter().filter_map(|(_, weak)| weak.upgrade()).collect()
    }

    pub(crate) fn set_fatal(&self) {
        self.fatal.store(true, SeqCst);
    }

    pub(crate) fn is_fatal(&self) -> bool {
        self.fatal.load(SeqCst)
    }

    fn check_open(&self) -> Result<()> {
        if self.closed.load(SeqCst) {
            err_at!(WriterClosed, msg: "writer closed")
        } else if self.fatal.load(SeqCst) {
            err_at!(WriterClosed, msg: "writer in failed state")
        } else {
            Ok(())
        }
    }
}

/// Single writer over a directory. Opening acquires the exclusive directory
/// lock and spawns the introducer, persister and merger workers.
pub struct Writer {
    shared: Arc<WriterShared>,
    introducer: Option<Thread<IntroMsg, Result<u64>>>,
    intro_tx: Tx<IntroMsg, Result<u64>>,
    persister: Option<Thread<PersistMsg, Result<()>>>,
    persister_tx: Option<Tx<PersistMsg, Result<()>>>,
    merger: Option<Thread<MergeMsg>>,
    closed: bool,
}

impl Writer {
    /// Open (or create) the index under `config`. Fails with
    /// `DirectoryLocked` when another writer owns the directory.
    pub fn open(config: Config) -> Result<Writer> {
        let directory = config.open_directory();
        directory.lock()?;

        let codec = config.codec()?;
        let root = load_latest_snapshot(directory.as_ref(), codec.as_ref())?;
        info!(
            target: "writer",
            "opened index at epoch {} with {} segments", root.epoch, root.segments.len()
        );

        let next_segment_id = {
            let on_disk = directory.list(Kind::Segment)?;
            let in_root = root.segments.iter().map(|s| s.id).max().unwrap_or(0);
            on_disk.last().copied().unwrap_or(0).max(in_root) + 1
        };

        let shared = Arc::new(WriterShared {
            config: config.clone(),
            directory: Arc::clone(&directory),
            codec,
            root: RwLock::new(Arc::new(Snapshot::new(0, vec![]))),
            epochs: std::sync::Mutex::new(vec![]),
            next_segment_id: AtomicU64::new(next_segment_id),
            stats: Stats::default(),
            fatal: AtomicBool::new(false),
            closed: AtomicBool::new(false),
        });
        shared.publish(root);

        cleanup_on_open(&shared)?;

        let introducer = {
            let shared = Arc::clone(&shared);
            Thread::new_sync("introducer", 8, move |rx| introducer::run(shared, rx))
        };
        let intro_tx = introducer.to_tx();

        let persister = {
            let shared = Arc::clone(&shared);
            let intro_tx = intro_tx.clone();
            Thread::new("persister", move |rx| persister::run(shared, intro_tx, rx))
        };
        let persister_tx = persister.to_tx();

        let merger = {
            let shared = Arc::clone(&shared);
            let intro_tx = intro_tx.clone();
            Thread::new("merger", move |rx| merger::run(shared, intro_tx, rx))
        };

        intro_tx.post(IntroMsg::Wire {
            persister: persister_tx.clone(),
            merger: merger.to_tx(),
        })?;

        Ok(Writer {
            shared,
            introducer: Some(introducer),
            intro_tx,
            persister: Some(persister),
            persister_tx: Some(persister_tx),
            merger: Some(merger),
            closed: false,
        })
    }

    /// Apply a single update as a one-op batch.
    pub fn update(&self, id: &[u8], doc: Document) -> Result<()> {
        let mut batch = Batch::new();
        batch.update(id, doc);
        self.batch(&batch)
    }

    /// Apply a single delete as a one-op batch.
    pub fn delete(&self, id: &[u8]) -> Result<()> {
        let mut batch = Batch::new();
        batch.delete(id);
        self.batch(&batch)
    }

    /// Apply a batch atomically. Blocks until the introducer has published
    /// the new snapshot; effects are visible to every reader opened after
    /// this returns.
    pub fn batch(&self, batch: &Batch) -> Result<()> {
        self.shared.check_open()?;

        if let Some(max) = self.shared.config.max_batch_ops {
            if batch.len() > max {
                return err_at!(BatchTooLarge, msg: "{} ops exceed {}", batch.len(), max);
            }
        }

        let (docs, obsoletes) = batch.resolve();
        if docs.is_empty() && obsoletes.is_empty() {
            return Ok(());
        }

        let analyzed = self.analyze(docs)?;
        let segment = if analyzed.is_empty() {
            None
        } else {
            Some(Arc::new(MemSegment::build(&analyzed)))
        };

        self.shared.emit(Event::BatchIntroductionStart);
        let epoch = self
            .intro_tx
            .request(IntroMsg::Batch { segment, obsoletes })??;
        self.shared.emit(Event::BatchIntroduction { epoch });

        Stats::incr(&self.shared.stats.tot_batches);
        Ok(())
    }

    // analyze documents, fanning out across the configured worker count.
    fn analyze(&self, docs: Vec<Document>) -> Result<Vec<AnalyzedDocument>> {
        let analyzer = self.shared.config.analyzer();
        let workers = self.shared.config.num_analysis_workers;

        if workers <= 1 || docs.len() < 2 {
            return Ok(docs
                .iter()
                .map(|doc| analyze_document(doc, analyzer.as_ref()))
                .collect());
        }

        let chunk_size = (docs.len() + workers - 1) / workers;
        let (tx, rx) = mpsc::channel();
        let mut handles = vec![];
        for (i, chunk) in docs.chunks(chunk_size).enumerate() {
            let chunk: Vec<Document> = chunk.to_vec();
            let analyzer = Arc::clone(&analyzer);
            let tx = tx.clone();
            handles.push(thread::spawn(move || {
                let analyzed: Vec<AnalyzedDocument> = chunk
                    .iter()
                    .map(|doc| analyze_document(doc, analyzer.as_ref()))
                    .collect();
                tx.send((i, analyzed)).ok();
            }));
        }
        drop(tx);

        let mut chunks: Vec<(usize, Vec<AnalyzedDocument>)> = rx.iter().collect();
        for handle in handles.into_iter() {
            if handle.join().is_err() {
                return err_at!(ThreadFail, msg: "analysis worker panicked");
            }
        }
        chunks.sort_by_key(|(i, _)| *i);

        Ok(chunks.into_iter().flat_map(|(_, docs)| docs).collect())
    }

    /// Acquire a reader over the current root snapshot. Single atomic
    /// capture; the snapshot stays stable for the reader's lifetime.
    pub fn reader(&self) -> Result<IndexReader> {
        Ok(IndexReader {
            snapshot: self.shared.root(),
            directory: Arc::clone(&self.shared.directory),
            codec: Arc::clone(&self.shared.codec),
            config: self.shared.config.clone(),
        })
    }

    pub fn directory(&self) -> Arc<dyn Directory> {
        Arc::clone(&self.shared.directory)
    }

    pub fn stats(&self) -> &Stats {
        &self.shared.stats
    }

    /// Flush outstanding state to the directory and stop the workers.
    pub fn close(mut self) -> Result<()> {
        self.close_inner()
    }

    fn close_inner(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        self.shared.closed.store(true, SeqCst);

        // final durable persist of the root, unless already failed
        if !self.shared.is_fatal() {
            if let Some(tx) = &self.persister_tx {
                if let Err(err) = tx.request(PersistMsg::Tick) {
                    error!(target: "writer", "final persist: {}", err);
                }
            }
        }

        self.intro_tx.request(IntroMsg::Close).ok();

        if let Some(merger) = self.merger.take() {
            merger.close_wait()?;
        }
        // drop our clone so the persister's channel can disconnect
        self.persister_tx.take();
        if let Some(persister) = self.persister.take() {
            persister.close_wait()?;
        }
        if let Some(introducer) = self.introducer.take() {
            introducer.close_wait()?;
        }

        self.shared.directory.unlock()?;
        info!(target: "writer", "closed at epoch {}", self.shared.root().epoch);
        Ok(())
    }
}

impl Drop for Writer {
    fn drop(&mut self) {
        self.close_inner().ok();
    }
}

/// Open-time housekeeping: drop deletable epochs per the retention policy,
/// then delete orphan segments referenced by no remaining snapshot.
fn cleanup_on_open(shared: &WriterShared) -> Result<()> {
    let directory = shared.directory.as_ref();

    let mut policy = KeepNLatest::new(shared.config.keep_n_latest);
    for epoch in directory.list(Kind::Snapshot)? {
        policy.commit(epoch);
    }
    for epoch in policy.deletable().to_vec() {
        directory.remove(Kind::Snapshot, epoch)?;
        policy.removed(epoch);
    }

    let mut referenced: HashSet<u64> =
        shared.root().segments.iter().map(|s| s.id).collect();
    for epoch in directory.list(Kind::Snapshot)? {
        let data = directory.load(Kind::Snapshot, epoch)?;
        if let Ok(file) = SnapshotFile::decode(data.as_slice()) {
            referenced.extend(file.segments.iter().map(|(id, _)| *id));
        }
    }

    for id in directory.list(Kind::Segment)? {
        if !referenced.contains(&id) {
            directory.remove(Kind::Segment, id)?;
            shared.emit(Event::SegmentDeleted { id });
            Stats::incr(&shared.stats.tot_deleted_segments);
        }
    }

    Ok(())
}

/// Open a standalone read-only view of the latest snapshot in a directory.
/// Takes no writer lock; the view does not follow later writes.
pub fn open_reader(config: Config) -> Result<IndexReader> {
    let directory = config.open_directory();
    let codec = config.codec()?;
    let snapshot = load_latest_snapshot(directory.as_ref(), codec.as_ref())?;

    Ok(IndexReader {
        snapshot: Arc::new(snapshot),
        directory,
        codec,
        config,
    })
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;
