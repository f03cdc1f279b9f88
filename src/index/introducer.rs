//! The introducer: sole owner of the root snapshot pointer.
//!
//! All snapshot transitions — batch introductions, merge reconciliations and
//! persist swaps — funnel through this single thread, which gives every
//! published snapshot a strictly greater epoch than the one it replaces.
//! Nothing here blocks on I/O; the persister and merger do the heavy work
//! and hand results over via messages.

use log::{debug, error};

use std::{
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{atomic::Ordering::SeqCst, Arc},
};

use crate::{
    bitmap::DeleteBitmap,
    codec::{PostingOptions, Segment},
    doc::ID_FIELD,
    index::{
        snapshot::{SegmentSnapshot, Snapshot},
        stats::Stats,
        writer::{IntroMsg, MergeIntroduction, MergeMsg, PersistMsg, WriterShared},
    },
    util::thread::{Rx, Tx},
    Error, Result,
};

pub(crate) fn run(
    shared: Arc<WriterShared>,
    rx: Rx<IntroMsg, Result<u64>>,
) -> impl FnOnce() {
    move || {
        let mut persister_tx: Option<Tx<PersistMsg, Result<()>>> = None;
        let mut merger_tx: Option<Tx<MergeMsg>> = None;

        for (msg, resp_tx) in rx {
            match msg {
                IntroMsg::Wire { persister, merger } => {
                    persister_tx = Some(persister);
                    merger_tx = Some(merger);
                }
                IntroMsg::Close => {
                    // drop downstream channels so the workers can drain out
                    persister_tx.take();
                    merger_tx.take();
                    if let Some(resp_tx) = resp_tx {
                        resp_tx.send(Ok(shared.root().epoch)).ok();
                    }
                    break;
                }
                msg => {
                    let res = catch_unwind(AssertUnwindSafe(|| {
                        handle(&shared, msg, persister_tx.as_ref(), merger_tx.as_ref())
                    }));
                    let res = match res {
                        Ok(res) => res,
                        Err(err) => {
                            error!(target: "introducer", "panic: {:?}", err);
                            shared.set_fatal();
                            err_at!(Fatal, msg: "introducer panicked")
                        }
                    };
                    if let Err(err) = &res {
                        error!(target: "introducer", "introduction failed: {}", err);
                        shared.set_fatal();
                    }
                    if let Some(resp_tx) = resp_tx {
                        resp_tx.send(res).ok();
                    }
                }
            }
        }
        debug!(target: "introducer", "exited");
    }
}

fn handle(
    shared: &WriterShared,
    msg: IntroMsg,
    persister_tx: Option<&Tx<PersistMsg, Result<()>>>,
    merger_tx: Option<&Tx<MergeMsg>>,
) -> Result<u64> {
    match msg {
        IntroMsg::Batch { segment, obsoletes } => {
            let epoch = introduce_batch(shared, segment, &obsoletes)?;
            notify(persister_tx, merger_tx);
            Ok(epoch)
        }
        IntroMsg::Merge(intro) => {
            let epoch = introduce_merge(shared, intro)?;
            notify(persister_tx, merger_tx);
            Ok(epoch)
        }
        IntroMsg::PersistSwap { swaps } => swap_persisted(shared, swaps),
        IntroMsg::Wire { .. } | IntroMsg::Close => unreachable!(),
    }
}

fn notify(persister_tx: Option<&Tx<PersistMsg, Result<()>>>, merger_tx: Option<&Tx<MergeMsg>>) {
    if let Some(tx) = persister_tx {
        tx.post(PersistMsg::Tick).ok();
    }
    if let Some(tx) = merger_tx {
        tx.post(MergeMsg::Tick).ok();
    }
}

// union the obsoleted ids into a segment's deleted bitmap.
fn compute_deletions(
    seg: &SegmentSnapshot,
    obsoletes: &[Vec<u8>],
) -> Result<Option<DeleteBitmap>> {
    let mut deleted = seg.deleted.clone();

    for id in obsoletes.iter() {
        let mut cursor = seg
            .segment
            .postings(ID_FIELD, id, PostingOptions::default())?;
        while let Some(posting) = cursor.next()? {
            deleted
                .get_or_insert_with(DeleteBitmap::new)
                .add(posting.doc as u32);
        }
    }

    Ok(deleted)
}

fn introduce_batch(
    shared: &WriterShared,
    segment: Option<Arc<crate::codec::mem::MemSegment>>,
    obsoletes: &[Vec<u8>],
) -> Result<u64> {
    let root = shared.root();

    let mut segments = vec![];
    for seg in root.segments.iter() {
        let deleted = compute_deletions(seg, obsoletes)?;
        let entry = SegmentSnapshot {
            id: seg.id,
            mem: seg.mem.clone(),
            segment: Arc::clone(&seg.segment),
            deleted,
        };
        // fully-deleted segments drop out of the snapshot here
        if entry.live_count() > 0 {
            segments.push(entry);
        }
    }

    if let Some(mem) = segment {
        let id = shared.next_segment_id();
        let segref: Arc<dyn Segment> = Arc::clone(&mem) as Arc<dyn Segment>;
        segments.push(SegmentSnapshot {
            id,
            mem: Some(mem),
            segment: segref,
            deleted: None,
        });
        Stats::incr(&shared.stats.tot_introduced_batch_segments);
    }

    let epoch = root.epoch + 1;
    shared.publish(Snapshot::new(epoch, segments));
    debug!(target: "introducer", "batch introduced at epoch {}", epoch);
    Ok(epoch)
}

fn introduce_merge(shared: &WriterShared, intro: MergeIntroduction) -> Result<u64> {
    let root = shared.root();

    // deletions that landed while the merge ran, mapped into the merged
    // segment's doc number space
    let mut merged_deleted = DeleteBitmap::new();
    for (idx, input_id) in intro.input_ids.iter().enumerate() {
        match root.segments.iter().find(|s| s.id == *input_id) {
            Some(current) => {
                let now = current.deleted.clone().unwrap_or_default();
                let at_start = intro.deleted_at_start[idx].clone().unwrap_or_default();
                for local in now.andnot(&at_start).to_vec() {
                    if let Some(new_local) = intro.doc_maps[idx][local as usize] {
                        merged_deleted.add(new_local as u32);
                    }
                }
            }
            None => {
                // input vanished from the root: every doc it contributed
                // has been obsoleted since the merge started
                for slot in intro.doc_maps[idx].iter() {
                    if let Some(new_local) = slot {
                        merged_deleted.add(*new_local as u32);
                    }
                }
            }
        }
    }

    let live = intro.merged.count() - merged_deleted.cardinality();
    let mut segments: Vec<SegmentSnapshot> = root
        .segments
        .iter()
        .filter(|s| !intro.input_ids.contains(&s.id))
        .cloned()
        .collect();

    if live == 0 {
        // nothing the merged segment would contribute is still wanted
        intro.obsoleted.store(true, SeqCst);
        Stats::incr(&shared.stats.tot_file_merge_introductions_obsoleted);
        let epoch = if segments.len() != root.segments.len() {
            let epoch = root.epoch + 1;
            shared.publish(Snapshot::new(epoch, segments));
            epoch
        } else {
            root.epoch
        };
        debug!(target: "introducer", "merge introduction obsoleted at epoch {}", epoch);
        return Ok(epoch);
    }

    let id = shared.next_segment_id();
    let segref: Arc<dyn Segment> = Arc::clone(&intro.merged) as Arc<dyn Segment>;
    segments.push(SegmentSnapshot {
        id,
        mem: Some(intro.merged),
        segment: segref,
        deleted: match merged_deleted.is_empty() {
            true => None,
            false => Some(merged_deleted),
        },
    });

    let epoch = root.epoch + 1;
    shared.publish(Snapshot::new(epoch, segments));
    Stats::incr(&shared.stats.tot_introduced_merge_segments);
    debug!(
        target: "introducer",
        "merge of {:?} introduced as segment {} at epoch {}", intro.input_ids, id, epoch
    );
    Ok(epoch)
}

fn swap_persisted(
    shared: &WriterShared,
    swaps: Vec<(u64, Arc<dyn Segment>)>,
) -> Result<u64> {
    let root = shared.root();

    let mut changed = false;
    let segments = root
        .segments
        .iter()
        .map(|seg| match swaps.iter().find(|(id, _)| *id == seg.id) {
            Some((_, disk)) if seg.mem.is_some() => {
                changed = true;
                SegmentSnapshot {
                    id: seg.id,
                    mem: None,
                    segment: Arc::clone(disk),
                    deleted: seg.deleted.clone(),
                }
            }
            _ => seg.clone(),
        })
        .collect();

    if !changed {
        return Ok(root.epoch);
    }

    let epoch = root.epoch + 1;
    shared.publish(Snapshot::new(epoch, segments));
    debug!(target: "introducer", "persist swap published epoch {}", epoch);
    Ok(epoch)
}
