//! The merger: keeps segment counts bounded.
//!
//! After every introduction the merger re-plans against the current root
//! using a tiered policy, stream-merges the chosen segments by term into a
//! fresh segment, and hands the result to the introducer for
//! reconciliation. A failed merge leaves the inputs untouched and is simply
//! retried on the next tick.

use log::{debug, error, info};

use std::{
    collections::BTreeMap,
    panic::{catch_unwind, AssertUnwindSafe},
    sync::{
        atomic::{AtomicBool, Ordering::SeqCst},
        Arc,
    },
};

use crate::{
    bitmap::DeleteBitmap,
    codec::{
        mem::{FieldData, MemPosting, MemSegment},
        FieldStats, PostingOptions,
    },
    index::{
        event::Event,
        snapshot::{SegmentSnapshot, Snapshot, SnapshotDictCursor},
        stats::Stats,
        writer::{IntroMsg, MergeIntroduction, MergeMsg, WriterShared},
    },
    util::thread::{Rx, Tx},
    Result,
};

/// Tiered merge policy. Sizes are live document counts.
#[derive(Clone, Debug)]
pub struct TieredMergePolicy {
    /// Desired number of segments per size tier; more than this triggers a
    /// merge of the smallest ones.
    pub segments_per_tier: usize,
    /// Most segments a single merge may consume.
    pub max_segments_per_merge: usize,
    /// Segments at or below this size always merge with their peers.
    pub floor_segment_size: u64,
    /// Segments above this size are never picked as merge inputs.
    pub max_segment_size: u64,
    /// A lone segment whose deleted percentage exceeds this is rewritten to
    /// reclaim the space.
    pub deletions_pct_allowed: f64,
}

impl Default for TieredMergePolicy {
    fn default() -> TieredMergePolicy {
        TieredMergePolicy {
            segments_per_tier: 10,
            max_segments_per_merge: 10,
            floor_segment_size: 10_000,
            max_segment_size: 5_000_000,
            deletions_pct_allowed: 10.0,
        }
    }
}

impl TieredMergePolicy {
    /// Choose segments to merge, or None when no merge is worthwhile.
    pub fn plan(&self, snapshot: &Snapshot) -> Option<Vec<u64>> {
        // (id, live, deleted-pct), eligible inputs only
        let mut sizes: Vec<(u64, u64, f64)> = snapshot
            .segments
            .iter()
            .filter(|s| s.live_count() > 0 && s.live_count() <= self.max_segment_size)
            .map(|s| {
                let total = s.count() as f64;
                let deleted_pct = match total {
                    t if t > 0.0 => 100.0 * (total - s.live_count() as f64) / t,
                    _ => 0.0,
                };
                (s.id, s.live_count(), deleted_pct)
            })
            .collect();
        sizes.sort_by(|a, b| a.1.cmp(&b.1));

        // the floor tier merges eagerly
        let small: Vec<u64> = sizes
            .iter()
            .filter(|(_, live, _)| *live <= self.floor_segment_size)
            .take(self.max_segments_per_merge)
            .map(|(id, _, _)| *id)
            .collect();
        if small.len() >= 2 {
            return Some(small);
        }

        if sizes.len() > self.segments_per_tier {
            let group: Vec<u64> = sizes
                .iter()
                .take(self.max_segments_per_merge)
                .map(|(id, _, _)| *id)
                .collect();
            if group.len() >= 2 {
                return Some(group);
            }
        }

        // single-segment rewrite to reclaim deletions
        sizes
            .iter()
            .find(|(_, _, pct)| *pct > self.deletions_pct_allowed)
            .map(|(id, _, _)| vec![*id])
    }
}

pub(crate) fn run(
    shared: Arc<WriterShared>,
    intro_tx: Tx<IntroMsg, Result<u64>>,
    rx: Rx<MergeMsg>,
) -> impl FnOnce() {
    move || {
        for (MergeMsg::Tick, resp_tx) in rx {
            if !shared.is_fatal() {
                let res = catch_unwind(AssertUnwindSafe(|| merge_round(&shared, &intro_tx)));
                match res {
                    Ok(Ok(())) => (),
                    Ok(Err(err)) => {
                        // inputs remain live; retried on the next tick
                        error!(target: "merger", "merge failed: {}", err);
                        Stats::incr(&shared.stats.tot_merges_failed);
                    }
                    Err(err) => {
                        error!(target: "merger", "panic: {:?}", err);
                        shared.set_fatal();
                    }
                }
            }
            if let Some(resp_tx) = resp_tx {
                resp_tx.send(()).ok();
            }
        }
        debug!(target: "merger", "exited");
    }
}

// plan and run merges until the policy is satisfied.
fn merge_round(shared: &WriterShared, intro_tx: &Tx<IntroMsg, Result<u64>>) -> Result<()> {
    loop {
        let root = shared.root();
        let ids = match shared.config.merge_policy.plan(&root) {
            Some(ids) => ids,
            None => return Ok(()),
        };

        let inputs: Vec<SegmentSnapshot> = ids
            .iter()
            .filter_map(|id| root.segments.iter().find(|s| s.id == *id).cloned())
            .collect();
        if inputs.len() != ids.len() {
            // root moved underneath the plan; re-plan on the next tick
            return Ok(());
        }

        let deleted_at_start: Vec<Option<DeleteBitmap>> =
            inputs.iter().map(|s| s.deleted.clone()).collect();

        let (merged, doc_maps) = merge_segments(&inputs)?;
        debug!(
            target: "merger",
            "merged {:?} into {} docs", ids, merged.doc_count
        );

        let obsoleted = Arc::new(AtomicBool::new(false));
        let intro = MergeIntroduction {
            merged: Arc::new(merged),
            input_ids: ids.clone(),
            deleted_at_start,
            doc_maps,
            obsoleted: Arc::clone(&obsoleted),
        };

        shared.emit(Event::MergeTaskIntroductionStart);
        let epoch = intro_tx.request(IntroMsg::Merge(intro))??;
        shared.emit(Event::MergeTaskIntroduction { epoch });

        if obsoleted.load(SeqCst) {
            info!(target: "merger", "merge of {:?} obsoleted before introduction", ids);
        } else {
            Stats::incr(&shared.stats.tot_merges_done);
        }
    }
}

/// Stream-merge segments by term. Local doc numbers are renumbered densely,
/// skipping documents deleted at merge start; the returned doc maps record
/// old-to-new numbers per input.
pub(crate) fn merge_segments(
    inputs: &[SegmentSnapshot],
) -> Result<(MemSegment, Vec<Vec<Option<u64>>>)> {
    // assign new doc numbers in segment order
    let mut doc_maps: Vec<Vec<Option<u64>>> = vec![];
    let mut new_count = 0_u64;
    for input in inputs.iter() {
        let mut map = Vec::with_capacity(input.count() as usize);
        for local in 0..input.count() {
            if input.is_deleted(local) {
                map.push(None);
            } else {
                map.push(Some(new_count));
                new_count += 1;
            }
        }
        doc_maps.push(map);
    }

    // union of fields across inputs
    let mut field_names: Vec<String> = vec![];
    for input in inputs.iter() {
        for field in input.segment.fields().into_iter() {
            if !field_names.contains(&field) {
                field_names.push(field);
            }
        }
    }
    field_names.sort();

    let mut fields: BTreeMap<String, FieldData> = BTreeMap::new();
    for field in field_names.iter() {
        let mut norms = vec![0_u32; new_count as usize];
        let mut stats = FieldStats::default();
        let mut has_locations = false;
        let mut terms: BTreeMap<Vec<u8>, Arc<Vec<MemPosting>>> = BTreeMap::new();

        // k-way walk of the input dictionaries
        let mut cursors = vec![];
        for input in inputs.iter() {
            cursors.push(input.segment.dictionary(field, None, None, None)?);
        }
        let mut dict = SnapshotDictCursor::new(cursors)?;

        while let Some(entry) = dict.next()? {
            let mut list: Vec<MemPosting> = vec![];
            for (idx, input) in inputs.iter().enumerate() {
                let mut cursor =
                    input
                        .segment
                        .postings(field, &entry.term, PostingOptions::all())?;
                while let Some(posting) = cursor.next()? {
                    let new_local = match doc_maps[idx][posting.doc as usize] {
                        Some(new_local) => new_local,
                        None => continue,
                    };
                    if !posting.locations.is_empty() {
                        has_locations = true;
                    }
                    if norms[new_local as usize] == 0 {
                        norms[new_local as usize] = posting.norm;
                        stats.doc_count += 1;
                        stats.sum_length += posting.field_length() as u64;
                    }
                    list.push(MemPosting {
                        doc: new_local as u32,
                        freq: posting.freq,
                        locations: posting.locations,
                    });
                }
            }
            if !list.is_empty() {
                terms.insert(entry.term, Arc::new(list));
            }
        }

        if !terms.is_empty() {
            fields.insert(
                field.clone(),
                FieldData {
                    stats,
                    has_locations,
                    norms: Arc::new(norms),
                    terms,
                },
            );
        }
    }

    // stored fields and doc-values follow the same renumbering
    let mut stored: Vec<Vec<(String, Vec<u8>)>> = vec![vec![]; new_count as usize];
    let mut doc_values: Vec<Vec<(String, Vec<Vec<u8>>)>> = vec![vec![]; new_count as usize];

    for (idx, input) in inputs.iter().enumerate() {
        let all_fields = input.segment.fields();
        for local in 0..input.count() {
            let new_local = match doc_maps[idx][local as usize] {
                Some(new_local) => new_local as usize,
                None => continue,
            };

            let slot = &mut stored[new_local];
            input.segment.visit_stored(local, &mut |name, value| {
                slot.push((name.to_string(), value.to_vec()));
                true
            })?;

            let slot = &mut doc_values[new_local];
            input
                .segment
                .visit_doc_values(local, &all_fields, &mut |name, value| {
                    match slot.last_mut() {
                        Some((last, values)) if last == name => {
                            values.push(value.to_vec())
                        }
                        _ => slot.push((name.to_string(), vec![value.to_vec()])),
                    }
                })?;
        }
    }

    let merged = MemSegment::from_parts(new_count, fields, stored, doc_values);
    Ok((merged, doc_maps))
}

#[cfg(test)]
#[path = "merger_test.rs"]
mod merger_test;
