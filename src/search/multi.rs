//! Fan a search request out across multiple readers in parallel, merging
//! result heaps by the request's sort order and aggregations by their merge
//! rules.

use std::{sync::Arc, thread};

use crate::{
    index::IndexReader,
    query::TopNSearch,
    search::{collector::SearchResults, Context, DocumentMatch},
    Error, Result,
};

/// Run `request` against every reader concurrently and merge. Matches keep
/// their per-reader document numbers; order and aggregation state carry the
/// cross-reader meaning.
pub fn multi_search(
    ctx: &Context,
    readers: Vec<IndexReader>,
    request: Arc<TopNSearch>,
) -> Result<SearchResults> {
    // shards collect enough to satisfy the global offset
    let shard_request = Arc::new(request.as_ref().clone().shard_form());

    let mut handles = vec![];
    for reader in readers.into_iter() {
        let ctx = ctx.clone();
        let request = Arc::clone(&shard_request);
        handles.push(thread::spawn(move || reader.search(&ctx, &request)));
    }

    let mut merged: Option<SearchResults> = None;
    let mut matches: Vec<DocumentMatch> = vec![];
    for handle in handles.into_iter() {
        let results = match handle.join() {
            Ok(results) => results?,
            Err(_) => return err_at!(ThreadFail, msg: "search worker panicked"),
        };
        let (shard_matches, shard_bucket) = results.into_parts();
        matches.extend(shard_matches);
        match &mut merged {
            Some(merged) => merged_bucket_merge(merged, shard_bucket),
            None => merged = Some(SearchResults::new(vec![], shard_bucket)),
        }
    }

    let (_, bucket) = match merged {
        Some(merged) => merged.into_parts(),
        None => return err_at!(InvalidInput, msg: "no readers"),
    };

    let order = request.effective_order();
    matches.sort_by(|a, b| order.compare(&a.sort_value, &b.sort_value));
    let mut matches: Vec<DocumentMatch> = matches
        .into_iter()
        .skip(request.from())
        .take(request.size())
        .collect();
    if request.is_reversed() {
        matches.reverse();
    }

    Ok(SearchResults::new(matches, bucket))
}

fn merged_bucket_merge(merged: &mut SearchResults, shard: crate::search::aggregations::Bucket) {
    merged.aggregations_mut().merge(&shard);
}

#[cfg(test)]
#[path = "multi_test.rs"]
mod multi_test;
