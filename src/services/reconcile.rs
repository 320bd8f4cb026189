// src/services/reconcile.rs

//! Batch reconciliation of stored postings.
//!
//! Records written before the current id normalization may carry ids
//! derived from raw URLs. Two passes bring a store back in line:
//!
//! - [`normalize_ids`] rewrites the id of each unsent posting to its
//!   canonical form, or suppresses the posting when that id is taken.
//! - [`merge_duplicates`] groups every posting by canonical id and keeps
//!   one record per group deliverable.
//!
//! Both passes are idempotent. A failure on one posting or group is logged
//! and counted; the pass carries on with the rest.

use std::collections::{HashMap, HashSet};

use crate::error::Result;
use crate::models::Posting;
use crate::storage::PostingStore;

/// Outcome of [`normalize_ids`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct NormalizeReport {
    /// Ids rewritten to their canonical form
    pub updated: usize,
    /// Postings marked sent because their canonical id was taken
    pub deduped: usize,
    pub failed: usize,
}

/// Outcome of [`merge_duplicates`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MergeReport {
    /// Canonical ids shared by more than one record
    pub groups: usize,
    /// Records flipped to sent
    pub marked: usize,
    pub keepers_rewritten: usize,
    pub failed_groups: usize,
}

/// Rewrite every unsent posting's id to `normalize_id(url)`.
pub async fn normalize_ids(store: &dyn PostingStore) -> Result<NormalizeReport> {
    let mut report = NormalizeReport::default();

    for posting in store.query_unsent().await? {
        let canonical = posting.canonical_id();
        if canonical == posting.id {
            continue;
        }

        let id = posting.id.clone();
        match normalize_one(store, posting, canonical).await {
            Ok(NormalizeOutcome::Rewritten) => report.updated += 1,
            Ok(NormalizeOutcome::Suppressed) => report.deduped += 1,
            Err(e) => {
                log::error!("Failed to normalize posting {id}: {e}");
                report.failed += 1;
            }
        }
    }

    log::info!(
        "Normalization: {} updated, {} deduped, {} failed",
        report.updated,
        report.deduped,
        report.failed
    );
    Ok(report)
}

enum NormalizeOutcome {
    Rewritten,
    Suppressed,
}

async fn normalize_one(
    store: &dyn PostingStore,
    mut posting: Posting,
    canonical: String,
) -> Result<NormalizeOutcome> {
    match store.get_by_id(&canonical).await? {
        Some(owner) if owner.seq != posting.seq => {
            log::debug!("{} duplicates {canonical}; marking sent", posting.id);
            posting.sent = true;
            store.update(posting).await?;
            Ok(NormalizeOutcome::Suppressed)
        }
        _ => {
            log::debug!("{} -> {canonical}", posting.id);
            posting.id = canonical;
            store.update(posting).await?;
            Ok(NormalizeOutcome::Rewritten)
        }
    }
}

/// Collapse postings that share a canonical id.
///
/// Within a group the keeper is the first record (by `seq`) that was
/// already sent, else the oldest record. Every other member is marked
/// sent and the keeper takes the canonical id. Each group is committed
/// atomically; a group whose keeper rewrite collides with an unrelated
/// record is committed without the rewrite.
///
/// Afterwards no two unsent postings share a canonical id.
pub async fn merge_duplicates(store: &dyn PostingStore) -> Result<MergeReport> {
    let mut report = MergeReport::default();

    for (canonical, members) in group_by_canonical(store.query_all().await?) {
        if members.len() < 2 {
            continue;
        }
        report.groups += 1;

        // Members may have changed since the snapshot
        let ids: Vec<String> = members.iter().map(|p| p.id.clone()).collect();
        let seqs: HashSet<u64> = members.iter().map(|p| p.seq).collect();
        let mut current = match store.get_by_ids(&ids).await {
            Ok(found) => found,
            Err(e) => {
                log::error!("Failed to reload group {canonical}: {e}");
                report.failed_groups += 1;
                continue;
            }
        };
        current.retain(|p| seqs.contains(&p.seq));
        if current.len() < 2 {
            continue;
        }

        match merge_group(store, &canonical, current).await {
            Ok((marked, rewritten)) => {
                report.marked += marked;
                if rewritten {
                    report.keepers_rewritten += 1;
                }
            }
            Err(e) => {
                log::error!("Failed to merge group {canonical}: {e}");
                report.failed_groups += 1;
            }
        }
    }

    log::info!(
        "Merge: {} groups, {} marked, {} keepers rewritten, {} failed",
        report.groups,
        report.marked,
        report.keepers_rewritten,
        report.failed_groups
    );
    Ok(report)
}

/// Group postings by canonical id, groups in first-seen order.
fn group_by_canonical(postings: Vec<Posting>) -> Vec<(String, Vec<Posting>)> {
    let mut index: HashMap<String, usize> = HashMap::new();
    let mut groups: Vec<(String, Vec<Posting>)> = Vec::new();

    for posting in postings {
        let canonical = posting.canonical_id();
        match index.get(&canonical) {
            Some(&i) => groups[i].1.push(posting),
            None => {
                index.insert(canonical.clone(), groups.len());
                groups.push((canonical, vec![posting]));
            }
        }
    }
    groups
}

/// Position of the keeper: first sent record by `seq`, else the oldest.
fn keeper_index(members: &[Posting]) -> usize {
    let oldest = |sent_only: bool| {
        members
            .iter()
            .enumerate()
            .filter(|(_, p)| p.sent || !sent_only)
            .min_by_key(|(_, p)| p.seq)
            .map(|(i, _)| i)
    };
    oldest(true).or_else(|| oldest(false)).unwrap_or(0)
}

/// Commit one group. Returns the number of records marked sent and whether
/// the keeper id was rewritten.
async fn merge_group(
    store: &dyn PostingStore,
    canonical: &str,
    mut members: Vec<Posting>,
) -> Result<(usize, bool)> {
    let keeper = members.swap_remove(keeper_index(&members));

    let marked: Vec<Posting> = members
        .into_iter()
        .filter(|p| !p.sent)
        .map(|mut p| {
            p.sent = true;
            p
        })
        .collect();
    let count = marked.len();

    let rewrite = (keeper.id != canonical).then(|| Posting {
        id: canonical.to_string(),
        ..keeper.clone()
    });

    let Some(rewrite) = rewrite else {
        if !marked.is_empty() {
            store.update_many(marked).await?;
        }
        return Ok((count, false));
    };

    let mut writes = marked.clone();
    writes.push(rewrite);
    match store.update_many(writes).await {
        Ok(()) => Ok((count, true)),
        Err(e) if e.is_conflict() => {
            log::warn!(
                "Keeper {} cannot take id {canonical} ({e}); keeping its id",
                keeper.id
            );
            if !marked.is_empty() {
                store.update_many(marked).await?;
            }
            Ok((count, false))
        }
        Err(e) => Err(e),
    }
}
