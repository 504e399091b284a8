// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Candidate selection and atomic claiming
//!
//! The selector reads a ranked batch and walks it attempting the store's
//! compare-and-swap. Losing a claim race is the expected outcome under
//! concurrent pollers and moves on to the next candidate silently.

use crate::error::EngineError;
use harrow_core::{priority_label, CandidateFilter, JobContext, JobId, JobStatus};
use harrow_store::{AuditRecord, JobStore};
use std::collections::HashMap;
use tracing::{debug, error, info};

/// Claim at most one job for this worker, or report nothing available.
///
/// Candidates are attempted in fairness order; a conditional update that
/// changes zero rows means another worker won the race between our read
/// and write.
pub async fn claim_next(
    store: &dyn JobStore,
    filter: &CandidateFilter,
    worker: &str,
) -> Result<Option<JobContext>, EngineError> {
    let candidates = store.fetch_candidates(filter).await?;
    if candidates.is_empty() {
        debug!(kind = %filter.kind, status = %filter.status, "no candidates found");
        return Ok(None);
    }

    for row in &candidates {
        debug!(
            job = %row.id,
            scene = %row.scene,
            priority = priority_label(row.sub_priority()),
            user_priority = row.user.priority,
            item_priority = row.item_priority,
            "attempting claim"
        );
        if store.try_claim(row.id, filter.status).await? {
            info!(job = %row.id, scene = %row.scene, user = %row.user.username, "claimed job");
            let ctx = JobContext::from_row(row)?;
            audit_claim_start(store, worker, row.id).await;
            return Ok(Some(ctx));
        }
        debug!(job = %row.id, "lost claim race, trying next candidate");
    }

    Ok(None)
}

/// Operator-directed reprocessing of one specific job.
///
/// Ranking is skipped; the job is reset to the expected source status if
/// needed and claimed directly.
pub async fn claim_specific(
    store: &dyn JobStore,
    id: JobId,
    expected: JobStatus,
    worker: &str,
) -> Result<Option<JobContext>, EngineError> {
    let Some(row) = store.fetch_by_id(id).await? else {
        info!(job = %id, "no such job");
        return Ok(None);
    };

    if row.status != expected {
        info!(
            job = %id,
            from = row.status.as_str(),
            to = expected.as_str(),
            "resetting status for directed reprocessing"
        );
        store.reset_status(id, expected).await?;
    }

    if !store.try_claim(id, expected).await? {
        info!(job = %id, "directed claim lost to another worker");
        return Ok(None);
    }

    info!(job = %id, scene = %row.scene, "claimed job by id");
    let ctx = JobContext::from_row(&row)?;
    audit_claim_start(store, worker, id).await;
    Ok(Some(ctx))
}

/// The job kind with the most rows among the highest-priority queued
/// candidates.
///
/// This is a plurality sample, deliberately distinct from the
/// strict-priority order `claim_next` uses.
pub async fn top_queued_kind(
    store: &dyn JobStore,
    limit: i64,
) -> Result<Option<String>, EngineError> {
    let sample = store.sample_queued_kinds(limit).await?;

    let mut counts: HashMap<&str, usize> = HashMap::new();
    for kind in &sample {
        *counts.entry(kind.as_str()).or_insert(0) += 1;
    }

    let mut top: Option<(&str, usize)> = None;
    for kind in &sample {
        let count = counts.get(kind.as_str()).copied().unwrap_or(0);
        match top {
            Some((_, best)) if best >= count => {}
            _ => top = Some((kind.as_str(), count)),
        }
    }

    if let Some((kind, count)) = top {
        info!(kind, count, sampled = sample.len(), "top queued kind");
    }
    Ok(top.map(|(kind, _)| kind.to_string()))
}

/// Best-effort: a failed audit write is logged and never fails the claim
async fn audit_claim_start(store: &dyn JobStore, worker: &str, id: JobId) {
    let record = AuditRecord::new(worker, id);
    if let Err(e) = store.audit_start(&record).await {
        error!(job = %id, error = %e, "could not write instance audit record");
    }
}

#[cfg(test)]
#[path = "claim_tests.rs"]
mod tests;
