//! Mutual exclusion and priority ordering of the claim protocol.

use crate::prelude::*;
use harrow_core::{CandidateFilter, JobId, JobStatus};
use harrow_engine::claim_next;
use harrow_store::{JobStore, MemoryJobStore};
use std::sync::Arc;

fn filter() -> CandidateFilter {
    CandidateFilter::new(KIND, JobStatus::Queued)
}

#[tokio::test]
async fn racing_claims_against_one_job_have_exactly_one_winner() {
    let store = Arc::new(MemoryJobStore::new());
    store.insert(row(1)).await;

    let mut handles = Vec::new();
    for _ in 0..32 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            store.try_claim(JobId(1), JobStatus::Queued).await.unwrap()
        }));
    }

    let mut winners = 0;
    for handle in handles {
        if handle.await.unwrap() {
            winners += 1;
        }
    }
    assert_eq!(winners, 1, "exactly one racing claim may succeed");
}

#[tokio::test]
async fn racing_selectors_never_share_a_job() {
    let store = Arc::new(MemoryJobStore::new());
    for id in 1..=4 {
        store.insert(row(id)).await;
    }

    let mut handles = Vec::new();
    for worker in 0..8 {
        let store = Arc::clone(&store);
        handles.push(tokio::spawn(async move {
            let name = format!("node-{worker}");
            claim_next(store.as_ref(), &filter(), &name).await.unwrap()
        }));
    }

    let mut claimed = Vec::new();
    for handle in handles {
        if let Some(ctx) = handle.await.unwrap() {
            claimed.push(ctx.id);
        }
    }

    claimed.sort();
    let before_dedup = claimed.len();
    claimed.dedup();
    assert_eq!(claimed.len(), before_dedup, "no job may be claimed twice");
    assert_eq!(claimed.len(), 4, "all queued jobs get claimed");
}

#[tokio::test]
async fn selection_follows_the_fairness_policy() {
    let store = MemoryJobStore::new();
    // (sub, user, item, age-hours)
    store.insert(ranked(1, 10, 5, 0, 1)).await;
    store.insert(ranked(2, 10, 5, 0, 2)).await;
    store.insert(ranked(3, 20, 1, 0, 1)).await;

    let first = claim_next(&store, &filter(), "node-1").await.unwrap().unwrap();
    assert_eq!(first.id, JobId(3), "subscription priority dominates");

    let second = claim_next(&store, &filter(), "node-1").await.unwrap().unwrap();
    assert_eq!(second.id, JobId(2), "oldest request wins at equal priority");

    let third = claim_next(&store, &filter(), "node-1").await.unwrap().unwrap();
    assert_eq!(third.id, JobId(1));
}

#[tokio::test]
async fn claims_against_terminal_jobs_always_fail() {
    let store = MemoryJobStore::new();
    let mut done = row(1);
    done.status = JobStatus::Complete;
    store.insert(done).await;
    let mut failed = row(2);
    failed.status = JobStatus::Failed;
    store.insert(failed).await;

    for id in [1, 2] {
        assert!(!store.try_claim(JobId(id), JobStatus::Queued).await.unwrap());
        assert!(!store.try_claim(JobId(id), JobStatus::Retry).await.unwrap());
    }
    assert!(claim_next(&store, &filter(), "node-1").await.unwrap().is_none());
}
