// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Candidate eligibility and ordering
//!
//! The SQL selector and the in-memory store both implement these rules;
//! keeping the predicate and comparator here as pure functions means the
//! fairness policy is tested once, not per backend.

use crate::job::{JobRow, JobStatus, UserInfo};
use crate::priority::{PriorityBand, DEFAULT_SUB_PRIORITY};
use std::cmp::Ordering;

/// Candidate batch size read per selection pass
pub const DEFAULT_BATCH_SIZE: i64 = 30;

/// Users below this access level never have jobs selected
pub const MIN_ACCESS_LEVEL: i32 = 2;

/// Which rows a worker may claim
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandidateFilter {
    pub kind: String,
    pub status: JobStatus,
    pub band: PriorityBand,
    pub batch_size: i64,
    /// Require the primary scene id to start with this prefix
    pub scene_prefix: Option<String>,
    /// Staging deployments pin selection to a single user
    pub test_user: Option<i64>,
}

impl CandidateFilter {
    pub fn new(kind: impl Into<String>, status: JobStatus) -> Self {
        Self {
            kind: kind.into(),
            status,
            band: PriorityBand::default(),
            batch_size: DEFAULT_BATCH_SIZE,
            scene_prefix: None,
            test_user: None,
        }
    }

    pub fn with_band(mut self, band: PriorityBand) -> Self {
        self.band = band;
        self
    }

    pub fn with_batch_size(mut self, batch_size: i64) -> Self {
        self.batch_size = batch_size;
        self
    }

    pub fn with_scene_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.scene_prefix = Some(prefix.into());
        self
    }

    pub fn with_test_user(mut self, user_id: i64) -> Self {
        self.test_user = Some(user_id);
        self
    }

    /// The full eligibility predicate a row must pass to be a candidate
    pub fn matches(&self, row: &JobRow) -> bool {
        row.kind == self.kind
            && row.status == self.status
            && row.kind_enabled
            && row.subscription.as_ref().is_none_or(|s| s.enabled)
            && row.user.access_level >= MIN_ACCESS_LEVEL
            && user_within_quota(&row.user)
            && self.band.admits(row)
            && self
                .scene_prefix
                .as_deref()
                .is_none_or(|prefix| row.scene.starts_with(prefix))
            && self.test_user.is_none_or(|user_id| row.user.id == user_id)
    }
}

fn user_within_quota(user: &UserInfo) -> bool {
    match user.max_jobs {
        None => true,
        Some(max) if max <= 0 => true,
        Some(max) => user.jobs_processed < max,
    }
}

/// The fairness ordering: explicit priority dominates, and among equal
/// priority the oldest request wins, preventing starvation. Id is the
/// stable tie-break.
pub fn candidate_order(a: &JobRow, b: &JobRow) -> Ordering {
    let a_sub = a.sub_priority().unwrap_or(DEFAULT_SUB_PRIORITY);
    let b_sub = b.sub_priority().unwrap_or(DEFAULT_SUB_PRIORITY);
    b_sub
        .cmp(&a_sub)
        .then(b.user.priority.cmp(&a.user.priority))
        .then(b.item_priority.cmp(&a.item_priority))
        .then(a.request_time.cmp(&b.request_time))
        .then(a.id.cmp(&b.id))
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
