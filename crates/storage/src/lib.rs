// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! Shared job-table access for harrow workers
//!
//! Workers coordinate exclusively through conditional updates against the
//! shared table: `try_claim` and `record_disposition` report whether
//! exactly one row changed, and a `false` return means another worker got
//! there first. It is never an error.

pub mod postgres;

#[cfg(any(test, feature = "test-support"))]
pub mod memory;

pub use postgres::PgJobStore;

#[cfg(any(test, feature = "test-support"))]
pub use memory::{AuditEntry, MemoryJobStore};

use async_trait::async_trait;
use harrow_core::{CandidateFilter, Disposition, JobId, JobRow, JobStatus};
use thiserror::Error;

/// Errors from job-store operations
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable after {attempts} connection attempts: {source}")]
    Unavailable {
        attempts: u32,
        source: sqlx::Error,
    },
    #[error("query failed: {0}")]
    Query(#[from] sqlx::Error),
    #[error("malformed row for job {id}: {reason}")]
    MalformedRow { id: i64, reason: String },
}

/// Best-effort audit of which worker ran which job
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditRecord {
    pub worker: String,
    pub job: JobId,
}

impl AuditRecord {
    pub fn new(worker: impl Into<String>, job: JobId) -> Self {
        Self {
            worker: worker.into(),
            job,
        }
    }
}

/// Parameterized access to the shared job table.
///
/// Implementations must make `try_claim` atomic with respect to every
/// other instance running against the same store; this is the system's
/// only inter-process mutual-exclusion primitive.
#[async_trait]
pub trait JobStore: Send + Sync {
    /// Read up to a batch of eligible candidates in fairness order
    async fn fetch_candidates(&self, filter: &CandidateFilter) -> Result<Vec<JobRow>, StoreError>;

    /// Read one row by id, with no eligibility filtering
    async fn fetch_by_id(&self, id: JobId) -> Result<Option<JobRow>, StoreError>;

    /// Atomically move `id` from `expected` to PROCESSING, stamping the
    /// processing-start time. Returns whether exactly one row changed.
    async fn try_claim(&self, id: JobId, expected: JobStatus) -> Result<bool, StoreError>;

    /// Unconditionally set the status of `id` (operator-directed
    /// reprocessing only)
    async fn reset_status(&self, id: JobId, to: JobStatus) -> Result<(), StoreError>;

    /// Record a disposition, conditional on the job still being
    /// PROCESSING. Terminal dispositions stamp the completion time;
    /// failures record the message. Returns whether a row changed.
    async fn record_disposition(
        &self,
        id: JobId,
        disposition: &Disposition,
    ) -> Result<bool, StoreError>;

    /// Kinds of the highest-priority queued rows, one entry per sampled
    /// row, for the plurality sampler
    async fn sample_queued_kinds(&self, limit: i64) -> Result<Vec<String>, StoreError>;

    /// Append an instance-tracking record; callers treat errors as
    /// best-effort
    async fn audit_start(&self, record: &AuditRecord) -> Result<(), StoreError>;

    /// Stamp the end time on an instance-tracking record
    async fn audit_end(&self, record: &AuditRecord) -> Result<(), StoreError>;
}
