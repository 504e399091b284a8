// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! In-memory job store for tests
//!
//! Mirrors the conditional-update contract of the SQL store: claims and
//! dispositions check the expected status under the write lock and report
//! whether a row changed. Eligibility and ordering come from the shared
//! pure functions, so both backends select identically.

use crate::{AuditRecord, JobStore, StoreError};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use harrow_core::{candidate_order, CandidateFilter, Disposition, JobId, JobRow, JobStatus};
use harrow_core::filter::MIN_ACCESS_LEVEL;
use tokio::sync::RwLock;

/// One instance-tracking entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditEntry {
    pub record: AuditRecord,
    pub started: bool,
    pub ended: bool,
}

/// Job store held entirely in memory
#[derive(Debug, Default)]
pub struct MemoryJobStore {
    jobs: RwLock<Vec<JobRow>>,
    audits: RwLock<Vec<AuditEntry>>,
}

impl MemoryJobStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert(&self, row: JobRow) {
        self.jobs.write().await.push(row);
    }

    pub async fn get(&self, id: JobId) -> Option<JobRow> {
        self.jobs.read().await.iter().find(|j| j.id == id).cloned()
    }

    pub async fn audit_entries(&self) -> Vec<AuditEntry> {
        self.audits.read().await.clone()
    }

    fn eligible_any_kind(row: &JobRow) -> bool {
        row.status == JobStatus::Queued
            && row.kind_enabled
            && row.subscription.as_ref().is_none_or(|s| s.enabled)
            && row.user.access_level >= MIN_ACCESS_LEVEL
            && match row.user.max_jobs {
                None => true,
                Some(max) if max <= 0 => true,
                Some(max) => row.user.jobs_processed < max,
            }
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }
}

#[async_trait]
impl JobStore for MemoryJobStore {
    async fn fetch_candidates(&self, filter: &CandidateFilter) -> Result<Vec<JobRow>, StoreError> {
        let jobs = self.jobs.read().await;
        let mut candidates: Vec<JobRow> = jobs
            .iter()
            .filter(|row| filter.matches(row))
            .cloned()
            .collect();
        candidates.sort_by(candidate_order);
        candidates.truncate(filter.batch_size.max(0) as usize);
        Ok(candidates)
    }

    async fn fetch_by_id(&self, id: JobId) -> Result<Option<JobRow>, StoreError> {
        Ok(self.get(id).await)
    }

    async fn try_claim(&self, id: JobId, expected: JobStatus) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.write().await;
        match jobs.iter_mut().find(|j| j.id == id) {
            Some(job) if job.status == expected => {
                job.status = JobStatus::Processing;
                job.processed_time = Some(Self::now());
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn reset_status(&self, id: JobId, to: JobStatus) -> Result<(), StoreError> {
        let mut jobs = self.jobs.write().await;
        if let Some(job) = jobs.iter_mut().find(|j| j.id == id) {
            job.status = to;
        }
        Ok(())
    }

    async fn record_disposition(
        &self,
        id: JobId,
        disposition: &Disposition,
    ) -> Result<bool, StoreError> {
        let mut jobs = self.jobs.write().await;
        match jobs.iter_mut().find(|j| j.id == id) {
            Some(job) if job.status == JobStatus::Processing => {
                job.status = disposition.status();
                job.message = disposition.message().map(String::from);
                if disposition.stamps_completion() {
                    job.completed_time = Some(Self::now());
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn sample_queued_kinds(&self, limit: i64) -> Result<Vec<String>, StoreError> {
        let jobs = self.jobs.read().await;
        let mut queued: Vec<&JobRow> = jobs
            .iter()
            .filter(|row| Self::eligible_any_kind(row))
            .collect();
        queued.sort_by(|a, b| candidate_order(a, b));
        Ok(queued
            .into_iter()
            .take(limit.max(0) as usize)
            .map(|row| row.kind.clone())
            .collect())
    }

    async fn audit_start(&self, record: &AuditRecord) -> Result<(), StoreError> {
        self.audits.write().await.push(AuditEntry {
            record: record.clone(),
            started: true,
            ended: false,
        });
        Ok(())
    }

    async fn audit_end(&self, record: &AuditRecord) -> Result<(), StoreError> {
        let mut audits = self.audits.write().await;
        if let Some(entry) = audits.iter_mut().find(|e| &e.record == record) {
            entry.ended = true;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "memory_tests.rs"]
mod tests;
