// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job rows and the claimed-job context
//!
//! A [`JobRow`] is the denormalized candidate row the selector reads from
//! the shared table. A [`JobContext`] is built from it exactly once, at
//! claim time, and carries everything the work callback needs.

use crate::params::{ExtraParams, ParamsError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// Identity of a job row in the shared table
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct JobId(pub i64);

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Job status as stored in the shared table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum JobStatus {
    /// Waiting to be claimed (set by the external enqueuer)
    Queued,
    /// Exactly one worker owns the job
    Processing,
    /// Failed transiently; selectable again when a worker opts in
    Retry,
    /// Finished successfully (terminal)
    Complete,
    /// Failed permanently (terminal)
    Failed,
}

impl JobStatus {
    /// The exact text stored in the status column
    pub fn as_str(&self) -> &'static str {
        match self {
            JobStatus::Queued => "QUEUED",
            JobStatus::Processing => "PROCESSING",
            JobStatus::Retry => "RETRY",
            JobStatus::Complete => "COMPLETE",
            JobStatus::Failed => "FAILED",
        }
    }

    /// Terminal states are retained for audit and never selected again
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Complete | JobStatus::Failed)
    }
}

impl std::fmt::Display for JobStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error parsing a status column value
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown job status: {0}")]
pub struct ParseStatusError(pub String);

impl FromStr for JobStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "QUEUED" => Ok(JobStatus::Queued),
            "PROCESSING" => Ok(JobStatus::Processing),
            "RETRY" => Ok(JobStatus::Retry),
            "COMPLETE" => Ok(JobStatus::Complete),
            "FAILED" => Ok(JobStatus::Failed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Bounding box of a subscription's region of interest
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl Region {
    /// Default for one-time jobs that have no subscription
    pub fn whole_world() -> Self {
        Self {
            min_lat: -90.0,
            max_lat: 90.0,
            min_lon: -180.0,
            max_lon: 180.0,
        }
    }
}

/// Subscription fields joined into a candidate row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubscriptionInfo {
    pub id: i64,
    pub name: String,
    /// Subscription priority; jobs without one sort at the normal default
    pub priority: Option<i32>,
    pub enabled: bool,
    pub region: Option<Region>,
}

/// Submitting-user fields joined into a candidate row
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserInfo {
    pub id: i64,
    pub username: String,
    pub priority: i32,
    pub access_level: i32,
    /// Processing quota; NULL or non-positive means unlimited
    pub max_jobs: Option<i64>,
    pub jobs_processed: i64,
}

/// A denormalized candidate row from the shared job table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobRow {
    pub id: JobId,
    /// Job-kind key; each worker class serves exactly one
    pub kind: String,
    /// Primary input identifier
    pub scene: String,
    pub companion_scenes: Vec<String>,
    pub item_priority: i32,
    pub status: JobStatus,
    pub request_time: DateTime<Utc>,
    pub processed_time: Option<DateTime<Utc>>,
    pub completed_time: Option<DateTime<Utc>>,
    pub message: Option<String>,
    pub subscription: Option<SubscriptionInfo>,
    pub user: UserInfo,
    pub kind_enabled: bool,
    /// Raw extra-parameter payload, resolved at claim time
    pub extra: Option<String>,
}

impl JobRow {
    pub fn sub_priority(&self) -> Option<i32> {
        self.subscription.as_ref().and_then(|s| s.priority)
    }
}

/// Everything a work callback needs about the job it owns.
///
/// Built once, at claim time; absent subscription fields resolve to the
/// one-time defaults rather than being probed ad hoc later.
#[derive(Debug, Clone, PartialEq)]
pub struct JobContext {
    pub id: JobId,
    pub kind: String,
    pub scene: String,
    pub companion_scenes: Vec<String>,
    pub sub_id: i64,
    pub sub_name: String,
    pub user_id: i64,
    pub username: String,
    pub user_priority: i32,
    pub item_priority: i32,
    pub region: Region,
    pub extra: ExtraParams,
    pub started: DateTime<Utc>,
    /// Set by the engine before the callback runs
    pub workdir: Option<PathBuf>,
    /// Debug mode: reuse prior results, do not invoke the external task
    pub skip_processing: bool,
}

impl JobContext {
    /// Populate a context from a freshly claimed row.
    ///
    /// The only fallible part is the extra-parameter payload; absent or
    /// degenerate payloads resolve to the empty bag.
    pub fn from_row(row: &JobRow) -> Result<Self, ParamsError> {
        let extra = ExtraParams::resolve(row.extra.as_deref())?;
        let (sub_id, sub_name, region) = match &row.subscription {
            Some(sub) => (
                sub.id,
                sub.name.clone(),
                sub.region.unwrap_or_else(Region::whole_world),
            ),
            None => (0, "One-Time".to_string(), Region::whole_world()),
        };

        Ok(Self {
            id: row.id,
            kind: row.kind.clone(),
            scene: row.scene.clone(),
            companion_scenes: row.companion_scenes.clone(),
            sub_id,
            sub_name,
            user_id: row.user.id,
            username: row.user.username.clone(),
            user_priority: row.user.priority,
            item_priority: row.item_priority,
            region,
            extra,
            started: Utc::now(),
            workdir: None,
            skip_processing: false,
        })
    }

    /// Placeholder context for forced iterations that bypass claiming
    pub fn synthetic(kind: impl Into<String>) -> Self {
        Self {
            id: JobId(0),
            kind: kind.into(),
            scene: String::new(),
            companion_scenes: Vec::new(),
            sub_id: 0,
            sub_name: "One-Time".to_string(),
            user_id: 0,
            username: String::new(),
            user_priority: 0,
            item_priority: 0,
            region: Region::whole_world(),
            extra: ExtraParams::default(),
            started: Utc::now(),
            workdir: None,
            skip_processing: false,
        }
    }
}

#[cfg(test)]
#[path = "job_tests.rs"]
mod tests;
