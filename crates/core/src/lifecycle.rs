// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Job lifecycle state machine
//!
//! Transitions are enforced by the store's conditional updates: an update
//! whose precondition no longer holds mutates zero rows. This module owns
//! the preconditions and the failure classification that picks between
//! RETRY and FAILED.

use crate::job::{JobContext, JobStatus};
use crate::rules::FailureRules;

/// The legal events of the job state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// QUEUED or RETRY -> PROCESSING, only via the atomic claim
    Claim,
    /// PROCESSING -> COMPLETE
    Complete,
    /// PROCESSING -> FAILED
    Fail,
    /// PROCESSING -> RETRY, re-entering the candidate pool
    Retry,
}

impl Transition {
    /// Whether the transition may be applied from `current`.
    ///
    /// Every (status, event) pair not accepted here must leave the row
    /// untouched.
    pub fn applies_from(&self, current: JobStatus) -> bool {
        match self {
            Transition::Claim => matches!(current, JobStatus::Queued | JobStatus::Retry),
            Transition::Complete | Transition::Fail | Transition::Retry => {
                current == JobStatus::Processing
            }
        }
    }

    pub fn target(&self) -> JobStatus {
        match self {
            Transition::Claim => JobStatus::Processing,
            Transition::Complete => JobStatus::Complete,
            Transition::Fail => JobStatus::Failed,
            Transition::Retry => JobStatus::Retry,
        }
    }
}

/// What outcome recording writes back to the store
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    Complete,
    Retry { message: String },
    Failed { message: String },
}

impl Disposition {
    pub fn status(&self) -> JobStatus {
        match self {
            Disposition::Complete => JobStatus::Complete,
            Disposition::Retry { .. } => JobStatus::Retry,
            Disposition::Failed { .. } => JobStatus::Failed,
        }
    }

    pub fn message(&self) -> Option<&str> {
        match self {
            Disposition::Complete => None,
            Disposition::Retry { message } | Disposition::Failed { message } => {
                Some(message.as_str())
            }
        }
    }

    /// Terminal dispositions stamp a completion timestamp; RETRY does not
    pub fn stamps_completion(&self) -> bool {
        !matches!(self, Disposition::Retry { .. })
    }
}

/// Whether a failed job may re-enter the queue.
///
/// Disabled when the worker is already draining RETRY jobs: a second
/// failure is final.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub enabled: bool,
}

/// Classify a work failure into a disposition.
///
/// Permanent rule matches and a disabled retry policy both go to FAILED;
/// everything else re-enters the candidate pool as RETRY.
pub fn classify_failure(
    policy: RetryPolicy,
    rules: &FailureRules,
    ctx: &JobContext,
    message: &str,
) -> Disposition {
    if !policy.enabled || rules.is_permanent(message, &ctx.scene) {
        Disposition::Failed {
            message: message.to_string(),
        }
    } else {
        Disposition::Retry {
            message: message.to_string(),
        }
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
