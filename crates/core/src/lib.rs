// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! harrow-core: domain model for the harrow worker fleet
//!
//! This crate provides:
//! - The job row and claimed-job context shared by every worker
//! - The lifecycle state machine and failure classification rules
//! - Candidate eligibility and the fairness ordering policy
//! - Worker configuration, built once at startup and passed by reference

pub mod config;
pub mod filter;
pub mod job;
pub mod lifecycle;
pub mod params;
pub mod priority;
pub mod rules;

pub use config::{ConfigError, WorkerConfig};
pub use filter::{candidate_order, CandidateFilter, DEFAULT_BATCH_SIZE};
pub use job::{
    JobContext, JobId, JobRow, JobStatus, ParseStatusError, Region, SubscriptionInfo, UserInfo,
};
pub use lifecycle::{classify_failure, Disposition, RetryPolicy, Transition};
pub use params::{ExtraParams, ParamValue, ParamsError};
pub use priority::{priority_label, PriorityBand, DEFAULT_SUB_PRIORITY, NORMAL_SUB_PRIORITY};
pub use rules::FailureRules;
