// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! harrow-engine: the worker side of the claim protocol
//!
//! This crate provides:
//! - The queue selector & claimer (candidate iteration over the store CAS)
//! - Outcome recording with failure classification and notification
//! - The driver loop
//! - File-based process locking and the cooperative stop protocol
//! - Work-directory lifecycle

pub mod claim;
pub mod error;
pub mod lock;
pub mod notify;
pub mod outcome;
pub mod runner;
pub mod work;
pub mod workdir;

pub use claim::{claim_next, claim_specific, top_queued_kind};
pub use error::EngineError;
pub use lock::{LockError, LockFile, LockOutcome, StopReason};
pub use notify::{NoOpNotifier, Notifier, NotifyError};
pub use outcome::record_outcome;
pub use runner::{RunSummary, Runner, RunnerDeps};
pub use work::{WorkFailure, WorkHandler};

#[cfg(any(test, feature = "test-support"))]
pub use notify::{FakeNotifier, NotifyCall};
#[cfg(any(test, feature = "test-support"))]
pub use work::{CountingHandler, FixedOutcomeHandler};
