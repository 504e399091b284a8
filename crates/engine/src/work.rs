// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Work callback boundary
//!
//! The external task invoked per claimed job. It may run for hours; there
//! is no internal timeout or cancellation, and the claim is held until
//! the handler returns.

use async_trait::async_trait;
use harrow_core::JobContext;
use thiserror::Error;

/// A failure reported by the work invocation, classified by the
/// lifecycle layer into RETRY or FAILED
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{0}")]
pub struct WorkFailure(pub String);

impl WorkFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self(message.into())
    }
}

/// The long-running external task run once per claimed job
#[async_trait]
pub trait WorkHandler: Send + Sync {
    async fn run(&self, ctx: &mut JobContext) -> Result<(), WorkFailure>;
}

/// Handler returning the same outcome on every invocation
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone)]
pub struct FixedOutcomeHandler {
    pub outcome: Result<(), WorkFailure>,
}

#[cfg(any(test, feature = "test-support"))]
impl FixedOutcomeHandler {
    pub fn succeeding() -> Self {
        Self { outcome: Ok(()) }
    }

    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            outcome: Err(WorkFailure::new(message)),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl WorkHandler for FixedOutcomeHandler {
    async fn run(&self, _ctx: &mut JobContext) -> Result<(), WorkFailure> {
        self.outcome.clone()
    }
}

/// Handler counting invocations, for driver-loop tests
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct CountingHandler {
    invocations: std::sync::atomic::AtomicU32,
}

#[cfg(any(test, feature = "test-support"))]
impl CountingHandler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn invocations(&self) -> u32 {
        self.invocations.load(std::sync::atomic::Ordering::SeqCst)
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl WorkHandler for CountingHandler {
    async fn run(&self, _ctx: &mut JobContext) -> Result<(), WorkFailure> {
        self.invocations
            .fetch_add(1, std::sync::atomic::Ordering::SeqCst);
        Ok(())
    }
}
