// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Notification collaborator boundary
//!
//! Delivery (product links, failure notices) lives outside this crate;
//! the worker fires and forgets. A failed delivery is logged and never
//! affects the recorded job status.

use async_trait::async_trait;
use harrow_core::JobContext;
use thiserror::Error;

/// A delivery failure, logged by the caller
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("notification failed: {0}")]
pub struct NotifyError(pub String);

/// Collaborator invoked when a job reaches COMPLETE or FAILED
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify_complete(&self, ctx: &JobContext) -> Result<(), NotifyError>;

    async fn notify_failure(&self, ctx: &JobContext, message: &str) -> Result<(), NotifyError>;
}

/// Discards all notifications
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOpNotifier;

#[async_trait]
impl Notifier for NoOpNotifier {
    async fn notify_complete(&self, _ctx: &JobContext) -> Result<(), NotifyError> {
        Ok(())
    }

    async fn notify_failure(&self, _ctx: &JobContext, _message: &str) -> Result<(), NotifyError> {
        Ok(())
    }
}

/// One recorded notification call
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotifyCall {
    Complete { job: harrow_core::JobId },
    Failure { job: harrow_core::JobId, message: String },
}

/// Records calls for assertions
#[cfg(any(test, feature = "test-support"))]
#[derive(Debug, Default)]
pub struct FakeNotifier {
    calls: std::sync::Mutex<Vec<NotifyCall>>,
}

#[cfg(any(test, feature = "test-support"))]
impl FakeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<NotifyCall> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }
}

#[cfg(any(test, feature = "test-support"))]
#[async_trait]
impl Notifier for FakeNotifier {
    async fn notify_complete(&self, ctx: &JobContext) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(NotifyCall::Complete { job: ctx.id });
        Ok(())
    }

    async fn notify_failure(&self, ctx: &JobContext, message: &str) -> Result<(), NotifyError> {
        self.calls
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(NotifyCall::Failure {
                job: ctx.id,
                message: message.to_string(),
            });
        Ok(())
    }
}
