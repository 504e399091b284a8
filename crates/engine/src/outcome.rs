// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outcome recording
//!
//! The disposition is always written to the store before any notification
//! is attempted, so a failed delivery can never lose a status change.

use crate::error::EngineError;
use crate::notify::Notifier;
use crate::work::WorkFailure;
use harrow_core::{classify_failure, Disposition, JobContext, RetryPolicy, WorkerConfig};
use harrow_store::{AuditRecord, JobStore};
use tracing::{error, info, warn};

/// Record the result of a work invocation and fire the matching
/// notification.
///
/// Returns the disposition that was written, or attempted: a job that is
/// no longer PROCESSING is logged and left alone.
pub async fn record_outcome(
    store: &dyn JobStore,
    notifier: &dyn Notifier,
    config: &WorkerConfig,
    ctx: &JobContext,
    outcome: Result<(), WorkFailure>,
    worker: &str,
) -> Result<Disposition, EngineError> {
    let policy = RetryPolicy {
        enabled: !config.select_retry,
    };
    let disposition = match &outcome {
        Ok(()) => Disposition::Complete,
        Err(failure) => {
            info!(job = %ctx.id, error = %failure, "work invocation failed");
            classify_failure(policy, &config.rules, ctx, &failure.0)
        }
    };

    let updated = store.record_disposition(ctx.id, &disposition).await?;
    if updated {
        info!(job = %ctx.id, status = disposition.status().as_str(), "recorded disposition");
    } else {
        warn!(
            job = %ctx.id,
            status = disposition.status().as_str(),
            "job was no longer PROCESSING; disposition not recorded"
        );
    }

    audit_claim_end(store, worker, ctx).await;

    match &disposition {
        Disposition::Complete => {
            if let Err(e) = notifier.notify_complete(ctx).await {
                error!(job = %ctx.id, error = %e, "completion notification failed");
            }
        }
        Disposition::Failed { message } if config.notify_failure => {
            if let Err(e) = notifier.notify_failure(ctx, message).await {
                error!(job = %ctx.id, error = %e, "failure notification failed");
            }
        }
        _ => {}
    }

    Ok(disposition)
}

async fn audit_claim_end(store: &dyn JobStore, worker: &str, ctx: &JobContext) {
    let record = AuditRecord::new(worker, ctx.id);
    if let Err(e) = store.audit_end(&record).await {
        error!(job = %ctx.id, error = %e, "could not stamp instance audit record");
    }
}

#[cfg(test)]
#[path = "outcome_tests.rs"]
mod tests;
