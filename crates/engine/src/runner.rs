// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-worker driver loop
//!
//! Up to N claim-and-process cycles: check the stop signal, claim, invoke
//! the work handler, record the outcome, optionally sleep. The loop
//! always exits by returning; "already running" short-circuits happen
//! before it ever starts.

use crate::claim::{claim_next, claim_specific};
use crate::error::EngineError;
use crate::lock::{LockFile, StopReason};
use crate::notify::Notifier;
use crate::outcome::record_outcome;
use crate::work::WorkHandler;
use crate::workdir;
use harrow_core::{CandidateFilter, JobContext, JobId, JobStatus, WorkerConfig};
use harrow_store::JobStore;
use std::time::Duration;
use tracing::{info, warn};

/// Driver-loop settings, usually derived from the worker config
#[derive(Debug, Clone)]
pub struct Runner {
    /// Claim-and-process cycles to attempt
    pub iterations: u32,
    /// Delay between cycles
    pub sleep: Duration,
    /// Stop early once a selection pass finds nothing
    pub stop_if_none: bool,
    /// Bypass claiming entirely and invoke the handler directly
    pub force: bool,
}

impl Runner {
    pub fn from_config(config: &WorkerConfig) -> Self {
        Self {
            iterations: config.num_to_process,
            sleep: Duration::from_secs(config.sleep_secs),
            stop_if_none: config.stop_if_none,
            force: false,
        }
    }
}

/// Everything a run borrows from the process
pub struct RunnerDeps<'a> {
    pub store: &'a dyn JobStore,
    pub notifier: &'a dyn Notifier,
    pub config: &'a WorkerConfig,
    pub lock: &'a mut LockFile,
    /// Worker identity used in audit records
    pub worker: &'a str,
}

/// How a run ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Jobs actually claimed and processed
    pub processed: u32,
    /// Set when a cooperative stop ended the loop early
    pub stop: Option<StopReason>,
}

impl Runner {
    /// Perform up to `iterations` cycles. Exits early on a cooperative
    /// stop or, when configured, on an empty selection pass.
    pub async fn run(
        &self,
        deps: &mut RunnerDeps<'_>,
        handler: &dyn WorkHandler,
    ) -> Result<RunSummary, EngineError> {
        let mut summary = RunSummary {
            processed: 0,
            stop: None,
        };

        info!(iterations = self.iterations, "starting driver loop");
        for n in 0..self.iterations {
            if let Some(reason) = deps.lock.check_stop() {
                summary.stop = Some(reason);
                break;
            }

            let found = self.process_one(deps, handler).await?;
            if found {
                summary.processed += 1;
            }
            info!(
                iteration = n + 1,
                total = self.iterations,
                processed = summary.processed,
                "iteration finished"
            );

            if !found && self.stop_if_none {
                break;
            }
            if self.sleep > Duration::ZERO && n + 1 < self.iterations {
                tokio::time::sleep(self.sleep).await;
            }
        }

        info!(processed = summary.processed, stop = ?summary.stop, "driver loop done");
        Ok(summary)
    }

    async fn process_one(
        &self,
        deps: &mut RunnerDeps<'_>,
        handler: &dyn WorkHandler,
    ) -> Result<bool, EngineError> {
        if self.force {
            // Synthetic iteration: nothing claimed, nothing recorded
            let mut ctx = JobContext::synthetic(deps.config.kind.as_str());
            if let Err(failure) = handler.run(&mut ctx).await {
                warn!(error = %failure, "forced iteration reported failure");
            }
            return Ok(true);
        }

        let claimed = match deps.config.target_job {
            Some(id) => {
                claim_specific(
                    deps.store,
                    JobId(id),
                    selection_status(deps.config),
                    deps.worker,
                )
                .await?
            }
            None => {
                let filter = filter_from_config(deps.config);
                claim_next(deps.store, &filter, deps.worker).await?
            }
        };

        let Some(mut ctx) = claimed else {
            info!("found nothing to process");
            return Ok(false);
        };

        workdir::setup(deps.config, &mut ctx)?;
        let outcome = handler.run(&mut ctx).await;
        record_outcome(
            deps.store,
            deps.notifier,
            deps.config,
            &ctx,
            outcome,
            deps.worker,
        )
        .await?;
        workdir::cleanup(deps.config, &ctx);

        Ok(true)
    }
}

/// Build the selection filter a worker's configuration implies
pub fn filter_from_config(config: &WorkerConfig) -> CandidateFilter {
    let mut filter = CandidateFilter::new(config.kind.as_str(), selection_status(config))
        .with_band(config.band)
        .with_batch_size(config.batch_size);
    if let Some(prefix) = &config.scene_prefix {
        filter = filter.with_scene_prefix(prefix.clone());
    }
    if let Some(user_id) = config.test_user {
        filter = filter.with_test_user(user_id);
    }
    filter
}

fn selection_status(config: &WorkerConfig) -> JobStatus {
    if config.select_retry {
        JobStatus::Retry
    } else {
        JobStatus::Queued
    }
}

#[cfg(test)]
#[path = "runner_tests.rs"]
mod tests;
