// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Per-job work directories
//!
//! Each claimed job gets a unique directory under the configured parent;
//! debug mode reuses an operator-supplied directory and marks the context
//! to skip processing.

use crate::error::EngineError;
use harrow_core::{JobContext, WorkerConfig};
use std::fs;
use std::time::{SystemTime, UNIX_EPOCH};
use tracing::{info, warn};

/// Create the work directory for a claimed job and record it on the
/// context.
pub fn setup(config: &WorkerConfig, ctx: &mut JobContext) -> Result<(), EngineError> {
    if let Some(dir) = &config.debug_workdir {
        info!(workdir = %dir.display(), "using previous work directory (will not process)");
        ctx.workdir = Some(dir.clone());
        ctx.skip_processing = true;
        return Ok(());
    }

    let name = format!("{}_{}_{}", ctx.kind, std::process::id(), nonce());
    let dir = config.work_dir.join(name);
    if dir.is_dir() {
        warn!(workdir = %dir.display(), "work directory already exists, removing");
        fs::remove_dir_all(&dir).map_err(EngineError::Workdir)?;
    }
    fs::create_dir_all(&dir).map_err(EngineError::Workdir)?;

    info!(workdir = %dir.display(), "created work directory");
    ctx.workdir = Some(dir);
    Ok(())
}

/// Remove the work directory after processing, honoring the keep flag.
/// Never fails the job over cleanup.
pub fn cleanup(config: &WorkerConfig, ctx: &JobContext) {
    let Some(dir) = &ctx.workdir else {
        return;
    };
    if config.debug_workdir.is_some() || config.keep_workdir {
        info!(workdir = %dir.display(), "not removing work directory");
        return;
    }
    if dir.is_dir() {
        info!(workdir = %dir.display(), "cleaning up work directory");
        if let Err(e) = fs::remove_dir_all(dir) {
            warn!(workdir = %dir.display(), error = %e, "failed to remove work directory");
        }
    } else {
        warn!(workdir = %dir.display(), "work directory not found at cleanup");
    }
}

/// Short unique suffix; the pid already disambiguates between workers on
/// a host
fn nonce() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    format!("{nanos:08X}")
}

#[cfg(test)]
#[path = "workdir_tests.rs"]
mod tests;
