// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Worker configuration
//!
//! Built exactly once at startup, from the TOML file plus CLI overlays,
//! and passed by reference through every component. Never ambient global
//! state.

use crate::priority::PriorityBand;
use crate::rules::FailureRules;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors loading the worker config file
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Configuration for one worker process
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct WorkerConfig {
    /// Job-kind key this worker serves
    pub kind: String,
    /// Directory holding the lock marker and the stop marker
    pub lock_dir: PathBuf,
    /// Parent directory for per-job work directories
    pub work_dir: PathBuf,
    /// Do not remove work directories after processing
    pub keep_workdir: bool,
    /// Reuse this directory and skip processing (operator debugging)
    pub debug_workdir: Option<PathBuf>,
    /// Seconds to sleep between driver-loop iterations
    pub sleep_secs: u64,
    /// How many claim-and-process cycles to attempt
    pub num_to_process: u32,
    /// Stop early once a selection pass finds nothing
    pub stop_if_none: bool,
    /// Candidate rows read per selection pass
    pub batch_size: i64,
    /// Send a failure notice when a job goes to FAILED
    pub notify_failure: bool,
    /// Slice of the subscription-priority range this deployment serves
    pub band: PriorityBand,
    /// Select RETRY jobs instead of QUEUED (a second failure is final)
    pub select_retry: bool,
    /// Claim exactly this job id instead of ranking candidates
    pub target_job: Option<i64>,
    /// Shared job table connection string
    pub database_url: String,
    /// Bounded store connection attempts before giving up
    pub connect_attempts: u32,
    /// Only select jobs whose scene starts with this prefix
    pub scene_prefix: Option<String>,
    /// Staging: only select jobs submitted by this user
    pub test_user: Option<i64>,
    /// External task invoked per claimed job
    pub command: Option<String>,
    pub rules: FailureRules,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            kind: String::new(),
            lock_dir: PathBuf::from("/tmp/harrow/lock"),
            work_dir: PathBuf::from("/tmp"),
            keep_workdir: false,
            debug_workdir: None,
            sleep_secs: 0,
            num_to_process: 1,
            stop_if_none: false,
            batch_size: crate::filter::DEFAULT_BATCH_SIZE,
            notify_failure: false,
            band: PriorityBand::default(),
            select_retry: false,
            target_job: None,
            database_url: "postgres://localhost/harrow".to_string(),
            connect_attempts: 5,
            scene_prefix: None,
            test_user: None,
            command: None,
            rules: FailureRules::default(),
        }
    }
}

impl WorkerConfig {
    /// Load from a TOML file; a missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(text) => Ok(toml::from_str(&text)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(source) => Err(ConfigError::Io {
                path: path.to_path_buf(),
                source,
            }),
        }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
