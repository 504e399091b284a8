// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process-level mutual exclusion and cooperative stop
//!
//! At most one driver loop per job kind runs on a deployment unit,
//! enforced by an exclusively created marker file holding the owner's
//! identity. Operators stop a worker by dropping a `stop` marker next to
//! it, or force-stop one by deleting its lock marker outright.

use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Errors acquiring or checking the lock marker
#[derive(Debug, Error)]
pub enum LockError {
    #[error("failed to create lock directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("failed to write lock marker {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("lock marker readback mismatch at {path}")]
    Readback { path: PathBuf },
}

/// Result of attempting to acquire the per-kind lock
#[derive(Debug)]
pub enum LockOutcome {
    /// This process owns the marker until release
    Acquired(LockFile),
    /// Another instance owns it; normal behavior is a clean exit
    AlreadyRunning,
}

/// Why the cooperative stop check asked the loop to end
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The lock marker vanished (operator force-stop)
    MarkerRemoved,
    /// A stop marker was found and consumed
    StopRequested,
    /// The marker holds a different identity (stale reuse after a crash)
    IdentityMismatch,
}

/// An exclusively created lock marker, released on every exit path
#[derive(Debug)]
pub struct LockFile {
    path: PathBuf,
    identity: String,
    released: bool,
}

impl LockFile {
    /// Acquire the marker for `kind` under `dir`.
    ///
    /// Creation uses the exclusive-create mode so two workers racing the
    /// check cannot both win; an existing marker means another instance
    /// is running, which is not a fault.
    pub fn acquire(dir: &Path, kind: &str, identity: &str) -> Result<LockOutcome, LockError> {
        fs::create_dir_all(dir).map_err(|source| LockError::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
        let path = dir.join(format!("{kind}.lock"));

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                info!(path = %path.display(), "lock marker exists; another instance is running");
                return Ok(LockOutcome::AlreadyRunning);
            }
            Err(source) => return Err(LockError::Write { path, source }),
        };

        file.write_all(identity.as_bytes())
            .and_then(|()| file.sync_all())
            .map_err(|source| LockError::Write {
                path: path.clone(),
                source,
            })?;
        drop(file);

        // Readback check: the marker must hold exactly our identity
        let written = fs::read_to_string(&path).map_err(|source| LockError::Write {
            path: path.clone(),
            source,
        })?;
        if written != identity {
            return Err(LockError::Readback { path });
        }

        info!(path = %path.display(), identity, "acquired lock marker");
        Ok(LockOutcome::Acquired(Self {
            path,
            identity: identity.to_string(),
            released: false,
        }))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The stop marker lives next to the lock marker
    pub fn stop_marker_path(&self) -> PathBuf {
        match self.path.parent() {
            Some(dir) => dir.join("stop"),
            None => PathBuf::from("stop"),
        }
    }

    /// Check the cooperative stop conditions at an iteration boundary.
    ///
    /// Returns the reason to stop, or `None` to continue. A consumed stop
    /// marker is deleted here; an identity mismatch leaves the marker
    /// alone since it belongs to someone else.
    pub fn check_stop(&mut self) -> Option<StopReason> {
        if !self.path.is_file() {
            info!(path = %self.path.display(), "lock marker removed externally; stopping");
            self.released = true;
            return Some(StopReason::MarkerRemoved);
        }

        let stop = self.stop_marker_path();
        if stop.is_file() {
            if let Err(e) = fs::remove_file(&stop) {
                warn!(path = %stop.display(), error = %e, "failed to consume stop marker");
            }
            info!(path = %stop.display(), "stop marker found; stopping");
            return Some(StopReason::StopRequested);
        }

        match fs::read_to_string(&self.path) {
            Ok(written) if written == self.identity => None,
            Ok(written) => {
                info!(
                    marker = %written,
                    ours = %self.identity,
                    "lock marker identity mismatch; stopping without cleanup"
                );
                self.released = true;
                Some(StopReason::IdentityMismatch)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to read lock marker; stopping");
                self.released = true;
                Some(StopReason::MarkerRemoved)
            }
        }
    }

    /// Remove the marker. Safe to call more than once; also runs on drop.
    pub fn release(&mut self) {
        if self.released {
            return;
        }
        self.released = true;
        match fs::remove_file(&self.path) {
            Ok(()) => info!(path = %self.path.display(), "removed lock marker"),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "lock marker already gone at release");
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "failed to remove lock marker");
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        self.release();
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
