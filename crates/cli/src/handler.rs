// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External task invocation
//!
//! Runs the configured command once per claimed job: the primary scene,
//! any companion scenes, and the work directory are passed as arguments.
//! The invocation blocks for however long the task takes; there is no
//! internal timeout.

use anyhow::{bail, Result};
use async_trait::async_trait;
use harrow_core::{JobContext, WorkerConfig};
use harrow_engine::{WorkFailure, WorkHandler};
use tokio::process::Command;
use tracing::{debug, info};

/// Work handler shelling out to the configured external task
pub struct CommandHandler {
    program: String,
}

impl CommandHandler {
    pub fn from_config(config: &WorkerConfig) -> Result<Self> {
        match &config.command {
            Some(program) if !program.trim().is_empty() => Ok(Self {
                program: program.clone(),
            }),
            _ => bail!("no command configured for kind '{}'", config.kind),
        }
    }
}

#[async_trait]
impl WorkHandler for CommandHandler {
    async fn run(&self, ctx: &mut JobContext) -> Result<(), WorkFailure> {
        if ctx.skip_processing {
            info!(job = %ctx.id, "processing skipped (debug mode)");
            return Ok(());
        }

        let workdir = ctx
            .workdir
            .clone()
            .ok_or_else(|| WorkFailure::new("no work directory set"))?;

        let mut command = Command::new(&self.program);
        command.arg(&ctx.scene);
        command.args(&ctx.companion_scenes);
        command.arg(&workdir);
        command.current_dir(&workdir);

        info!(job = %ctx.id, program = %self.program, scene = %ctx.scene, "processing starting");
        let output = command
            .output()
            .await
            .map_err(|e| WorkFailure::new(format!("{}: {e}", self.program)))?;

        let stdout = String::from_utf8_lossy(&output.stdout);
        let stderr = String::from_utf8_lossy(&output.stderr);
        for line in stdout.lines().chain(stderr.lines()) {
            debug!(job = %ctx.id, "proc: {line}");
        }

        if !output.status.success() {
            return Err(WorkFailure::new(extract_error(
                &self.program,
                &stdout,
                &stderr,
                output.status.code(),
            )));
        }

        info!(job = %ctx.id, "processing finished");
        Ok(())
    }
}

/// Pick the most useful failure line out of the task output: the first
/// line mentioning an error, else the last non-empty line, else the exit
/// code.
fn extract_error(program: &str, stdout: &str, stderr: &str, code: Option<i32>) -> String {
    let lines = || stderr.lines().chain(stdout.lines());

    if let Some(line) = lines().find(|l| l.to_uppercase().contains("ERROR")) {
        return format!("{program}: {}", line.trim());
    }
    if let Some(line) = lines().filter(|l| !l.trim().is_empty()).last() {
        return format!("{program}: {}", line.trim());
    }
    match code {
        Some(code) => format!("{program}: nonzero return value: {code}"),
        None => format!("{program}: terminated by signal"),
    }
}
