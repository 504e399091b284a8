// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! harrow - shared-queue worker runner

mod handler;

use anyhow::Result;
use clap::Parser;
use harrow_core::{PriorityBand, WorkerConfig};
use harrow_engine::{LockFile, LockOutcome, NoOpNotifier, Runner, RunnerDeps};
use harrow_store::PgJobStore;
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(
    name = "harrow",
    version,
    about = "Harrow - pull processing jobs from the shared queue"
)]
struct Cli {
    /// Job kind this worker serves
    kind: String,

    /// Path to the worker config file
    #[arg(long, default_value = "harrow.toml")]
    config: PathBuf,

    /// Process the specified number of jobs
    #[arg(short = 'n', long = "num", default_value_t = 1)]
    num: u32,

    /// Process jobs in RETRY status (a second failure is permanent)
    #[arg(long)]
    retry: bool,

    /// Process a specific job id
    #[arg(long, value_name = "ID")]
    job_id: Option<i64>,

    /// Do not clean up work directories after processing
    #[arg(short, long)]
    keep: bool,

    /// Reuse a previously used workdir; do not process
    #[arg(short, long, value_name = "WORKDIR")]
    debug: Option<PathBuf>,

    /// Select only spot-band jobs (interruptible capacity)
    #[arg(long, conflicts_with = "on_prem")]
    spot: bool,

    /// Select any job regardless of subscription priority (on-premise)
    #[arg(long)]
    on_prem: bool,

    /// Print debug messages
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    install_signal_handler()?;

    let mut config = WorkerConfig::load(&cli.config)?;
    apply_flags(&mut config, &cli);

    let identity = std::process::id().to_string();
    let worker = format!("{}:{}", hostname(), identity);

    let mut lock = match LockFile::acquire(&config.lock_dir, &config.kind, &identity)? {
        LockOutcome::Acquired(lock) => lock,
        LockOutcome::AlreadyRunning => {
            info!("already running; exiting");
            return Ok(());
        }
    };

    let store = PgJobStore::connect(&config.database_url, config.connect_attempts).await?;
    let handler = handler::CommandHandler::from_config(&config)?;
    let notifier = NoOpNotifier;

    let runner = Runner::from_config(&config);
    let mut deps = RunnerDeps {
        store: &store,
        notifier: &notifier,
        config: &config,
        lock: &mut lock,
        worker: &worker,
    };
    let summary = runner.run(&mut deps, &handler).await?;

    lock.release();
    info!(processed = summary.processed, "done");
    Ok(())
}

fn apply_flags(config: &mut WorkerConfig, cli: &Cli) {
    config.kind = cli.kind.clone();
    config.num_to_process = cli.num;
    if cli.retry {
        config.select_retry = true;
    }
    if cli.job_id.is_some() {
        config.target_job = cli.job_id;
    }
    if cli.keep {
        config.keep_workdir = true;
    }
    if cli.debug.is_some() {
        config.debug_workdir = cli.debug.clone();
    }
    if cli.spot {
        config.band = PriorityBand::Spot;
    } else if cli.on_prem {
        config.band = PriorityBand::OnPrem;
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Termination signals do not trigger graceful mid-job cleanup; the lock
/// marker is the only thing released, via the process exit path.
fn install_signal_handler() -> Result<()> {
    ctrlc::set_handler(|| {
        tracing::error!("received a termination signal; bailing out");
        std::process::exit(1);
    })?;
    Ok(())
}

fn hostname() -> String {
    std::env::var("HOSTNAME").unwrap_or_else(|_| "localhost".to_string())
}
