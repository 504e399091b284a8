//! Lock idempotence and cooperative stop.

use crate::prelude::*;
use harrow_core::{JobId, JobStatus};
use harrow_engine::{
    FakeNotifier, FixedOutcomeHandler, LockFile, LockOutcome, Runner, RunnerDeps, StopReason,
};
use harrow_store::{JobStore, MemoryJobStore};

#[tokio::test]
async fn second_instance_exits_cleanly_without_claiming() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryJobStore::new();
    store.insert(row(1)).await;
    let _running = acquire(dir.path(), "4242");

    // the second invocation sees the marker and never touches the store
    let outcome = LockFile::acquire(dir.path(), KIND, "4343").unwrap();
    assert!(matches!(outcome, LockOutcome::AlreadyRunning));
    assert_eq!(store.get(JobId(1)).await.unwrap().status, JobStatus::Queued);
}

#[tokio::test]
async fn stop_marker_ends_the_loop_before_the_next_claim() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryJobStore::new();
    for id in 1..=3 {
        store.insert(row(id)).await;
    }
    let notifier = FakeNotifier::new();
    let mut config = config(dir.path());
    config.num_to_process = 3;
    let mut lock = acquire(dir.path(), "4242");
    let stop_marker = lock.stop_marker_path();
    std::fs::write(&stop_marker, "").unwrap();

    let mut deps = RunnerDeps {
        store: &store,
        notifier: &notifier,
        config: &config,
        lock: &mut lock,
        worker: "node-1",
    };
    let summary = Runner::from_config(&config)
        .run(&mut deps, &FixedOutcomeHandler::succeeding())
        .await
        .unwrap();

    assert_eq!(summary.stop, Some(StopReason::StopRequested));
    assert_eq!(summary.processed, 0, "no further claims after the stop");
    assert!(!stop_marker.exists(), "the stop marker is consumed");
    for id in 1..=3 {
        assert_eq!(store.get(JobId(id)).await.unwrap().status, JobStatus::Queued);
    }
}

#[tokio::test]
async fn removed_marker_stops_the_loop() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryJobStore::new();
    store.insert(row(1)).await;
    let notifier = FakeNotifier::new();
    let mut config = config(dir.path());
    config.num_to_process = 2;
    let mut lock = acquire(dir.path(), "4242");

    // operator force-stops by deleting the marker
    std::fs::remove_file(lock.path()).unwrap();

    let mut deps = RunnerDeps {
        store: &store,
        notifier: &notifier,
        config: &config,
        lock: &mut lock,
        worker: "node-1",
    };
    let summary = Runner::from_config(&config)
        .run(&mut deps, &FixedOutcomeHandler::succeeding())
        .await
        .unwrap();

    assert_eq!(summary.stop, Some(StopReason::MarkerRemoved));
    assert_eq!(summary.processed, 0);
}

#[tokio::test]
async fn lock_is_released_on_every_exit_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = {
        let lock = acquire(dir.path(), "4242");
        lock.path().to_path_buf()
    };
    assert!(!path.exists(), "drop releases the marker");

    // a fresh worker can acquire immediately afterwards
    let again = LockFile::acquire(dir.path(), KIND, "4343").unwrap();
    assert!(matches!(again, LockOutcome::Acquired(_)));
}
