//! Status evolution under success, transient failure, and permanent
//! failure, driven through the full runner.

use crate::prelude::*;
use harrow_core::{JobId, JobStatus};
use harrow_engine::{FakeNotifier, FixedOutcomeHandler, NotifyCall, Runner, RunnerDeps};
use harrow_store::{JobStore, MemoryJobStore};

#[tokio::test]
async fn successful_job_completes_with_notification_and_audit() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryJobStore::new();
    store.insert(row(1)).await;
    let notifier = FakeNotifier::new();
    let config = config(dir.path());
    let mut lock = acquire(dir.path(), "4242");
    let mut deps = RunnerDeps {
        store: &store,
        notifier: &notifier,
        config: &config,
        lock: &mut lock,
        worker: "node-1:4242",
    };

    let summary = Runner::from_config(&config)
        .run(&mut deps, &FixedOutcomeHandler::succeeding())
        .await
        .unwrap();
    assert_eq!(summary.processed, 1);

    let job = store.get(JobId(1)).await.unwrap();
    assert_eq!(job.status, JobStatus::Complete);
    assert!(job.processed_time.is_some(), "claim stamps the start time");
    assert!(job.completed_time.is_some(), "completion is stamped");

    assert_eq!(notifier.calls(), vec![NotifyCall::Complete { job: JobId(1) }]);

    let audits = store.audit_entries().await;
    assert_eq!(audits.len(), 1);
    assert_eq!(audits[0].record.worker, "node-1:4242");
    assert!(audits[0].ended);
}

#[tokio::test]
async fn transient_failure_reenters_the_pool_and_retries_to_completion() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryJobStore::new();
    store.insert(row(1)).await;
    let notifier = FakeNotifier::new();
    let config = config(dir.path());

    // first worker hits a transient failure
    {
        let mut lock = acquire(dir.path(), "4242");
        let mut deps = RunnerDeps {
            store: &store,
            notifier: &notifier,
            config: &config,
            lock: &mut lock,
            worker: "node-1",
        };
        Runner::from_config(&config)
            .run(&mut deps, &FixedOutcomeHandler::failing("connection reset"))
            .await
            .unwrap();
    }

    let job = store.get(JobId(1)).await.unwrap();
    assert_eq!(job.status, JobStatus::Retry);
    assert_eq!(job.message.as_deref(), Some("connection reset"));
    assert!(job.completed_time.is_none());

    // a retry-draining worker picks it up and succeeds
    {
        let mut retry_config = config.clone();
        retry_config.select_retry = true;
        let mut lock = acquire(dir.path(), "4343");
        let mut deps = RunnerDeps {
            store: &store,
            notifier: &notifier,
            config: &retry_config,
            lock: &mut lock,
            worker: "node-2",
        };
        Runner::from_config(&retry_config)
            .run(&mut deps, &FixedOutcomeHandler::succeeding())
            .await
            .unwrap();
    }

    assert_eq!(store.get(JobId(1)).await.unwrap().status, JobStatus::Complete);
}

#[tokio::test]
async fn permanent_failure_is_final_even_with_retry_enabled() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryJobStore::new();
    store.insert(row(1)).await;
    let notifier = FakeNotifier::new();
    let mut config = config(dir.path());
    config.notify_failure = true;
    let mut lock = acquire(dir.path(), "4242");
    let mut deps = RunnerDeps {
        store: &store,
        notifier: &notifier,
        config: &config,
        lock: &mut lock,
        worker: "node-1",
    };

    Runner::from_config(&config)
        .run(
            &mut deps,
            &FixedOutcomeHandler::failing("could not locate required auxiliary data"),
        )
        .await
        .unwrap();

    let job = store.get(JobId(1)).await.unwrap();
    assert_eq!(job.status, JobStatus::Failed);
    assert!(job.completed_time.is_some());
    assert_eq!(
        notifier.calls(),
        vec![NotifyCall::Failure {
            job: JobId(1),
            message: "could not locate required auxiliary data".to_string(),
        }]
    );
}

#[tokio::test]
async fn second_failure_of_a_retry_job_is_final() {
    let dir = tempfile::tempdir().unwrap();
    let store = MemoryJobStore::new();
    let mut retry = row(1);
    retry.status = JobStatus::Retry;
    store.insert(retry).await;
    let notifier = FakeNotifier::new();
    let mut config = config(dir.path());
    config.select_retry = true;
    let mut lock = acquire(dir.path(), "4242");
    let mut deps = RunnerDeps {
        store: &store,
        notifier: &notifier,
        config: &config,
        lock: &mut lock,
        worker: "node-1",
    };

    Runner::from_config(&config)
        .run(&mut deps, &FixedOutcomeHandler::failing("connection reset"))
        .await
        .unwrap();

    assert_eq!(store.get(JobId(1)).await.unwrap().status, JobStatus::Failed);
}
