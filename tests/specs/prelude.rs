//! Shared builders for the spec tests.

use chrono::{Duration, Utc};
use harrow_core::{JobId, JobRow, JobStatus, SubscriptionInfo, UserInfo, WorkerConfig};
use harrow_engine::{LockFile, LockOutcome};
use std::path::Path;

pub const KIND: &str = "terrain_correct";

pub fn row(id: i64) -> JobRow {
    JobRow {
        id: JobId(id),
        kind: KIND.to_string(),
        scene: format!("S1A_{id:04}"),
        companion_scenes: Vec::new(),
        item_priority: 0,
        status: JobStatus::Queued,
        request_time: Utc::now(),
        processed_time: None,
        completed_time: None,
        message: None,
        subscription: None,
        user: UserInfo {
            id: 7,
            username: "ada".to_string(),
            priority: 0,
            access_level: 2,
            max_jobs: None,
            jobs_processed: 0,
        },
        kind_enabled: true,
        extra: None,
    }
}

pub fn ranked(id: i64, sub: i32, user: i32, item: i32, age_hours: i64) -> JobRow {
    let mut r = row(id);
    r.subscription = Some(SubscriptionInfo {
        id: 1,
        name: "sub".to_string(),
        priority: Some(sub),
        enabled: true,
        region: None,
    });
    r.user.priority = user;
    r.item_priority = item;
    r.request_time = Utc::now() - Duration::hours(age_hours);
    r
}

pub fn config(work_dir: &Path) -> WorkerConfig {
    WorkerConfig {
        kind: KIND.to_string(),
        work_dir: work_dir.to_path_buf(),
        ..WorkerConfig::default()
    }
}

pub fn acquire(dir: &Path, identity: &str) -> LockFile {
    match LockFile::acquire(dir, KIND, identity).unwrap() {
        LockOutcome::Acquired(lock) => lock,
        LockOutcome::AlreadyRunning => panic!("expected to acquire the lock"),
    }
}
