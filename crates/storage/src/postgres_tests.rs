// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use harrow_core::JobStatus;

fn filter() -> CandidateFilter {
    CandidateFilter::new("terrain_correct", JobStatus::Queued)
}

#[tokio::test]
async fn connect_gives_up_after_the_attempt_bound() {
    // an unparseable URL fails every attempt without touching the network
    let err = PgJobStore::connect("definitely not a url", 1)
        .await
        .err()
        .unwrap();
    assert!(matches!(err, StoreError::Unavailable { attempts: 1, .. }));
}

#[test]
fn candidate_sql_applies_the_shared_predicates() {
    let filter = filter();
    let query = PgJobStore::candidate_query(&filter);
    let sql = query.sql();

    assert!(sql.contains("WHERE j.kind = $1"));
    assert!(sql.contains("AND j.status = $2"));
    assert!(sql.contains("k.enabled = TRUE"));
    assert!(sql.contains("(s.enabled = TRUE OR j.sub_id IS NULL)"));
    assert!(sql.contains("u.jobs_processed < u.max_jobs"));
    assert!(sql.contains("ORDER BY COALESCE(s.priority,"));
    assert!(sql.ends_with("LIMIT $5"));
}

#[test]
fn candidate_sql_orders_by_priority_then_age_then_id() {
    let filter = filter();
    let query = PgJobStore::candidate_query(&filter);
    let sql = query.sql();

    let order = sql
        .split("ORDER BY")
        .nth(1)
        .unwrap();
    assert!(order.contains("u.priority DESC"));
    assert!(order.contains("j.priority DESC"));
    assert!(order.contains("j.request_time ASC"));
    assert!(order.contains("j.id ASC"));
}

#[test]
fn standard_band_excludes_non_positive_subscriptions() {
    let filter = filter();
    let query = PgJobStore::candidate_query(&filter);
    assert!(query
        .sql()
        .contains("(j.sub_id IS NULL OR s.priority > 0)"));
}

#[test]
fn spot_band_requires_item_priority_and_caps_subscription_priority() {
    let spot = filter().with_band(PriorityBand::Spot);
    let query = PgJobStore::candidate_query(&spot);
    let sql = query.sql();

    assert!(sql.contains("AND j.priority > 0"));
    assert!(sql.contains("s.priority > 0 AND s.priority <="));
}

#[test]
fn on_prem_band_adds_no_priority_restriction() {
    let on_prem = filter().with_band(PriorityBand::OnPrem);
    let query = PgJobStore::candidate_query(&on_prem);
    let sql = query.sql();

    assert!(!sql.contains("s.priority > 0"));
    assert!(!sql.contains("AND j.priority > 0"));
}

#[test]
fn optional_predicates_bind_when_configured() {
    let narrowed = filter().with_scene_prefix("S1").with_test_user(7);
    let query = PgJobStore::candidate_query(&narrowed);
    let sql = query.sql();

    assert!(sql.contains("j.scene LIKE"));
    assert!(sql.contains("u.id ="));
}
