// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! PostgreSQL job store
//!
//! Expects the shared schema: `jobs` (id, kind, scene, companion_scenes,
//! priority, status, request_time, processed_time, completed_time,
//! message, extra_parameters, sub_id, user_id), `subscriptions` (id, name,
//! priority, enabled, min_lat/max_lat/min_lon/max_lon), `users` (id,
//! username, priority, access_level, max_jobs, jobs_processed),
//! `job_types` (key, enabled), and the append-only `instance_log`
//! (worker, job_id, start_time, end_time).
//!
//! Every mutation is a parameterized conditional update; the
//! rows-affected count is the whole claim protocol.

use crate::{AuditRecord, JobStore, StoreError};
use async_trait::async_trait;
use harrow_core::{
    CandidateFilter, Disposition, JobId, JobRow, JobStatus, PriorityBand, Region,
    SubscriptionInfo, UserInfo, DEFAULT_SUB_PRIORITY, NORMAL_SUB_PRIORITY,
};
use harrow_core::filter::MIN_ACCESS_LEVEL;
use sqlx::postgres::{PgPool, PgPoolOptions, PgRow, Postgres};
use sqlx::{QueryBuilder, Row};
use std::time::Duration;
use tracing::{debug, warn};

/// Seconds multiplied by the attempt number between connection retries
const RETRY_BACKOFF_SECS: u64 = 30;

const SELECT_COLUMNS: &str = "\
    SELECT j.id, j.kind, j.scene, j.companion_scenes, j.priority AS item_priority, \
           j.status, j.request_time, j.processed_time, j.completed_time, j.message, \
           j.extra_parameters, \
           s.id AS sub_id, s.name AS sub_name, s.priority AS sub_priority, \
           s.enabled AS sub_enabled, s.min_lat, s.max_lat, s.min_lon, s.max_lon, \
           u.id AS user_id, u.username, u.priority AS user_priority, u.access_level, \
           u.max_jobs, u.jobs_processed, \
           k.enabled AS kind_enabled \
    FROM jobs j \
         LEFT JOIN subscriptions s ON j.sub_id = s.id \
         JOIN users u ON j.user_id = u.id \
         JOIN job_types k ON j.kind = k.key";

/// Job store backed by the shared PostgreSQL table
#[derive(Clone)]
pub struct PgJobStore {
    pool: PgPool,
}

impl PgJobStore {
    /// Connect with a bounded number of attempts and linear backoff.
    ///
    /// Running out of attempts surfaces [`StoreError::Unavailable`]; the
    /// process treats that as fatal.
    pub async fn connect(url: &str, attempts: u32) -> Result<Self, StoreError> {
        let attempts = attempts.max(1);
        let mut tried = 0;
        loop {
            tried += 1;
            match PgPoolOptions::new().max_connections(2).connect(url).await {
                Ok(pool) => return Ok(Self { pool }),
                Err(source) if tried >= attempts => {
                    return Err(StoreError::Unavailable {
                        attempts: tried,
                        source,
                    })
                }
                Err(e) => {
                    let wait = Duration::from_secs(RETRY_BACKOFF_SECS * u64::from(tried));
                    warn!(
                        error = %e,
                        attempt = tried,
                        retry_in_secs = wait.as_secs(),
                        "store connection failed, retrying"
                    );
                    tokio::time::sleep(wait).await;
                }
            }
        }
    }

    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    fn candidate_query<'a>(filter: &'a CandidateFilter) -> QueryBuilder<'a, Postgres> {
        let mut query = QueryBuilder::new(SELECT_COLUMNS);
        query.push(" WHERE j.kind = ");
        query.push_bind(&filter.kind);
        query.push(" AND j.status = ");
        query.push_bind(filter.status.as_str());
        query.push(" AND k.enabled = TRUE");
        query.push(" AND (s.enabled = TRUE OR j.sub_id IS NULL)");
        query.push(" AND u.access_level >= ");
        query.push_bind(MIN_ACCESS_LEVEL);
        query.push(
            " AND (u.max_jobs IS NULL OR u.max_jobs <= 0 OR u.jobs_processed < u.max_jobs)",
        );

        match filter.band {
            PriorityBand::Standard => {
                query.push(" AND (j.sub_id IS NULL OR s.priority > 0)");
            }
            PriorityBand::Spot => {
                query.push(" AND j.priority > 0");
                query.push(" AND (j.sub_id IS NULL OR (s.priority > 0 AND s.priority <= ");
                query.push_bind(NORMAL_SUB_PRIORITY);
                query.push("))");
            }
            PriorityBand::OnPrem => {}
        }

        if let Some(prefix) = &filter.scene_prefix {
            query.push(" AND j.scene LIKE ");
            query.push_bind(format!("{prefix}%"));
        }
        if let Some(user_id) = filter.test_user {
            query.push(" AND u.id = ");
            query.push_bind(user_id);
        }

        query.push(" ORDER BY COALESCE(s.priority, ");
        query.push_bind(DEFAULT_SUB_PRIORITY);
        query.push(") DESC, u.priority DESC, j.priority DESC, j.request_time ASC, j.id ASC");
        query.push(" LIMIT ");
        query.push_bind(filter.batch_size);
        query
    }
}

#[async_trait]
impl JobStore for PgJobStore {
    async fn fetch_candidates(&self, filter: &CandidateFilter) -> Result<Vec<JobRow>, StoreError> {
        let mut query = Self::candidate_query(filter);
        let rows = query.build().fetch_all(&self.pool).await?;
        debug!(kind = %filter.kind, count = rows.len(), "fetched candidates");
        rows.iter().map(row_to_job).collect()
    }

    async fn fetch_by_id(&self, id: JobId) -> Result<Option<JobRow>, StoreError> {
        let mut query = QueryBuilder::new(SELECT_COLUMNS);
        query.push(" WHERE j.id = ");
        query.push_bind(id.0);
        let row = query.build().fetch_optional(&self.pool).await?;
        row.as_ref().map(row_to_job).transpose()
    }

    async fn try_claim(&self, id: JobId, expected: JobStatus) -> Result<bool, StoreError> {
        let result = sqlx::query(
            "UPDATE jobs SET status = 'PROCESSING', processed_time = current_timestamp \
             WHERE id = $1 AND status = $2",
        )
        .bind(id.0)
        .bind(expected.as_str())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn reset_status(&self, id: JobId, to: JobStatus) -> Result<(), StoreError> {
        sqlx::query("UPDATE jobs SET status = $2 WHERE id = $1")
            .bind(id.0)
            .bind(to.as_str())
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn record_disposition(
        &self,
        id: JobId,
        disposition: &Disposition,
    ) -> Result<bool, StoreError> {
        let result = match disposition {
            Disposition::Complete => {
                sqlx::query(
                    "UPDATE jobs SET status = $2, completed_time = current_timestamp \
                     WHERE id = $1 AND status = 'PROCESSING'",
                )
                .bind(id.0)
                .bind(disposition.status().as_str())
                .execute(&self.pool)
                .await?
            }
            Disposition::Failed { message } => {
                sqlx::query(
                    "UPDATE jobs SET status = $2, message = $3, \
                     completed_time = current_timestamp \
                     WHERE id = $1 AND status = 'PROCESSING'",
                )
                .bind(id.0)
                .bind(disposition.status().as_str())
                .bind(message)
                .execute(&self.pool)
                .await?
            }
            Disposition::Retry { message } => {
                sqlx::query(
                    "UPDATE jobs SET status = $2, message = $3 \
                     WHERE id = $1 AND status = 'PROCESSING'",
                )
                .bind(id.0)
                .bind(disposition.status().as_str())
                .bind(message)
                .execute(&self.pool)
                .await?
            }
        };
        Ok(result.rows_affected() == 1)
    }

    async fn sample_queued_kinds(&self, limit: i64) -> Result<Vec<String>, StoreError> {
        let rows = sqlx::query(
            "SELECT j.kind \
             FROM jobs j \
                  LEFT JOIN subscriptions s ON j.sub_id = s.id \
                  JOIN users u ON j.user_id = u.id \
                  JOIN job_types k ON j.kind = k.key \
             WHERE j.status = 'QUEUED' \
               AND k.enabled = TRUE \
               AND (s.enabled = TRUE OR j.sub_id IS NULL) \
               AND u.access_level >= $1 \
               AND (u.max_jobs IS NULL OR u.max_jobs <= 0 OR u.jobs_processed < u.max_jobs) \
             ORDER BY COALESCE(s.priority, $2) DESC, u.priority DESC, j.priority DESC, \
                      j.request_time ASC, j.id ASC \
             LIMIT $3",
        )
        .bind(MIN_ACCESS_LEVEL)
        .bind(DEFAULT_SUB_PRIORITY)
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| row.try_get::<String, _>("kind").map_err(StoreError::from))
            .collect()
    }

    async fn audit_start(&self, record: &AuditRecord) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO instance_log (worker, job_id, start_time) \
             VALUES ($1, $2, current_timestamp)",
        )
        .bind(&record.worker)
        .bind(record.job.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn audit_end(&self, record: &AuditRecord) -> Result<(), StoreError> {
        sqlx::query(
            "UPDATE instance_log SET end_time = current_timestamp \
             WHERE worker = $1 AND job_id = $2",
        )
        .bind(&record.worker)
        .bind(record.job.0)
        .execute(&self.pool)
        .await?;
        Ok(())
    }
}

fn row_to_job(row: &PgRow) -> Result<JobRow, StoreError> {
    let id: i64 = row.try_get("id")?;
    let status_text: String = row.try_get("status")?;
    let status: JobStatus = status_text
        .parse()
        .map_err(|e: harrow_core::ParseStatusError| StoreError::MalformedRow {
            id,
            reason: e.to_string(),
        })?;

    let companions: Option<String> = row.try_get("companion_scenes")?;
    let companion_scenes = companions
        .map(|text| {
            text.split(',')
                .map(str::trim)
                .filter(|scene| !scene.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    let sub_id: Option<i64> = row.try_get("sub_id")?;
    let subscription = match sub_id {
        Some(sub_id) => Some(SubscriptionInfo {
            id: sub_id,
            name: row
                .try_get::<Option<String>, _>("sub_name")?
                .unwrap_or_default(),
            priority: row.try_get("sub_priority")?,
            enabled: row
                .try_get::<Option<bool>, _>("sub_enabled")?
                .unwrap_or(false),
            region: region_from_row(row)?,
        }),
        None => None,
    };

    Ok(JobRow {
        id: JobId(id),
        kind: row.try_get("kind")?,
        scene: row.try_get("scene")?,
        companion_scenes,
        item_priority: row.try_get("item_priority")?,
        status,
        request_time: row.try_get("request_time")?,
        processed_time: row.try_get("processed_time")?,
        completed_time: row.try_get("completed_time")?,
        message: row.try_get("message")?,
        subscription,
        user: UserInfo {
            id: row.try_get("user_id")?,
            username: row.try_get("username")?,
            priority: row.try_get("user_priority")?,
            access_level: row.try_get("access_level")?,
            max_jobs: row.try_get("max_jobs")?,
            jobs_processed: row.try_get("jobs_processed")?,
        },
        kind_enabled: row.try_get("kind_enabled")?,
        extra: row.try_get("extra_parameters")?,
    })
}

fn region_from_row(row: &PgRow) -> Result<Option<Region>, StoreError> {
    let min_lat: Option<f64> = row.try_get("min_lat")?;
    let max_lat: Option<f64> = row.try_get("max_lat")?;
    let min_lon: Option<f64> = row.try_get("min_lon")?;
    let max_lon: Option<f64> = row.try_get("max_lon")?;

    Ok(match (min_lat, max_lat, min_lon, max_lon) {
        (Some(min_lat), Some(max_lat), Some(min_lon), Some(max_lon)) => Some(Region {
            min_lat,
            max_lat,
            min_lon,
            max_lon,
        }),
        _ => None,
    })
}

#[cfg(test)]
#[path = "postgres_tests.rs"]
mod tests;
