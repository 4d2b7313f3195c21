//! Database operations for `collection_runs` and `collection_run_resorts`.
//!
//! A run moves `running -> succeeded | failed`. Per-resort rows record what
//! happened to every resort the batch considered.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

const RUN_COLUMNS: &str = "id, public_id, trigger_source, status, started_at, completed_at, \
     resorts_succeeded, resorts_failed, resorts_skipped, records_persisted, deadline_hit, \
     error_message, created_at";

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `collection_runs` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRunRow {
    pub id: i64,
    pub public_id: Uuid,
    /// `cli`, `scheduler`, ...
    pub trigger_source: String,
    pub status: String,
    pub started_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
    pub resorts_succeeded: i32,
    pub resorts_failed: i32,
    /// Resorts not attempted or interrupted by the batch deadline.
    pub resorts_skipped: i32,
    pub records_persisted: i32,
    pub deadline_hit: bool,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Counters written when a run completes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunTotals {
    pub resorts_succeeded: i32,
    pub resorts_failed: i32,
    pub resorts_skipped: i32,
    pub records_persisted: i32,
    pub deadline_hit: bool,
}

/// A row from the `collection_run_resorts` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CollectionRunResortRow {
    pub id: i64,
    pub collection_run_id: i64,
    pub resort_id: i64,
    /// One of `succeeded`, `failed`, `not_attempted`, `interrupted`.
    pub status: String,
    /// Failure category such as `network_error` or `shape_mismatch`.
    pub failure_category: Option<String>,
    pub error_message: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// collection_runs operations
// ---------------------------------------------------------------------------

/// Opens a run in `running` status with `started_at` set to `started_at`.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails.
pub async fn create_collection_run(
    pool: &PgPool,
    trigger_source: &str,
    started_at: DateTime<Utc>,
) -> Result<CollectionRunRow, DbError> {
    let row = sqlx::query_as::<_, CollectionRunRow>(&format!(
        "INSERT INTO collection_runs (public_id, trigger_source, status, started_at) \
         VALUES ($1, $2, 'running', $3) \
         RETURNING {RUN_COLUMNS}"
    ))
    .bind(Uuid::new_v4())
    .bind(trigger_source)
    .bind(started_at)
    .fetch_one(pool)
    .await?;

    Ok(row)
}

/// Marks a running run as `succeeded` and writes its totals.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn complete_collection_run(
    pool: &PgPool,
    id: i64,
    totals: RunTotals,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'succeeded', completed_at = NOW(), \
             resorts_succeeded = $1, resorts_failed = $2, resorts_skipped = $3, \
             records_persisted = $4, deadline_hit = $5 \
         WHERE id = $6 AND status = 'running'",
    )
    .bind(totals.resorts_succeeded)
    .bind(totals.resorts_failed)
    .bind(totals.resorts_skipped)
    .bind(totals.records_persisted)
    .bind(totals.deadline_hit)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidCollectionRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// Marks a running run as `failed` with `error_message`.
///
/// # Errors
///
/// Returns [`DbError::InvalidCollectionRunTransition`] if the run is not
/// `running`, or [`DbError::Sqlx`] if the update fails.
pub async fn fail_collection_run(
    pool: &PgPool,
    id: i64,
    error_message: &str,
) -> Result<(), DbError> {
    let result = sqlx::query(
        "UPDATE collection_runs \
         SET status = 'failed', completed_at = NOW(), error_message = $1 \
         WHERE id = $2 AND status = 'running'",
    )
    .bind(error_message)
    .bind(id)
    .execute(pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::InvalidCollectionRunTransition {
            id,
            expected_status: "running",
        });
    }

    Ok(())
}

/// # Errors
///
/// Returns [`DbError::NotFound`] if no row exists with the given `id`, or
/// [`DbError::Sqlx`] if the query fails.
pub async fn get_collection_run(pool: &PgPool, id: i64) -> Result<CollectionRunRow, DbError> {
    sqlx::query_as::<_, CollectionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM collection_runs WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(DbError::NotFound)
}

/// The most recent `limit` runs, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_collection_runs(
    pool: &PgPool,
    limit: i64,
) -> Result<Vec<CollectionRunRow>, DbError> {
    let rows = sqlx::query_as::<_, CollectionRunRow>(&format!(
        "SELECT {RUN_COLUMNS} FROM collection_runs \
         ORDER BY started_at DESC, id DESC \
         LIMIT $1"
    ))
    .bind(limit)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

// ---------------------------------------------------------------------------
// collection_run_resorts operations
// ---------------------------------------------------------------------------

/// Inserts or updates the per-resort result row for a collection run.
///
/// Conflicts on `(collection_run_id, resort_id)` update `status`,
/// `failure_category`, and `error_message` in place.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_collection_run_resort(
    pool: &PgPool,
    run_id: i64,
    resort_id: i64,
    status: &str,
    failure_category: Option<&str>,
    error_message: Option<&str>,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO collection_run_resorts \
             (collection_run_id, resort_id, status, failure_category, error_message) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (collection_run_id, resort_id) DO UPDATE SET \
             status           = EXCLUDED.status, \
             failure_category = EXCLUDED.failure_category, \
             error_message    = EXCLUDED.error_message",
    )
    .bind(run_id)
    .bind(resort_id)
    .bind(status)
    .bind(failure_category)
    .bind(error_message)
    .execute(pool)
    .await?;

    Ok(())
}

/// Returns all resort-level result rows for a given collection run.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_collection_run_resorts(
    pool: &PgPool,
    run_id: i64,
) -> Result<Vec<CollectionRunResortRow>, DbError> {
    let rows = sqlx::query_as::<_, CollectionRunResortRow>(
        "SELECT id, collection_run_id, resort_id, status, failure_category, \
                error_message, created_at \
         FROM collection_run_resorts \
         WHERE collection_run_id = $1 \
         ORDER BY resort_id",
    )
    .bind(run_id)
    .fetch_all(pool)
    .await?;

    Ok(rows)
}
