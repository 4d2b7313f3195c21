//! Database operations for `resort_failures`, the persisted failure-tracker
//! state.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use crate::DbError;

/// A row from the `resort_failures` table.
#[derive(Debug, Clone, PartialEq, Eq, sqlx::FromRow)]
pub struct ResortFailureRow {
    pub resort_id: i64,
    /// The schema defines this as `INTEGER NOT NULL DEFAULT 0`.
    pub consecutive_failures: i32,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_failure_reason: Option<String>,
    pub just_suspended: bool,
    pub updated_at: DateTime<Utc>,
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_resort_failures(pool: &PgPool) -> Result<Vec<ResortFailureRow>, DbError> {
    let rows = sqlx::query_as::<_, ResortFailureRow>(
        "SELECT resort_id, consecutive_failures, last_success_at, last_failure_at, \
                last_failure_reason, just_suspended, updated_at \
         FROM resort_failures \
         ORDER BY resort_id",
    )
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// Inserts or replaces the failure state for one resort.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_resort_failure(
    pool: &PgPool,
    resort_id: i64,
    consecutive_failures: i32,
    last_success_at: Option<DateTime<Utc>>,
    last_failure_at: Option<DateTime<Utc>>,
    last_failure_reason: Option<&str>,
    just_suspended: bool,
) -> Result<(), DbError> {
    sqlx::query(
        "INSERT INTO resort_failures \
             (resort_id, consecutive_failures, last_success_at, last_failure_at, \
              last_failure_reason, just_suspended) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         ON CONFLICT (resort_id) DO UPDATE SET \
             consecutive_failures = EXCLUDED.consecutive_failures, \
             last_success_at      = EXCLUDED.last_success_at, \
             last_failure_at      = EXCLUDED.last_failure_at, \
             last_failure_reason  = EXCLUDED.last_failure_reason, \
             just_suspended       = EXCLUDED.just_suspended, \
             updated_at           = NOW()",
    )
    .bind(resort_id)
    .bind(consecutive_failures)
    .bind(last_success_at)
    .bind(last_failure_at)
    .bind(last_failure_reason)
    .bind(just_suspended)
    .execute(pool)
    .await?;

    Ok(())
}
