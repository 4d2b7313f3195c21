//! Database operations for `resort_conditions` (observation history) and
//! `resort_conditions_latest` (one row per resort).
//!
//! The full canonical record is stored as JSONB. The columns that queries
//! filter or sort on are duplicated alongside it.

use chrono::{DateTime, Utc};
use snowdb_core::{CanonicalRecord, ResortStatus};
use sqlx::PgPool;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from either conditions table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ConditionsRow {
    pub resort_id: i64,
    pub observed_at: DateTime<Utc>,
    pub source: String,
    pub status: Option<String>,
    pub record: serde_json::Value,
}

impl ConditionsRow {
    /// # Errors
    ///
    /// Returns [`DbError::Record`] if the stored JSON no longer matches the
    /// record shape.
    pub fn into_record(self) -> Result<CanonicalRecord, DbError> {
        Ok(serde_json::from_value(self.record)?)
    }
}

// ---------------------------------------------------------------------------
// Writes
// ---------------------------------------------------------------------------

/// Appends `record` to the history table.
///
/// Re-inserting the same observation (same resort, source and `observed_at`)
/// is a no-op. Returns `true` if a row was inserted.
///
/// # Errors
///
/// Returns [`DbError::Record`] if the record cannot be serialized, or
/// [`DbError::Sqlx`] if the insert fails.
pub async fn insert_conditions(pool: &PgPool, record: &CanonicalRecord) -> Result<bool, DbError> {
    let json = serde_json::to_value(record)?;

    let inserted: Option<i64> = sqlx::query_scalar::<_, i64>(
        "INSERT INTO resort_conditions \
             (resort_id, observed_at, source, status, new_snow_cm, base_depth_cm, \
              lifts_open, lifts_total, trails_open, trails_total, temperature_c, record) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12) \
         ON CONFLICT (resort_id, source, observed_at) DO NOTHING \
         RETURNING id",
    )
    .bind(record.resort_id)
    .bind(record.observed_at)
    .bind(record.source.as_str())
    .bind(record.status.map(ResortStatus::as_str))
    .bind(record.new_snow_cm)
    .bind(record.base_depth_cm)
    .bind(record.lifts_open)
    .bind(record.lifts_total)
    .bind(record.trails_open)
    .bind(record.trails_total)
    .bind(record.temperature_c)
    .bind(json)
    .fetch_optional(pool)
    .await?;

    Ok(inserted.is_some())
}

/// Replaces the latest row for the record's resort. An older observation
/// never overwrites a newer one.
///
/// # Errors
///
/// Returns [`DbError::Record`] if the record cannot be serialized, or
/// [`DbError::Sqlx`] if the upsert fails.
pub async fn upsert_latest_conditions(
    pool: &PgPool,
    record: &CanonicalRecord,
) -> Result<(), DbError> {
    let json = serde_json::to_value(record)?;

    sqlx::query(
        "INSERT INTO resort_conditions_latest \
             (resort_id, observed_at, source, status, record) \
         VALUES ($1, $2, $3, $4, $5) \
         ON CONFLICT (resort_id) DO UPDATE SET \
             observed_at = EXCLUDED.observed_at, \
             source      = EXCLUDED.source, \
             status      = EXCLUDED.status, \
             record      = EXCLUDED.record, \
             updated_at  = NOW() \
         WHERE resort_conditions_latest.observed_at <= EXCLUDED.observed_at",
    )
    .bind(record.resort_id)
    .bind(record.observed_at)
    .bind(record.source.as_str())
    .bind(record.status.map(ResortStatus::as_str))
    .bind(json)
    .execute(pool)
    .await?;

    Ok(())
}

// ---------------------------------------------------------------------------
// Reads
// ---------------------------------------------------------------------------

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails or [`DbError::Record`] if the
/// stored JSON cannot be decoded.
pub async fn get_latest_conditions(
    pool: &PgPool,
    resort_id: i64,
) -> Result<Option<CanonicalRecord>, DbError> {
    let row = sqlx::query_as::<_, ConditionsRow>(
        "SELECT resort_id, observed_at, source, status, record \
         FROM resort_conditions_latest \
         WHERE resort_id = $1",
    )
    .bind(resort_id)
    .fetch_optional(pool)
    .await?;

    row.map(ConditionsRow::into_record).transpose()
}

/// Latest record for every collected resort, ordered by resort id.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails or [`DbError::Record`] if a
/// stored record cannot be decoded.
pub async fn list_latest_conditions(pool: &PgPool) -> Result<Vec<CanonicalRecord>, DbError> {
    let rows = sqlx::query_as::<_, ConditionsRow>(
        "SELECT resort_id, observed_at, source, status, record \
         FROM resort_conditions_latest \
         ORDER BY resort_id",
    )
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ConditionsRow::into_record).collect()
}

/// The `limit` most recent observations for one resort, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails or [`DbError::Record`] if a
/// stored record cannot be decoded.
pub async fn list_conditions_history(
    pool: &PgPool,
    resort_id: i64,
    limit: i64,
) -> Result<Vec<CanonicalRecord>, DbError> {
    let rows = sqlx::query_as::<_, ConditionsRow>(
        "SELECT resort_id, observed_at, source, status, record \
         FROM resort_conditions \
         WHERE resort_id = $1 \
         ORDER BY observed_at DESC, id DESC \
         LIMIT $2",
    )
    .bind(resort_id)
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.into_iter().map(ConditionsRow::into_record).collect()
}
