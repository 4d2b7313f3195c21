//! Postgres implementations of the pipeline's persistence ports.

use async_trait::async_trait;
use snowdb_core::{CanonicalRecord, ResortId};
use snowdb_db::{DbError, ResortFailureRow};
use snowdb_pipeline::{FailureRecord, FailureStore, RecordStore, StoreError};
use sqlx::PgPool;

fn store_error(resort_id: ResortId, error: &DbError) -> StoreError {
    if error.is_connection_error() {
        StoreError::Unreachable(error.to_string())
    } else {
        StoreError::Rejected {
            resort_id,
            reason: error.to_string(),
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PgRecordStore {
    pool: PgPool,
}

impl PgRecordStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RecordStore for PgRecordStore {
    async fn upsert_latest(&self, record: &CanonicalRecord) -> Result<(), StoreError> {
        snowdb_db::upsert_latest_conditions(&self.pool, record)
            .await
            .map_err(|e| store_error(record.resort_id, &e))
    }

    async fn append_history(&self, record: &CanonicalRecord) -> Result<(), StoreError> {
        let inserted = snowdb_db::insert_conditions(&self.pool, record)
            .await
            .map_err(|e| store_error(record.resort_id, &e))?;
        if !inserted {
            tracing::debug!(
                resort_id = record.resort_id,
                observed_at = %record.observed_at,
                "observation already stored"
            );
        }
        Ok(())
    }

    async fn get_latest(
        &self,
        resort_id: ResortId,
    ) -> Result<Option<CanonicalRecord>, StoreError> {
        snowdb_db::get_latest_conditions(&self.pool, resort_id)
            .await
            .map_err(|e| store_error(resort_id, &e))
    }
}

#[derive(Debug, Clone)]
pub(crate) struct PgFailureStore {
    pool: PgPool,
}

impl PgFailureStore {
    pub(crate) fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

pub(crate) fn failure_record_from_row(row: ResortFailureRow) -> FailureRecord {
    FailureRecord {
        consecutive_failures: u32::try_from(row.consecutive_failures).unwrap_or(0),
        last_success_at: row.last_success_at,
        last_failure_at: row.last_failure_at,
        last_failure_reason: row.last_failure_reason,
        just_suspended: row.just_suspended,
    }
}

#[async_trait]
impl FailureStore for PgFailureStore {
    async fn load_all(&self) -> Result<Vec<(ResortId, FailureRecord)>, StoreError> {
        // A failed read leaves the whole tracker unloaded, so it is reported
        // as unreachable rather than against one resort.
        let rows = snowdb_db::list_resort_failures(&self.pool)
            .await
            .map_err(|e| StoreError::Unreachable(e.to_string()))?;

        Ok(rows
            .into_iter()
            .map(|row| (row.resort_id, failure_record_from_row(row)))
            .collect())
    }

    async fn save(&self, resort_id: ResortId, record: &FailureRecord) -> Result<(), StoreError> {
        snowdb_db::upsert_resort_failure(
            &self.pool,
            resort_id,
            i32::try_from(record.consecutive_failures).unwrap_or(i32::MAX),
            record.last_success_at,
            record.last_failure_at,
            record.last_failure_reason.as_deref(),
            record.just_suspended,
        )
        .await
        .map_err(|e| store_error(resort_id, &e))
    }
}
