//! Persistence ports and their in-memory implementations.
//!
//! The Postgres-backed implementations live with the binary, over
//! `snowdb-db`. The in-memory stores back dry runs and tests.

use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use dashmap::DashMap;
use snowdb_core::{CanonicalRecord, ResortId};
use thiserror::Error;

use crate::failure::FailureRecord;

#[derive(Debug, Error)]
pub enum StoreError {
    /// The backing store could not be reached at all.
    #[error("store unreachable: {0}")]
    Unreachable(String),

    /// The store was reachable but refused this write or read.
    #[error("store rejected resort {resort_id}: {reason}")]
    Rejected { resort_id: ResortId, reason: String },
}

impl StoreError {
    #[must_use]
    pub fn is_unreachable(&self) -> bool {
        matches!(self, StoreError::Unreachable(_))
    }
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Replaces the latest-known record for the record's resort.
    async fn upsert_latest(&self, record: &CanonicalRecord) -> Result<(), StoreError>;

    /// Appends the record to the resort's observation history.
    async fn append_history(&self, record: &CanonicalRecord) -> Result<(), StoreError>;

    async fn get_latest(&self, resort_id: ResortId)
        -> Result<Option<CanonicalRecord>, StoreError>;
}

#[async_trait]
pub trait FailureStore: Send + Sync {
    async fn load_all(&self) -> Result<Vec<(ResortId, FailureRecord)>, StoreError>;

    async fn save(&self, resort_id: ResortId, record: &FailureRecord) -> Result<(), StoreError>;
}

#[derive(Debug, Default)]
pub struct MemoryRecordStore {
    latest: DashMap<ResortId, CanonicalRecord>,
    history: Mutex<Vec<CanonicalRecord>>,
}

impl MemoryRecordStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest records ordered by resort id.
    #[must_use]
    pub fn latest(&self) -> Vec<CanonicalRecord> {
        let mut records: Vec<CanonicalRecord> =
            self.latest.iter().map(|entry| entry.value().clone()).collect();
        records.sort_by_key(|r| r.resort_id);
        records
    }

    #[must_use]
    pub fn history(&self) -> Vec<CanonicalRecord> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait]
impl RecordStore for MemoryRecordStore {
    async fn upsert_latest(&self, record: &CanonicalRecord) -> Result<(), StoreError> {
        self.latest.insert(record.resort_id, record.clone());
        Ok(())
    }

    async fn append_history(&self, record: &CanonicalRecord) -> Result<(), StoreError> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(record.clone());
        Ok(())
    }

    async fn get_latest(
        &self,
        resort_id: ResortId,
    ) -> Result<Option<CanonicalRecord>, StoreError> {
        Ok(self.latest.get(&resort_id).map(|entry| entry.value().clone()))
    }
}

#[derive(Debug, Default)]
pub struct MemoryFailureStore {
    records: DashMap<ResortId, FailureRecord>,
}

impl MemoryFailureStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn get(&self, resort_id: ResortId) -> Option<FailureRecord> {
        self.records.get(&resort_id).map(|entry| entry.value().clone())
    }
}

#[async_trait]
impl FailureStore for MemoryFailureStore {
    async fn load_all(&self) -> Result<Vec<(ResortId, FailureRecord)>, StoreError> {
        Ok(self
            .records
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect())
    }

    async fn save(&self, resort_id: ResortId, record: &FailureRecord) -> Result<(), StoreError> {
        self.records.insert(resort_id, record.clone());
        Ok(())
    }
}
