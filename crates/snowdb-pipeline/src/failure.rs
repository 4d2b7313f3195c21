//! Per-resort failure tracking.
//!
//! Each resort moves between three health states driven by its count of
//! consecutive failed collection attempts:
//!
//! - `healthy`: zero failures.
//! - `degraded`: at least one failure, fewer than the threshold.
//! - `suspended`: at or above the threshold.
//!
//! A single success resets the count. Entering `suspended` is reported once
//! through [`FailureTracker::should_alert`]; further failures stay silent.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use snowdb_core::ResortId;

use crate::store::{FailureStore, StoreError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthState {
    Healthy,
    Degraded,
    Suspended,
}

impl HealthState {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            HealthState::Healthy => "healthy",
            HealthState::Degraded => "degraded",
            HealthState::Suspended => "suspended",
        }
    }
}

impl std::fmt::Display for HealthState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How the collection manager should treat a resort this cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Escalation {
    /// Healthy or degraded: in-batch retries allowed.
    Retry,
    /// Suspended: a single attempt per cycle, no retries.
    Suppress,
    /// Just entered suspended; alert and make a single attempt.
    Alert,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub consecutive_failures: u32,
    pub last_success_at: Option<DateTime<Utc>>,
    pub last_failure_at: Option<DateTime<Utc>>,
    pub last_failure_reason: Option<String>,
    /// Set by the outcome that moved the resort into `suspended`, cleared by
    /// the next outcome.
    pub just_suspended: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub previous: HealthState,
    pub current: HealthState,
}

impl Transition {
    #[must_use]
    pub fn entered_suspension(&self) -> bool {
        self.previous != HealthState::Suspended && self.current == HealthState::Suspended
    }

    #[must_use]
    pub fn recovered(&self) -> bool {
        self.previous != HealthState::Healthy && self.current == HealthState::Healthy
    }
}

#[derive(Debug)]
pub struct FailureTracker {
    threshold: u32,
    records: DashMap<ResortId, FailureRecord>,
}

impl FailureTracker {
    /// A `threshold` of zero is treated as one.
    #[must_use]
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            records: DashMap::new(),
        }
    }

    #[must_use]
    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    fn classify(&self, consecutive_failures: u32) -> HealthState {
        if consecutive_failures == 0 {
            HealthState::Healthy
        } else if consecutive_failures < self.threshold {
            HealthState::Degraded
        } else {
            HealthState::Suspended
        }
    }

    /// Records one collection outcome and returns the resulting transition.
    /// The read-modify-write is atomic per resort.
    pub fn record_outcome(
        &self,
        resort_id: ResortId,
        success: bool,
        reason: Option<&str>,
    ) -> Transition {
        let now = Utc::now();
        let mut entry = self.records.entry(resort_id).or_default();
        let previous = self.classify(entry.consecutive_failures);

        if success {
            entry.consecutive_failures = 0;
            entry.last_success_at = Some(now);
        } else {
            entry.consecutive_failures = entry.consecutive_failures.saturating_add(1);
            entry.last_failure_at = Some(now);
            entry.last_failure_reason = reason.map(str::to_owned);
        }

        let current = self.classify(entry.consecutive_failures);
        let transition = Transition { previous, current };
        entry.just_suspended = transition.entered_suspension();
        transition
    }

    /// True exactly when the most recent outcome moved the resort into
    /// `suspended`.
    #[must_use]
    pub fn should_alert(&self, resort_id: ResortId) -> bool {
        self.records
            .get(&resort_id)
            .is_some_and(|record| record.just_suspended)
    }

    #[must_use]
    pub fn state(&self, resort_id: ResortId) -> HealthState {
        self.records
            .get(&resort_id)
            .map_or(HealthState::Healthy, |record| {
                self.classify(record.consecutive_failures)
            })
    }

    #[must_use]
    pub fn record(&self, resort_id: ResortId) -> Option<FailureRecord> {
        self.records.get(&resort_id).map(|r| r.value().clone())
    }

    #[must_use]
    pub fn escalation(&self, resort_id: ResortId) -> Escalation {
        if self.should_alert(resort_id) {
            return Escalation::Alert;
        }
        match self.state(resort_id) {
            HealthState::Healthy | HealthState::Degraded => Escalation::Retry,
            HealthState::Suspended => Escalation::Suppress,
        }
    }

    /// Replaces in-memory state with everything in `store`. Returns the number
    /// of resorts loaded.
    ///
    /// # Errors
    ///
    /// Returns the store's error; in-memory state is left untouched.
    pub async fn load(&self, store: &dyn FailureStore) -> Result<usize, StoreError> {
        let loaded = store.load_all().await?;
        self.records.clear();
        let count = loaded.len();
        for (resort_id, record) in loaded {
            self.records.insert(resort_id, record);
        }
        Ok(count)
    }

    /// Writes every tracked resort to `store`. All writes are attempted.
    ///
    /// # Errors
    ///
    /// Returns the first store error after attempting the remaining writes.
    pub async fn persist(&self, store: &dyn FailureStore) -> Result<usize, StoreError> {
        let snapshot: Vec<(ResortId, FailureRecord)> = self
            .records
            .iter()
            .map(|entry| (*entry.key(), entry.value().clone()))
            .collect();

        let mut saved = 0usize;
        let mut first_error = None;
        for (resort_id, record) in &snapshot {
            match store.save(*resort_id, record).await {
                Ok(()) => saved += 1,
                Err(e) => {
                    tracing::warn!(resort_id, error = %e, "failed to persist failure state");
                    first_error.get_or_insert(e);
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(saved),
        }
    }
}
