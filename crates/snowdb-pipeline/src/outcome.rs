//! The structured result of one collection batch.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use snowdb_core::ResortId;
use snowdb_sources::{FailureKind, NormalizationError};

/// Why a single resort produced no record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureCategory {
    NetworkError,
    RateLimited,
    ParseError,
    NotFound,
    UpstreamError,
    MissingRequiredField,
    ShapeMismatch,
}

impl FailureCategory {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FailureCategory::NetworkError => "network_error",
            FailureCategory::RateLimited => "rate_limited",
            FailureCategory::ParseError => "parse_error",
            FailureCategory::NotFound => "not_found",
            FailureCategory::UpstreamError => "upstream_error",
            FailureCategory::MissingRequiredField => "missing_required_field",
            FailureCategory::ShapeMismatch => "shape_mismatch",
        }
    }
}

impl std::fmt::Display for FailureCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<FailureKind> for FailureCategory {
    fn from(kind: FailureKind) -> Self {
        match kind {
            FailureKind::NetworkError => FailureCategory::NetworkError,
            FailureKind::RateLimited => FailureCategory::RateLimited,
            FailureKind::ParseError => FailureCategory::ParseError,
            FailureKind::NotFound => FailureCategory::NotFound,
            FailureKind::UpstreamError => FailureCategory::UpstreamError,
        }
    }
}

impl From<&NormalizationError> for FailureCategory {
    fn from(err: &NormalizationError) -> Self {
        match err {
            NormalizationError::MissingRequiredField { .. } => {
                FailureCategory::MissingRequiredField
            }
            NormalizationError::ShapeMismatch { .. } => FailureCategory::ShapeMismatch,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResortFailure {
    pub resort_id: ResortId,
    pub slug: String,
    pub category: FailureCategory,
    pub message: String,
}

/// A batch whose records were collected but not (fully) stored. The resorts
/// themselves are not counted as failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PersistenceFailure {
    /// No write succeeded and the store could not be reached. Writing
    /// stops at the first unreachable error; `unwritten` lists every
    /// collected resort whose record was not stored.
    Unreachable {
        message: String,
        unwritten: Vec<ResortId>,
    },
    /// Some writes failed; each entry is a resort id and its error.
    PartialWrite { failed: Vec<(ResortId, String)> },
}

#[derive(Debug, Clone, Serialize)]
pub struct BatchOutcome {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    /// Units dispatched: succeeded, failed, or interrupted.
    pub attempted: usize,
    pub succeeded: usize,
    /// Resorts whose record was collected, in id order.
    pub collected: Vec<ResortId>,
    pub failures: Vec<ResortFailure>,
    /// Never dispatched because the soft cutoff had passed.
    pub not_attempted: Vec<ResortId>,
    /// Cancelled in flight at the hard cutoff.
    pub interrupted: Vec<ResortId>,
    pub deadline_hit: bool,
    pub records_persisted: usize,
    pub persistence_failure: Option<PersistenceFailure>,
    /// Resorts that entered suspension during this batch.
    pub alerts: Vec<ResortId>,
}

impl BatchOutcome {
    #[must_use]
    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// True when every dispatched unit failed. An empty batch is not a
    /// failure.
    #[must_use]
    pub fn all_failed(&self) -> bool {
        self.attempted > 0 && self.succeeded == 0 && self.failed() == self.attempted
    }

    #[must_use]
    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

#[async_trait]
pub trait OutcomeReporter: Send + Sync {
    async fn report(&self, outcome: &BatchOutcome);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogReporter;

#[async_trait]
impl OutcomeReporter for LogReporter {
    async fn report(&self, outcome: &BatchOutcome) {
        for failure in &outcome.failures {
            tracing::warn!(
                resort = %failure.slug,
                category = %failure.category,
                error = %failure.message,
                "resort collection failed"
            );
        }
        if let Some(persistence) = &outcome.persistence_failure {
            tracing::error!(?persistence, "collected records were not fully persisted");
        }
        tracing::info!(
            attempted = outcome.attempted,
            succeeded = outcome.succeeded,
            failed = outcome.failed(),
            not_attempted = outcome.not_attempted.len(),
            interrupted = outcome.interrupted.len(),
            deadline_hit = outcome.deadline_hit,
            records_persisted = outcome.records_persisted,
            duration_ms = outcome.duration_ms(),
            "collection batch complete"
        );
    }
}
