//! Batch orchestration.
//!
//! One batch dispatches a fetch-and-normalize unit per resort, at most
//! `concurrency_limit` at a time. Every unit is isolated: an adapter or
//! normalization failure becomes an entry in the outcome and never aborts the
//! batch. Two cutoffs bound the wall clock:
//!
//! - soft (`batch_deadline - safety_margin`): no new unit is dispatched;
//!   remaining resorts are reported as `not_attempted`.
//! - hard (`batch_deadline`): units still in flight are cancelled and
//!   reported as `interrupted`. They produce no record and leave the failure
//!   tracker untouched.
//!
//! Collected records are then written to the record store best-effort, by
//! `max(batch_deadline, now + safety_margin)` at the latest. Writing stops at
//! the first unreachable-store error.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use futures::stream::{self, StreamExt};
use snowdb_core::{AppConfig, CanonicalRecord, ResortConfig, ResortId, SourceKind};
use snowdb_sources::{
    normalize_collection, retry_with_backoff, AdapterError, AdapterRegistry, RawCollection,
    RawCollectionResult, SourceAdapter,
};
use tokio::time::Instant;

use crate::error::PipelineError;
use crate::failure::{Escalation, FailureTracker};
use crate::merge::ConfigMergeLayer;
use crate::notify::{AlertEvent, LogNotifier, Notifier};
use crate::outcome::{
    BatchOutcome, FailureCategory, LogReporter, OutcomeReporter, PersistenceFailure,
    ResortFailure,
};
use crate::store::{FailureStore, StoreError};

#[derive(Debug, Clone)]
pub struct BatchOptions {
    pub concurrency_limit: usize,
    pub batch_deadline: Duration,
    pub safety_margin: Duration,
    /// Bound on a single adapter call, retries excluded.
    pub call_timeout: Duration,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    pub include_weather: bool,
    pub include_contact: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: 10,
            batch_deadline: Duration::from_secs(840),
            safety_margin: Duration::from_secs(60),
            call_timeout: Duration::from_secs(15),
            max_retries: 2,
            retry_backoff_base_ms: 1000,
            include_weather: true,
            include_contact: false,
        }
    }
}

impl BatchOptions {
    /// Contact enrichment stays off; callers opt in per run.
    #[must_use]
    pub fn from_app_config(config: &AppConfig) -> Self {
        Self {
            concurrency_limit: config.collect_concurrency.max(1),
            batch_deadline: Duration::from_secs(config.batch_deadline_secs),
            safety_margin: Duration::from_secs(config.deadline_margin_secs),
            call_timeout: Duration::from_secs(config.request_timeout_secs),
            max_retries: config.max_retries,
            retry_backoff_base_ms: config.retry_backoff_base_ms,
            include_weather: config.include_weather,
            include_contact: false,
        }
    }
}

/// What a single invocation should collect.
#[derive(Debug, Clone, Default)]
pub struct BatchRequest {
    /// Collect only the first N enabled resorts.
    pub limit: Option<usize>,
    /// Collect exactly this resort, even when it is disabled.
    pub resort_id: Option<ResortId>,
    /// Like `resort_id`, addressed by slug.
    pub resort_slug: Option<String>,
}

fn log_unpersisted(record: &CanonicalRecord, error: &StoreError) {
    let replay = serde_json::to_string(record).unwrap_or_default();
    tracing::error!(
        resort = %record.slug,
        error = %error,
        record = %replay,
        "collected record not persisted"
    );
}

enum UnitResult {
    Collected(Box<CanonicalRecord>),
    Failed(ResortFailure),
    NotAttempted(ResortId),
    Interrupted(ResortId),
}

pub struct CollectionManager {
    registry: AdapterRegistry,
    merge: ConfigMergeLayer,
    tracker: Arc<FailureTracker>,
    failures: Arc<dyn FailureStore>,
    notifier: Arc<dyn Notifier>,
    reporter: Arc<dyn OutcomeReporter>,
    options: BatchOptions,
    /// Cleared when loading stored failure state fails, so an empty tracker
    /// never overwrites counters it could not read.
    failure_state_writable: AtomicBool,
}

impl CollectionManager {
    /// Records are written to the merge layer's store. Alerts and outcomes go
    /// to the log until other sinks are attached.
    #[must_use]
    pub fn new(
        registry: AdapterRegistry,
        merge: ConfigMergeLayer,
        failures: Arc<dyn FailureStore>,
        tracker: Arc<FailureTracker>,
    ) -> Self {
        Self {
            registry,
            merge,
            tracker,
            failures,
            notifier: Arc::new(LogNotifier),
            reporter: Arc::new(LogReporter),
            options: BatchOptions::default(),
            failure_state_writable: AtomicBool::new(true),
        }
    }

    #[must_use]
    pub fn with_options(mut self, options: BatchOptions) -> Self {
        self.options = options;
        self
    }

    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    #[must_use]
    pub fn with_reporter(mut self, reporter: Arc<dyn OutcomeReporter>) -> Self {
        self.reporter = reporter;
        self
    }

    #[must_use]
    pub fn options(&self) -> &BatchOptions {
        &self.options
    }

    #[must_use]
    pub fn tracker(&self) -> &FailureTracker {
        &self.tracker
    }

    #[must_use]
    pub fn merge(&self) -> &ConfigMergeLayer {
        &self.merge
    }

    /// Loads failure state persisted by earlier cycles.
    ///
    /// On error the manager keeps collecting but stops writing failure state
    /// back until a later load succeeds.
    ///
    /// # Errors
    ///
    /// Returns the failure store's error.
    pub async fn load_failure_state(&self) -> Result<usize, StoreError> {
        let result = self.tracker.load(self.failures.as_ref()).await;
        self.failure_state_writable
            .store(result.is_ok(), Ordering::SeqCst);
        result
    }

    /// Resolves `request` against the catalog, runs the batch with the
    /// manager's options, and hands the outcome to the reporter.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::UnknownResort`] or
    /// [`PipelineError::UnknownSlug`] when an explicit target is not in the
    /// catalog. Collection failures are reported in the outcome instead.
    pub async fn run(&self, request: &BatchRequest) -> Result<BatchOutcome, PipelineError> {
        let explicit = match (&request.resort_id, &request.resort_slug) {
            (Some(id), _) => Some(
                self.merge
                    .get(*id)
                    .ok_or(PipelineError::UnknownResort(*id))?,
            ),
            (None, Some(slug)) => Some(
                self.merge
                    .get_by_slug(slug)
                    .ok_or_else(|| PipelineError::UnknownSlug(slug.clone()))?,
            ),
            (None, None) => None,
        };

        let resorts: Vec<ResortConfig> = if let Some(config) = explicit {
            if !config.enabled {
                tracing::info!(resort = %config.slug, "collecting disabled resort on explicit request");
            }
            vec![config.clone()]
        } else {
            let mut enabled = self.merge.list_enabled();
            if let Some(limit) = request.limit {
                enabled.truncate(limit);
            }
            enabled
        };

        let outcome = self.run_units(resorts.iter().collect(), &self.options).await;
        self.reporter.report(&outcome).await;
        Ok(outcome)
    }

    /// Collects every enabled resort in `resorts`; disabled entries are
    /// skipped.
    pub async fn run_batch(&self, resorts: &[ResortConfig], options: &BatchOptions) -> BatchOutcome {
        let enabled: Vec<&ResortConfig> = resorts
            .iter()
            .filter(|r| {
                if r.enabled {
                    true
                } else {
                    tracing::debug!(resort = %r.slug, "skipping disabled resort");
                    false
                }
            })
            .collect();
        self.run_units(enabled, options).await
    }

    async fn run_units(&self, resorts: Vec<&ResortConfig>, options: &BatchOptions) -> BatchOutcome {
        let started_at = Utc::now();
        let start = Instant::now();
        let hard_deadline = start + options.batch_deadline;
        let soft_deadline = start + options.batch_deadline.saturating_sub(options.safety_margin);
        let concurrency = options.concurrency_limit.max(1);

        tracing::info!(
            resorts = resorts.len(),
            concurrency,
            deadline_secs = options.batch_deadline.as_secs(),
            "starting collection batch"
        );

        let results: Vec<UnitResult> = stream::iter(resorts)
            .map(|config| async move {
                if Instant::now() >= soft_deadline {
                    return UnitResult::NotAttempted(config.id);
                }
                match tokio::time::timeout_at(hard_deadline, self.collect_one(config, options))
                    .await
                {
                    Ok(result) => result,
                    Err(_) => {
                        tracing::warn!(resort = %config.slug, "collection interrupted at batch deadline");
                        UnitResult::Interrupted(config.id)
                    }
                }
            })
            .buffer_unordered(concurrency)
            .collect()
            .await;

        let mut records = Vec::new();
        let mut failures = Vec::new();
        let mut not_attempted = Vec::new();
        let mut interrupted = Vec::new();
        for result in results {
            match result {
                UnitResult::Collected(record) => records.push(*record),
                UnitResult::Failed(failure) => failures.push(failure),
                UnitResult::NotAttempted(id) => not_attempted.push(id),
                UnitResult::Interrupted(id) => interrupted.push(id),
            }
        }
        records.sort_by_key(|r| r.resort_id);
        failures.sort_by_key(|f| f.resort_id);
        not_attempted.sort_unstable();
        interrupted.sort_unstable();

        if !not_attempted.is_empty() {
            tracing::warn!(
                not_attempted = not_attempted.len(),
                interrupted = interrupted.len(),
                "batch deadline reached before all resorts were collected"
            );
        }

        // Persistence may run past the hard cutoff by at most the safety
        // margin.
        let persist_deadline = hard_deadline.max(Instant::now() + options.safety_margin);
        let (records_persisted, persistence_failure) =
            self.persist_records(&records, persist_deadline).await;
        self.persist_failure_state(persist_deadline).await;

        let touched = records
            .iter()
            .map(|r| r.resort_id)
            .chain(failures.iter().map(|f| f.resort_id));
        let mut alerts = Vec::new();
        for resort_id in touched {
            if let Some(event) = self.alert_event(resort_id) {
                self.notifier.notify(&event).await;
                alerts.push(resort_id);
            }
        }

        let collected: Vec<ResortId> = records.iter().map(|r| r.resort_id).collect();
        let succeeded = collected.len();
        BatchOutcome {
            started_at,
            finished_at: Utc::now(),
            attempted: succeeded + failures.len() + interrupted.len(),
            succeeded,
            collected,
            failures,
            deadline_hit: !not_attempted.is_empty() || !interrupted.is_empty(),
            not_attempted,
            interrupted,
            records_persisted,
            persistence_failure,
            alerts,
        }
    }

    async fn collect_one(&self, config: &ResortConfig, options: &BatchOptions) -> UnitResult {
        let max_retries = match self.tracker.escalation(config.id) {
            Escalation::Retry => options.max_retries,
            Escalation::Suppress | Escalation::Alert => {
                tracing::debug!(resort = %config.slug, "resort suspended, single attempt");
                0
            }
        };

        let adapter = match self.registry.require(config.source) {
            Ok(adapter) => adapter,
            Err(e) => return self.fail(config, FailureCategory::from(e.kind()), e.to_string()),
        };
        let adapter: &dyn SourceAdapter = adapter.as_ref();
        let call_timeout = options.call_timeout;

        let primary = match retry_with_backoff(max_retries, options.retry_backoff_base_ms, move || {
            fetch_bounded(adapter, config, call_timeout)
        })
        .await
        {
            Ok(raw) => raw,
            Err(e) => return self.fail(config, FailureCategory::from(e.kind()), e.to_string()),
        };

        let weather = if options.include_weather
            && config.source != SourceKind::OpenMeteo
            && config.coordinates().is_some()
        {
            self.enrich(SourceKind::OpenMeteo, config, call_timeout).await
        } else {
            None
        };
        let contact = if options.include_contact {
            self.enrich(SourceKind::GooglePlaces, config, call_timeout)
                .await
        } else {
            None
        };

        match normalize_collection(config, &primary, weather.as_ref(), contact.as_ref()) {
            Ok(record) => {
                let transition = self.tracker.record_outcome(config.id, true, None);
                if transition.recovered() {
                    tracing::info!(resort = %config.slug, previous = %transition.previous, "resort recovered");
                }
                UnitResult::Collected(Box::new(record))
            }
            Err(e) => self.fail(config, FailureCategory::from(&e), e.to_string()),
        }
    }

    /// Single attempt at an enrichment source. Failures are logged and the
    /// corresponding record fields stay null.
    async fn enrich(
        &self,
        kind: SourceKind,
        config: &ResortConfig,
        call_timeout: Duration,
    ) -> Option<RawCollection> {
        let Some(adapter) = self.registry.get(kind) else {
            tracing::debug!(resort = %config.slug, source = %kind, "no adapter registered, enrichment skipped");
            return None;
        };
        match fetch_bounded(adapter.as_ref(), config, call_timeout).await {
            Ok(raw) => Some(raw),
            Err(e) => {
                tracing::warn!(
                    resort = %config.slug,
                    source = %kind,
                    kind = %e.kind(),
                    error = %e,
                    "enrichment failed; fields left null"
                );
                None
            }
        }
    }

    fn fail(&self, config: &ResortConfig, category: FailureCategory, message: String) -> UnitResult {
        let reason = format!("{category}: {message}");
        let transition = self.tracker.record_outcome(config.id, false, Some(&reason));
        tracing::warn!(
            resort = %config.slug,
            category = %category,
            state = %transition.current,
            error = %message,
            "resort collection failed"
        );
        UnitResult::Failed(ResortFailure {
            resort_id: config.id,
            slug: config.slug.clone(),
            category,
            message,
        })
    }

    /// Writes each record to history and the latest projection. Failed writes
    /// are logged with the serialized record so they can be replayed.
    ///
    /// Stops at the first unreachable error or once `deadline` passes; every
    /// record from that point on is reported as unwritten.
    async fn persist_records(
        &self,
        records: &[CanonicalRecord],
        deadline: Instant,
    ) -> (usize, Option<PersistenceFailure>) {
        let store = self.merge.store();
        let mut persisted = 0usize;
        let mut failed = Vec::new();
        let mut unreachable: Option<String> = None;

        for (index, record) in records.iter().enumerate() {
            let write = async {
                store.append_history(record).await?;
                store.upsert_latest(record).await
            };
            let result = match tokio::time::timeout_at(deadline, write).await {
                Ok(result) => result,
                Err(_) => Err(StoreError::Unreachable(
                    "persistence budget exhausted".to_owned(),
                )),
            };
            let err = match result {
                Ok(()) => {
                    persisted += 1;
                    continue;
                }
                Err(e) => e,
            };

            if err.is_unreachable() {
                let rest = &records[index..];
                tracing::error!(
                    error = %err,
                    unwritten = rest.len(),
                    "record store unreachable, remaining records not persisted"
                );
                for record in rest {
                    log_unpersisted(record, &err);
                    failed.push((record.resort_id, err.to_string()));
                }
                unreachable = Some(err.to_string());
                break;
            }

            log_unpersisted(record, &err);
            failed.push((record.resort_id, err.to_string()));
        }

        let failure = match (failed.is_empty(), persisted, unreachable) {
            (true, _, _) => None,
            (false, 0, Some(message)) => Some(PersistenceFailure::Unreachable {
                message,
                unwritten: failed.into_iter().map(|(id, _)| id).collect(),
            }),
            (false, _, _) => Some(PersistenceFailure::PartialWrite { failed }),
        };
        (persisted, failure)
    }

    async fn persist_failure_state(&self, deadline: Instant) {
        if !self.failure_state_writable.load(Ordering::SeqCst) {
            tracing::warn!("stored failure state was not loaded; tracker state not persisted");
            return;
        }
        match tokio::time::timeout_at(deadline, self.tracker.persist(self.failures.as_ref())).await
        {
            Ok(Ok(saved)) => tracing::debug!(saved, "failure tracker state persisted"),
            Ok(Err(e)) => tracing::error!(error = %e, "failure tracker state not persisted"),
            Err(_) => tracing::error!("failure tracker state not persisted within the batch budget"),
        }
    }

    fn alert_event(&self, resort_id: ResortId) -> Option<AlertEvent> {
        if !self.tracker.should_alert(resort_id) {
            return None;
        }
        let record = self.tracker.record(resort_id)?;
        let (slug, name) = self
            .merge
            .get(resort_id)
            .map(|c| (c.slug.clone(), c.name.clone()))
            .unwrap_or_default();
        Some(AlertEvent {
            resort_id,
            slug,
            name,
            consecutive_failures: record.consecutive_failures,
            last_failure_reason: record.last_failure_reason,
            suspended_at: record.last_failure_at.unwrap_or_else(Utc::now),
        })
    }
}

impl std::fmt::Debug for CollectionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CollectionManager")
            .field("registry", &self.registry)
            .field("merge", &self.merge)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

async fn fetch_bounded(
    adapter: &dyn SourceAdapter,
    config: &ResortConfig,
    call_timeout: Duration,
) -> RawCollectionResult {
    match tokio::time::timeout(call_timeout, adapter.fetch(config)).await {
        Ok(result) => result,
        Err(_) => Err(AdapterError::Timeout {
            source_kind: adapter.kind(),
            after_ms: u64::try_from(call_timeout.as_millis()).unwrap_or(u64::MAX),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_options_leave_room_below_a_fifteen_minute_cutoff() {
        let options = BatchOptions::default();
        assert_eq!(options.concurrency_limit, 10);
        assert!(options.batch_deadline < Duration::from_secs(900));
        assert!(options.safety_margin < options.batch_deadline);
        assert!(!options.include_contact);
    }
}
