//! Collection manager tests over scripted adapters and in-memory stores.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use snowdb_core::{CanonicalRecord, ResortCatalog, ResortConfig, ResortId, SourceKind};
use snowdb_pipeline::{
    AlertEvent, BatchOptions, BatchOutcome, BatchRequest, CollectionManager, ConfigMergeLayer,
    FailureCategory, FailureRecord, FailureStore, FailureTracker, HealthState, MemoryFailureStore, MemoryRecordStore,
    Notifier, OutcomeReporter, PersistenceFailure, PipelineError, RecordStore, StoreError,
};
use snowdb_sources::types::{MtnPowderFeed, MtnPowderSnowReport};
use snowdb_sources::{AdapterError, AdapterRegistry, RawPayload, SourceAdapter};

// ---------------------------------------------------------------------------
// Fakes
// ---------------------------------------------------------------------------

struct ScriptedAdapter {
    kind: SourceKind,
    failing: HashSet<ResortId>,
    delay: Duration,
    calls: AtomicU32,
}

impl ScriptedAdapter {
    fn new(kind: SourceKind) -> Self {
        Self {
            kind,
            failing: HashSet::new(),
            delay: Duration::ZERO,
            calls: AtomicU32::new(0),
        }
    }

    fn failing(mut self, ids: &[ResortId]) -> Self {
        self.failing.extend(ids);
        self
    }

    fn delayed(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SourceAdapter for ScriptedAdapter {
    fn kind(&self) -> SourceKind {
        self.kind
    }

    fn source_url(&self, config: &ResortConfig) -> Option<String> {
        Some(format!("https://feeds.test/{}", config.slug))
    }

    async fn fetch_raw(&self, config: &ResortConfig) -> Result<String, AdapterError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if self.failing.contains(&config.id) {
            return Err(AdapterError::UnexpectedStatus {
                status: 503,
                url: format!("https://feeds.test/{}", config.slug),
            });
        }
        Ok(String::new())
    }

    fn parse(&self, config: &ResortConfig, _body: &str) -> Result<RawPayload, AdapterError> {
        match self.kind {
            SourceKind::MtnPowder => Ok(RawPayload::MtnPowder(MtnPowderFeed {
                name: Some(config.name.clone()),
                snow_report: Some(MtnPowderSnowReport {
                    storm_total_cm: Some(12.0),
                    total_open_lifts: Some(5),
                    total_lifts: Some(10),
                    total_open_trails: Some(40),
                    total_trails: Some(80),
                    ..MtnPowderSnowReport::default()
                }),
                ..MtnPowderFeed::default()
            })),
            other => Err(AdapterError::Unsupported(other)),
        }
    }
}

/// Fails every operation as if the database were down.
struct UnreachableStore;

#[async_trait]
impl RecordStore for UnreachableStore {
    async fn upsert_latest(&self, _record: &CanonicalRecord) -> Result<(), StoreError> {
        Err(StoreError::Unreachable("connection refused".to_owned()))
    }

    async fn append_history(&self, _record: &CanonicalRecord) -> Result<(), StoreError> {
        Err(StoreError::Unreachable("connection refused".to_owned()))
    }

    async fn get_latest(
        &self,
        _resort_id: ResortId,
    ) -> Result<Option<CanonicalRecord>, StoreError> {
        Err(StoreError::Unreachable("connection refused".to_owned()))
    }
}

/// Answers every write after `delay`, either with an unreachable error or
/// never at all.
struct SlowStore {
    delay: Duration,
    writes: AtomicU32,
}

impl SlowStore {
    fn new(delay: Duration) -> Self {
        Self {
            delay,
            writes: AtomicU32::new(0),
        }
    }

    async fn write(&self) -> Result<(), StoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        Err(StoreError::Unreachable("connection timed out".to_owned()))
    }
}

#[async_trait]
impl RecordStore for SlowStore {
    async fn upsert_latest(&self, _record: &CanonicalRecord) -> Result<(), StoreError> {
        self.write().await
    }

    async fn append_history(&self, _record: &CanonicalRecord) -> Result<(), StoreError> {
        self.write().await
    }

    async fn get_latest(
        &self,
        _resort_id: ResortId,
    ) -> Result<Option<CanonicalRecord>, StoreError> {
        Ok(None)
    }
}

/// Failure store whose reads fail; counts the writes it receives.
#[derive(Default)]
struct UnreadableFailureStore {
    saves: AtomicU32,
}

#[async_trait]
impl FailureStore for UnreadableFailureStore {
    async fn load_all(&self) -> Result<Vec<(ResortId, FailureRecord)>, StoreError> {
        Err(StoreError::Unreachable("connection refused".to_owned()))
    }

    async fn save(&self, _resort_id: ResortId, _record: &FailureRecord) -> Result<(), StoreError> {
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Rejects writes for one resort and delegates the rest.
struct RejectingStore {
    inner: MemoryRecordStore,
    reject: ResortId,
}

#[async_trait]
impl RecordStore for RejectingStore {
    async fn upsert_latest(&self, record: &CanonicalRecord) -> Result<(), StoreError> {
        self.inner.upsert_latest(record).await
    }

    async fn append_history(&self, record: &CanonicalRecord) -> Result<(), StoreError> {
        if record.resort_id == self.reject {
            return Err(StoreError::Rejected {
                resort_id: record.resort_id,
                reason: "value too long for column".to_owned(),
            });
        }
        self.inner.append_history(record).await
    }

    async fn get_latest(
        &self,
        resort_id: ResortId,
    ) -> Result<Option<CanonicalRecord>, StoreError> {
        self.inner.get_latest(resort_id).await
    }
}

#[derive(Default)]
struct RecordingNotifier {
    events: Mutex<Vec<AlertEvent>>,
}

#[async_trait]
impl Notifier for RecordingNotifier {
    async fn notify(&self, event: &AlertEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

#[derive(Default)]
struct RecordingReporter {
    reports: Mutex<Vec<BatchOutcome>>,
}

#[async_trait]
impl OutcomeReporter for RecordingReporter {
    async fn report(&self, outcome: &BatchOutcome) {
        self.reports.lock().unwrap().push(outcome.clone());
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn resort(id: ResortId) -> ResortConfig {
    ResortConfig {
        id,
        name: format!("Resort {id}"),
        slug: format!("resort-{id}"),
        location: Some("Colorado, USA".to_owned()),
        lat: Some(39.6),
        lon: Some(-106.3),
        elevation_min: Some(2475),
        elevation_max: Some(3527),
        source: SourceKind::MtnPowder,
        source_id: Some(id.to_string()),
        source_url: None,
        enabled: true,
        update_interval_mins: None,
        notes: None,
    }
}

fn resorts(count: ResortId) -> Vec<ResortConfig> {
    (1..=count).map(resort).collect()
}

fn fast_options() -> BatchOptions {
    BatchOptions {
        concurrency_limit: 4,
        batch_deadline: Duration::from_secs(30),
        safety_margin: Duration::from_secs(5),
        call_timeout: Duration::from_secs(5),
        max_retries: 2,
        retry_backoff_base_ms: 0,
        include_weather: false,
        include_contact: false,
    }
}

fn manager(
    catalog: Vec<ResortConfig>,
    adapters: &[&Arc<ScriptedAdapter>],
    store: Arc<dyn RecordStore>,
    threshold: u32,
) -> CollectionManager {
    let mut registry = AdapterRegistry::new();
    for adapter in adapters {
        registry.register((*adapter).clone());
    }
    let catalog = Arc::new(ResortCatalog::new(catalog).unwrap());
    let merge = ConfigMergeLayer::new(catalog, store);
    CollectionManager::new(
        registry,
        merge,
        Arc::new(MemoryFailureStore::new()),
        Arc::new(FailureTracker::new(threshold)),
    )
    .with_options(fast_options())
}

// ---------------------------------------------------------------------------
// Isolation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn one_failing_resort_does_not_affect_the_others() {
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder).failing(&[4]));
    let store = Arc::new(MemoryRecordStore::new());
    let all = resorts(10);
    let manager = manager(all.clone(), &[&adapter], store.clone(), 3);

    let outcome = manager.run_batch(&all, &fast_options()).await;

    assert_eq!(outcome.attempted, 10);
    assert_eq!(outcome.succeeded, 9);
    assert_eq!(outcome.collected, vec![1, 2, 3, 5, 6, 7, 8, 9, 10]);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].resort_id, 4);
    assert_eq!(outcome.failures[0].slug, "resort-4");
    assert_eq!(outcome.failures[0].category, FailureCategory::UpstreamError);
    assert!(!outcome.deadline_hit);
    assert!(outcome.persistence_failure.is_none());
    assert_eq!(outcome.records_persisted, 9);

    let latest = store.latest();
    assert_eq!(latest.len(), 9);
    assert!(latest.iter().all(|r| r.resort_id != 4));
    assert_eq!(manager.tracker().state(4), HealthState::Degraded);
    assert_eq!(manager.tracker().state(5), HealthState::Healthy);
}

#[tokio::test]
async fn collected_records_carry_configured_static_fields() {
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder));
    let store = Arc::new(MemoryRecordStore::new());
    let all = resorts(2);
    let manager = manager(all.clone(), &[&adapter], store.clone(), 3);

    manager.run_batch(&all, &fast_options()).await;

    let record = store.get_latest(2).await.unwrap().unwrap();
    assert_eq!(record.name, "Resort 2");
    assert_eq!(record.lat, Some(39.6));
    assert_eq!(record.elevation.min, Some(2475));
    assert_eq!(record.lifts_open, Some(5));
    assert_eq!(record.source_url.as_deref(), Some("https://feeds.test/resort-2"));
    assert_eq!(store.history().len(), 2);
}

#[tokio::test]
async fn disabled_resorts_are_skipped() {
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder));
    let mut all = resorts(3);
    all[1].enabled = false;
    let manager = manager(
        all.clone(),
        &[&adapter],
        Arc::new(MemoryRecordStore::new()),
        3,
    );

    let outcome = manager.run_batch(&all, &fast_options()).await;

    assert_eq!(outcome.attempted, 2);
    assert_eq!(adapter.calls(), 2);
}

#[tokio::test]
async fn missing_adapter_is_a_per_resort_failure() {
    let mut all = resorts(2);
    all[1].source = SourceKind::OnTheSnow;
    all[1].source_url = Some("https://www.onthesnow.com/x/skireport".to_owned());
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder));
    let manager = manager(
        all.clone(),
        &[&adapter],
        Arc::new(MemoryRecordStore::new()),
        3,
    );

    let outcome = manager.run_batch(&all, &fast_options()).await;

    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failures[0].resort_id, 2);
    assert_eq!(outcome.failures[0].category, FailureCategory::UpstreamError);
}

// ---------------------------------------------------------------------------
// Enrichment
// ---------------------------------------------------------------------------

#[tokio::test]
async fn failed_weather_enrichment_leaves_fields_null() {
    let primary = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder));
    let weather = Arc::new(ScriptedAdapter::new(SourceKind::OpenMeteo).failing(&[1]));
    let store = Arc::new(MemoryRecordStore::new());
    let all = resorts(1);
    let manager = manager(
        all.clone(),
        &[&primary, &weather],
        store.clone(),
        3,
    );
    let options = BatchOptions {
        include_weather: true,
        ..fast_options()
    };

    let outcome = manager.run_batch(&all, &options).await;

    assert_eq!(outcome.succeeded, 1);
    assert!(outcome.failures.is_empty());
    assert_eq!(weather.calls(), 1, "enrichment is attempted once, without retries");
    let record = store.get_latest(1).await.unwrap().unwrap();
    assert!(record.weather.temperature_c.is_none());
    assert_eq!(manager.tracker().state(1), HealthState::Healthy);
}

// ---------------------------------------------------------------------------
// Deadlines
// ---------------------------------------------------------------------------

#[tokio::test]
async fn deadline_shorter_than_the_work_returns_promptly() {
    let adapter = Arc::new(
        ScriptedAdapter::new(SourceKind::MtnPowder).delayed(Duration::from_secs(2)),
    );
    let store = Arc::new(MemoryRecordStore::new());
    let all = resorts(6);
    let manager = manager(all.clone(), &[&adapter], store.clone(), 3);
    let options = BatchOptions {
        concurrency_limit: 2,
        batch_deadline: Duration::from_millis(300),
        safety_margin: Duration::from_millis(100),
        ..fast_options()
    };

    let started = Instant::now();
    let outcome = manager.run_batch(&all, &options).await;
    let elapsed = started.elapsed();

    assert!(elapsed < Duration::from_millis(1500), "took {elapsed:?}");
    assert!(outcome.deadline_hit);
    assert_eq!(outcome.interrupted, vec![1, 2]);
    assert_eq!(outcome.not_attempted, vec![3, 4, 5, 6]);
    assert_eq!(outcome.succeeded, 0);
    assert!(outcome.failures.is_empty());
    assert!(store.latest().is_empty());
    assert!(manager.tracker().record(1).is_none());
    assert!(manager.tracker().record(3).is_none());
}

#[tokio::test]
async fn per_call_timeout_is_a_network_error() {
    let adapter = Arc::new(
        ScriptedAdapter::new(SourceKind::MtnPowder).delayed(Duration::from_millis(500)),
    );
    let all = resorts(1);
    let manager = manager(
        all.clone(),
        &[&adapter],
        Arc::new(MemoryRecordStore::new()),
        3,
    );
    let options = BatchOptions {
        call_timeout: Duration::from_millis(50),
        max_retries: 0,
        ..fast_options()
    };

    let outcome = manager.run_batch(&all, &options).await;

    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(outcome.failures[0].category, FailureCategory::NetworkError);
    assert_eq!(adapter.calls(), 1);
}

// ---------------------------------------------------------------------------
// Persistence
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unreachable_store_does_not_mark_resorts_failed() {
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder));
    let all = resorts(3);
    let manager = manager(all.clone(), &[&adapter], Arc::new(UnreachableStore), 3);

    let outcome = manager.run_batch(&all, &fast_options()).await;

    assert_eq!(outcome.succeeded, 3);
    assert!(outcome.failures.is_empty());
    assert_eq!(outcome.records_persisted, 0);
    match outcome.persistence_failure {
        Some(PersistenceFailure::Unreachable { unwritten, .. }) => {
            assert_eq!(unwritten, vec![1, 2, 3]);
        }
        other => panic!("expected unreachable, got {other:?}"),
    }
    for id in 1..=3 {
        assert_eq!(manager.tracker().state(id), HealthState::Healthy);
    }
}

#[tokio::test]
async fn slow_unreachable_store_stops_writing_at_first_error() {
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder));
    let store = Arc::new(SlowStore::new(Duration::from_millis(200)));
    let all = resorts(20);
    let manager = manager(all.clone(), &[&adapter], store.clone(), 3);
    let options = BatchOptions {
        batch_deadline: Duration::from_secs(2),
        safety_margin: Duration::from_millis(500),
        ..fast_options()
    };

    let started = Instant::now();
    let outcome = manager.run_batch(&all, &options).await;

    assert!(started.elapsed() < Duration::from_millis(2500));
    assert_eq!(store.writes.load(Ordering::SeqCst), 1);
    assert_eq!(outcome.succeeded, 20);
    assert_eq!(outcome.records_persisted, 0);
    match outcome.persistence_failure {
        Some(PersistenceFailure::Unreachable { unwritten, .. }) => {
            assert_eq!(unwritten, (1..=20).collect::<Vec<_>>());
        }
        other => panic!("expected unreachable, got {other:?}"),
    }
}

#[tokio::test]
async fn hanging_store_is_cut_off_at_the_batch_deadline() {
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder));
    let store = Arc::new(SlowStore::new(Duration::from_secs(60)));
    let all = resorts(5);
    let manager = manager(all.clone(), &[&adapter], store, 3);
    let options = BatchOptions {
        batch_deadline: Duration::from_secs(1),
        safety_margin: Duration::from_millis(200),
        ..fast_options()
    };

    let started = Instant::now();
    let outcome = manager.run_batch(&all, &options).await;

    assert!(started.elapsed() < Duration::from_millis(1500));
    assert_eq!(outcome.records_persisted, 0);
    match outcome.persistence_failure {
        Some(PersistenceFailure::Unreachable { message, unwritten }) => {
            assert!(message.contains("budget"));
            assert_eq!(unwritten.len(), 5);
        }
        other => panic!("expected unreachable, got {other:?}"),
    }
}

#[tokio::test]
async fn rejected_write_is_reported_as_partial() {
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder));
    let store = Arc::new(RejectingStore {
        inner: MemoryRecordStore::new(),
        reject: 2,
    });
    let all = resorts(3);
    let manager = manager(all.clone(), &[&adapter], store.clone(), 3);

    let outcome = manager.run_batch(&all, &fast_options()).await;

    assert_eq!(outcome.succeeded, 3);
    assert_eq!(outcome.records_persisted, 2);
    match outcome.persistence_failure {
        Some(PersistenceFailure::PartialWrite { failed }) => {
            assert_eq!(failed.len(), 1);
            assert_eq!(failed[0].0, 2);
        }
        other => panic!("expected partial write, got {other:?}"),
    }
    assert!(store.inner.get_latest(2).await.unwrap().is_none());
    assert!(store.inner.get_latest(3).await.unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Failure tracking
// ---------------------------------------------------------------------------

#[tokio::test]
async fn repeated_failures_suspend_alert_once_and_stop_retrying() {
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder).failing(&[1]));
    let notifier = Arc::new(RecordingNotifier::default());
    let all = resorts(2);
    let manager = manager(
        all.clone(),
        &[&adapter],
        Arc::new(MemoryRecordStore::new()),
        3,
    )
    .with_notifier(notifier.clone());
    let options = fast_options();

    let first = manager.run_batch(&all, &options).await;
    assert!(first.alerts.is_empty());
    assert_eq!(manager.tracker().state(1), HealthState::Degraded);

    manager.run_batch(&all, &options).await;
    let third = manager.run_batch(&all, &options).await;
    assert_eq!(third.alerts, vec![1]);
    assert_eq!(manager.tracker().state(1), HealthState::Suspended);

    // one initial attempt plus two retries per batch for resort 1, one for resort 2
    assert_eq!(adapter.calls(), 3 * (3 + 1));

    let fourth = manager.run_batch(&all, &options).await;
    assert!(fourth.alerts.is_empty());
    assert_eq!(adapter.calls(), 3 * (3 + 1) + 2, "suspended resort gets one attempt");

    let events = notifier.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].resort_id, 1);
    assert_eq!(events[0].slug, "resort-1");
    assert_eq!(events[0].consecutive_failures, 3);
    assert!(events[0]
        .last_failure_reason
        .as_deref()
        .is_some_and(|r| r.starts_with("upstream_error")));
}

// ---------------------------------------------------------------------------
// Invocation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn run_honours_limit_and_explicit_targets() {
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder));
    let reporter = Arc::new(RecordingReporter::default());
    let mut all = resorts(4);
    all[3].enabled = false;
    let manager = manager(all, &[&adapter], Arc::new(MemoryRecordStore::new()), 3)
        .with_reporter(reporter.clone());

    let limited = manager
        .run(&BatchRequest {
            limit: Some(2),
            ..BatchRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(limited.attempted, 2);

    let everything = manager.run(&BatchRequest::default()).await.unwrap();
    assert_eq!(everything.attempted, 3);

    let disabled = manager
        .run(&BatchRequest {
            resort_id: Some(4),
            ..BatchRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(disabled.succeeded, 1);

    let by_slug = manager
        .run(&BatchRequest {
            resort_slug: Some("RESORT-2".to_owned()),
            ..BatchRequest::default()
        })
        .await
        .unwrap();
    assert_eq!(by_slug.succeeded, 1);

    assert_eq!(reporter.reports.lock().unwrap().len(), 4);
}

#[tokio::test]
async fn run_rejects_unknown_targets() {
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder));
    let manager = manager(
        resorts(2),
        &[&adapter],
        Arc::new(MemoryRecordStore::new()),
        3,
    );

    let err = manager
        .run(&BatchRequest {
            resort_id: Some(99),
            ..BatchRequest::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownResort(99)));

    let err = manager
        .run(&BatchRequest {
            resort_slug: Some("nowhere".to_owned()),
            ..BatchRequest::default()
        })
        .await
        .unwrap_err();
    assert!(matches!(err, PipelineError::UnknownSlug(_)));
}

#[tokio::test]
async fn failure_state_is_persisted_and_reloaded() {
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder).failing(&[1]));
    let failures = Arc::new(MemoryFailureStore::new());
    let all = resorts(1);
    let catalog = Arc::new(ResortCatalog::new(all.clone()).unwrap());
    let build = |tracker: Arc<FailureTracker>| {
        let mut registry = AdapterRegistry::new();
        registry.register(adapter.clone());
        CollectionManager::new(
            registry,
            ConfigMergeLayer::new(catalog.clone(), Arc::new(MemoryRecordStore::new())),
            failures.clone(),
            tracker,
        )
        .with_options(fast_options())
    };

    let first = build(Arc::new(FailureTracker::new(3)));
    first.run_batch(&all, &fast_options()).await;
    first.run_batch(&all, &fast_options()).await;
    assert_eq!(failures.get(1).unwrap().consecutive_failures, 2);

    let restarted = build(Arc::new(FailureTracker::new(3)));
    assert_eq!(restarted.load_failure_state().await.unwrap(), 1);
    let outcome = restarted.run_batch(&all, &fast_options()).await;
    assert_eq!(outcome.alerts, vec![1]);
}

#[tokio::test]
async fn unloaded_failure_state_is_not_overwritten() {
    let adapter = Arc::new(ScriptedAdapter::new(SourceKind::MtnPowder).failing(&[1]));
    let failures = Arc::new(UnreadableFailureStore::default());
    let all = resorts(2);
    let mut registry = AdapterRegistry::new();
    registry.register(adapter.clone());
    let manager = CollectionManager::new(
        registry,
        ConfigMergeLayer::new(
            Arc::new(ResortCatalog::new(all.clone()).unwrap()),
            Arc::new(MemoryRecordStore::new()),
        ),
        failures.clone(),
        Arc::new(FailureTracker::new(3)),
    )
    .with_options(fast_options());

    assert!(manager.load_failure_state().await.is_err());
    let outcome = manager.run_batch(&all, &fast_options()).await;

    assert_eq!(outcome.succeeded, 1);
    assert_eq!(outcome.failures.len(), 1);
    assert_eq!(failures.saves.load(Ordering::SeqCst), 0);
}
