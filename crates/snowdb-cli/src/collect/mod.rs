//! `collect` command: runs one batch through the collection manager.
//!
//! A dry run keeps everything in memory and prints the collected records.
//! A normal run persists records and failure state to Postgres and records
//! the batch as a collection run.

mod report;
mod store;

use std::sync::Arc;

use clap::Args;
use snowdb_core::{AppConfig, CanonicalRecord, ResortCatalog, ResortStatus, SourceKind};
use snowdb_pipeline::{
    BatchOptions, BatchOutcome, BatchRequest, CollectionManager, ConfigMergeLayer, FailureTracker,
    MemoryFailureStore, MemoryRecordStore,
};
use snowdb_sources::AdapterRegistry;

use report::RunReporter;
pub(crate) use store::{PgFailureStore, PgRecordStore};

#[derive(Debug, Args)]
pub struct CollectArgs {
    /// Collect at most this many enabled resorts
    #[arg(long)]
    pub limit: Option<usize>,
    /// Collect a single resort by id, even if it is disabled
    #[arg(long, conflicts_with = "resort")]
    pub resort_id: Option<i64>,
    /// Collect a single resort by slug, even if it is disabled
    #[arg(long)]
    pub resort: Option<String>,
    /// Collect without writing to the database and print the records
    #[arg(long)]
    pub dry_run: bool,
    /// Print output as JSON
    #[arg(long)]
    pub json: bool,
    /// Skip weather enrichment for non-weather sources
    #[arg(long)]
    pub no_weather: bool,
    /// Enrich records with contact details (needs GOOGLE_MAPS_API_KEY)
    #[arg(long)]
    pub contacts: bool,
}

impl CollectArgs {
    fn request(&self) -> BatchRequest {
        BatchRequest {
            limit: self.limit,
            resort_id: self.resort_id,
            resort_slug: self.resort.clone(),
        }
    }

    fn options(&self, config: &AppConfig) -> BatchOptions {
        let mut options = BatchOptions::from_app_config(config);
        options.include_weather = options.include_weather && !self.no_weather;
        options.include_contact = self.contacts;
        options
    }
}

/// # Errors
///
/// Returns an error if the resort catalog or adapters cannot be built, the
/// requested resort does not exist, the database cannot be reached (normal
/// runs only), or every attempted resort failed.
pub(crate) async fn run_collect(config: &AppConfig, args: &CollectArgs) -> anyhow::Result<()> {
    let catalog = Arc::new(ResortCatalog::load(&config.resorts_path)?);
    let registry = AdapterRegistry::from_config(config)
        .map_err(|e| anyhow::anyhow!("failed to build source adapters: {e}"))?;

    if args.contacts && !registry.contains(SourceKind::GooglePlaces) {
        tracing::warn!("--contacts given but GOOGLE_MAPS_API_KEY is not set; contact fields stay empty");
    }

    let options = args.options(config);
    let tracker = Arc::new(FailureTracker::new(config.failure_threshold));

    if args.dry_run {
        let records = Arc::new(MemoryRecordStore::new());
        let merge = ConfigMergeLayer::new(catalog, records.clone());
        let manager = CollectionManager::new(
            registry,
            merge,
            Arc::new(MemoryFailureStore::new()),
            tracker,
        )
        .with_options(options);

        let outcome = manager.run(&args.request()).await?;
        print_dry_run(&outcome, &records.latest(), args.json)?;
        return Ok(());
    }

    let pool = snowdb_db::connect_pool(
        &config.database_url,
        snowdb_db::PoolConfig::from_app_config(config),
    )
    .await?;

    let merge = ConfigMergeLayer::new(catalog, Arc::new(PgRecordStore::new(pool.clone())));
    let manager = CollectionManager::new(
        registry,
        merge,
        Arc::new(PgFailureStore::new(pool.clone())),
        tracker,
    )
    .with_options(options)
    .with_reporter(Arc::new(RunReporter::new(pool, "cli")));

    match manager.load_failure_state().await {
        Ok(loaded) => tracing::debug!(loaded, "failure state loaded"),
        Err(e) => tracing::warn!(error = %e, "failure state not loaded; starting from healthy"),
    }

    let outcome = manager.run(&args.request()).await?;
    print_outcome(&outcome, args.json)?;

    if outcome.all_failed() {
        anyhow::bail!("all {} attempted resorts failed collection", outcome.attempted);
    }
    Ok(())
}

fn print_outcome(outcome: &BatchOutcome, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
        return Ok(());
    }

    println!(
        "collected {} of {} resorts ({} failed, {} not attempted, {} interrupted) in {} ms; {} records persisted",
        outcome.succeeded,
        outcome.attempted + outcome.not_attempted.len(),
        outcome.failed(),
        outcome.not_attempted.len(),
        outcome.interrupted.len(),
        outcome.duration_ms(),
        outcome.records_persisted,
    );
    for failure in &outcome.failures {
        println!("  {:<24}{:<18}{}", failure.slug, failure.category.as_str(), failure.message);
    }
    if let Some(persistence) = &outcome.persistence_failure {
        println!("persistence: {}", serde_json::to_string(persistence)?);
    }
    if !outcome.alerts.is_empty() {
        println!("suspended this batch: {:?}", outcome.alerts);
    }
    Ok(())
}

fn print_dry_run(
    outcome: &BatchOutcome,
    records: &[CanonicalRecord],
    json: bool,
) -> anyhow::Result<()> {
    if json {
        let body = serde_json::json!({ "outcome": outcome, "records": records });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    println!("dry-run: collected {} records, nothing written", records.len());
    println!(
        "{:<22}{:<10}{:>9}{:>9}{:>9}{:>9}{:>8}",
        "SLUG", "STATUS", "NEW_CM", "BASE_CM", "LIFTS", "TRAILS", "TEMP_C"
    );
    for record in records {
        println!(
            "{:<22}{:<10}{:>9}{:>9}{:>9}{:>9}{:>8}",
            record.slug,
            record.status.map_or("-", ResortStatus::as_str),
            fmt_opt(record.new_snow_cm),
            fmt_opt(record.base_depth_cm),
            fmt_ratio(record.lifts_open, record.lifts_total),
            fmt_ratio(record.trails_open, record.trails_total),
            fmt_opt(record.temperature_c),
        );
    }
    print_outcome(outcome, false)
}

pub(crate) fn fmt_opt(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.1}"))
}

pub(crate) fn fmt_ratio(open: Option<i32>, total: Option<i32>) -> String {
    match (open, total) {
        (Some(open), Some(total)) => format!("{open}/{total}"),
        (Some(open), None) => open.to_string(),
        _ => "-".to_string(),
    }
}

#[cfg(test)]
#[path = "collect_test.rs"]
mod tests;
