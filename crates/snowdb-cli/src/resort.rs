//! `resort` command: list configured resorts and show the merged view of one
//! resort (static config plus latest stored conditions).

use std::collections::HashMap;
use std::sync::Arc;

use clap::Subcommand;
use snowdb_core::{AppConfig, CanonicalRecord, ResortCatalog, ResortId, ResortStatus};
use snowdb_pipeline::{ConfigMergeLayer, FailureTracker, HealthState};

use crate::collect::{fmt_opt, fmt_ratio, PgFailureStore, PgRecordStore};

#[derive(Debug, Subcommand)]
pub enum ResortCommands {
    /// List configured resorts
    List {
        /// Include disabled resorts
        #[arg(long)]
        all: bool,
        /// Add the latest stored conditions (needs the database)
        #[arg(long)]
        conditions: bool,
    },
    /// Show one resort with its latest conditions
    Show {
        /// Resort slug (e.g. vail)
        slug: String,
        /// Also print this many historical observations
        #[arg(long, default_value = "0")]
        history: i64,
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

pub(crate) async fn run_resort(
    config: &AppConfig,
    pool_config: snowdb_db::PoolConfig,
    command: ResortCommands,
) -> anyhow::Result<()> {
    let catalog = Arc::new(ResortCatalog::load(&config.resorts_path)?);

    match command {
        ResortCommands::List { all, conditions } => {
            let latest = if conditions {
                let pool = snowdb_db::connect_pool(&config.database_url, pool_config).await?;
                snowdb_db::list_latest_conditions(&pool)
                    .await?
                    .into_iter()
                    .map(|record| (record.resort_id, record))
                    .collect()
            } else {
                HashMap::new()
            };
            list_resorts(&catalog, all, conditions.then_some(&latest));
            Ok(())
        }
        ResortCommands::Show {
            slug,
            history,
            json,
        } => {
            let pool = snowdb_db::connect_pool(&config.database_url, pool_config).await?;
            show_resort(&pool, catalog, config.failure_threshold, &slug, history, json).await
        }
    }
}

fn list_resorts(
    catalog: &ResortCatalog,
    all: bool,
    latest: Option<&HashMap<ResortId, CanonicalRecord>>,
) {
    let mut header = format!(
        "{:<5}{:<22}{:<28}{:<12}{:<8}",
        "ID", "SLUG", "NAME", "SOURCE", "ENABLED"
    );
    if latest.is_some() {
        header.push_str(&format!("{:<10}{:>9}{:>9}  OBSERVED", "STATUS", "NEW_CM", "LIFTS"));
    }
    println!("{header}");

    for resort in catalog.iter().filter(|r| all || r.enabled) {
        let mut line = format!(
            "{:<5}{:<22}{:<28}{:<12}{:<8}",
            resort.id,
            resort.slug,
            truncate(&resort.name, 26),
            resort.source.as_str(),
            if resort.enabled { "yes" } else { "no" },
        );
        if let Some(latest) = latest {
            match latest.get(&resort.id) {
                Some(record) => line.push_str(&format!(
                    "{:<10}{:>9}{:>9}  {}",
                    record.status.map_or("-", ResortStatus::as_str),
                    fmt_opt(record.new_snow_cm),
                    fmt_ratio(record.lifts_open, record.lifts_total),
                    record.observed_at.format("%Y-%m-%d %H:%M"),
                )),
                None => line.push_str(&format!("{:<10}{:>9}{:>9}  never", "-", "-", "-")),
            }
        }
        println!("{line}");
    }
}

async fn show_resort(
    pool: &sqlx::PgPool,
    catalog: Arc<ResortCatalog>,
    failure_threshold: u32,
    slug: &str,
    history: i64,
    json: bool,
) -> anyhow::Result<()> {
    let merge = ConfigMergeLayer::new(catalog, Arc::new(PgRecordStore::new(pool.clone())));
    let merged = merge
        .resolve_by_slug(slug)
        .await?
        .ok_or_else(|| anyhow::anyhow!("resort '{slug}' not found"))?;

    let tracker = FailureTracker::new(failure_threshold);
    tracker.load(&PgFailureStore::new(pool.clone())).await?;
    let health = tracker.state(merged.config.id);

    let past = if history > 0 {
        snowdb_db::list_conditions_history(pool, merged.config.id, history).await?
    } else {
        Vec::new()
    };

    if json {
        let body = serde_json::json!({
            "resort": merged.config,
            "latest": merged.latest,
            "health": health,
            "history": past,
        });
        println!("{}", serde_json::to_string_pretty(&body)?);
        return Ok(());
    }

    let resort = &merged.config;
    println!("{} ({})", resort.name, resort.slug);
    if let Some(location) = &resort.location {
        println!("  location:  {location}");
    }
    if let Some((lat, lon)) = resort.coordinates() {
        println!("  coords:    {lat:.4}, {lon:.4}");
    }
    println!("  source:    {}", resort.source.as_str());
    println!("  health:    {}", health_label(health));

    match &merged.latest {
        Some(latest) => print_conditions(latest),
        None => println!("  no conditions collected yet"),
    }

    if !past.is_empty() {
        println!();
        println!(
            "{:<22}{:<10}{:>9}{:>9}{:>9}",
            "OBSERVED", "STATUS", "NEW_CM", "BASE_CM", "LIFTS"
        );
        for record in &past {
            println!(
                "{:<22}{:<10}{:>9}{:>9}{:>9}",
                record.observed_at.format("%Y-%m-%d %H:%M"),
                record.status.map_or("-", ResortStatus::as_str),
                fmt_opt(record.new_snow_cm),
                fmt_opt(record.base_depth_cm),
                fmt_ratio(record.lifts_open, record.lifts_total),
            );
        }
    }

    Ok(())
}

fn print_conditions(record: &CanonicalRecord) {
    println!(
        "  observed:  {} via {}",
        record.observed_at.format("%Y-%m-%d %H:%M UTC"),
        record.source.as_str()
    );
    println!(
        "  status:    {}",
        record.status.map_or("unknown", ResortStatus::as_str)
    );
    println!("  new snow:  {} cm", fmt_opt(record.new_snow_cm));
    println!("  base:      {} cm", fmt_opt(record.base_depth_cm));
    println!(
        "  lifts:     {}",
        fmt_ratio(record.lifts_open, record.lifts_total)
    );
    println!(
        "  trails:    {}",
        fmt_ratio(record.trails_open, record.trails_total)
    );
    println!("  temp:      {} C", fmt_opt(record.temperature_c));
}

fn health_label(state: HealthState) -> &'static str {
    match state {
        HealthState::Healthy => "healthy",
        HealthState::Degraded => "degraded (recent failures)",
        HealthState::Suspended => "suspended",
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(1)).collect();
        format!("{cut}~")
    }
}
