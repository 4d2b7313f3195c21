use super::*;
use chrono::{TimeZone, Utc};
use snowdb_db::ResortFailureRow;
use snowdb_pipeline::{FailureCategory, ResortFailure};

fn outcome() -> BatchOutcome {
    let started_at = Utc.with_ymd_and_hms(2026, 1, 10, 6, 0, 0).unwrap();
    BatchOutcome {
        started_at,
        finished_at: started_at + chrono::Duration::milliseconds(1500),
        attempted: 4,
        succeeded: 2,
        collected: vec![1, 2],
        failures: vec![ResortFailure {
            resort_id: 3,
            slug: "park-city".to_string(),
            category: FailureCategory::NetworkError,
            message: "connection reset".to_string(),
        }],
        not_attempted: vec![5, 6],
        interrupted: vec![4],
        deadline_hit: true,
        records_persisted: 2,
        persistence_failure: None,
        alerts: Vec::new(),
    }
}

fn app_config() -> snowdb_core::AppConfig {
    snowdb_core::AppConfig {
        database_url: "postgres://example".to_string(),
        env: snowdb_core::Environment::Test,
        log_level: "info".to_string(),
        resorts_path: std::path::PathBuf::from("./config/resorts.yaml"),
        db_max_connections: 10,
        db_min_connections: 1,
        db_acquire_timeout_secs: 10,
        request_timeout_secs: 15,
        user_agent: "snowdb-test".to_string(),
        collect_concurrency: 10,
        batch_deadline_secs: 840,
        deadline_margin_secs: 60,
        max_retries: 2,
        retry_backoff_base_ms: 1000,
        failure_threshold: 3,
        weather_min_spacing_ms: 200,
        include_weather: true,
        openmeteo_api_key: None,
        google_maps_api_key: None,
    }
}

fn args(extra: &[&str]) -> CollectArgs {
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: CollectArgs,
    }

    let mut argv = vec!["collect"];
    argv.extend_from_slice(extra);
    Wrapper::try_parse_from(argv).unwrap().args
}

#[test]
fn run_totals_count_interrupted_as_skipped() {
    let totals = report::run_totals(&outcome());

    assert_eq!(totals.resorts_succeeded, 2);
    assert_eq!(totals.resorts_failed, 1);
    assert_eq!(totals.resorts_skipped, 3);
    assert_eq!(totals.records_persisted, 2);
    assert!(totals.deadline_hit);
}

#[test]
fn request_carries_target_flags() {
    let request = args(&["--resort", "vail", "--limit", "3"]).request();

    assert_eq!(request.resort_slug.as_deref(), Some("vail"));
    assert_eq!(request.resort_id, None);
    assert_eq!(request.limit, Some(3));
}

#[test]
fn resort_id_and_slug_conflict() {
    use clap::Parser;

    #[derive(Debug, Parser)]
    struct Wrapper {
        #[command(flatten)]
        args: CollectArgs,
    }

    let result = Wrapper::try_parse_from(["collect", "--resort-id", "1", "--resort", "vail"]);
    assert!(result.is_err());
}

#[test]
fn no_weather_flag_disables_enrichment() {
    let config = app_config();
    let defaults = args(&[]).options(&config);
    assert!(defaults.include_weather);
    assert!(!defaults.include_contact);

    let options = args(&["--no-weather", "--contacts"]).options(&config);
    assert!(!options.include_weather);
    assert!(options.include_contact);
}

#[test]
fn failure_rows_convert_to_tracker_records() {
    let at = Utc.with_ymd_and_hms(2026, 1, 9, 6, 0, 0).unwrap();
    let row = ResortFailureRow {
        resort_id: 2,
        consecutive_failures: 5,
        last_success_at: None,
        last_failure_at: Some(at),
        last_failure_reason: Some("parse_error: missing field".to_string()),
        just_suspended: true,
        updated_at: at,
    };

    let record = store::failure_record_from_row(row);

    assert_eq!(record.consecutive_failures, 5);
    assert_eq!(record.last_failure_at, Some(at));
    assert!(record.just_suspended);
}

#[test]
fn negative_failure_counts_reset_to_zero() {
    let at = Utc.with_ymd_and_hms(2026, 1, 9, 6, 0, 0).unwrap();
    let row = ResortFailureRow {
        resort_id: 2,
        consecutive_failures: -1,
        last_success_at: Some(at),
        last_failure_at: None,
        last_failure_reason: None,
        just_suspended: false,
        updated_at: at,
    };

    assert_eq!(store::failure_record_from_row(row).consecutive_failures, 0);
}

#[test]
fn table_cells_format_missing_values() {
    assert_eq!(fmt_opt(None), "-");
    assert_eq!(fmt_opt(Some(12.345)), "12.3");
    assert_eq!(fmt_ratio(Some(4), Some(10)), "4/10");
    assert_eq!(fmt_ratio(Some(4), None), "4");
    assert_eq!(fmt_ratio(None, Some(10)), "-");
}
