//! `runs` command: read-only views over recorded collection runs.

use chrono::{DateTime, Utc};
use clap::Subcommand;

#[derive(Debug, Subcommand)]
pub enum RunsCommands {
    /// List recent collection runs, newest first
    List {
        /// Maximum number of runs to show
        #[arg(long, default_value = "20")]
        limit: i64,
    },
    /// Show one run with its per-resort results
    Show {
        /// Run id as printed by `runs list`
        id: i64,
    },
}

fn fmt_time(at: Option<DateTime<Utc>>) -> String {
    at.map_or_else(|| "-".to_string(), |t| t.format("%Y-%m-%d %H:%M").to_string())
}

pub(crate) async fn run_runs(pool: &sqlx::PgPool, command: RunsCommands) -> anyhow::Result<()> {
    match command {
        RunsCommands::List { limit } => list_runs(pool, limit).await,
        RunsCommands::Show { id } => show_run(pool, id).await,
    }
}

async fn list_runs(pool: &sqlx::PgPool, limit: i64) -> anyhow::Result<()> {
    let runs = snowdb_db::list_collection_runs(pool, limit).await?;
    if runs.is_empty() {
        println!("no collection runs recorded; run `collect` first");
        return Ok(());
    }

    let header = format!(
        "{:<7}{:<11}{:<18}{:<18}{:>5}{:>6}{:>6}{:>8}  DEADLINE",
        "ID", "STATUS", "STARTED", "COMPLETED", "OK", "FAIL", "SKIP", "STORED"
    );
    println!("{header}");
    for run in &runs {
        println!(
            "{:<7}{:<11}{:<18}{:<18}{:>5}{:>6}{:>6}{:>8}  {}",
            run.id,
            run.status,
            fmt_time(Some(run.started_at)),
            fmt_time(run.completed_at),
            run.resorts_succeeded,
            run.resorts_failed,
            run.resorts_skipped,
            run.records_persisted,
            if run.deadline_hit { "hit" } else { "-" },
        );
    }

    Ok(())
}

async fn show_run(pool: &sqlx::PgPool, id: i64) -> anyhow::Result<()> {
    let run = match snowdb_db::get_collection_run(pool, id).await {
        Ok(run) => run,
        Err(snowdb_db::DbError::NotFound) => anyhow::bail!("collection run {id} not found"),
        Err(e) => return Err(e.into()),
    };
    let resorts = snowdb_db::list_collection_run_resorts(pool, id).await?;

    println!("Run {} ({})", run.id, run.public_id);
    println!("Status: {} via {}", run.status, run.trigger_source);
    println!(
        "Started: {}  Completed: {}",
        fmt_time(Some(run.started_at)),
        fmt_time(run.completed_at)
    );
    if let Some(message) = &run.error_message {
        println!("Error: {message}");
    }
    println!();

    let header = format!("{:<8}{:<14}{:<18}ERROR", "RESORT", "STATUS", "CATEGORY");
    println!("{header}");
    for resort in &resorts {
        println!(
            "{:<8}{:<14}{:<18}{}",
            resort.resort_id,
            resort.status,
            resort.failure_category.as_deref().unwrap_or("-"),
            resort.error_message.as_deref().unwrap_or(""),
        );
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn fmt_time_renders_minutes() {
        let at = Utc.with_ymd_and_hms(2026, 2, 3, 4, 5, 6).unwrap();
        assert_eq!(fmt_time(Some(at)), "2026-02-03 04:05");
    }

    #[test]
    fn fmt_time_renders_missing_as_dash() {
        assert_eq!(fmt_time(None), "-");
    }
}
