//! Records each batch as a `collection_runs` row with one
//! `collection_run_resorts` row per resort.

use async_trait::async_trait;
use snowdb_db::RunTotals;
use snowdb_pipeline::{BatchOutcome, LogReporter, OutcomeReporter};
use sqlx::PgPool;

pub(crate) struct RunReporter {
    pool: PgPool,
    trigger_source: &'static str,
}

impl RunReporter {
    pub(crate) fn new(pool: PgPool, trigger_source: &'static str) -> Self {
        Self {
            pool,
            trigger_source,
        }
    }

    async fn record(&self, outcome: &BatchOutcome) -> Result<(), snowdb_db::DbError> {
        let run =
            snowdb_db::create_collection_run(&self.pool, self.trigger_source, outcome.started_at)
                .await?;

        let result = self.record_resorts(run.id, outcome).await;
        if let Err(e) = result {
            fail_run_best_effort(&self.pool, run.id, format!("{e}")).await;
            return Err(e);
        }

        if outcome.all_failed() {
            let message = format!("all {} attempted resorts failed", outcome.attempted);
            fail_run_best_effort(&self.pool, run.id, message).await;
            return Ok(());
        }

        snowdb_db::complete_collection_run(&self.pool, run.id, run_totals(outcome)).await?;
        tracing::info!(run_id = run.id, public_id = %run.public_id, "collection run recorded");
        Ok(())
    }

    async fn record_resorts(
        &self,
        run_id: i64,
        outcome: &BatchOutcome,
    ) -> Result<(), snowdb_db::DbError> {
        for &resort_id in &outcome.collected {
            snowdb_db::upsert_collection_run_resort(
                &self.pool, run_id, resort_id, "succeeded", None, None,
            )
            .await?;
        }
        for failure in &outcome.failures {
            snowdb_db::upsert_collection_run_resort(
                &self.pool,
                run_id,
                failure.resort_id,
                "failed",
                Some(failure.category.as_str()),
                Some(&failure.message),
            )
            .await?;
        }
        for &resort_id in &outcome.not_attempted {
            snowdb_db::upsert_collection_run_resort(
                &self.pool,
                run_id,
                resort_id,
                "not_attempted",
                None,
                Some("batch deadline reached before dispatch"),
            )
            .await?;
        }
        for &resort_id in &outcome.interrupted {
            snowdb_db::upsert_collection_run_resort(
                &self.pool,
                run_id,
                resort_id,
                "interrupted",
                None,
                Some("cancelled at batch deadline"),
            )
            .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl OutcomeReporter for RunReporter {
    async fn report(&self, outcome: &BatchOutcome) {
        LogReporter.report(outcome).await;

        if let Err(e) = self.record(outcome).await {
            tracing::error!(error = %e, "collection run not recorded");
        }
    }
}

pub(crate) fn run_totals(outcome: &BatchOutcome) -> RunTotals {
    let count = |n: usize| i32::try_from(n).unwrap_or(i32::MAX);
    RunTotals {
        resorts_succeeded: count(outcome.succeeded),
        resorts_failed: count(outcome.failed()),
        resorts_skipped: count(outcome.not_attempted.len() + outcome.interrupted.len()),
        records_persisted: count(outcome.records_persisted),
        deadline_hit: outcome.deadline_hit,
    }
}

/// Attempt to mark a collection run as failed, logging any secondary error.
async fn fail_run_best_effort(pool: &PgPool, run_id: i64, message: String) {
    if let Err(mark_err) = snowdb_db::fail_collection_run(pool, run_id, &message).await {
        tracing::error!(
            run_id,
            error = %mark_err,
            "failed to mark collection run as failed"
        );
    }
}
