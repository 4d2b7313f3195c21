use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use snowdb_core::ResortId;

/// Emitted once when a resort enters the suspended state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AlertEvent {
    pub resort_id: ResortId,
    pub slug: String,
    pub name: String,
    pub consecutive_failures: u32,
    pub last_failure_reason: Option<String>,
    pub suspended_at: DateTime<Utc>,
}

/// Alert sink. Implementations handle their own delivery failures.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, event: &AlertEvent);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, event: &AlertEvent) {
        tracing::error!(
            resort = %event.slug,
            resort_id = event.resort_id,
            consecutive_failures = event.consecutive_failures,
            reason = event.last_failure_reason.as_deref().unwrap_or("unknown"),
            "resort suspended after repeated collection failures"
        );
    }
}
