//! Retry and call-spacing utilities for source adapters.
//!
//! Adapters never retry on their own. The collection manager decides whether
//! a resort gets retries at all and wraps the adapter call in
//! [`retry_with_backoff`]. [`CallSpacing`] enforces a minimum gap between
//! consecutive calls to a rate-limited upstream.

use std::future::Future;
use std::time::Duration;

use tokio::sync::Mutex;
use tokio::time::Instant;

use crate::error::AdapterError;

/// Upper bound on any single back-off sleep, including server-requested
/// `Retry-After` delays.
pub const MAX_RETRY_DELAY_MS: u64 = 30_000;

/// Returns `true` if `err` is a transient condition worth retrying.
///
/// Retriable:
/// - [`AdapterError::RateLimited`]: HTTP 429.
/// - [`AdapterError::Http`]: timeout or connection failure.
/// - [`AdapterError::Timeout`]: the caller's per-call bound elapsed.
/// - [`AdapterError::UnexpectedStatus`] with a 5xx status.
///
/// Everything else (404, parse failures, missing locators, places API
/// statuses) fails the same way on every attempt.
pub fn is_retriable(err: &AdapterError) -> bool {
    match err {
        AdapterError::RateLimited { .. } | AdapterError::Timeout { .. } => true,
        AdapterError::Http(e) => !e.is_decode() && !e.is_builder(),
        AdapterError::UnexpectedStatus { status, .. } => *status >= 500,
        AdapterError::Deserialize { .. }
        | AdapterError::Extract { .. }
        | AdapterError::NotFound { .. }
        | AdapterError::MissingLocator { .. }
        | AdapterError::PlacesStatus { .. }
        | AdapterError::Unsupported(_) => false,
    }
}

/// Executes `operation` with exponential back-off retries on transient errors.
///
/// The wait before retry `n` is `backoff_base_ms * 2^(n-1)` with ±25 % jitter.
/// A rate-limited response stretches the wait to its `Retry-After` value.
/// Both are capped at [`MAX_RETRY_DELAY_MS`]. With `max_retries = 2` the
/// operation runs at most three times.
///
/// # Errors
///
/// Returns the last error once retries are exhausted, or the first
/// non-retriable error immediately.
pub async fn retry_with_backoff<T, F, Fut>(
    max_retries: u32,
    backoff_base_ms: u64,
    mut operation: F,
) -> Result<T, AdapterError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AdapterError>>,
{
    let mut attempt = 0u32;
    loop {
        match operation().await {
            Ok(value) => return Ok(value),
            Err(err) => {
                if !is_retriable(&err) || attempt >= max_retries {
                    return Err(err);
                }
                attempt += 1;
                let computed = backoff_base_ms
                    .saturating_mul(1u64 << (attempt - 1).min(10))
                    .min(MAX_RETRY_DELAY_MS);
                #[allow(
                    clippy::cast_possible_truncation,
                    clippy::cast_sign_loss,
                    clippy::cast_precision_loss
                )]
                let jittered = (computed as f64 * (rand::random::<f64>() * 0.5 + 0.75)) as u64;
                let delay_ms = match &err {
                    AdapterError::RateLimited {
                        retry_after_secs, ..
                    } => jittered.max(retry_after_secs.saturating_mul(1000)),
                    _ => jittered,
                }
                .min(MAX_RETRY_DELAY_MS);

                tracing::warn!(
                    attempt,
                    max_retries,
                    delay_ms,
                    kind = %err.kind(),
                    error = %err,
                    "transient source error, retrying after back-off"
                );
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
            }
        }
    }
}

/// Minimum spacing between consecutive calls to one upstream.
///
/// Callers queue on an async mutex, so concurrent resort units are
/// serialized through the gap rather than bursting.
#[derive(Debug)]
pub struct CallSpacing {
    min_gap: Duration,
    last_call: Mutex<Option<Instant>>,
}

impl CallSpacing {
    #[must_use]
    pub fn new(min_gap: Duration) -> Self {
        Self {
            min_gap,
            last_call: Mutex::new(None),
        }
    }

    /// Spacing that never waits.
    #[must_use]
    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        !self.min_gap.is_zero()
    }

    /// Waits until at least `min_gap` has passed since the previous call,
    /// then records this call.
    pub async fn wait(&self) {
        if !self.is_enabled() {
            return;
        }
        let mut last_call = self.last_call.lock().await;
        if let Some(previous) = *last_call {
            tokio::time::sleep_until(previous + self.min_gap).await;
        }
        *last_call = Some(Instant::now());
    }
}
