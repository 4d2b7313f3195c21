//! Shared HTTP client for all source adapters.

use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, StatusCode, Url};

use crate::error::AdapterError;

/// Fallback delay when a 429 response carries no usable `Retry-After`.
pub(crate) const DEFAULT_RETRY_AFTER_SECS: u64 = 60;

/// Thin wrapper over `reqwest::Client` that turns non-2xx responses into
/// typed [`AdapterError`]s.
///
/// The per-call timeout is applied on the underlying client, so every
/// adapter sharing a `SourceClient` gets the same bound. Retries are not
/// performed here.
#[derive(Clone)]
pub struct SourceClient {
    client: Client,
}

impl SourceClient {
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, AdapterError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .connect_timeout(Duration::from_secs(10))
            .user_agent(user_agent)
            .build()?;
        Ok(Self { client })
    }

    /// GETs `url` with `query` appended and returns the body as text.
    ///
    /// # Errors
    ///
    /// - [`AdapterError::RateLimited`] on HTTP 429.
    /// - [`AdapterError::NotFound`] on HTTP 404.
    /// - [`AdapterError::UnexpectedStatus`] on any other non-2xx status.
    /// - [`AdapterError::Http`] on transport failure or timeout.
    pub async fn get_text(
        &self,
        url: &str,
        query: &[(&str, String)],
    ) -> Result<String, AdapterError> {
        let response = self
            .client
            .get(url)
            .query(query)
            .header(
                reqwest::header::ACCEPT,
                "application/json,text/html;q=0.9,*/*;q=0.8",
            )
            .header(reqwest::header::ACCEPT_LANGUAGE, "en-US,en;q=0.9")
            .send()
            .await?;

        let status = response.status();
        let shown_url = display_url(response.url());

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(AdapterError::RateLimited {
                host: response.url().host_str().unwrap_or_default().to_owned(),
                retry_after_secs: retry_after_secs(response.headers()),
            });
        }

        if status == StatusCode::NOT_FOUND {
            return Err(AdapterError::NotFound { url: shown_url });
        }

        if !status.is_success() {
            return Err(AdapterError::UnexpectedStatus {
                status: status.as_u16(),
                url: shown_url,
            });
        }

        Ok(response.text().await?)
    }
}

/// Reads `Retry-After` as whole seconds, falling back to
/// [`DEFAULT_RETRY_AFTER_SECS`]. HTTP-date values are not interpreted.
pub(crate) fn retry_after_secs(headers: &HeaderMap) -> u64 {
    headers
        .get(reqwest::header::RETRY_AFTER)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse::<u64>().ok())
        .unwrap_or(DEFAULT_RETRY_AFTER_SECS)
}

/// Renders a URL for errors and logs with its query string removed, so API
/// keys passed as query parameters never leak.
pub(crate) fn display_url(url: &Url) -> String {
    let mut shown = url.clone();
    shown.set_query(None);
    shown.set_fragment(None);
    shown.to_string()
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
