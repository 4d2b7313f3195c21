//! OnTheSnow resort pages. The conditions live in the Next.js
//! `__NEXT_DATA__` bootstrap script embedded in the HTML.

use std::sync::LazyLock;

use async_trait::async_trait;
use regex::Regex;
use snowdb_core::{ResortConfig, SourceKind};

use crate::adapter::{parse_json, RawPayload, SourceAdapter};
use crate::client::SourceClient;
use crate::error::AdapterError;
use crate::types::OnTheSnowPage;

static NEXT_DATA_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)<script id="__NEXT_DATA__"[^>]*>(.*?)</script>"#).expect("valid regex")
});

pub struct OnTheSnowAdapter {
    client: SourceClient,
}

impl OnTheSnowAdapter {
    #[must_use]
    pub fn new(client: SourceClient) -> Self {
        Self { client }
    }

    fn page_url(config: &ResortConfig) -> Result<&str, AdapterError> {
        config
            .source_url
            .as_deref()
            .map(str::trim)
            .filter(|url| !url.is_empty())
            .ok_or_else(|| AdapterError::MissingLocator {
                resort: config.slug.clone(),
                field: "source_url",
            })
    }
}

/// Returns the raw JSON text of the `__NEXT_DATA__` script, if present.
pub(crate) fn extract_next_data(html: &str) -> Option<&str> {
    NEXT_DATA_RE
        .captures(html)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .filter(|json| !json.is_empty())
}

#[async_trait]
impl SourceAdapter for OnTheSnowAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::OnTheSnow
    }

    fn source_url(&self, config: &ResortConfig) -> Option<String> {
        Self::page_url(config).ok().map(str::to_owned)
    }

    async fn fetch_raw(&self, config: &ResortConfig) -> Result<String, AdapterError> {
        let url = Self::page_url(config)?;
        tracing::debug!(resort = %config.slug, url, "fetching onthesnow page");
        self.client.get_text(url, &[]).await
    }

    fn parse(&self, config: &ResortConfig, body: &str) -> Result<RawPayload, AdapterError> {
        let json = extract_next_data(body).ok_or_else(|| AdapterError::Extract {
            url: config.source_url.clone().unwrap_or_default(),
            reason: "no __NEXT_DATA__ script in page".to_owned(),
        })?;
        let page: OnTheSnowPage =
            parse_json(json, || format!("__NEXT_DATA__ for {}", config.slug))?;
        Ok(RawPayload::OnTheSnow(page))
    }
}
