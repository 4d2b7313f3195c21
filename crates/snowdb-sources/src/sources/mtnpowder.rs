//! MtnPowder vendor feed: `GET /feed?resortId={source_id}`.

use async_trait::async_trait;
use snowdb_core::{ResortConfig, SourceKind};

use crate::adapter::{parse_json, RawPayload, SourceAdapter};
use crate::client::SourceClient;
use crate::error::AdapterError;
use crate::types::MtnPowderFeed;

pub const DEFAULT_BASE_URL: &str = "https://www.mtnpowder.com";

pub struct MtnPowderAdapter {
    client: SourceClient,
    base_url: String,
}

impl MtnPowderAdapter {
    #[must_use]
    pub fn new(client: SourceClient) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL)
    }

    #[must_use]
    pub fn with_base_url(client: SourceClient, base_url: impl Into<String>) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    fn feed_url(&self) -> String {
        format!("{}/feed", self.base_url)
    }

    fn resort_id(config: &ResortConfig) -> Result<&str, AdapterError> {
        config
            .source_id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| AdapterError::MissingLocator {
                resort: config.slug.clone(),
                field: "source_id",
            })
    }
}

#[async_trait]
impl SourceAdapter for MtnPowderAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::MtnPowder
    }

    fn source_url(&self, config: &ResortConfig) -> Option<String> {
        Self::resort_id(config)
            .ok()
            .map(|id| format!("{}?resortId={id}", self.feed_url()))
    }

    async fn fetch_raw(&self, config: &ResortConfig) -> Result<String, AdapterError> {
        let resort_id = Self::resort_id(config)?;
        tracing::debug!(resort = %config.slug, resort_id, "fetching mtnpowder feed");
        self.client
            .get_text(&self.feed_url(), &[("resortId", resort_id.to_owned())])
            .await
    }

    fn parse(&self, config: &ResortConfig, body: &str) -> Result<RawPayload, AdapterError> {
        let feed: MtnPowderFeed =
            parse_json(body, || format!("mtnpowder feed for {}", config.slug))?;
        Ok(RawPayload::MtnPowder(feed))
    }
}
