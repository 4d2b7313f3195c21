//! The source adapter contract.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use snowdb_core::{ResortConfig, SourceKind};

use crate::error::AdapterError;
use crate::types::{MtnPowderFeed, OnTheSnowPage, OpenMeteoForecast, PlaceDetails};

/// Shallow-parsed, source-native payload. One variant per source kind.
#[derive(Debug, Clone)]
pub enum RawPayload {
    MtnPowder(MtnPowderFeed),
    OnTheSnow(OnTheSnowPage),
    OpenMeteo(OpenMeteoForecast),
    GooglePlaces(PlaceDetails),
}

impl RawPayload {
    #[must_use]
    pub fn kind(&self) -> SourceKind {
        match self {
            RawPayload::MtnPowder(_) => SourceKind::MtnPowder,
            RawPayload::OnTheSnow(_) => SourceKind::OnTheSnow,
            RawPayload::OpenMeteo(_) => SourceKind::OpenMeteo,
            RawPayload::GooglePlaces(_) => SourceKind::GooglePlaces,
        }
    }
}

/// The product of one successful adapter call.
#[derive(Debug, Clone)]
pub struct RawCollection {
    pub source: SourceKind,
    /// Public URL of the fetched resource, for attribution. Never carries
    /// API keys.
    pub source_url: Option<String>,
    pub fetched_at: DateTime<Utc>,
    pub payload: RawPayload,
}

pub type RawCollectionResult = Result<RawCollection, AdapterError>;

/// Retrieves and shallow-parses data for one resort from one external origin.
///
/// Implementations must not retry and must not panic: every failure is
/// returned as an [`AdapterError`]. Instances are shared across concurrent
/// resort units.
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    fn kind(&self) -> SourceKind;

    /// Attribution URL recorded on the canonical record.
    fn source_url(&self, config: &ResortConfig) -> Option<String>;

    /// Performs the network retrieval and returns the response body.
    async fn fetch_raw(&self, config: &ResortConfig) -> Result<String, AdapterError>;

    /// Parses a body returned by [`SourceAdapter::fetch_raw`].
    fn parse(&self, config: &ResortConfig, body: &str) -> Result<RawPayload, AdapterError>;

    async fn fetch(&self, config: &ResortConfig) -> RawCollectionResult {
        let body = self.fetch_raw(config).await?;
        let payload = self.parse(config, &body)?;
        Ok(RawCollection {
            source: self.kind(),
            source_url: self.source_url(config),
            fetched_at: Utc::now(),
            payload,
        })
    }
}

/// Parses a JSON body into `T`, attaching `context` to the error.
pub(crate) fn parse_json<T: serde::de::DeserializeOwned>(
    body: &str,
    context: impl FnOnce() -> String,
) -> Result<T, AdapterError> {
    serde_json::from_str(body).map_err(|source| AdapterError::Deserialize {
        context: context(),
        source,
    })
}
