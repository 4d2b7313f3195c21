//! Google Places contact enrichment.
//!
//! Two calls per resort: a text search for `"{name} ski resort"` biased to
//! the resort's coordinates, then a details lookup on the first candidate.

use async_trait::async_trait;
use snowdb_core::{ResortConfig, SourceKind};

use crate::adapter::{parse_json, RawPayload, SourceAdapter};
use crate::client::SourceClient;
use crate::error::AdapterError;
use crate::types::{PlaceDetailsResponse, PlacesSearchResponse};

pub const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

const SEARCH_RADIUS_M: u32 = 5_000;
const DETAIL_FIELDS: &str = "name,formatted_address,address_components,formatted_phone_number,international_phone_number,website";

pub struct GooglePlacesAdapter {
    client: SourceClient,
    base_url: String,
    api_key: String,
}

impl GooglePlacesAdapter {
    #[must_use]
    pub fn new(client: SourceClient, api_key: impl Into<String>) -> Self {
        Self::with_base_url(client, DEFAULT_BASE_URL, api_key)
    }

    #[must_use]
    pub fn with_base_url(
        client: SourceClient,
        base_url: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key: api_key.into(),
        }
    }

    async fn find_place_id(&self, config: &ResortConfig) -> Result<String, AdapterError> {
        let url = format!("{}/textsearch/json", self.base_url);
        let mut query = vec![("query", format!("{} ski resort", config.name))];
        if let Some((lat, lon)) = config.coordinates() {
            query.push(("location", format!("{lat},{lon}")));
            query.push(("radius", SEARCH_RADIUS_M.to_string()));
        }
        query.push(("key", self.api_key.clone()));

        let body = self.client.get_text(&url, &query).await?;
        let search: PlacesSearchResponse =
            parse_json(&body, || format!("places search for {}", config.slug))?;

        match search.status.as_str() {
            "OK" => search
                .results
                .into_iter()
                .next()
                .map(|candidate| candidate.place_id)
                .ok_or(AdapterError::NotFound { url }),
            "ZERO_RESULTS" => Err(AdapterError::NotFound { url }),
            other => Err(AdapterError::PlacesStatus {
                status: other.to_owned(),
            }),
        }
    }
}

#[async_trait]
impl SourceAdapter for GooglePlacesAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::GooglePlaces
    }

    fn source_url(&self, _config: &ResortConfig) -> Option<String> {
        None
    }

    async fn fetch_raw(&self, config: &ResortConfig) -> Result<String, AdapterError> {
        let place_id = self.find_place_id(config).await?;
        tracing::debug!(resort = %config.slug, place_id, "fetching place details");
        let url = format!("{}/details/json", self.base_url);
        self.client
            .get_text(
                &url,
                &[
                    ("place_id", place_id),
                    ("fields", DETAIL_FIELDS.to_owned()),
                    ("key", self.api_key.clone()),
                ],
            )
            .await
    }

    fn parse(&self, config: &ResortConfig, body: &str) -> Result<RawPayload, AdapterError> {
        let response: PlaceDetailsResponse =
            parse_json(body, || format!("place details for {}", config.slug))?;
        let PlaceDetailsResponse { status, result } = response;
        match (status.as_str(), result) {
            ("OK", Some(details)) => Ok(RawPayload::GooglePlaces(details)),
            ("OK" | "ZERO_RESULTS" | "NOT_FOUND", _) => Err(AdapterError::NotFound {
                url: format!("{}/details/json", self.base_url),
            }),
            (other, _) => Err(AdapterError::PlacesStatus {
                status: other.to_owned(),
            }),
        }
    }
}
