//! Open-Meteo forecast API, keyed by resort coordinates.
//!
//! The free endpoint is rate limited, so calls are spaced through a shared
//! [`CallSpacing`]. With an API key the customer endpoint is used instead and
//! spacing is switched off.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use snowdb_core::{ResortConfig, SourceKind};

use crate::adapter::{parse_json, RawPayload, SourceAdapter};
use crate::client::SourceClient;
use crate::error::AdapterError;
use crate::rate_limit::CallSpacing;
use crate::types::OpenMeteoForecast;

pub const FREE_BASE_URL: &str = "https://api.open-meteo.com";
pub const CUSTOMER_BASE_URL: &str = "https://customer-api.open-meteo.com";

const HOURLY_FIELDS: &str =
    "temperature_2m,relativehumidity_2m,windspeed_10m,winddirection_10m,freezinglevel_height";
const DAILY_FIELDS: &str = "sunrise,sunset,temperature_2m_max,temperature_2m_min,precipitation_sum,snowfall_sum,windspeed_10m_max";
const FORECAST_DAYS: u8 = 7;

pub struct OpenMeteoAdapter {
    client: SourceClient,
    base_url: String,
    api_key: Option<String>,
    spacing: Arc<CallSpacing>,
}

impl OpenMeteoAdapter {
    /// Builds the adapter for the public API. With `api_key` set the
    /// customer endpoint is used and `min_spacing` is ignored.
    #[must_use]
    pub fn new(client: SourceClient, api_key: Option<String>, min_spacing: Duration) -> Self {
        let base_url = if api_key.is_some() {
            CUSTOMER_BASE_URL
        } else {
            FREE_BASE_URL
        };
        Self::with_base_url(client, base_url, api_key, min_spacing)
    }

    #[must_use]
    pub fn with_base_url(
        client: SourceClient,
        base_url: impl Into<String>,
        api_key: Option<String>,
        min_spacing: Duration,
    ) -> Self {
        let spacing = if api_key.is_some() {
            CallSpacing::disabled()
        } else {
            CallSpacing::new(min_spacing)
        };
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            api_key,
            spacing: Arc::new(spacing),
        }
    }

    #[must_use]
    pub fn spacing_enabled(&self) -> bool {
        self.spacing.is_enabled()
    }

    fn forecast_url(&self) -> String {
        format!("{}/v1/forecast", self.base_url)
    }

    fn coordinates(config: &ResortConfig) -> Result<(f64, f64), AdapterError> {
        config
            .coordinates()
            .ok_or_else(|| AdapterError::MissingLocator {
                resort: config.slug.clone(),
                field: "coordinates",
            })
    }

    fn query(&self, lat: f64, lon: f64) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("latitude", lat.to_string()),
            ("longitude", lon.to_string()),
            ("hourly", HOURLY_FIELDS.to_owned()),
            ("daily", DAILY_FIELDS.to_owned()),
            ("temperature_unit", "celsius".to_owned()),
            ("windspeed_unit", "kmh".to_owned()),
            ("precipitation_unit", "mm".to_owned()),
            ("timezone", "auto".to_owned()),
            ("forecast_days", FORECAST_DAYS.to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("apikey", key.clone()));
        }
        query
    }
}

#[async_trait]
impl SourceAdapter for OpenMeteoAdapter {
    fn kind(&self) -> SourceKind {
        SourceKind::OpenMeteo
    }

    fn source_url(&self, config: &ResortConfig) -> Option<String> {
        config.coordinates().map(|(lat, lon)| {
            format!("{}?latitude={lat}&longitude={lon}", self.forecast_url())
        })
    }

    async fn fetch_raw(&self, config: &ResortConfig) -> Result<String, AdapterError> {
        let (lat, lon) = Self::coordinates(config)?;
        self.spacing.wait().await;
        tracing::debug!(resort = %config.slug, lat, lon, "fetching open-meteo forecast");
        self.client
            .get_text(&self.forecast_url(), &self.query(lat, lon))
            .await
    }

    fn parse(&self, config: &ResortConfig, body: &str) -> Result<RawPayload, AdapterError> {
        let forecast: OpenMeteoForecast =
            parse_json(body, || format!("open-meteo forecast for {}", config.slug))?;
        Ok(RawPayload::OpenMeteo(forecast))
    }
}
