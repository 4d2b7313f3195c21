//! Source-native response models.
//!
//! Every field is optional: upstreams drop keys freely and the normalizer
//! decides which absences are fatal. Numeric fields go through the lenient
//! deserializers because the vendor feed sends most numbers as strings.
//!
//! ### MtnPowder feed
//! Counts arrive as integers or numeric strings depending on the resort.
//! Depths and storm totals are reported in both centimetres and inches; the
//! centimetre field is sometimes blank while the inch field is filled.
//!
//! ### OnTheSnow `__NEXT_DATA__`
//! The resort page embeds a Next.js bootstrap blob. Only
//! `props.pageProps.fullResort` and `props.pageProps.shortWeather` are used.
//! `status.openFlag` is 0 (open), 1 (partial) or 2 (closed) but is ignored in
//! favour of the lift/trail counts.
//!
//! ### Open-Meteo
//! Hourly and daily series are parallel arrays indexed by `time`; individual
//! entries may be `null`. `elevation` is the forecast grid cell's height.

use serde::Deserialize;

use crate::parse_helpers::{lenient_f64, lenient_i32};

// ---------------------------------------------------------------------------
// MtnPowder
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MtnPowderFeed {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub operating_status: Option<String>,
    #[serde(default)]
    pub opening_date: Option<String>,
    #[serde(default)]
    pub closing_date: Option<String>,
    #[serde(default)]
    pub snow_report: Option<MtnPowderSnowReport>,
    #[serde(default)]
    pub current_conditions: Option<MtnPowderConditions>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MtnPowderSnowReport {
    #[serde(rename = "StormTotalCM", default, deserialize_with = "lenient_f64")]
    pub storm_total_cm: Option<f64>,
    #[serde(rename = "StormTotalIn", default, deserialize_with = "lenient_f64")]
    pub storm_total_in: Option<f64>,
    #[serde(rename = "TotalOpenLifts", default, deserialize_with = "lenient_i32")]
    pub total_open_lifts: Option<i32>,
    #[serde(rename = "TotalLifts", default, deserialize_with = "lenient_i32")]
    pub total_lifts: Option<i32>,
    #[serde(rename = "TotalOpenTrails", default, deserialize_with = "lenient_i32")]
    pub total_open_trails: Option<i32>,
    #[serde(rename = "TotalTrails", default, deserialize_with = "lenient_i32")]
    pub total_trails: Option<i32>,
    #[serde(rename = "BaseArea", default)]
    pub base_area: Option<MtnPowderArea>,
    #[serde(rename = "SummitArea", default)]
    pub summit_area: Option<MtnPowderArea>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MtnPowderArea {
    #[serde(rename = "BaseCm", default, deserialize_with = "lenient_f64")]
    pub base_cm: Option<f64>,
    #[serde(rename = "BaseIn", default, deserialize_with = "lenient_f64")]
    pub base_in: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct MtnPowderConditions {
    #[serde(default)]
    pub base: Option<MtnPowderStation>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct MtnPowderStation {
    #[serde(rename = "TemperatureC", default, deserialize_with = "lenient_f64")]
    pub temperature_c: Option<f64>,
    #[serde(rename = "TemperatureF", default, deserialize_with = "lenient_f64")]
    pub temperature_f: Option<f64>,
}

// ---------------------------------------------------------------------------
// OnTheSnow
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnTheSnowPage {
    #[serde(default)]
    pub props: Option<OnTheSnowProps>,
}

impl OnTheSnowPage {
    #[must_use]
    pub fn page_props(&self) -> Option<&OnTheSnowPageProps> {
        self.props.as_ref().and_then(|p| p.page_props.as_ref())
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnTheSnowProps {
    #[serde(default)]
    pub page_props: Option<OnTheSnowPageProps>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnTheSnowPageProps {
    #[serde(default)]
    pub full_resort: Option<OnTheSnowResort>,
    #[serde(default)]
    pub short_weather: Option<OnTheSnowWeather>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnTheSnowResort {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub snow: Option<OnTheSnowSnow>,
    #[serde(default)]
    pub lifts: Option<OnTheSnowCounts>,
    #[serde(default)]
    pub runs: Option<OnTheSnowCounts>,
    #[serde(default)]
    pub status: Option<OnTheSnowStatus>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub latitude: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub longitude: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnTheSnowSnow {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub last24: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub base: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub summit: Option<f64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnTheSnowCounts {
    #[serde(default, deserialize_with = "lenient_i32")]
    pub open: Option<i32>,
    #[serde(default, deserialize_with = "lenient_i32")]
    pub total: Option<i32>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OnTheSnowStatus {
    #[serde(default, deserialize_with = "lenient_i32")]
    pub open_flag: Option<i32>,
    #[serde(default)]
    pub opening_date: Option<String>,
    #[serde(default)]
    pub closing_date: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnTheSnowWeather {
    #[serde(default)]
    pub temp: Option<OnTheSnowTempRange>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OnTheSnowTempRange {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub min: Option<f64>,
    #[serde(default, deserialize_with = "lenient_f64")]
    pub max: Option<f64>,
}

// ---------------------------------------------------------------------------
// Open-Meteo
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenMeteoForecast {
    #[serde(default)]
    pub latitude: Option<f64>,
    #[serde(default)]
    pub longitude: Option<f64>,
    /// Height of the forecast grid cell in metres.
    #[serde(default)]
    pub elevation: Option<f64>,
    #[serde(default)]
    pub timezone: Option<String>,
    #[serde(default)]
    pub hourly: Option<OpenMeteoHourly>,
    #[serde(default)]
    pub daily: Option<OpenMeteoDaily>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenMeteoHourly {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub temperature_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub relativehumidity_2m: Vec<Option<f64>>,
    #[serde(default)]
    pub windspeed_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub winddirection_10m: Vec<Option<f64>>,
    #[serde(default)]
    pub freezinglevel_height: Vec<Option<f64>>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct OpenMeteoDaily {
    #[serde(default)]
    pub time: Vec<String>,
    #[serde(default)]
    pub sunrise: Vec<Option<String>>,
    #[serde(default)]
    pub sunset: Vec<Option<String>>,
    #[serde(default)]
    pub temperature_2m_max: Vec<Option<f64>>,
    #[serde(default)]
    pub temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    pub precipitation_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub snowfall_sum: Vec<Option<f64>>,
    #[serde(default)]
    pub windspeed_10m_max: Vec<Option<f64>>,
}

// ---------------------------------------------------------------------------
// Google Places
// ---------------------------------------------------------------------------

/// Response of `place/textsearch/json`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlacesSearchResponse {
    pub status: String,
    #[serde(default)]
    pub results: Vec<PlaceCandidate>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceCandidate {
    pub place_id: String,
}

/// Response of `place/details/json`.
#[derive(Debug, Clone, Deserialize)]
pub struct PlaceDetailsResponse {
    pub status: String,
    #[serde(default)]
    pub result: Option<PlaceDetails>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub formatted_address: Option<String>,
    #[serde(default)]
    pub address_components: Vec<AddressComponent>,
    #[serde(default)]
    pub formatted_phone_number: Option<String>,
    #[serde(default)]
    pub international_phone_number: Option<String>,
    #[serde(default)]
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressComponent {
    #[serde(default)]
    pub long_name: String,
    #[serde(default)]
    pub short_name: String,
    #[serde(default)]
    pub types: Vec<String>,
}

impl AddressComponent {
    #[must_use]
    pub fn has_type(&self, kind: &str) -> bool {
        self.types.iter().any(|t| t == kind)
    }
}
