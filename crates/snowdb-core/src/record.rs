//! The canonical resort-conditions record.
//!
//! Every field serializes, either with a value or as an explicit `null`.
//! Nested blocks are always present so downstream consumers can rely on a
//! fixed key set.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::resorts::{ResortConfig, ResortId, SourceKind};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResortStatus {
    Open,
    Partial,
    Closed,
}

impl ResortStatus {
    /// Derives operating status from lift and trail counts.
    ///
    /// Any open lift means `Open`, even if the trail counts disagree. With no
    /// lifts open, some-but-not-all trails open means `Partial`. Everything
    /// else is `Closed`. Returns `None` when neither count is known.
    #[must_use]
    pub fn derive(
        lifts_open: Option<i32>,
        trails_open: Option<i32>,
        trails_total: Option<i32>,
    ) -> Option<Self> {
        if lifts_open.is_none() && trails_open.is_none() {
            return None;
        }
        if lifts_open.is_some_and(|n| n > 0) {
            return Some(ResortStatus::Open);
        }
        match (trails_open, trails_total) {
            (Some(open), Some(total)) if open > 0 && open < total => Some(ResortStatus::Partial),
            _ => Some(ResortStatus::Closed),
        }
    }

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ResortStatus::Open => "open",
            ResortStatus::Partial => "partial",
            ResortStatus::Closed => "closed",
        }
    }
}

impl std::fmt::Display for ResortStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Elevation bounds in metres.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Elevation {
    pub min: Option<i32>,
    pub max: Option<i32>,
    pub vertical: Option<i32>,
}

impl Elevation {
    #[must_use]
    pub fn new(min: Option<i32>, max: Option<i32>) -> Self {
        let vertical = min.zip(max).and_then(|(lo, hi)| hi.checked_sub(lo));
        Self { min, max, vertical }
    }

    /// Midpoint between base and summit.
    #[must_use]
    pub fn mid(&self) -> Option<i32> {
        self.min.zip(self.max).map(|(lo, hi)| {
            let mid = (i64::from(lo) + i64::from(hi)) / 2;
            // The midpoint of two i32 values always fits in i32.
            i32::try_from(mid).unwrap_or(lo)
        })
    }
}

/// Weather block merged from the forecast source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WeatherSummary {
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    /// 8-point compass label for `wind_direction_deg`.
    pub wind_direction: Option<String>,
    pub freezing_level_m: Option<f64>,
    pub freezing_level_avg_24h_m: Option<f64>,
    pub wind_speed_avg_24h_kmh: Option<f64>,
    pub temp_min_c: Option<f64>,
    pub temp_max_c: Option<f64>,
    pub snowfall_today_cm: Option<f64>,
    pub precipitation_today_mm: Option<f64>,
    pub sunrise: Option<String>,
    pub sunset: Option<String>,
    pub base_temp_c: Option<f64>,
    pub mid_temp_c: Option<f64>,
    pub summit_temp_c: Option<f64>,
    /// Today's maximum wind speed.
    pub wind_speed_max_kmh: Option<f64>,
    /// Next 24 hours, one entry per forecast hour.
    pub hourly_forecast: Option<Vec<HourlyForecast>>,
    /// Up to seven days starting today.
    pub forecast_7d: Option<Vec<DailyForecast>>,
}

/// One hour of the forecast. Values the source left null stay null.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HourlyForecast {
    pub time: String,
    pub temperature_c: Option<f64>,
    pub humidity_pct: Option<f64>,
    pub wind_speed_kmh: Option<f64>,
    pub wind_direction_deg: Option<f64>,
    pub freezing_level_m: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailyForecast {
    pub date: String,
    pub temp_max_c: Option<f64>,
    pub temp_min_c: Option<f64>,
    pub snowfall_cm: Option<f64>,
    pub precipitation_mm: Option<f64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactInfo {
    pub address: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip: Option<String>,
    pub phone: Option<String>,
    pub website: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonDates {
    pub opening_date: Option<String>,
    pub closing_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanonicalRecord {
    pub resort_id: ResortId,
    pub name: String,
    pub slug: String,
    pub location: Option<String>,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub elevation: Elevation,
    pub status: Option<ResortStatus>,
    pub new_snow_cm: Option<f64>,
    pub base_depth_cm: Option<f64>,
    pub lifts_open: Option<i32>,
    pub lifts_total: Option<i32>,
    pub trails_open: Option<i32>,
    pub trails_total: Option<i32>,
    pub temperature_c: Option<f64>,
    pub weather: WeatherSummary,
    pub contact: ContactInfo,
    pub season: SeasonDates,
    pub observed_at: DateTime<Utc>,
    pub source: SourceKind,
    pub source_url: Option<String>,
}

impl CanonicalRecord {
    /// A record carrying only the static fields from `config`; every dynamic
    /// field starts out `null`.
    #[must_use]
    pub fn from_config(
        config: &ResortConfig,
        source: SourceKind,
        source_url: Option<String>,
        observed_at: DateTime<Utc>,
    ) -> Self {
        Self {
            resort_id: config.id,
            name: config.name.clone(),
            slug: config.slug.clone(),
            location: config.location.clone(),
            lat: config.lat,
            lon: config.lon,
            elevation: config.elevation(),
            status: None,
            new_snow_cm: None,
            base_depth_cm: None,
            lifts_open: None,
            lifts_total: None,
            trails_open: None,
            trails_total: None,
            temperature_c: None,
            weather: WeatherSummary::default(),
            contact: ContactInfo::default(),
            season: SeasonDates::default(),
            observed_at,
            source,
            source_url,
        }
    }
}
