//! Normalization from source-native payloads to [`CanonicalRecord`].
//!
//! Static fields (name, slug, location, coordinates, elevation) always come
//! from [`ResortConfig`], even when a payload reports its own values. Dynamic
//! fields come from the payload and stay `null` when the source omits them.
//! The observation timestamp is the payload's fetch time, so normalizing the
//! same payload twice yields the same record.

use snowdb_core::{
    CanonicalRecord, ContactInfo, DailyForecast, HourlyForecast, ResortConfig, ResortStatus,
    SourceKind, WeatherSummary,
};

use crate::adapter::{RawCollection, RawPayload};
use crate::error::NormalizationError;
use crate::parse_helpers::{
    compass_point, fahrenheit_to_celsius, inches_to_cm, lapse_adjust, leading_mean, round1,
};
use crate::types::{
    MtnPowderArea, MtnPowderFeed, OnTheSnowPage, OpenMeteoDaily, OpenMeteoForecast,
    OpenMeteoHourly, PlaceDetails,
};

/// Hourly samples needed before a 24-hour average is reported.
const AVERAGE_WINDOW_HOURS: usize = 24;
const FORECAST_HOURS: usize = 24;
const FORECAST_DAYS: usize = 7;

/// Normalizes a resort's primary payload.
///
/// # Errors
///
/// - [`NormalizationError::ShapeMismatch`] if the payload was not produced by
///   the resort's bound source.
/// - [`NormalizationError::MissingRequiredField`] if the configuration lacks a
///   name, or the payload lacks the fields its source must always carry.
pub fn normalize(
    config: &ResortConfig,
    raw: &RawCollection,
) -> Result<CanonicalRecord, NormalizationError> {
    if config.name.trim().is_empty() {
        return Err(NormalizationError::MissingRequiredField { field: "name" });
    }

    let found = raw.payload.kind();
    if found != config.source || !found.is_primary() {
        return Err(NormalizationError::ShapeMismatch {
            expected: config.source,
            found,
        });
    }

    let mut record = CanonicalRecord::from_config(
        config,
        raw.source,
        raw.source_url.clone(),
        raw.fetched_at,
    );

    match &raw.payload {
        RawPayload::MtnPowder(feed) => apply_mtnpowder(&mut record, feed)?,
        RawPayload::OnTheSnow(page) => apply_onthesnow(&mut record, page)?,
        RawPayload::OpenMeteo(forecast) => {
            record.weather = weather_summary(config, forecast);
            record.temperature_c = record.weather.temperature_c;
        }
        RawPayload::GooglePlaces(_) => {
            return Err(NormalizationError::ShapeMismatch {
                expected: config.source,
                found,
            })
        }
    }

    record.status = ResortStatus::derive(record.lifts_open, record.trails_open, record.trails_total);
    Ok(record)
}

/// Merges a weather payload into `record`. The record temperature is filled
/// from the weather block only when the primary source supplied none.
///
/// # Errors
///
/// Returns [`NormalizationError::ShapeMismatch`] unless `raw` is a forecast.
pub fn apply_weather(
    record: &mut CanonicalRecord,
    config: &ResortConfig,
    raw: &RawCollection,
) -> Result<(), NormalizationError> {
    let RawPayload::OpenMeteo(forecast) = &raw.payload else {
        return Err(NormalizationError::ShapeMismatch {
            expected: SourceKind::OpenMeteo,
            found: raw.payload.kind(),
        });
    };
    record.weather = weather_summary(config, forecast);
    if record.temperature_c.is_none() {
        record.temperature_c = record.weather.temperature_c;
    }
    Ok(())
}

/// Merges a places payload into `record.contact`.
///
/// # Errors
///
/// Returns [`NormalizationError::ShapeMismatch`] unless `raw` is a places
/// payload.
pub fn apply_contact(
    record: &mut CanonicalRecord,
    raw: &RawCollection,
) -> Result<(), NormalizationError> {
    let RawPayload::GooglePlaces(details) = &raw.payload else {
        return Err(NormalizationError::ShapeMismatch {
            expected: SourceKind::GooglePlaces,
            found: raw.payload.kind(),
        });
    };
    record.contact = contact_info(details);
    Ok(())
}

/// Normalizes the primary payload and merges any enrichment payloads.
///
/// # Errors
///
/// See [`normalize`], [`apply_weather`] and [`apply_contact`].
pub fn normalize_collection(
    config: &ResortConfig,
    primary: &RawCollection,
    weather: Option<&RawCollection>,
    contact: Option<&RawCollection>,
) -> Result<CanonicalRecord, NormalizationError> {
    let mut record = normalize(config, primary)?;
    if let Some(weather) = weather {
        apply_weather(&mut record, config, weather)?;
    }
    if let Some(contact) = contact {
        apply_contact(&mut record, contact)?;
    }
    Ok(record)
}

fn apply_mtnpowder(
    record: &mut CanonicalRecord,
    feed: &MtnPowderFeed,
) -> Result<(), NormalizationError> {
    if feed.name.as_deref().is_none_or(|n| n.trim().is_empty()) {
        return Err(NormalizationError::MissingRequiredField { field: "Name" });
    }

    if let Some(report) = &feed.snow_report {
        record.new_snow_cm = report
            .storm_total_cm
            .or_else(|| report.storm_total_in.map(inches_to_cm));
        record.base_depth_cm = area_depth_cm(report.base_area.as_ref())
            .or_else(|| area_depth_cm(report.summit_area.as_ref()));
        record.lifts_open = report.total_open_lifts;
        record.lifts_total = report.total_lifts;
        record.trails_open = report.total_open_trails;
        record.trails_total = report.total_trails;
    }

    record.temperature_c = feed
        .current_conditions
        .as_ref()
        .and_then(|c| c.base.as_ref())
        .and_then(|station| {
            station
                .temperature_c
                .or_else(|| station.temperature_f.map(fahrenheit_to_celsius))
        });

    record.season.opening_date = non_blank(feed.opening_date.as_deref());
    record.season.closing_date = non_blank(feed.closing_date.as_deref());
    Ok(())
}

fn area_depth_cm(area: Option<&MtnPowderArea>) -> Option<f64> {
    area.and_then(|a| a.base_cm.or_else(|| a.base_in.map(inches_to_cm)))
}

fn apply_onthesnow(
    record: &mut CanonicalRecord,
    page: &OnTheSnowPage,
) -> Result<(), NormalizationError> {
    let props = page.page_props();
    let resort = props
        .and_then(|p| p.full_resort.as_ref())
        .ok_or(NormalizationError::MissingRequiredField {
            field: "fullResort",
        })?;
    if resort.title.as_deref().is_none_or(|t| t.trim().is_empty()) {
        return Err(NormalizationError::MissingRequiredField { field: "title" });
    }

    if let Some(snow) = &resort.snow {
        record.new_snow_cm = snow.last24;
        record.base_depth_cm = snow.base.or(snow.summit);
    }
    if let Some(lifts) = &resort.lifts {
        record.lifts_open = lifts.open;
        record.lifts_total = lifts.total;
    }
    if let Some(runs) = &resort.runs {
        record.trails_open = runs.open;
        record.trails_total = runs.total;
    }
    if let Some(status) = &resort.status {
        record.season.opening_date = non_blank(status.opening_date.as_deref());
        record.season.closing_date = non_blank(status.closing_date.as_deref());
    }

    record.temperature_c = props
        .and_then(|p| p.short_weather.as_ref())
        .and_then(|w| w.temp.as_ref())
        .and_then(|range| range.min.zip(range.max))
        .map(|(min, max)| round1((min + max) / 2.0));
    Ok(())
}

fn weather_summary(config: &ResortConfig, forecast: &OpenMeteoForecast) -> WeatherSummary {
    let mut summary = WeatherSummary::default();

    if let Some(hourly) = &forecast.hourly {
        summary.temperature_c = first(&hourly.temperature_2m);
        summary.humidity_pct = first(&hourly.relativehumidity_2m);
        summary.wind_speed_kmh = first(&hourly.windspeed_10m);
        summary.wind_direction_deg = first(&hourly.winddirection_10m);
        summary.wind_direction = summary
            .wind_direction_deg
            .and_then(compass_point)
            .map(str::to_owned);
        summary.freezing_level_m = first(&hourly.freezinglevel_height);
        summary.freezing_level_avg_24h_m =
            leading_mean(&hourly.freezinglevel_height, AVERAGE_WINDOW_HOURS);
        summary.wind_speed_avg_24h_kmh = leading_mean(&hourly.windspeed_10m, AVERAGE_WINDOW_HOURS);
        summary.hourly_forecast = hourly_forecast(hourly);
    }

    if let Some(daily) = &forecast.daily {
        summary.temp_max_c = first(&daily.temperature_2m_max);
        summary.temp_min_c = first(&daily.temperature_2m_min);
        summary.snowfall_today_cm = first(&daily.snowfall_sum);
        summary.precipitation_today_mm = first(&daily.precipitation_sum);
        summary.sunrise = daily.sunrise.first().cloned().flatten();
        summary.sunset = daily.sunset.first().cloned().flatten();
        summary.wind_speed_max_kmh = first(&daily.windspeed_10m_max);
        summary.forecast_7d = daily_forecast(daily);
    }

    if let (Some(temperature), Some(grid_m)) = (summary.temperature_c, forecast.elevation) {
        let elevation = config.elevation();
        let at = |target: Option<i32>| {
            target.map(|m| lapse_adjust(temperature, grid_m, f64::from(m)))
        };
        summary.base_temp_c = at(elevation.min);
        summary.mid_temp_c = at(elevation.mid());
        summary.summit_temp_c = at(elevation.max);
    }

    summary
}

fn hourly_forecast(hourly: &OpenMeteoHourly) -> Option<Vec<HourlyForecast>> {
    let hours: Vec<HourlyForecast> = hourly
        .time
        .iter()
        .take(FORECAST_HOURS)
        .enumerate()
        .map(|(i, time)| HourlyForecast {
            time: time.clone(),
            temperature_c: nth(&hourly.temperature_2m, i),
            humidity_pct: nth(&hourly.relativehumidity_2m, i),
            wind_speed_kmh: nth(&hourly.windspeed_10m, i),
            wind_direction_deg: nth(&hourly.winddirection_10m, i),
            freezing_level_m: nth(&hourly.freezinglevel_height, i),
        })
        .collect();
    (!hours.is_empty()).then_some(hours)
}

fn daily_forecast(daily: &OpenMeteoDaily) -> Option<Vec<DailyForecast>> {
    let days: Vec<DailyForecast> = daily
        .time
        .iter()
        .take(FORECAST_DAYS)
        .enumerate()
        .map(|(i, date)| DailyForecast {
            date: date.clone(),
            temp_max_c: nth(&daily.temperature_2m_max, i),
            temp_min_c: nth(&daily.temperature_2m_min, i),
            snowfall_cm: nth(&daily.snowfall_sum, i),
            precipitation_mm: nth(&daily.precipitation_sum, i),
        })
        .collect();
    (!days.is_empty()).then_some(days)
}

fn contact_info(details: &PlaceDetails) -> ContactInfo {
    let mut street: Option<String> = None;
    let mut contact = ContactInfo::default();

    for component in &details.address_components {
        if component.has_type("street_number") || component.has_type("route") {
            street = Some(match street {
                Some(prefix) => format!("{prefix} {}", component.long_name),
                None => component.long_name.clone(),
            });
        } else if component.has_type("locality") {
            contact.city = non_blank(Some(component.long_name.as_str()));
        } else if component.has_type("administrative_area_level_1") {
            contact.state = non_blank(Some(component.short_name.as_str()));
        } else if component.has_type("postal_code") {
            contact.zip = non_blank(Some(component.long_name.as_str()));
        }
    }

    contact.address = street.or_else(|| details.formatted_address.clone());
    contact.phone = details
        .formatted_phone_number
        .clone()
        .or_else(|| details.international_phone_number.clone());
    contact.website = details.website.clone();
    contact
}

fn first(series: &[Option<f64>]) -> Option<f64> {
    nth(series, 0)
}

fn nth(series: &[Option<f64>], index: usize) -> Option<f64> {
    series.get(index).copied().flatten()
}

fn non_blank(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_owned)
}

#[cfg(test)]
#[path = "normalize_test.rs"]
mod tests;
