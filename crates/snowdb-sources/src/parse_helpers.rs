//! Lenient number parsing and unit conversions shared by the source models
//! and the normalizer.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Standard atmosphere lapse rate, °C per metre.
pub(crate) const LAPSE_RATE_C_PER_M: f64 = 6.5 / 1000.0;

const COMPASS_POINTS: [&str; 8] = ["N", "NE", "E", "SE", "S", "SW", "W", "NW"];

/// Accepts a JSON number, a numeric string (`"12"`, `" 12.5 "`), or null.
/// Empty and non-numeric strings become `None`.
pub(crate) fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(value_as_f64))
}

/// Like [`lenient_f64`] but for counts. Fractional values are truncated.
pub(crate) fn lenient_i32<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    #[allow(clippy::cast_possible_truncation)]
    let count = value
        .as_ref()
        .and_then(value_as_f64)
        .filter(|n| *n >= f64::from(i32::MIN) && *n <= f64::from(i32::MAX))
        .map(|n| n as i32);
    Ok(count)
}

pub(crate) fn value_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_number(s),
        _ => None,
    }
}

pub(crate) fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

pub(crate) fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub(crate) fn inches_to_cm(inches: f64) -> f64 {
    round1(inches * 2.54)
}

pub(crate) fn fahrenheit_to_celsius(fahrenheit: f64) -> f64 {
    round1((fahrenheit - 32.0) * 5.0 / 9.0)
}

/// Maps a bearing in degrees onto an 8-point compass label.
pub(crate) fn compass_point(degrees: f64) -> Option<&'static str> {
    if !degrees.is_finite() {
        return None;
    }
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let sector = ((degrees / 45.0).round() as i64).rem_euclid(8) as usize;
    COMPASS_POINTS.get(sector).copied()
}

/// Mean of the first `window` samples, rounded to 0.1. `None` unless all
/// `window` samples are present.
pub(crate) fn leading_mean(samples: &[Option<f64>], window: usize) -> Option<f64> {
    if window == 0 || samples.len() < window {
        return None;
    }
    let leading: Option<Vec<f64>> = samples[..window].iter().copied().collect();
    #[allow(clippy::cast_precision_loss)]
    let divisor = window as f64;
    leading.map(|values| round1(values.iter().sum::<f64>() / divisor))
}

/// Moves a temperature observed at `from_m` to `to_m` along the standard
/// lapse rate.
pub(crate) fn lapse_adjust(temperature_c: f64, from_m: f64, to_m: f64) -> f64 {
    round1(temperature_c - (to_m - from_m) * LAPSE_RATE_C_PER_M)
}
