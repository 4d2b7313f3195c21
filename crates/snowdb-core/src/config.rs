use crate::app_config::{AppConfig, Environment};
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Parsing and validation are decoupled from the real environment so tests can
/// drive them with a plain `HashMap`.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let optional = |var: &str| -> Option<String> {
        lookup(var)
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
    };

    let invalid = |var: &str, reason: String| ConfigError::InvalidEnvVar {
        var: var.to_string(),
        reason,
    };

    let parse_u32 = |var: &str, default: &str| -> Result<u32, ConfigError> {
        or_default(var, default)
            .parse::<u32>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        or_default(var, default)
            .parse::<u64>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_usize = |var: &str, default: &str| -> Result<usize, ConfigError> {
        or_default(var, default)
            .parse::<usize>()
            .map_err(|e| invalid(var, e.to_string()))
    };

    let parse_bool = |var: &str, default: &str| -> Result<bool, ConfigError> {
        match or_default(var, default).to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Ok(true),
            "0" | "false" | "no" | "off" => Ok(false),
            other => Err(invalid(var, format!("expected a boolean, got '{other}'"))),
        }
    };

    let database_url = require("DATABASE_URL")?;
    let env = parse_environment(&or_default("SNOWDB_ENV", "development"))?;
    let log_level = or_default("SNOWDB_LOG_LEVEL", "info");
    let resorts_path = PathBuf::from(or_default("SNOWDB_RESORTS_PATH", "./config/resorts.yaml"));

    let db_max_connections = parse_u32("SNOWDB_DB_MAX_CONNECTIONS", "10")?;
    let db_min_connections = parse_u32("SNOWDB_DB_MIN_CONNECTIONS", "1")?;
    let db_acquire_timeout_secs = parse_u64("SNOWDB_DB_ACQUIRE_TIMEOUT_SECS", "10")?;

    let request_timeout_secs = parse_u64("SNOWDB_REQUEST_TIMEOUT_SECS", "15")?;
    let user_agent = or_default("SNOWDB_USER_AGENT", "snowdb/0.1 (resort-conditions)");

    let collect_concurrency = parse_usize("SNOWDB_COLLECT_CONCURRENCY", "10")?;
    if collect_concurrency == 0 {
        return Err(invalid(
            "SNOWDB_COLLECT_CONCURRENCY",
            "must be at least 1".to_string(),
        ));
    }

    let batch_deadline_secs = parse_u64("SNOWDB_BATCH_DEADLINE_SECS", "840")?;
    let deadline_margin_secs = parse_u64("SNOWDB_DEADLINE_MARGIN_SECS", "60")?;
    if deadline_margin_secs >= batch_deadline_secs {
        return Err(invalid(
            "SNOWDB_DEADLINE_MARGIN_SECS",
            format!("must be less than SNOWDB_BATCH_DEADLINE_SECS ({batch_deadline_secs})"),
        ));
    }

    let max_retries = parse_u32("SNOWDB_MAX_RETRIES", "2")?;
    let retry_backoff_base_ms = parse_u64("SNOWDB_RETRY_BACKOFF_BASE_MS", "1000")?;

    let failure_threshold = parse_u32("SNOWDB_FAILURE_THRESHOLD", "3")?;
    if failure_threshold == 0 {
        return Err(invalid(
            "SNOWDB_FAILURE_THRESHOLD",
            "must be at least 1".to_string(),
        ));
    }

    let weather_min_spacing_ms = parse_u64("SNOWDB_WEATHER_MIN_SPACING_MS", "200")?;
    let include_weather = parse_bool("SNOWDB_INCLUDE_WEATHER", "true")?;
    let openmeteo_api_key = optional("OPENMETEO_API_KEY");
    let google_maps_api_key = optional("GOOGLE_MAPS_API_KEY");

    Ok(AppConfig {
        database_url,
        env,
        log_level,
        resorts_path,
        db_max_connections,
        db_min_connections,
        db_acquire_timeout_secs,
        request_timeout_secs,
        user_agent,
        collect_concurrency,
        batch_deadline_secs,
        deadline_margin_secs,
        max_retries,
        retry_backoff_base_ms,
        failure_threshold,
        weather_min_spacing_ms,
        include_weather,
        openmeteo_api_key,
        google_maps_api_key,
    })
}

/// Parse a string into an `Environment` variant.
fn parse_environment(s: &str) -> Result<Environment, ConfigError> {
    match s {
        "development" => Ok(Environment::Development),
        "test" => Ok(Environment::Test),
        "production" => Ok(Environment::Production),
        other => Err(ConfigError::InvalidEnvVar {
            var: "SNOWDB_ENV".to_string(),
            reason: format!("unknown environment '{other}'"),
        }),
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
