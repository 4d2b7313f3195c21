//! Domain types shared across the snowdb workspace: resort configuration,
//! the canonical conditions record, and application configuration.

pub mod app_config;
pub mod config;
pub mod record;
pub mod resorts;

use thiserror::Error;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use record::{
    CanonicalRecord, ContactInfo, DailyForecast, Elevation, HourlyForecast, ResortStatus,
    SeasonDates, WeatherSummary,
};
pub use resorts::{load_resorts, ResortCatalog, ResortConfig, ResortId, ResortsFile, SourceKind};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read resorts file {path}: {source}")]
    ResortsFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse resorts file: {0}")]
    ResortsFileParse(#[from] serde_yaml::Error),

    #[error("resort configuration invalid: {0}")]
    Validation(String),
}
