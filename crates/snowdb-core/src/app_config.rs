use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub env: Environment,
    pub log_level: String,
    pub resorts_path: PathBuf,
    pub db_max_connections: u32,
    pub db_min_connections: u32,
    pub db_acquire_timeout_secs: u64,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    /// Upper bound on resorts collected concurrently within one batch.
    pub collect_concurrency: usize,
    /// Hard wall-clock budget for one batch, sized below the host's cutoff.
    pub batch_deadline_secs: u64,
    /// Dispatch of new resorts stops this long before the deadline.
    pub deadline_margin_secs: u64,
    pub max_retries: u32,
    pub retry_backoff_base_ms: u64,
    /// Consecutive failures after which a resort is suspended.
    pub failure_threshold: u32,
    pub weather_min_spacing_ms: u64,
    pub include_weather: bool,
    pub openmeteo_api_key: Option<String>,
    pub google_maps_api_key: Option<String>,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("log_level", &self.log_level)
            .field("resorts_path", &self.resorts_path)
            .field("database_url", &"[redacted]")
            .field("db_max_connections", &self.db_max_connections)
            .field("db_min_connections", &self.db_min_connections)
            .field("db_acquire_timeout_secs", &self.db_acquire_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("collect_concurrency", &self.collect_concurrency)
            .field("batch_deadline_secs", &self.batch_deadline_secs)
            .field("deadline_margin_secs", &self.deadline_margin_secs)
            .field("max_retries", &self.max_retries)
            .field("retry_backoff_base_ms", &self.retry_backoff_base_ms)
            .field("failure_threshold", &self.failure_threshold)
            .field("weather_min_spacing_ms", &self.weather_min_spacing_ms)
            .field("include_weather", &self.include_weather)
            .field(
                "openmeteo_api_key",
                &self.openmeteo_api_key.as_ref().map(|_| "[redacted]"),
            )
            .field(
                "google_maps_api_key",
                &self.google_maps_api_key.as_ref().map(|_| "[redacted]"),
            )
            .finish()
    }
}
