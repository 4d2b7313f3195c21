use serde::{Deserialize, Serialize};
use snowdb_core::SourceKind;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AdapterError {
    /// Transport failure. The request URL is stripped on conversion.
    #[error("HTTP error: {0}")]
    Http(reqwest::Error),

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("could not extract payload from {url}: {reason}")]
    Extract { url: String, reason: String },

    #[error("no response from {source_kind} within {after_ms}ms")]
    Timeout {
        source_kind: SourceKind,
        after_ms: u64,
    },

    #[error("rate limited by {host} (retry after {retry_after_secs}s)")]
    RateLimited { host: String, retry_after_secs: u64 },

    #[error("endpoint not found: {url}")]
    NotFound { url: String },

    #[error("resort {resort} has no {field} configured")]
    MissingLocator { resort: String, field: &'static str },

    #[error("unexpected HTTP status {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },

    #[error("places API returned status {status}")]
    PlacesStatus { status: String },

    #[error("no adapter registered for source {0}")]
    Unsupported(SourceKind),
}

impl From<reqwest::Error> for AdapterError {
    fn from(err: reqwest::Error) -> Self {
        // The URL may carry an API key in its query string.
        AdapterError::Http(err.without_url())
    }
}

/// Coarse classification of an adapter failure, recorded per resort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    NetworkError,
    RateLimited,
    ParseError,
    NotFound,
    UpstreamError,
}

impl FailureKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::NetworkError => "network_error",
            FailureKind::RateLimited => "rate_limited",
            FailureKind::ParseError => "parse_error",
            FailureKind::NotFound => "not_found",
            FailureKind::UpstreamError => "upstream_error",
        }
    }
}

impl std::fmt::Display for FailureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl AdapterError {
    #[must_use]
    pub fn kind(&self) -> FailureKind {
        match self {
            AdapterError::Http(e) if e.is_decode() => FailureKind::ParseError,
            AdapterError::Http(_) | AdapterError::Timeout { .. } => FailureKind::NetworkError,
            AdapterError::Deserialize { .. } | AdapterError::Extract { .. } => {
                FailureKind::ParseError
            }
            AdapterError::RateLimited { .. } => FailureKind::RateLimited,
            AdapterError::NotFound { .. } | AdapterError::MissingLocator { .. } => {
                FailureKind::NotFound
            }
            AdapterError::UnexpectedStatus { .. }
            | AdapterError::PlacesStatus { .. }
            | AdapterError::Unsupported(_) => FailureKind::UpstreamError,
        }
    }
}

/// A well-formed payload that cannot be mapped onto the canonical record.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum NormalizationError {
    #[error("missing required field `{field}`")]
    MissingRequiredField { field: &'static str },

    #[error("payload from {found} cannot be normalized for a resort bound to {expected}")]
    ShapeMismatch {
        expected: SourceKind,
        found: SourceKind,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classification_covers_every_variant() {
        let deser = serde_json::from_str::<()>("nope").unwrap_err();
        let cases = [
            (
                AdapterError::Deserialize {
                    context: "feed".to_owned(),
                    source: deser,
                },
                FailureKind::ParseError,
            ),
            (
                AdapterError::Extract {
                    url: "https://x".to_owned(),
                    reason: "no script".to_owned(),
                },
                FailureKind::ParseError,
            ),
            (
                AdapterError::RateLimited {
                    host: "api.open-meteo.com".to_owned(),
                    retry_after_secs: 60,
                },
                FailureKind::RateLimited,
            ),
            (
                AdapterError::NotFound {
                    url: "https://x".to_owned(),
                },
                FailureKind::NotFound,
            ),
            (
                AdapterError::MissingLocator {
                    resort: "vail".to_owned(),
                    field: "source_id",
                },
                FailureKind::NotFound,
            ),
            (
                AdapterError::UnexpectedStatus {
                    status: 503,
                    url: "https://x".to_owned(),
                },
                FailureKind::UpstreamError,
            ),
            (
                AdapterError::PlacesStatus {
                    status: "REQUEST_DENIED".to_owned(),
                },
                FailureKind::UpstreamError,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(err.kind(), expected, "{err}");
        }
    }

    #[test]
    fn failure_kind_serializes_snake_case() {
        let json = serde_json::to_string(&FailureKind::UpstreamError).unwrap();
        assert_eq!(json, "\"upstream_error\"");
        assert_eq!(FailureKind::NetworkError.to_string(), "network_error");
    }
}
