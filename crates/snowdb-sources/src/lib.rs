//! Source adapters for resort conditions, the shared HTTP client, retry and
//! spacing helpers, and the normalizer that maps every source onto
//! [`snowdb_core::CanonicalRecord`].

pub mod adapter;
pub mod client;
pub mod error;
pub mod normalize;
pub(crate) mod parse_helpers;
pub mod rate_limit;
pub mod registry;
pub mod sources;
pub mod types;

pub use adapter::{RawCollection, RawCollectionResult, RawPayload, SourceAdapter};
pub use client::SourceClient;
pub use error::{AdapterError, FailureKind, NormalizationError};
pub use normalize::{apply_contact, apply_weather, normalize, normalize_collection};
pub use rate_limit::{retry_with_backoff, CallSpacing};
pub use registry::AdapterRegistry;
pub use sources::{GooglePlacesAdapter, MtnPowderAdapter, OnTheSnowAdapter, OpenMeteoAdapter};
