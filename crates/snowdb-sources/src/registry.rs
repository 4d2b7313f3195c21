//! Lookup table from [`SourceKind`] to the adapter that serves it.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use snowdb_core::{AppConfig, SourceKind};

use crate::adapter::SourceAdapter;
use crate::client::SourceClient;
use crate::error::AdapterError;
use crate::sources::{GooglePlacesAdapter, MtnPowderAdapter, OnTheSnowAdapter, OpenMeteoAdapter};

#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<SourceKind, Arc<dyn SourceAdapter>>,
}

impl AdapterRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the production registry. All adapters share one HTTP client.
    /// The places adapter is registered only when a Google Maps key is set.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Http`] if the HTTP client cannot be built.
    pub fn from_config(config: &AppConfig) -> Result<Self, AdapterError> {
        let client = SourceClient::new(config.request_timeout_secs, &config.user_agent)?;

        let mut registry = Self::new()
            .with(MtnPowderAdapter::new(client.clone()))
            .with(OnTheSnowAdapter::new(client.clone()))
            .with(OpenMeteoAdapter::new(
                client.clone(),
                config.openmeteo_api_key.clone(),
                Duration::from_millis(config.weather_min_spacing_ms),
            ));

        if let Some(key) = &config.google_maps_api_key {
            registry = registry.with(GooglePlacesAdapter::new(client, key.clone()));
        }

        Ok(registry)
    }

    /// Registers `adapter` under its own kind, replacing any previous entry.
    #[must_use]
    pub fn with<A: SourceAdapter + 'static>(mut self, adapter: A) -> Self {
        self.register(Arc::new(adapter));
        self
    }

    pub fn register(&mut self, adapter: Arc<dyn SourceAdapter>) {
        self.adapters.insert(adapter.kind(), adapter);
    }

    #[must_use]
    pub fn get(&self, kind: SourceKind) -> Option<Arc<dyn SourceAdapter>> {
        self.adapters.get(&kind).cloned()
    }

    /// Like [`AdapterRegistry::get`] but reports a missing adapter as an error.
    ///
    /// # Errors
    ///
    /// Returns [`AdapterError::Unsupported`] when nothing is registered for
    /// `kind`.
    pub fn require(&self, kind: SourceKind) -> Result<Arc<dyn SourceAdapter>, AdapterError> {
        self.get(kind).ok_or(AdapterError::Unsupported(kind))
    }

    #[must_use]
    pub fn contains(&self, kind: SourceKind) -> bool {
        self.adapters.contains_key(&kind)
    }
}

impl std::fmt::Debug for AdapterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut kinds: Vec<&str> = self.adapters.keys().map(|k| k.as_str()).collect();
        kinds.sort_unstable();
        f.debug_struct("AdapterRegistry")
            .field("adapters", &kinds)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_registry_reports_unsupported() {
        let registry = AdapterRegistry::new();
        assert!(!registry.contains(SourceKind::MtnPowder));
        assert!(matches!(
            registry.require(SourceKind::MtnPowder),
            Err(AdapterError::Unsupported(SourceKind::MtnPowder))
        ));
    }

    #[test]
    fn with_registers_under_adapter_kind() {
        let client = SourceClient::new(5, "snowdb-test/0.1").unwrap();
        let registry = AdapterRegistry::new()
            .with(OnTheSnowAdapter::new(client.clone()))
            .with(MtnPowderAdapter::new(client));
        assert!(registry.contains(SourceKind::OnTheSnow));
        assert!(registry.contains(SourceKind::MtnPowder));
        assert!(!registry.contains(SourceKind::GooglePlaces));
        assert_eq!(
            registry.get(SourceKind::OnTheSnow).unwrap().kind(),
            SourceKind::OnTheSnow
        );
        assert_eq!(
            format!("{registry:?}"),
            "AdapterRegistry { adapters: [\"mtnpowder\", \"onthesnow\"] }"
        );
    }
}
