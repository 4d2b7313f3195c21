//! Read-side view combining static resort configuration with the most
//! recently collected record.

use std::sync::Arc;

use serde::Serialize;
use snowdb_core::{CanonicalRecord, ResortCatalog, ResortConfig, ResortId};

use crate::error::PipelineError;
use crate::store::RecordStore;

/// Static configuration plus the latest collected state, if any.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MergedResort {
    pub config: ResortConfig,
    /// `None` until the resort has been collected at least once.
    pub latest: Option<CanonicalRecord>,
}

impl MergedResort {
    /// Static fields on `latest` are overwritten from `config`.
    #[must_use]
    pub fn new(config: ResortConfig, latest: Option<CanonicalRecord>) -> Self {
        let latest = latest.map(|mut record| {
            record.name.clone_from(&config.name);
            record.slug.clone_from(&config.slug);
            record.location.clone_from(&config.location);
            record.lat = config.lat;
            record.lon = config.lon;
            record.elevation = config.elevation();
            record
        });
        Self { config, latest }
    }
}

#[derive(Clone)]
pub struct ConfigMergeLayer {
    catalog: Arc<ResortCatalog>,
    store: Arc<dyn RecordStore>,
}

impl ConfigMergeLayer {
    #[must_use]
    pub fn new(catalog: Arc<ResortCatalog>, store: Arc<dyn RecordStore>) -> Self {
        Self { catalog, store }
    }

    #[must_use]
    pub fn catalog(&self) -> &ResortCatalog {
        &self.catalog
    }

    /// The record store collected batches are written to.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn RecordStore> {
        &self.store
    }

    /// Enabled resorts in configuration-file order.
    #[must_use]
    pub fn list_enabled(&self) -> Vec<ResortConfig> {
        self.catalog.enabled().cloned().collect()
    }

    #[must_use]
    pub fn get(&self, resort_id: ResortId) -> Option<&ResortConfig> {
        self.catalog.get(resort_id)
    }

    #[must_use]
    pub fn get_by_slug(&self, slug: &str) -> Option<&ResortConfig> {
        self.catalog.get_by_slug(slug)
    }

    /// Returns `Ok(None)` for an id that is not in the catalog.
    ///
    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] if the latest record cannot be read.
    pub async fn resolve(&self, resort_id: ResortId) -> Result<Option<MergedResort>, PipelineError> {
        let Some(config) = self.catalog.get(resort_id) else {
            return Ok(None);
        };
        let latest = self.store.get_latest(resort_id).await?;
        Ok(Some(MergedResort::new(config.clone(), latest)))
    }

    /// # Errors
    ///
    /// Returns [`PipelineError::Store`] if the latest record cannot be read.
    pub async fn resolve_by_slug(&self, slug: &str) -> Result<Option<MergedResort>, PipelineError> {
        match self.catalog.get_by_slug(slug) {
            Some(config) => self.resolve(config.id).await,
            None => Ok(None),
        }
    }
}

impl std::fmt::Debug for ConfigMergeLayer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigMergeLayer")
            .field("resorts", &self.catalog.len())
            .finish_non_exhaustive()
    }
}
