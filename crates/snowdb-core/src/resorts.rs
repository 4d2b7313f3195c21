//! Static resort configuration loaded from `config/resorts.yaml`.
//!
//! The catalog is built once at process start and never mutated afterwards;
//! configuration changes take effect on restart.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::Elevation;
use crate::ConfigError;

/// Plausible elevations in metres, from below sea level to above any lift.
const ELEVATION_RANGE_M: std::ops::RangeInclusive<i32> = -500..=9_000;

pub type ResortId = i64;

/// Adapter-type tag a resort is bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    /// MtnPowder vendor feed, keyed by a numeric resort id.
    MtnPowder,
    /// OnTheSnow resort page with an embedded `__NEXT_DATA__` blob.
    OnTheSnow,
    /// Open-Meteo forecast API, keyed by coordinates.
    OpenMeteo,
    /// Google Places API; contact enrichment only.
    GooglePlaces,
}

impl SourceKind {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            SourceKind::MtnPowder => "mtnpowder",
            SourceKind::OnTheSnow => "onthesnow",
            SourceKind::OpenMeteo => "openmeteo",
            SourceKind::GooglePlaces => "googleplaces",
        }
    }

    /// Whether a resort may be bound to this source as its primary feed.
    #[must_use]
    pub fn is_primary(self) -> bool {
        !matches!(self, SourceKind::GooglePlaces)
    }
}

impl std::fmt::Display for SourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SourceKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "mtnpowder" => Ok(SourceKind::MtnPowder),
            "onthesnow" => Ok(SourceKind::OnTheSnow),
            "openmeteo" => Ok(SourceKind::OpenMeteo),
            "googleplaces" => Ok(SourceKind::GooglePlaces),
            other => Err(format!("unknown source kind '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResortConfig {
    pub id: ResortId,
    pub name: String,
    pub slug: String,
    /// Human-readable region label, e.g. `"Colorado, USA"`.
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
    /// Base elevation in metres.
    #[serde(default)]
    pub elevation_min: Option<i32>,
    /// Summit elevation in metres.
    #[serde(default)]
    pub elevation_max: Option<i32>,
    pub source: SourceKind,
    /// Vendor-side identifier (MtnPowder `resortId`).
    #[serde(default)]
    pub source_id: Option<String>,
    /// Page URL for scraped sources.
    #[serde(default)]
    pub source_url: Option<String>,
    #[serde(default)]
    pub enabled: bool,
    /// Suggested refresh cadence; informational only.
    #[serde(default)]
    pub update_interval_mins: Option<u32>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ResortConfig {
    /// Returns `(lat, lon)` when both are configured.
    #[must_use]
    pub fn coordinates(&self) -> Option<(f64, f64)> {
        self.lat.zip(self.lon)
    }

    #[must_use]
    pub fn elevation(&self) -> Elevation {
        Elevation::new(self.elevation_min, self.elevation_max)
    }

    /// The source-specific locator for the bound adapter, if configured.
    #[must_use]
    pub fn locator(&self) -> Option<&str> {
        match self.source {
            SourceKind::MtnPowder => self.source_id.as_deref(),
            SourceKind::OnTheSnow => self.source_url.as_deref(),
            SourceKind::OpenMeteo | SourceKind::GooglePlaces => None,
        }
        .filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Deserialize)]
pub struct ResortsFile {
    pub resorts: Vec<ResortConfig>,
}

/// Load and validate the resort configuration from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_resorts(path: &Path) -> Result<ResortsFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ResortsFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let resorts_file: ResortsFile = serde_yaml::from_str(&content)?;

    validate_resorts(&resorts_file.resorts)?;

    Ok(resorts_file)
}

fn validate_resorts(resorts: &[ResortConfig]) -> Result<(), ConfigError> {
    let mut seen_ids = HashSet::new();
    let mut seen_slugs = HashSet::new();

    for resort in resorts {
        if resort.name.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "resort {} has an empty name",
                resort.id
            )));
        }

        if !seen_ids.insert(resort.id) {
            return Err(ConfigError::Validation(format!(
                "duplicate resort id: {}",
                resort.id
            )));
        }

        let slug = resort.slug.trim().to_lowercase();
        if slug.is_empty() {
            return Err(ConfigError::Validation(format!(
                "resort '{}' has an empty slug",
                resort.name
            )));
        }
        if !seen_slugs.insert(slug) {
            return Err(ConfigError::Validation(format!(
                "duplicate resort slug: '{}' (from resort '{}')",
                resort.slug, resort.name
            )));
        }

        if !resort.source.is_primary() {
            return Err(ConfigError::Validation(format!(
                "resort '{}' cannot use {} as its primary source",
                resort.slug, resort.source
            )));
        }

        match resort.source {
            SourceKind::MtnPowder | SourceKind::OnTheSnow if resort.locator().is_none() => {
                let field = if resort.source == SourceKind::MtnPowder {
                    "source_id"
                } else {
                    "source_url"
                };
                return Err(ConfigError::Validation(format!(
                    "resort '{}' is bound to {} but has no {field}",
                    resort.slug, resort.source
                )));
            }
            SourceKind::OpenMeteo if resort.coordinates().is_none() => {
                return Err(ConfigError::Validation(format!(
                    "resort '{}' is bound to openmeteo but has no coordinates",
                    resort.slug
                )));
            }
            _ => {}
        }

        for (field, value) in [
            ("elevation_min", resort.elevation_min),
            ("elevation_max", resort.elevation_max),
        ] {
            if let Some(value) = value.filter(|v| !ELEVATION_RANGE_M.contains(v)) {
                return Err(ConfigError::Validation(format!(
                    "resort '{}' has {field} {value} outside {}..={} m",
                    resort.slug,
                    ELEVATION_RANGE_M.start(),
                    ELEVATION_RANGE_M.end()
                )));
            }
        }

        if let (Some(min), Some(max)) = (resort.elevation_min, resort.elevation_max) {
            if min > max {
                return Err(ConfigError::Validation(format!(
                    "resort '{}' has elevation_min {min} above elevation_max {max}",
                    resort.slug
                )));
            }
        }
    }

    Ok(())
}

/// In-memory, read-only index over the configured resorts.
///
/// Preserves file order for [`ResortCatalog::iter`] and
/// [`ResortCatalog::enabled`].
#[derive(Debug, Clone)]
pub struct ResortCatalog {
    resorts: Vec<ResortConfig>,
    by_id: HashMap<ResortId, usize>,
    by_slug: HashMap<String, usize>,
}

impl ResortCatalog {
    /// Builds a catalog from already-parsed entries, validating them first.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] on duplicate ids/slugs or missing
    /// source locators.
    pub fn new(resorts: Vec<ResortConfig>) -> Result<Self, ConfigError> {
        validate_resorts(&resorts)?;
        let by_id = resorts
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.id, idx))
            .collect();
        let by_slug = resorts
            .iter()
            .enumerate()
            .map(|(idx, r)| (r.slug.trim().to_lowercase(), idx))
            .collect();
        Ok(Self {
            resorts,
            by_id,
            by_slug,
        })
    }

    /// Loads and indexes the YAML configuration artifact.
    ///
    /// # Errors
    ///
    /// See [`load_resorts`].
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::new(load_resorts(path)?.resorts)
    }

    #[must_use]
    pub fn get(&self, id: ResortId) -> Option<&ResortConfig> {
        self.by_id.get(&id).map(|&idx| &self.resorts[idx])
    }

    #[must_use]
    pub fn get_by_slug(&self, slug: &str) -> Option<&ResortConfig> {
        self.by_slug
            .get(&slug.trim().to_lowercase())
            .map(|&idx| &self.resorts[idx])
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResortConfig> {
        self.resorts.iter()
    }

    pub fn enabled(&self) -> impl Iterator<Item = &ResortConfig> {
        self.resorts.iter().filter(|r| r.enabled)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resorts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resorts.is_empty()
    }
}

#[cfg(test)]
#[path = "resorts_test.rs"]
mod tests;
