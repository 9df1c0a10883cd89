use super::types::{CatalogItem, Settings};
use crate::{InstallWatchError, Result};
use std::path::Path;
use tracing::{debug, warn};

/// Loads scan settings from a JSON file
pub struct SettingsLoader;

impl SettingsLoader {
    /// Load settings, falling back to defaults when the file is missing or
    /// unreadable. A broken settings file never blocks scanning.
    pub fn load<P: AsRef<Path>>(path: P) -> Settings {
        let path = path.as_ref();
        if !path.exists() {
            debug!(path = %path.display(), "No settings file, using defaults");
            return Settings::default();
        }

        match Self::try_load(path) {
            Ok(settings) => settings,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to load settings, using defaults");
                Settings::default()
            }
        }
    }

    /// Load settings and report any read or parse failure
    pub fn try_load<P: AsRef<Path>>(path: P) -> Result<Settings> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            InstallWatchError::Config(format!("Failed to read settings file {}: {}", path.display(), e))
        })?;

        let settings: Settings = serde_json::from_str(&contents).map_err(|e| {
            InstallWatchError::Config(format!("Failed to parse settings file {}: {}", path.display(), e))
        })?;

        Self::validate(&settings)?;
        Ok(settings)
    }

    fn validate(settings: &Settings) -> Result<()> {
        let tuning = &settings.tuning;
        if !(0.0..=1.0).contains(&tuning.application_overlap_ratio)
            || !(0.0..=1.0).contains(&tuning.relevance_overlap_ratio)
        {
            return Err(InstallWatchError::Config(
                "Overlap ratios must be between 0 and 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Loads catalog items exported by the catalog layer
pub struct CatalogLoader;

impl CatalogLoader {
    /// Parse a JSON array of `{name, kind}` objects.
    ///
    /// Items with a blank name are dropped with a warning; anything else that
    /// does not fit the shape is an error.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<CatalogItem>> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            InstallWatchError::Catalog(format!("Failed to read catalog {}: {}", path.display(), e))
        })?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Vec<CatalogItem>> {
        let items: Vec<CatalogItem> = serde_json::from_str(contents)
            .map_err(|e| InstallWatchError::Catalog(format!("Invalid catalog: {}", e)))?;

        Ok(items
            .into_iter()
            .filter_map(|mut item| {
                let trimmed = item.name.trim();
                if trimmed.is_empty() {
                    warn!("Skipping catalog item with empty name");
                    return None;
                }
                item.name = trimmed.to_string();
                Some(item)
            })
            .collect())
    }
}
