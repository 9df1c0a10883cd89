//! Inventory scanner
//!
//! Turns raw source records into inventory collections. Scanning is
//! best-effort: unreadable records are skipped, and the `scan_*` variants
//! return an empty inventory when the whole source fails. The `try_scan_*`
//! variants surface the failure so the orchestrator can report it.

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::sources::{ApplicationRecord, DriverRecord, InventorySource};
use super::types::{Inventory, InventoryEntry};
use crate::error::ScanError;

/// Display names this short are installer leftovers, not products
const MIN_DISPLAY_NAME_CHARS: usize = 3;

pub struct InventoryScanner {
    source: Arc<dyn InventorySource>,
}

impl InventoryScanner {
    pub fn new(source: Arc<dyn InventorySource>) -> Self {
        Self { source }
    }

    /// Installed applications, or an empty inventory if the source fails
    pub fn scan_applications(&self) -> Inventory {
        self.try_scan_applications().unwrap_or_else(|e| {
            warn!(error = %e, "Application scan failed, using empty inventory");
            Inventory::new()
        })
    }

    /// Installed drivers, or an empty inventory if the source fails
    pub fn scan_drivers(&self) -> Inventory {
        self.try_scan_drivers().unwrap_or_else(|e| {
            warn!(error = %e, "Driver scan failed, using empty inventory");
            Inventory::new()
        })
    }

    pub fn try_scan_applications(&self) -> Result<Inventory, ScanError> {
        let records = self.source.applications()?;
        let total = records.len();
        let inventory: Inventory = records.into_iter().filter_map(application_entry).collect();

        let skipped = total - inventory.len();
        if skipped > 0 {
            debug!(skipped, "Skipped unreadable or duplicate application records");
        }
        info!(applications = inventory.len(), "Application scan complete");
        Ok(inventory)
    }

    pub fn try_scan_drivers(&self) -> Result<Inventory, ScanError> {
        let records = self.source.drivers()?;
        let total = records.len();
        let inventory: Inventory = records.into_iter().filter_map(driver_entry).collect();

        let skipped = total - inventory.len();
        if skipped > 0 {
            debug!(skipped, "Skipped unreadable or duplicate driver records");
        }
        info!(drivers = inventory.len(), "Driver scan complete");
        Ok(inventory)
    }

    pub fn is_platform_multimedia_runtime_present(&self) -> bool {
        self.source.multimedia_runtime_present()
    }
}

fn application_entry(record: ApplicationRecord) -> Option<InventoryEntry> {
    let name = record.display_name?.trim().to_string();
    if name.chars().count() < MIN_DISPLAY_NAME_CHARS {
        return None;
    }
    Some(InventoryEntry::new(name, clean_version(record.display_version)))
}

fn driver_entry(record: DriverRecord) -> Option<InventoryEntry> {
    let name = record.device_name?.trim().to_string();
    let version = clean_version(record.driver_version)?;
    if name.is_empty() {
        return None;
    }
    Some(InventoryEntry::new(name, Some(version)))
}

fn clean_version(version: Option<String>) -> Option<String> {
    version
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
