use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A piece of software or a driver present on the machine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryEntry {
    pub display_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

impl InventoryEntry {
    pub fn new(display_name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            display_name: display_name.into(),
            version,
        }
    }
}

/// One inventory collection, unique by display name.
///
/// Backed by an ordered map so every pass over it visits entries in the same
/// order, which keeps "first candidate wins" decisions deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inventory {
    entries: BTreeMap<String, InventoryEntry>,
}

impl Inventory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry; a duplicate name replaces the earlier version
    pub fn insert(&mut self, entry: InventoryEntry) {
        self.entries.insert(entry.display_name.clone(), entry);
    }

    pub fn get(&self, display_name: &str) -> Option<&InventoryEntry> {
        self.entries.get(display_name)
    }

    pub fn iter(&self) -> impl Iterator<Item = &InventoryEntry> {
        self.entries.values()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<InventoryEntry> for Inventory {
    fn from_iter<I: IntoIterator<Item = InventoryEntry>>(iter: I) -> Self {
        let mut inventory = Inventory::new();
        for entry in iter {
            inventory.insert(entry);
        }
        inventory
    }
}

/// Raw output of one full scan. Replaced wholesale by the next scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSnapshot {
    pub timestamp: DateTime<Utc>,
    pub applications: Inventory,
    pub drivers: Inventory,
}

impl ScanSnapshot {
    pub fn new(applications: Inventory, drivers: Inventory) -> Self {
        Self {
            timestamp: Utc::now(),
            applications,
            drivers,
        }
    }
}

/// Installation status of one catalog item.
///
/// Live matching and cache lookups return exactly this shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchResult {
    pub installed: bool,
    pub exact_name: Option<String>,
    pub version: Option<String>,
}

impl MatchResult {
    pub fn not_installed() -> Self {
        Self {
            installed: false,
            exact_name: None,
            version: None,
        }
    }

    pub fn installed(exact_name: impl Into<String>, version: Option<String>) -> Self {
        Self {
            installed: true,
            exact_name: Some(exact_name.into()),
            version,
        }
    }
}

/// Sizes of the inventories a scan produced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanSummary {
    pub programs_found: usize,
    pub drivers_found: usize,
}

impl ScanSummary {
    pub fn from_snapshot(snapshot: &ScanSnapshot) -> Self {
        Self {
            programs_found: snapshot.applications.len(),
            drivers_found: snapshot.drivers.len(),
        }
    }
}

/// Per-item statuses, split by catalog kind and keyed by catalog name
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemStatuses {
    pub programs: BTreeMap<String, MatchResult>,
    pub drivers: BTreeMap<String, MatchResult>,
}

impl ItemStatuses {
    pub fn is_empty(&self) -> bool {
        self.programs.is_empty() && self.drivers.is_empty()
    }
}
