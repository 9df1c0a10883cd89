use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::config::ItemKind;
use crate::engine::{MatchResult, ScanSummary};

/// The persisted outcome of the last successful scan.
///
/// Written as one JSON document and replaced whole on every save.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheRecord {
    /// When the record was written; `None` for a record that was never saved
    #[serde(default)]
    pub last_scan: Option<DateTime<Utc>>,

    #[serde(default)]
    pub programs: BTreeMap<String, MatchResult>,

    #[serde(default)]
    pub drivers: BTreeMap<String, MatchResult>,

    #[serde(default)]
    pub scan_summary: ScanSummary,
}

impl CacheRecord {
    pub fn new(
        last_scan: DateTime<Utc>,
        programs: BTreeMap<String, MatchResult>,
        drivers: BTreeMap<String, MatchResult>,
        scan_summary: ScanSummary,
    ) -> Self {
        Self {
            last_scan: Some(last_scan),
            programs,
            drivers,
            scan_summary,
        }
    }

    /// True for a record that has never been written by a scan
    pub fn is_unscanned(&self) -> bool {
        self.last_scan.is_none()
    }

    pub fn statuses(&self, kind: ItemKind) -> &BTreeMap<String, MatchResult> {
        match kind {
            ItemKind::Program => &self.programs,
            ItemKind::Driver => &self.drivers,
        }
    }

    /// What the record knows about one catalog item
    pub fn lookup(&self, name: &str, kind: ItemKind) -> ItemState {
        match self.statuses(kind).get(name) {
            None => ItemState::NotScanned,
            Some(result) if result.installed => ItemState::Present(result.clone()),
            Some(_) => ItemState::Absent,
        }
    }
}

/// Cached knowledge about a single catalog item
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemState {
    /// No scan has recorded this item
    NotScanned,
    /// A scan checked the item and found nothing
    Absent,
    /// A scan found the item installed
    Present(MatchResult),
}

impl ItemState {
    /// The answer to serve, or `None` when the item needs a live check
    pub fn into_result(self) -> Option<MatchResult> {
        match self {
            ItemState::NotScanned => None,
            ItemState::Absent => Some(MatchResult::not_installed()),
            ItemState::Present(result) => Some(result),
        }
    }
}
