use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use super::tuning::MatchTuning;

/// Scan and cache settings.
///
/// Values are supplied by the surrounding settings file; this crate only reads
/// them. Missing keys fall back to the defaults below.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Allow the host to start scans on its own (startup, interval)
    pub auto_scan_enabled: bool,

    /// Minimum minutes between two automatic scans
    pub scan_interval_minutes: u64,

    /// Hours a completed scan stays fresh
    pub cache_expiry_hours: u64,

    /// Kick off a scan when the host starts
    pub scan_on_startup: bool,

    /// Matching constants
    pub tuning: MatchTuning,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            auto_scan_enabled: true,
            scan_interval_minutes: 30,
            cache_expiry_hours: 24,
            scan_on_startup: true,
            tuning: MatchTuning::default(),
        }
    }
}

impl Settings {
    /// Cache lifetime; absurdly large values saturate instead of overflowing
    pub fn cache_expiry(&self) -> TimeDelta {
        saturating_delta(self.cache_expiry_hours, TimeDelta::try_hours)
    }

    pub fn scan_interval(&self) -> TimeDelta {
        saturating_delta(self.scan_interval_minutes, TimeDelta::try_minutes)
    }
}

fn saturating_delta(amount: u64, unit: fn(i64) -> Option<TimeDelta>) -> TimeDelta {
    i64::try_from(amount)
        .ok()
        .and_then(unit)
        .unwrap_or(TimeDelta::MAX)
}

/// What kind of catalog entry is being checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Program,
    Driver,
}

impl std::fmt::Display for ItemKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemKind::Program => write!(f, "program"),
            ItemKind::Driver => write!(f, "driver"),
        }
    }
}

/// An entry of the external download catalog.
///
/// Only `name` and `kind` matter here; any other catalog metadata is ignored
/// when parsing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CatalogItem {
    pub name: String,
    pub kind: ItemKind,
}

impl CatalogItem {
    pub fn program(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Program,
        }
    }

    pub fn driver(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ItemKind::Driver,
        }
    }
}
