//! Inventory scanning and catalog matching
//!
//! - `sources` enumerate raw records from the platform or a fixture
//! - `scanner` turns records into inventories
//! - `normalizer` and `rules` hold the name-matching heuristics
//! - `matcher` resolves catalog items against the current snapshot
//! - `orchestrator` drives full scans and publishes `events`

pub mod events;
pub mod matcher;
pub mod normalizer;
pub mod orchestrator;
pub mod rules;
pub mod scanner;
pub mod sources;
pub mod types;

pub use events::{ScanEvent, ScanStage};
pub use matcher::{MatchEngine, MULTIMEDIA_RUNTIME_NAME, MULTIMEDIA_RUNTIME_VERSION};
pub use normalizer::{normalize, NormalizedName};
pub use orchestrator::{BackgroundScan, ScanOrchestrator, ScanOutcome};
pub use scanner::InventoryScanner;
pub use sources::{
    ApplicationRecord, DriverRecord, FixtureInventorySource, InventorySource,
    StaticInventorySource, SystemInventorySource,
};
pub use types::{Inventory, InventoryEntry, ItemStatuses, MatchResult, ScanSnapshot, ScanSummary};
