//! Match engine
//!
//! Resolves a catalog name against the current scan snapshot. The snapshot is
//! held behind an `Arc` and swapped wholesale after each scan, so any number of
//! readers can match concurrently while a new snapshot is being installed.

use std::sync::{Arc, RwLock};
use tracing::{debug, trace};

use super::rules::{
    application_match, calculate_relevance_score, has_exclusions, has_keyword_overlap,
    is_dotnet_listing, is_relevant_match, ApplicationMatch, NameView,
};
use super::sources::InventorySource;
use super::types::{Inventory, InventoryEntry, MatchResult, ScanSnapshot};
use crate::config::{CatalogItem, ItemKind, MatchTuning};

/// Display name reported for the multimedia runtime, which no inventory lists
pub const MULTIMEDIA_RUNTIME_NAME: &str = "DirectX (system)";
/// Version reported for the multimedia runtime
pub const MULTIMEDIA_RUNTIME_VERSION: &str = "present, version unknown";

/// Inventory entry with its name pre-normalized
#[derive(Debug)]
struct IndexedEntry {
    entry: InventoryEntry,
    name: NameView,
}

#[derive(Debug)]
struct IndexedInventory {
    entries: Vec<IndexedEntry>,
}

impl IndexedInventory {
    fn build(inventory: &Inventory) -> Self {
        Self {
            entries: inventory
                .iter()
                .map(|entry| IndexedEntry {
                    name: NameView::new(&entry.display_name),
                    entry: entry.clone(),
                })
                .collect(),
        }
    }
}

/// A snapshot together with its normalized lookup tables
#[derive(Debug)]
struct PreparedSnapshot {
    snapshot: Arc<ScanSnapshot>,
    applications: IndexedInventory,
    drivers: IndexedInventory,
}

impl PreparedSnapshot {
    fn new(snapshot: ScanSnapshot) -> Self {
        Self {
            applications: IndexedInventory::build(&snapshot.applications),
            drivers: IndexedInventory::build(&snapshot.drivers),
            snapshot: Arc::new(snapshot),
        }
    }
}

pub struct MatchEngine {
    source: Arc<dyn InventorySource>,
    tuning: MatchTuning,
    current: RwLock<Option<Arc<PreparedSnapshot>>>,
}

impl MatchEngine {
    pub fn new(source: Arc<dyn InventorySource>, tuning: MatchTuning) -> Self {
        Self {
            source,
            tuning,
            current: RwLock::new(None),
        }
    }

    /// Install a new snapshot, replacing the previous one entirely
    pub fn replace_snapshot(&self, snapshot: ScanSnapshot) {
        debug!(
            applications = snapshot.applications.len(),
            drivers = snapshot.drivers.len(),
            "Installing scan snapshot"
        );
        let prepared = Arc::new(PreparedSnapshot::new(snapshot));
        match self.current.write() {
            Ok(mut guard) => *guard = Some(prepared),
            Err(poisoned) => *poisoned.into_inner() = Some(prepared),
        }
    }

    /// The snapshot of the last completed scan, if any
    pub fn snapshot(&self) -> Option<Arc<ScanSnapshot>> {
        self.prepared().map(|prepared| Arc::clone(&prepared.snapshot))
    }

    pub fn has_snapshot(&self) -> bool {
        self.prepared().is_some()
    }

    fn prepared(&self) -> Option<Arc<PreparedSnapshot>> {
        let guard = match self.current.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        guard.clone()
    }

    /// Resolve a catalog item using the path that fits its kind
    pub fn match_item(&self, item: &CatalogItem) -> MatchResult {
        match item.kind {
            ItemKind::Program => self.match_application(&item.name),
            ItemKind::Driver => self.match_driver_or_program(&item.name),
        }
    }

    /// Match a catalog program against installed applications.
    ///
    /// An inventory entry whose canonical name equals the catalog's wins;
    /// otherwise the first entry accepted by the keyword rules is returned.
    pub fn match_application(&self, catalog_name: &str) -> MatchResult {
        let Some(prepared) = self.prepared() else {
            return MatchResult::not_installed();
        };

        let catalog = NameView::new(catalog_name);
        let mut first_candidate: Option<&IndexedEntry> = None;

        for indexed in &prepared.applications.entries {
            match application_match(&catalog.normalized, &indexed.name.normalized, &self.tuning) {
                Some(ApplicationMatch::Exact) => {
                    trace!(catalog = catalog_name, installed = %indexed.entry.display_name, "Exact match");
                    return installed_result(&indexed.entry);
                }
                Some(ApplicationMatch::Keywords) if first_candidate.is_none() => {
                    first_candidate = Some(indexed);
                }
                _ => {}
            }
        }

        first_candidate
            .map(|indexed| installed_result(&indexed.entry))
            .unwrap_or_else(MatchResult::not_installed)
    }

    /// Match a catalog driver (or program) against applications, then drivers.
    ///
    /// Drivers are often shipped as installed applications (vendor control
    /// panels), so the application inventory is searched first; the driver
    /// listing is only consulted when it yields no candidate.
    pub fn match_driver_or_program(&self, catalog_name: &str) -> MatchResult {
        let catalog = NameView::new(catalog_name);

        if catalog.lower.contains("directx") && self.source.multimedia_runtime_present() {
            return MatchResult::installed(
                MULTIMEDIA_RUNTIME_NAME,
                Some(MULTIMEDIA_RUNTIME_VERSION.to_string()),
            );
        }

        let Some(prepared) = self.prepared() else {
            return MatchResult::not_installed();
        };

        self.best_candidate(&catalog, &prepared.applications)
            .or_else(|| self.best_candidate(&catalog, &prepared.drivers))
            .map(installed_result)
            .unwrap_or_else(MatchResult::not_installed)
    }

    fn best_candidate<'a>(
        &self,
        catalog: &NameView,
        inventory: &'a IndexedInventory,
    ) -> Option<&'a InventoryEntry> {
        let mut best: Option<(&InventoryEntry, f64)> = None;

        for indexed in &inventory.entries {
            if has_exclusions(&indexed.name, catalog) {
                continue;
            }

            let accepted = is_dotnet_listing(catalog, &indexed.name)
                || (has_keyword_overlap(catalog, &indexed.name, &self.tuning)
                    && is_relevant_match(catalog, &indexed.name, &self.tuning));
            if !accepted {
                continue;
            }

            let score = calculate_relevance_score(catalog, &indexed.name, &self.tuning);
            trace!(installed = %indexed.entry.display_name, score, "Scored candidate");

            match best {
                Some((_, best_score)) if best_score >= score => {}
                _ => best = Some((&indexed.entry, score)),
            }
        }

        best.map(|(entry, _)| entry)
    }
}

fn installed_result(entry: &InventoryEntry) -> MatchResult {
    MatchResult::installed(entry.display_name.clone(), entry.version.clone())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::sources::StaticInventorySource;
    use pretty_assertions::assert_eq;

    fn entry(name: &str, version: Option<&str>) -> InventoryEntry {
        InventoryEntry::new(name, version.map(str::to_string))
    }

    fn engine_with(applications: Vec<InventoryEntry>, drivers: Vec<InventoryEntry>) -> MatchEngine {
        engine_with_runtime(applications, drivers, false)
    }

    fn engine_with_runtime(
        applications: Vec<InventoryEntry>,
        drivers: Vec<InventoryEntry>,
        runtime_present: bool,
    ) -> MatchEngine {
        let source = StaticInventorySource::new(Vec::new(), Vec::new())
            .with_multimedia_runtime(runtime_present);
        let engine = MatchEngine::new(Arc::new(source), MatchTuning::default());
        engine.replace_snapshot(ScanSnapshot::new(
            applications.into_iter().collect(),
            drivers.into_iter().collect(),
        ));
        engine
    }

    #[test]
    fn test_no_snapshot_means_not_installed() {
        let engine = MatchEngine::new(
            Arc::new(StaticInventorySource::new(Vec::new(), Vec::new())),
            MatchTuning::default(),
        );
        assert!(!engine.has_snapshot());
        assert_eq!(engine.match_application("Git"), MatchResult::not_installed());
        assert_eq!(engine.match_driver_or_program("Git"), MatchResult::not_installed());
    }

    #[test]
    fn test_exact_match_preferred_over_superset() {
        // "Google Chrome Beta" sorts ahead of "Google chrome", so it is the
        // first keyword candidate; the exact canonical match must still win
        let engine = engine_with(
            vec![
                entry("Google Chrome Beta", Some("121.0")),
                entry("Google chrome", Some("120.0")),
            ],
            vec![],
        );

        let result = engine.match_application("Google Chrome");
        assert_eq!(result, MatchResult::installed("Google chrome", Some("120.0".to_string())));
    }

    #[test]
    fn test_first_candidate_without_exact() {
        let engine = engine_with(
            vec![entry("Mozilla Firefox (x64 en-US)", Some("121.0"))],
            vec![],
        );
        let result = engine.match_application("Firefox");
        assert!(result.installed);
        assert_eq!(result.exact_name.as_deref(), Some("Mozilla Firefox (x64 en-US)"));
    }

    #[test]
    fn test_opera_override() {
        let gx_only = engine_with(vec![entry("Opera GX 109.0", Some("109.0"))], vec![]);
        assert!(!gx_only.match_application("Opera").installed);

        let opera_only = engine_with(vec![entry("Opera 109.0", Some("109.0"))], vec![]);
        assert!(!opera_only.match_application("Opera GX").installed);
        assert!(opera_only.match_application("Opera").installed);
    }

    #[test]
    fn test_amd_brand_gating() {
        let installed = engine_with(vec![entry("AMD Software: Adrenalin Edition", Some("24.1.1"))], vec![]);
        let result = installed.match_driver_or_program("AMD Adrenalin");
        assert_eq!(
            result,
            MatchResult::installed("AMD Software: Adrenalin Edition", Some("24.1.1".to_string()))
        );

        let chipset_only = engine_with(vec![entry("AMD Chipset Driver", Some("5.08"))], vec![]);
        assert!(!chipset_only.match_driver_or_program("AMD Adrenalin").installed);
    }

    #[test]
    fn test_applications_searched_before_drivers() {
        let engine = engine_with(
            vec![entry("Realtek Audio Driver", Some("6.0"))],
            vec![entry("Realtek High Definition Audio", Some("6.0.9600"))],
        );
        let result = engine.match_driver_or_program("Realtek HD Audio");
        assert_eq!(result.exact_name.as_deref(), Some("Realtek Audio Driver"));
    }

    #[test]
    fn test_driver_inventory_fallback() {
        let engine = engine_with(
            vec![entry("VLC media player", Some("3.0.20"))],
            vec![entry("Realtek PCIe GbE Family Controller", Some("10.68"))],
        );
        let result = engine.match_driver_or_program("Realtek Ethernet PCIe GbE");
        assert_eq!(
            result,
            MatchResult::installed(
                "Realtek PCIe GbE Family Controller",
                Some("10.68".to_string())
            )
        );
    }

    #[test]
    fn test_highest_score_wins() {
        let engine = engine_with(
            vec![
                entry("Java Auto Updater", Some("2.8")),
                entry("Java 8 Update 391", Some("8.0.3910")),
                entry("Java SE Development Kit 21", Some("21.0")),
            ],
            vec![],
        );
        let result = engine.match_driver_or_program("Java");
        assert_eq!(result.exact_name.as_deref(), Some("Java SE Development Kit 21"));
    }

    #[test]
    fn test_dotnet_listing_bypasses_gate() {
        let engine = engine_with(
            vec![
                entry("Microsoft .NET Runtime - 8.0.1 (x64)", Some("8.0.1")),
                entry("Microsoft Edge", Some("120.0")),
            ],
            vec![],
        );
        let result = engine.match_driver_or_program(".NET Desktop Runtime");
        assert_eq!(result.exact_name.as_deref(), Some("Microsoft .NET Runtime - 8.0.1 (x64)"));
    }

    #[test]
    fn test_directx_sentinel() {
        let engine = engine_with_runtime(vec![], vec![], true);
        let result = engine.match_driver_or_program("DirectX End-User Runtime");
        assert_eq!(
            result,
            MatchResult::installed(
                MULTIMEDIA_RUNTIME_NAME,
                Some(MULTIMEDIA_RUNTIME_VERSION.to_string())
            )
        );

        let absent = engine_with_runtime(vec![], vec![], false);
        assert!(!absent.match_driver_or_program("DirectX").installed);
    }

    #[test]
    fn test_match_item_dispatches_on_kind() {
        let engine = engine_with(vec![entry("Intel Arc Software", Some("31.0"))], vec![]);
        // Program path needs two shared keywords, driver path accepts the shared brand
        assert!(!engine.match_item(&CatalogItem::program("Intel Graphics Command")).installed);
        assert!(engine.match_item(&CatalogItem::driver("Intel Graphics Command")).installed);
    }

    #[test]
    fn test_deterministic() {
        let engine = engine_with(
            vec![
                entry("NVIDIA GeForce Experience", Some("3.28")),
                entry("NVIDIA Graphics Driver", Some("546.33")),
                entry("NVIDIA PhysX System Software", Some("9.23")),
            ],
            vec![entry("NVIDIA GeForce RTX 4070", Some("31.0.15.4633"))],
        );
        let first = engine.match_driver_or_program("NVIDIA Graphics Driver");
        for _ in 0..10 {
            assert_eq!(engine.match_driver_or_program("NVIDIA Graphics Driver"), first);
        }
        assert_eq!(first.exact_name.as_deref(), Some("NVIDIA Graphics Driver"));
    }

    #[test]
    fn test_snapshot_replaced_wholesale() {
        let engine = engine_with(vec![entry("Git", Some("2.43.0"))], vec![]);
        assert!(engine.match_application("Git").installed);

        engine.replace_snapshot(ScanSnapshot::new(
            vec![entry("Zoom", None)].into_iter().collect(),
            Inventory::new(),
        ));
        assert!(!engine.match_application("Git").installed);
        assert_eq!(engine.snapshot().unwrap().applications.len(), 1);
    }
}
