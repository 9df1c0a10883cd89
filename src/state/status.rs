use std::sync::Arc;
use tracing::trace;

use super::manager::StatusCache;
use crate::config::{CatalogItem, ItemKind, Settings};
use crate::engine::{ItemStatuses, MatchEngine, MatchResult};

/// Answers "is this catalog item installed?" for the UI layer.
///
/// A fresh cache entry is served as is. Otherwise the item is matched live
/// against the last scan snapshot; with no snapshot yet it reports not
/// installed.
pub struct InstallationStatusService {
    engine: Arc<MatchEngine>,
    cache: Arc<StatusCache>,
    settings: Settings,
}

impl InstallationStatusService {
    pub fn new(engine: Arc<MatchEngine>, cache: Arc<StatusCache>, settings: Settings) -> Self {
        Self {
            engine,
            cache,
            settings,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn status_for(&self, item: &CatalogItem) -> MatchResult {
        if let Some(cached) = self.cache.get_cached_status(&item.name, item.kind) {
            trace!(item = %item.name, kind = %item.kind, "Serving cached status");
            return cached;
        }

        if self.engine.has_snapshot() {
            trace!(item = %item.name, kind = %item.kind, "Matching live");
            return self.engine.match_item(item);
        }

        MatchResult::not_installed()
    }

    pub fn statuses_for(&self, items: &[CatalogItem]) -> ItemStatuses {
        let mut statuses = ItemStatuses::default();
        for item in items {
            let bucket = match item.kind {
                ItemKind::Program => &mut statuses.programs,
                ItemKind::Driver => &mut statuses.drivers,
            };
            bucket.insert(item.name.clone(), self.status_for(item));
        }
        statuses
    }

    /// Bypass cached answers until the next scan is saved
    pub fn force_refresh(&self) {
        self.cache.invalidate();
    }

    /// Pick up a record saved by a scan and serve cached answers again
    pub fn refresh_cache(&self) {
        self.cache.reload();
    }

    /// Whether the host should start a scan on its own now
    pub fn should_auto_scan(&self) -> bool {
        if !self.settings.auto_scan_enabled {
            return false;
        }
        if !self.cache.is_cache_fresh() {
            return true;
        }
        self.cache
            .since_last_scan()
            .map_or(true, |elapsed| elapsed >= self.settings.scan_interval())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MatchTuning;
    use crate::engine::{InventoryEntry, ScanSnapshot, ScanSummary, StaticInventorySource};
    use crate::state::clock::ManualClock;
    use chrono::Duration;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    struct Fixture {
        _temp_dir: TempDir,
        clock: Arc<ManualClock>,
        engine: Arc<MatchEngine>,
        cache: Arc<StatusCache>,
    }

    impl Fixture {
        fn new() -> Self {
            let temp_dir = TempDir::new().unwrap();
            let clock = Arc::new(ManualClock::default());
            let engine = Arc::new(MatchEngine::new(
                Arc::new(StaticInventorySource::default()),
                MatchTuning::default(),
            ));
            let cache = Arc::new(StatusCache::with_clock(
                temp_dir.path().join("scan_cache.json"),
                Duration::hours(24),
                clock.clone(),
            ));
            Self {
                _temp_dir: temp_dir,
                clock,
                engine,
                cache,
            }
        }

        fn service(&self, settings: Settings) -> InstallationStatusService {
            InstallationStatusService::new(self.engine.clone(), self.cache.clone(), settings)
        }

        fn save(&self, name: &str, result: MatchResult) {
            let mut programs = BTreeMap::new();
            programs.insert(name.to_string(), result);
            self.cache
                .save_snapshot(programs, BTreeMap::new(), ScanSummary::default())
                .unwrap();
        }

        fn scan(&self, applications: &[(&str, &str)]) {
            self.engine.replace_snapshot(ScanSnapshot::new(
                applications
                    .iter()
                    .map(|(name, version)| InventoryEntry::new(*name, Some(version.to_string())))
                    .collect(),
                Default::default(),
            ));
        }
    }

    #[test]
    fn test_nothing_known_is_not_installed() {
        let fixture = Fixture::new();
        let service = fixture.service(Settings::default());
        assert_eq!(
            service.status_for(&CatalogItem::program("Git")),
            MatchResult::not_installed()
        );
    }

    #[test]
    fn test_fresh_cache_wins_over_live_match() {
        let fixture = Fixture::new();
        fixture.save("Git", MatchResult::installed("Git", Some("2.40.0".to_string())));
        fixture.scan(&[("Git", "2.43.0")]);
        let service = fixture.service(Settings::default());

        let status = service.status_for(&CatalogItem::program("Git"));
        assert_eq!(status.version.as_deref(), Some("2.40.0"));
    }

    #[test]
    fn test_cache_miss_falls_back_to_live() {
        let fixture = Fixture::new();
        fixture.save("Git", MatchResult::installed("Git", Some("2.40.0".to_string())));
        fixture.scan(&[("Zoom", "5.17")]);
        let service = fixture.service(Settings::default());

        assert!(service.status_for(&CatalogItem::program("Zoom")).installed);
    }

    #[test]
    fn test_force_refresh_then_refresh_cache() {
        let fixture = Fixture::new();
        fixture.save("Git", MatchResult::installed("Git", Some("2.40.0".to_string())));
        fixture.scan(&[("Git", "2.43.0")]);
        let service = fixture.service(Settings::default());

        service.force_refresh();
        let live = service.status_for(&CatalogItem::program("Git"));
        assert_eq!(live.version.as_deref(), Some("2.43.0"));

        service.refresh_cache();
        let cached = service.status_for(&CatalogItem::program("Git"));
        assert_eq!(cached.version.as_deref(), Some("2.40.0"));
    }

    #[test]
    fn test_statuses_for_splits_by_kind() {
        let fixture = Fixture::new();
        fixture.scan(&[("Realtek Audio Driver", "6.0")]);
        let service = fixture.service(Settings::default());

        let statuses = service.statuses_for(&[
            CatalogItem::driver("Realtek HD Audio"),
            CatalogItem::program("VLC Media Player"),
        ]);
        assert!(statuses.drivers["Realtek HD Audio"].installed);
        assert!(!statuses.programs["VLC Media Player"].installed);
    }

    #[test]
    fn test_should_auto_scan() {
        let fixture = Fixture::new();
        let service = fixture.service(Settings::default());
        assert!(service.should_auto_scan(), "never scanned");

        fixture.save("Git", MatchResult::not_installed());
        assert!(!service.should_auto_scan());

        fixture.clock.advance(Duration::minutes(29));
        assert!(!service.should_auto_scan());

        fixture.clock.advance(Duration::minutes(1));
        assert!(service.should_auto_scan());

        let disabled = fixture.service(Settings {
            auto_scan_enabled: false,
            ..Settings::default()
        });
        assert!(!disabled.should_auto_scan());
    }
}
