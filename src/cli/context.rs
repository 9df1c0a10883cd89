use std::sync::Arc;
use tracing::debug;

use super::app::GlobalArgs;
use crate::config::{Settings, SettingsLoader};
use crate::engine::{
    FixtureInventorySource, InventoryScanner, InventorySource, MatchEngine, ScanOrchestrator,
    SystemInventorySource,
};
use crate::io::AppPaths;
use crate::state::{InstallationStatusService, StatusCache};
use crate::Result;

/// The components a command works with, constructed once per invocation
pub struct AppContext {
    pub paths: AppPaths,
    pub settings: Settings,
    pub orchestrator: Arc<ScanOrchestrator>,
    pub status: InstallationStatusService,
}

impl AppContext {
    pub fn build(global: &GlobalArgs) -> Result<Self> {
        let paths = match &global.data_dir {
            Some(dir) => AppPaths::for_dir(dir),
            None => AppPaths::new()?,
        };
        paths.ensure_directories()?;

        let settings = SettingsLoader::load(paths.settings_file());

        let source: Arc<dyn InventorySource> = match &global.inventory {
            Some(fixture) => {
                debug!(path = %fixture.display(), "Using inventory fixture");
                Arc::new(FixtureInventorySource::new(fixture))
            }
            None => Arc::new(SystemInventorySource::new()),
        };

        Ok(Self::assemble(paths, settings, source))
    }

    /// Wire the engine, cache, orchestrator and status service together
    pub fn assemble(paths: AppPaths, settings: Settings, source: Arc<dyn InventorySource>) -> Self {
        let engine = Arc::new(MatchEngine::new(Arc::clone(&source), settings.tuning.clone()));
        let cache = Arc::new(StatusCache::open(paths.scan_cache_file(), settings.cache_expiry()));
        let orchestrator = Arc::new(ScanOrchestrator::new(
            InventoryScanner::new(source),
            Arc::clone(&engine),
            Arc::clone(&cache),
        ));
        let status = InstallationStatusService::new(engine, cache, settings.clone());

        Self {
            paths,
            settings,
            orchestrator,
            status,
        }
    }
}
