use std::path::PathBuf;
use tracing::{info, warn};

use super::{print_statuses, CommandHandler};
use crate::cli::app::GlobalArgs;
use crate::cli::context::AppContext;
use crate::config::CatalogLoader;
use crate::Result;

/// Handler for the `status` command
pub struct StatusCommand {
    pub global: GlobalArgs,
    pub catalog: PathBuf,
    pub no_scan: bool,
    pub json: bool,
}

impl StatusCommand {
    pub fn new(global: GlobalArgs, catalog: PathBuf, no_scan: bool, json: bool) -> Self {
        Self {
            global,
            catalog,
            no_scan,
            json,
        }
    }
}

impl CommandHandler for StatusCommand {
    fn execute(&self) -> Result<()> {
        let context = AppContext::build(&self.global)?;
        let items = CatalogLoader::load(&self.catalog)?;

        let scan_due = context.settings.scan_on_startup && context.status.should_auto_scan();
        if scan_due && !self.no_scan {
            info!("Status cache is due for a refresh, scanning");
            let (outcome, _) = context.orchestrator.scan_and_save(&items);
            if !outcome.success {
                warn!("Scan failed, reporting from cache and last snapshot");
            }
        }

        let statuses = context.status.statuses_for(&items);
        print_statuses(&items, &statuses, self.json)
    }

    fn name(&self) -> &'static str {
        "status"
    }
}
