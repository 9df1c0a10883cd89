use anyhow::anyhow;
use std::path::PathBuf;

use super::{print_statuses, CommandHandler};
use crate::cli::app::GlobalArgs;
use crate::cli::context::AppContext;
use crate::config::CatalogLoader;
use crate::Result;

/// Handler for the `check` command
pub struct CheckCommand {
    pub global: GlobalArgs,
    pub catalog: PathBuf,
    pub json: bool,
}

impl CheckCommand {
    pub fn new(global: GlobalArgs, catalog: PathBuf, json: bool) -> Self {
        Self {
            global,
            catalog,
            json,
        }
    }
}

impl CommandHandler for CheckCommand {
    fn execute(&self) -> Result<()> {
        let context = AppContext::build(&self.global)?;
        let items = CatalogLoader::load(&self.catalog)?;

        let outcome = context.orchestrator.run_full_scan();
        if !outcome.success {
            return Err(anyhow!("Scan did not complete; run with --log-level debug for details").into());
        }

        let statuses = context.orchestrator.check_items(&items);
        print_statuses(&items, &statuses, self.json)
    }

    fn name(&self) -> &'static str {
        "check"
    }
}
