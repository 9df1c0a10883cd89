use super::CommandHandler;
use crate::cli::app::GlobalArgs;
use crate::cli::context::AppContext;
use crate::Result;

/// Handler for the `clear-cache` command
pub struct ClearCacheCommand {
    pub global: GlobalArgs,
}

impl ClearCacheCommand {
    pub fn new(global: GlobalArgs) -> Self {
        Self { global }
    }
}

impl CommandHandler for ClearCacheCommand {
    fn execute(&self) -> Result<()> {
        let context = AppContext::build(&self.global)?;
        context.orchestrator.cache().reset()?;
        println!(
            "Cleared status cache at {}",
            context.paths.scan_cache_file().display()
        );
        Ok(())
    }

    fn name(&self) -> &'static str {
        "clear-cache"
    }
}
