use anyhow::{anyhow, Context};
use std::path::PathBuf;
use tracing::info;

use super::{print_statuses, CommandHandler};
use crate::cli::app::GlobalArgs;
use crate::cli::context::AppContext;
use crate::config::CatalogLoader;
use crate::engine::ScanEvent;
use crate::Result;

/// Handler for the `scan` command
pub struct ScanCommand {
    pub global: GlobalArgs,
    pub catalog: Option<PathBuf>,
    pub json: bool,
}

impl ScanCommand {
    pub fn new(global: GlobalArgs, catalog: Option<PathBuf>, json: bool) -> Self {
        Self {
            global,
            catalog,
            json,
        }
    }
}

impl CommandHandler for ScanCommand {
    fn execute(&self) -> Result<()> {
        let context = AppContext::build(&self.global)?;
        let items = match &self.catalog {
            Some(path) => CatalogLoader::load(path)?,
            None => Vec::new(),
        };

        let rt = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .context("Failed to create async runtime")?;

        let json = self.json;
        let outcome = rt.block_on(async {
            let mut scan = context
                .orchestrator
                .spawn_background_scan(items.clone())
                .ok_or_else(|| anyhow!("A scan is already in progress"))?;

            while let Some(event) = scan.events.recv().await {
                match &event {
                    ScanEvent::Started if !json => println!("Scan started"),
                    ScanEvent::Progress { stage } if !json => println!("  {stage}..."),
                    ScanEvent::Completed {
                        success,
                        statuses,
                        summary,
                    } => {
                        if json {
                            println!("{}", serde_json::to_string_pretty(&event)?);
                        } else {
                            println!(
                                "Scan {}: {} programs, {} drivers found",
                                if *success { "completed" } else { "failed" },
                                summary.programs_found,
                                summary.drivers_found
                            );
                            print_statuses(&items, statuses, false)?;
                        }
                    }
                    _ => {}
                }
            }

            scan.handle.await.context("Scan task failed")
        })?;

        info!(
            success = outcome.success,
            cache = %context.paths.scan_cache_file().display(),
            "Scan finished"
        );

        if !outcome.success {
            return Err(anyhow!("Scan did not complete; run with --log-level debug for details").into());
        }
        Ok(())
    }

    fn name(&self) -> &'static str {
        "scan"
    }
}
