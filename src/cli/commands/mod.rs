pub mod check;
pub mod clear_cache;
pub mod scan;
pub mod status;

use crate::config::{CatalogItem, ItemKind};
use crate::engine::{ItemStatuses, MatchResult};
use crate::Result;

/// Common trait for all command handlers
pub trait CommandHandler {
    /// Execute the command
    fn execute(&self) -> Result<()>;

    /// Get command name for logging
    fn name(&self) -> &'static str;
}

/// Render one status line per catalog item, in catalog order
pub fn render_statuses(items: &[CatalogItem], statuses: &ItemStatuses) -> Vec<String> {
    let not_installed = MatchResult::not_installed();
    items
        .iter()
        .map(|item| {
            let bucket = match item.kind {
                ItemKind::Program => &statuses.programs,
                ItemKind::Driver => &statuses.drivers,
            };
            let result = bucket.get(&item.name).unwrap_or(&not_installed);
            render_status(item, result)
        })
        .collect()
}

fn render_status(item: &CatalogItem, result: &MatchResult) -> String {
    if !result.installed {
        return format!("[missing]   {} ({})", item.name, item.kind);
    }

    let found = result.exact_name.as_deref().unwrap_or(&item.name);
    match result.version.as_deref() {
        Some(version) => format!("[installed] {} ({}) -> {} {}", item.name, item.kind, found, version),
        None => format!("[installed] {} ({}) -> {}", item.name, item.kind, found),
    }
}

/// Print statuses as text lines or as one JSON document
pub fn print_statuses(items: &[CatalogItem], statuses: &ItemStatuses, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(statuses)?);
    } else {
        for line in render_statuses(items, statuses) {
            println!("{line}");
        }
    }
    Ok(())
}
