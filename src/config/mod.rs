pub mod loader;
pub mod tuning;
pub mod types;

pub use loader::{CatalogLoader, SettingsLoader};
pub use tuning::MatchTuning;
pub use types::{CatalogItem, ItemKind, Settings};
