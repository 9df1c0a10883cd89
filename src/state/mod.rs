pub mod clock;
pub mod manager;
pub mod status;
pub mod types;

pub use clock::{Clock, ManualClock, SystemClock};
pub use manager::StatusCache;
pub use status::InstallationStatusService;
pub use types::{CacheRecord, ItemState};
