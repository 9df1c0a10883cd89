pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod io;
pub mod state;

pub use error::{InstallWatchError, Result, ScanError};
