use crate::{InstallWatchError, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};

const SETTINGS_FILE: &str = "settings.json";
const SCAN_CACHE_FILE: &str = "scan_cache.json";

/// Location of the persisted settings and scan cache
#[derive(Debug, Clone)]
pub struct AppPaths {
    /// Data directory holding both files
    pub data_dir: PathBuf,
}

impl AppPaths {
    /// Resolve the platform data directory
    pub fn new() -> Result<Self> {
        let dirs = ProjectDirs::from("", "", "installwatch").ok_or_else(|| {
            InstallWatchError::Path("Failed to determine project directories".to_string())
        })?;

        Ok(Self {
            data_dir: dirs.data_dir().to_path_buf(),
        })
    }

    /// Use an explicit data directory
    pub fn for_dir(data_dir: &Path) -> Self {
        Self {
            data_dir: data_dir.to_path_buf(),
        }
    }

    pub fn settings_file(&self) -> PathBuf {
        self.data_dir.join(SETTINGS_FILE)
    }

    pub fn scan_cache_file(&self) -> PathBuf {
        self.data_dir.join(SCAN_CACHE_FILE)
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.data_dir)?;
        Ok(())
    }
}

impl Default for AppPaths {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| {
            let current_dir = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            Self::for_dir(&current_dir.join("data"))
        })
    }
}
