use chrono::{DateTime, Duration, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, RwLock};
use tracing::{debug, info, warn};

use super::clock::{Clock, SystemClock};
use super::types::{CacheRecord, ItemState};
use crate::config::ItemKind;
use crate::engine::{MatchResult, ScanSummary};
use crate::Result;

/// Persistent per-item status cache backed by a single JSON file.
///
/// Readers share the current record through an `Arc`; a save builds a new
/// record, writes it to disk, then swaps it in whole.
pub struct StatusCache {
    /// Location of the cache document
    path: PathBuf,
    /// How long a saved record stays fresh
    expiry: Duration,
    clock: Arc<dyn Clock>,
    record: RwLock<Arc<CacheRecord>>,
    /// Set by `invalidate`, cleared by the next save or reload
    invalidated: AtomicBool,
}

impl StatusCache {
    /// Open the cache at `path`, loading whatever is on disk
    pub fn open(path: impl Into<PathBuf>, expiry: Duration) -> Self {
        Self::with_clock(path, expiry, Arc::new(SystemClock))
    }

    pub fn with_clock(path: impl Into<PathBuf>, expiry: Duration, clock: Arc<dyn Clock>) -> Self {
        let path = path.into();
        let record = load_record(&path);
        Self {
            path,
            expiry,
            clock,
            record: RwLock::new(Arc::new(record)),
            invalidated: AtomicBool::new(false),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The record currently served to readers
    pub fn record(&self) -> Arc<CacheRecord> {
        let guard = match self.record.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        Arc::clone(&guard)
    }

    pub fn last_scan(&self) -> Option<DateTime<Utc>> {
        self.record().last_scan
    }

    /// Time elapsed since the last saved scan
    pub fn since_last_scan(&self) -> Option<Duration> {
        self.last_scan().map(|last_scan| self.clock.now() - last_scan)
    }

    /// Fresh iff a scan was saved, it is younger than the expiry, and the
    /// cache has not been invalidated since
    pub fn is_cache_fresh(&self) -> bool {
        if self.invalidated.load(Ordering::Acquire) {
            return false;
        }
        self.since_last_scan()
            .map_or(false, |elapsed| elapsed < self.expiry)
    }

    /// What the persisted record says about an item, regardless of freshness
    pub fn lookup(&self, name: &str, kind: ItemKind) -> ItemState {
        self.record().lookup(name, kind)
    }

    /// The cached answer for an item, or `None` when the caller must match live
    pub fn get_cached_status(&self, name: &str, kind: ItemKind) -> Option<MatchResult> {
        if !self.is_cache_fresh() {
            return None;
        }
        self.lookup(name, kind).into_result()
    }

    /// Replace the persisted record with the results of a completed scan.
    ///
    /// A scan that resolved no items leaves a never-scanned record behind:
    /// `last_scan` is only set while at least one status is stored.
    pub fn save_snapshot(
        &self,
        programs: BTreeMap<String, MatchResult>,
        drivers: BTreeMap<String, MatchResult>,
        summary: ScanSummary,
    ) -> Result<()> {
        let record = if programs.is_empty() && drivers.is_empty() {
            debug!("No item statuses to cache, writing an empty record");
            CacheRecord::default()
        } else {
            CacheRecord::new(self.clock.now(), programs, drivers, summary)
        };
        write_atomically(&self.path, &record)?;

        info!(
            programs = record.programs.len(),
            drivers = record.drivers.len(),
            path = %self.path.display(),
            "Status cache saved"
        );
        self.install(record);
        self.invalidated.store(false, Ordering::Release);
        Ok(())
    }

    /// Make reads bypass the cache until the next save. Nothing is deleted.
    pub fn invalidate(&self) {
        debug!("Status cache invalidated");
        self.invalidated.store(true, Ordering::Release);
    }

    /// Re-read the record from disk and serve cached answers again
    pub fn reload(&self) {
        self.install(load_record(&self.path));
        self.invalidated.store(false, Ordering::Release);
    }

    /// Overwrite the persisted record with an empty, never-scanned one
    pub fn reset(&self) -> Result<()> {
        let record = CacheRecord::default();
        write_atomically(&self.path, &record)?;
        info!(path = %self.path.display(), "Status cache cleared");
        self.install(record);
        Ok(())
    }

    fn install(&self, record: CacheRecord) {
        let record = Arc::new(record);
        match self.record.write() {
            Ok(mut guard) => *guard = record,
            Err(poisoned) => *poisoned.into_inner() = record,
        }
    }
}

/// Load the cache document; anything unreadable counts as "never scanned"
fn load_record(path: &Path) -> CacheRecord {
    if !path.exists() {
        debug!(path = %path.display(), "No status cache on disk");
        return CacheRecord::default();
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Status cache unreadable, starting empty");
            return CacheRecord::default();
        }
    };

    match serde_json::from_str::<CacheRecord>(&content) {
        Ok(record) => record,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Status cache corrupt, starting empty");
            CacheRecord::default()
        }
    }
}

/// Write to a sibling temp file, flush it, then rename over the target
fn write_atomically(path: &Path, record: &CacheRecord) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }

    let tmp = path.with_extension("json.tmp");
    let content = serde_json::to_string_pretty(record)?;
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(content.as_bytes())?;
        file.sync_all()?;
    }
    fs::rename(&tmp, path)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::clock::ManualClock;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn programs() -> BTreeMap<String, MatchResult> {
        let mut programs = BTreeMap::new();
        programs.insert(
            "Git".to_string(),
            MatchResult::installed("Git", Some("2.43.0".to_string())),
        );
        programs.insert("VLC Media Player".to_string(), MatchResult::not_installed());
        programs
    }

    fn cache_in(dir: &TempDir, clock: Arc<ManualClock>) -> StatusCache {
        StatusCache::with_clock(dir.path().join("scan_cache.json"), Duration::hours(24), clock)
    }

    #[test]
    fn test_new_cache_is_stale() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir, Arc::new(ManualClock::default()));

        assert!(!cache.is_cache_fresh());
        assert!(cache.record().is_unscanned());
        assert_eq!(cache.get_cached_status("Git", ItemKind::Program), None);
    }

    #[test]
    fn test_save_then_fresh_then_expired() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::default());
        let cache = cache_in(&temp_dir, clock.clone());

        cache
            .save_snapshot(programs(), BTreeMap::new(), ScanSummary::default())
            .unwrap();
        assert!(cache.is_cache_fresh());
        assert_eq!(
            cache.get_cached_status("Git", ItemKind::Program),
            Some(MatchResult::installed("Git", Some("2.43.0".to_string())))
        );
        assert_eq!(
            cache.get_cached_status("VLC Media Player", ItemKind::Program),
            Some(MatchResult::not_installed())
        );
        assert_eq!(cache.get_cached_status("Zoom", ItemKind::Program), None);

        clock.advance(Duration::hours(23));
        assert!(cache.is_cache_fresh());

        clock.advance(Duration::hours(2));
        assert!(!cache.is_cache_fresh());
        assert_eq!(cache.get_cached_status("Git", ItemKind::Program), None);
        assert_eq!(cache.get_cached_status("VLC Media Player", ItemKind::Program), None);
    }

    #[test]
    fn test_invalidate_keeps_data() {
        let temp_dir = TempDir::new().unwrap();
        let cache = cache_in(&temp_dir, Arc::new(ManualClock::default()));
        cache
            .save_snapshot(programs(), BTreeMap::new(), ScanSummary::default())
            .unwrap();

        cache.invalidate();
        assert!(!cache.is_cache_fresh());
        assert_eq!(cache.get_cached_status("Git", ItemKind::Program), None);
        assert!(matches!(cache.lookup("Git", ItemKind::Program), ItemState::Present(_)));
        assert!(cache.path().exists());

        cache
            .save_snapshot(programs(), BTreeMap::new(), ScanSummary::default())
            .unwrap();
        assert!(cache.is_cache_fresh());
    }

    #[test]
    fn test_persisted_across_instances() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::default());
        let summary = ScanSummary {
            programs_found: 42,
            drivers_found: 7,
        };
        cache_in(&temp_dir, clock.clone())
            .save_snapshot(programs(), BTreeMap::new(), summary)
            .unwrap();

        let reopened = cache_in(&temp_dir, clock);
        assert!(reopened.is_cache_fresh());
        assert_eq!(reopened.record().scan_summary, summary);
        assert!(!temp_dir.path().join("scan_cache.json.tmp").exists());
    }

    #[test]
    fn test_corrupt_file_loads_empty() {
        let temp_dir = TempDir::new().unwrap();
        fs::write(temp_dir.path().join("scan_cache.json"), "{ not json").unwrap();

        let cache = cache_in(&temp_dir, Arc::new(ManualClock::default()));
        assert!(cache.record().is_unscanned());
        assert!(!cache.is_cache_fresh());

        // A later save replaces the corrupt document
        cache
            .save_snapshot(programs(), BTreeMap::new(), ScanSummary::default())
            .unwrap();
        assert!(cache_in(&temp_dir, Arc::new(ManualClock::default())).is_cache_fresh());
    }

    #[test]
    fn test_reload_picks_up_other_writer() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::default());
        let reader = cache_in(&temp_dir, clock.clone());
        let writer = cache_in(&temp_dir, clock);

        reader.invalidate();
        writer
            .save_snapshot(programs(), BTreeMap::new(), ScanSummary::default())
            .unwrap();
        assert!(!reader.is_cache_fresh());

        reader.reload();
        assert!(reader.is_cache_fresh());
        assert!(matches!(reader.lookup("Git", ItemKind::Program), ItemState::Present(_)));
    }

    #[test]
    fn test_saving_no_statuses_keeps_record_unscanned() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::default());
        let cache = cache_in(&temp_dir, clock.clone());
        cache
            .save_snapshot(programs(), BTreeMap::new(), ScanSummary::default())
            .unwrap();

        let summary = ScanSummary {
            programs_found: 12,
            drivers_found: 3,
        };
        cache
            .save_snapshot(BTreeMap::new(), BTreeMap::new(), summary)
            .unwrap();

        let record = cache.record();
        assert_eq!(record.last_scan, None);
        assert!(record.programs.is_empty() && record.drivers.is_empty());
        assert!(!cache.is_cache_fresh());
        assert_eq!(cache.lookup("Git", ItemKind::Program), ItemState::NotScanned);

        let reopened = cache_in(&temp_dir, clock);
        assert_eq!(reopened.last_scan(), None);
        assert!(reopened.record().is_unscanned());
    }

    #[test]
    fn test_reset_overwrites_with_empty_record() {
        let temp_dir = TempDir::new().unwrap();
        let clock = Arc::new(ManualClock::default());
        let cache = cache_in(&temp_dir, clock.clone());
        cache
            .save_snapshot(programs(), BTreeMap::new(), ScanSummary::default())
            .unwrap();

        cache.reset().unwrap();
        assert!(!cache.is_cache_fresh());
        assert!(cache_in(&temp_dir, clock).record().is_unscanned());
    }
}
