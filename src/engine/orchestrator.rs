//! Scan orchestration
//!
//! Runs a full inventory scan, installs the resulting snapshot in the match
//! engine, and (for the background variant) resolves catalog statuses and
//! persists them to the status cache. Only one scan runs at a time, whichever
//! entry point started it.

use serde::{Deserialize, Serialize};
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use super::events::{ScanEvent, ScanStage};
use super::matcher::MatchEngine;
use super::scanner::InventoryScanner;
use super::types::{ItemStatuses, ScanSnapshot, ScanSummary};
use crate::config::{CatalogItem, ItemKind};
use crate::state::StatusCache;

/// Buffer size of the background scan event channel
pub const EVENT_CHANNEL_CAPACITY: usize = 32;

/// Result of one full scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanOutcome {
    pub success: bool,
    pub summary: ScanSummary,
}

impl ScanOutcome {
    pub fn failed() -> Self {
        Self {
            success: false,
            summary: ScanSummary::default(),
        }
    }
}

/// A scan running on the blocking pool
pub struct BackgroundScan {
    pub handle: JoinHandle<ScanOutcome>,
    pub events: mpsc::Receiver<ScanEvent>,
}

pub struct ScanOrchestrator {
    scanner: InventoryScanner,
    engine: Arc<MatchEngine>,
    cache: Arc<StatusCache>,
    in_progress: Arc<AtomicBool>,
}

/// Clears the in-progress flag when the scan ends, however it ends
struct InProgressGuard(Arc<AtomicBool>);

impl InProgressGuard {
    /// Claim the flag, or `None` when a scan already holds it
    fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self(Arc::clone(flag)))
    }
}

impl Drop for InProgressGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl ScanOrchestrator {
    pub fn new(scanner: InventoryScanner, engine: Arc<MatchEngine>, cache: Arc<StatusCache>) -> Self {
        Self {
            scanner,
            engine,
            cache,
            in_progress: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn engine(&self) -> &Arc<MatchEngine> {
        &self.engine
    }

    pub fn cache(&self) -> &Arc<StatusCache> {
        &self.cache
    }

    pub fn is_scan_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::Acquire)
    }

    /// The snapshot of the last successful scan
    pub fn snapshot(&self) -> Option<Arc<ScanSnapshot>> {
        self.engine.snapshot()
    }

    /// Scan both inventories and install the new snapshot.
    ///
    /// Never fails: any source error (or panic) yields `success = false` with a
    /// zeroed summary, and the previous snapshot stays in place. While another
    /// scan is running nothing is scanned and the outcome is a failure.
    pub fn run_full_scan(&self) -> ScanOutcome {
        let Some(_guard) = self.begin_scan() else {
            return ScanOutcome::failed();
        };
        self.scan_with_progress(&mut |_: ScanStage| {})
    }

    /// Resolve the status of every item against the current snapshot
    pub fn check_items(&self, items: &[CatalogItem]) -> ItemStatuses {
        let mut statuses = ItemStatuses::default();
        for item in items {
            let result = self.engine.match_item(item);
            let bucket = match item.kind {
                ItemKind::Program => &mut statuses.programs,
                ItemKind::Driver => &mut statuses.drivers,
            };
            bucket.insert(item.name.clone(), result);
        }
        statuses
    }

    /// Scan, resolve `items`, and save the status cache on success.
    ///
    /// Like `run_full_scan`, this is a failed no-op while another scan runs.
    pub fn scan_and_save(&self, items: &[CatalogItem]) -> (ScanOutcome, ItemStatuses) {
        let Some(_guard) = self.begin_scan() else {
            return (ScanOutcome::failed(), ItemStatuses::default());
        };
        self.scan_and_save_with_progress(items, &mut |_: ScanStage| {})
    }

    /// Start a scan on the blocking pool and return its event stream.
    ///
    /// Returns `None` without doing anything while another scan is running or
    /// when called outside a Tokio runtime.
    pub fn spawn_background_scan(self: &Arc<Self>, items: Vec<CatalogItem>) -> Option<BackgroundScan> {
        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(runtime) => runtime,
            Err(e) => {
                warn!(error = %e, "No Tokio runtime, background scan not started");
                return None;
            }
        };
        let guard = self.begin_scan()?;

        let (event_tx, event_rx) = mpsc::channel(EVENT_CHANNEL_CAPACITY);
        let orchestrator = Arc::clone(self);

        let handle = runtime.spawn_blocking(move || {
            let _guard = guard;
            let send = |event: ScanEvent| {
                // A dropped receiver only means nobody is listening
                let _ = event_tx.blocking_send(event);
            };

            send(ScanEvent::Started);
            let (outcome, statuses) = orchestrator.scan_and_save_with_progress(&items, &mut |stage: ScanStage| {
                send(ScanEvent::Progress { stage })
            });
            send(ScanEvent::Completed {
                success: outcome.success,
                statuses,
                summary: outcome.summary,
            });
            outcome
        });

        Some(BackgroundScan {
            handle,
            events: event_rx,
        })
    }

    fn begin_scan(&self) -> Option<InProgressGuard> {
        let guard = InProgressGuard::acquire(&self.in_progress);
        if guard.is_none() {
            debug!("Scan already in progress, ignoring trigger");
        }
        guard
    }

    fn scan_and_save_with_progress(
        &self,
        items: &[CatalogItem],
        progress: &mut dyn FnMut(ScanStage),
    ) -> (ScanOutcome, ItemStatuses) {
        let outcome = self.scan_with_progress(progress);
        if !outcome.success {
            return (outcome, ItemStatuses::default());
        }

        progress(ScanStage::Matching);
        let statuses = match catch_unwind(AssertUnwindSafe(|| self.check_items(items))) {
            Ok(statuses) => statuses,
            Err(_) => {
                error!("Matching panicked, reporting scan as failed");
                return (ScanOutcome::failed(), ItemStatuses::default());
            }
        };

        progress(ScanStage::SavingCache);
        if let Err(e) = self.cache.save_snapshot(
            statuses.programs.clone(),
            statuses.drivers.clone(),
            outcome.summary,
        ) {
            warn!(error = %e, "Failed to save status cache");
        }

        (outcome, statuses)
    }

    fn scan_with_progress(&self, progress: &mut dyn FnMut(ScanStage)) -> ScanOutcome {
        info!("Starting full scan");

        let scanned = catch_unwind(AssertUnwindSafe(|| {
            progress(ScanStage::Applications);
            let applications = self.scanner.try_scan_applications()?;
            progress(ScanStage::Drivers);
            let drivers = self.scanner.try_scan_drivers()?;
            Ok::<_, crate::error::ScanError>(ScanSnapshot::new(applications, drivers))
        }));

        let snapshot = match scanned {
            Ok(Ok(snapshot)) => snapshot,
            Ok(Err(e)) => {
                warn!(error = %e, "Full scan failed");
                return ScanOutcome::failed();
            }
            Err(_) => {
                error!("Full scan panicked");
                return ScanOutcome::failed();
            }
        };

        let summary = ScanSummary::from_snapshot(&snapshot);
        self.engine.replace_snapshot(snapshot);
        info!(
            programs_found = summary.programs_found,
            drivers_found = summary.drivers_found,
            "Full scan complete"
        );

        ScanOutcome {
            success: true,
            summary,
        }
    }
}
