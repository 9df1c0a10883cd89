use serde::{Deserialize, Serialize};

use super::types::{ItemStatuses, ScanSummary};

/// Progress notifications published by a background scan.
///
/// A scan emits `Started`, zero or more `Progress`, then exactly one
/// `Completed`. A failed scan still completes, with empty statuses and a
/// zeroed summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ScanEvent {
    Started,

    Progress {
        stage: ScanStage,
    },

    Completed {
        success: bool,
        statuses: ItemStatuses,
        summary: ScanSummary,
    },
}

/// Named milestones of a full scan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanStage {
    Applications,
    Drivers,
    Matching,
    SavingCache,
}

impl std::fmt::Display for ScanStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ScanStage::Applications => "scanning installed applications",
            ScanStage::Drivers => "scanning installed drivers",
            ScanStage::Matching => "matching catalog items",
            ScanStage::SavingCache => "saving status cache",
        };
        f.write_str(label)
    }
}

impl ScanEvent {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ScanEvent::Completed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_event_serialization() {
        let json = serde_json::to_value(ScanEvent::Progress {
            stage: ScanStage::Drivers,
        })
        .unwrap();
        assert_eq!(json, serde_json::json!({"event": "progress", "stage": "drivers"}));

        let completed = ScanEvent::Completed {
            success: false,
            statuses: ItemStatuses::default(),
            summary: ScanSummary::default(),
        };
        let json = serde_json::to_value(&completed).unwrap();
        assert_eq!(json["event"], "completed");
        assert_eq!(json["summary"]["programs_found"], 0);
        assert!(completed.is_terminal());
        assert!(!ScanEvent::Started.is_terminal());
    }
}
