use chrono::{DateTime, Local};
use humansize::{BINARY, format_size};
use std::collections::BTreeSet;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Pass {
    Temp,
    Browsers,
}

/// Options for a single reclaim run. Built per user action and moved into
/// the worker; nothing mutates it afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    pub include_browser_caches: bool,
    pub max_file_size_bytes: u64,
    pub excluded_paths: BTreeSet<PathBuf>,
    pub dry_run: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub path: PathBuf,
    pub size_bytes: u64,
}

/// Result of handing one candidate to the deleter.
///
/// `deleted_bytes` is either zero or equal to `detected_bytes`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeleteOutcome {
    pub detected_bytes: u64,
    pub deleted_bytes: u64,
    pub succeeded: bool,
}

impl DeleteOutcome {
    pub const fn missing() -> Self {
        Self {
            detected_bytes: 0,
            deleted_bytes: 0,
            succeeded: false,
        }
    }

    pub const fn deleted(size: u64) -> Self {
        Self {
            detected_bytes: size,
            deleted_bytes: size,
            succeeded: true,
        }
    }

    pub const fn kept(size: u64, succeeded: bool) -> Self {
        Self {
            detected_bytes: size,
            deleted_bytes: 0,
            succeeded,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PassMetrics {
    pub detected_bytes: u64,
    pub deleted_bytes: u64,
    pub file_count: u64,
}

impl PassMetrics {
    pub fn record(&mut self, outcome: &DeleteOutcome) {
        self.detected_bytes += outcome.detected_bytes;
        self.deleted_bytes += outcome.deleted_bytes;
        self.file_count += 1;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrashOutcome {
    Emptied,
    Failed,
    Skipped,
}

impl TrashOutcome {
    pub fn label(self) -> &'static str {
        match self {
            Self::Emptied => "emptied",
            Self::Failed => "not available",
            Self::Skipped => "skipped",
        }
    }
}

/// Terminal record of one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunResult {
    pub temp: PassMetrics,
    pub browsers: PassMetrics,
    pub trash: TrashOutcome,
    pub dry_run: bool,
    pub cancelled: bool,
    pub timestamp: DateTime<Local>,
}

impl RunResult {
    pub fn trash_emptied(&self) -> bool {
        self.trash == TrashOutcome::Emptied
    }

    pub fn total_detected(&self) -> u64 {
        self.temp.detected_bytes + self.browsers.detected_bytes
    }

    pub fn total_deleted(&self) -> u64 {
        self.temp.deleted_bytes + self.browsers.deleted_bytes
    }

    pub fn summary(&self) -> String {
        let mut msg = format!(
            "Detected: {} - Deleted: {} (Temp: {} of {} | Browsers: {} of {}) | Trash: {}",
            format_size(self.total_detected(), BINARY),
            format_size(self.total_deleted(), BINARY),
            format_size(self.temp.deleted_bytes, BINARY),
            format_size(self.temp.detected_bytes, BINARY),
            format_size(self.browsers.deleted_bytes, BINARY),
            format_size(self.browsers.detected_bytes, BINARY),
            self.trash.label(),
        );
        if self.dry_run {
            msg.push_str(" [dry run]");
        }
        if self.cancelled {
            msg.push_str(" [cancelled]");
        }
        msg
    }
}

/// Where a run stands. An engine with no run in flight is `Idle`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Idle,
    Scanning(Pass),
    Deleting(Pass),
    EmptyingTrash,
    Done,
}

impl Phase {
    pub fn label(self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::Scanning(Pass::Temp) => "scanning temp",
            Self::Deleting(Pass::Temp) => "cleaning temp",
            Self::Scanning(Pass::Browsers) => "scanning browser caches",
            Self::Deleting(Pass::Browsers) => "cleaning browser caches",
            Self::EmptyingTrash => "emptying trash",
            Self::Done => "done",
        }
    }
}

/// Everything the worker reports to the front end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReclaimEvent {
    Phase(Phase),
    Progress(u8),
    Status(String),
    Finished(RunResult),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(trash: TrashOutcome) -> RunResult {
        RunResult {
            temp: PassMetrics {
                detected_bytes: 2048,
                deleted_bytes: 1024,
                file_count: 2,
            },
            browsers: PassMetrics::default(),
            trash,
            dry_run: false,
            cancelled: false,
            timestamp: Local::now(),
        }
    }

    #[test]
    fn pass_metrics_counts_failures() {
        let mut metrics = PassMetrics::default();
        metrics.record(&DeleteOutcome::deleted(10));
        metrics.record(&DeleteOutcome::kept(5, false));
        metrics.record(&DeleteOutcome::missing());

        assert_eq!(metrics.detected_bytes, 15);
        assert_eq!(metrics.deleted_bytes, 10);
        assert_eq!(metrics.file_count, 3);
    }

    #[test]
    fn summary_mentions_trash_status() {
        let r = result(TrashOutcome::Failed);
        assert!(!r.trash_emptied());
        assert_eq!(r.total_detected(), 2048);
        assert_eq!(r.total_deleted(), 1024);

        let text = r.summary();
        assert!(text.contains("Detected: 2 KiB"));
        assert!(text.contains("Deleted: 1 KiB"));
        assert!(text.contains("Trash: not available"));
        assert!(!text.contains("[dry run]"));
    }

    #[test]
    fn summary_marks_dry_run() {
        let mut r = result(TrashOutcome::Skipped);
        r.dry_run = true;
        assert!(r.summary().ends_with("Trash: skipped [dry run]"));
    }
}
