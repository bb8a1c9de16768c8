use crate::config::Settings;
use crate::engine::{ReclaimEngine, RunHandle};
use crate::model::{Phase, ReclaimEvent, RunConfig, RunResult};
use crate::runlog;
use crate::schedule;
use anyhow::Result;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;
use sysinfo::Disks;
use tracing::warn;

pub enum AppState {
    Idle,
    Confirming,
    Running,
    Done(String),
    Error(String),
}

pub struct App {
    pub engine: Arc<ReclaimEngine>,
    pub settings: Settings,
    pub log_dir: Option<PathBuf>,
    pub state: AppState,
    pub disks: Disks,
    pub include_browsers: bool,
    pub dry_run: bool,
    /// `None` while the temp directory is still being measured.
    pub estimate: Option<u64>,
    pub pending_estimate: Option<Receiver<u64>>,
    pub phase: Phase,
    pub progress: u8,
    pub status: String,
    pub run: Option<RunHandle>,
    pub last_result: Option<RunResult>,
}

impl App {
    pub fn new(engine: Arc<ReclaimEngine>, settings: Settings, log_dir: Option<PathBuf>) -> Self {
        let disks = Disks::new_with_refreshed_list();
        let mut app = Self {
            engine,
            settings,
            log_dir,
            state: AppState::Idle,
            disks,
            include_browsers: false,
            dry_run: false,
            estimate: None,
            pending_estimate: None,
            phase: Phase::Idle,
            progress: 0,
            status: String::new(),
            run: None,
            last_result: None,
        };
        app.refresh_estimate();
        app
    }

    pub fn run_config(&self) -> RunConfig {
        RunConfig::from_settings(&self.settings, self.include_browsers, self.dry_run)
    }

    /// Measures the temp directory on a short-lived thread; the result is
    /// picked up by `check_estimate`.
    pub fn refresh_estimate(&mut self) {
        let (tx, rx) = mpsc::channel();
        let engine = Arc::clone(&self.engine);
        let config = self.run_config();
        let spawned = thread::Builder::new()
            .name("estimate".to_string())
            .spawn(move || {
                let _ = tx.send(engine.estimate(&config));
            });
        match spawned {
            Ok(_) => {
                self.estimate = None;
                self.pending_estimate = Some(rx);
            }
            Err(e) => warn!("could not start the estimate: {e}"),
        }
    }

    pub fn check_estimate(&mut self) {
        let Some(rx) = &self.pending_estimate else {
            return;
        };
        match rx.try_recv() {
            Ok(bytes) => {
                self.estimate = Some(bytes);
                self.pending_estimate = None;
            }
            Err(TryRecvError::Empty) => {}
            Err(TryRecvError::Disconnected) => self.pending_estimate = None,
        }
    }

    pub fn toggle_browsers(&mut self) {
        self.include_browsers = !self.include_browsers;
    }

    pub fn toggle_dry_run(&mut self) {
        self.dry_run = !self.dry_run;
    }

    pub fn confirm_message(&self) -> String {
        let action = if self.dry_run { "Analyze" } else { "Delete" };
        let browsers = if self.include_browsers {
            " and browser caches"
        } else {
            ""
        };
        let trash = if self.dry_run {
            " (trash skipped in dry run)"
        } else {
            " and empty the trash"
        };
        format!("{action} temporary files{browsers}{trash}?")
    }

    pub fn start_clean(&mut self) {
        match self.engine.start(self.run_config()) {
            Ok(handle) => {
                self.progress = 0;
                self.status = "Preparing...".to_string();
                self.run = Some(handle);
                self.state = AppState::Running;
            }
            Err(e) => self.state = AppState::Error(format!("{e:#}")),
        }
    }

    pub fn cancel_clean(&mut self) {
        if let Some(run) = &self.run {
            run.cancel();
            self.status = "Cancelling...".to_string();
        }
    }

    pub fn check_run_status(&mut self) {
        let Some(run) = &self.run else {
            return;
        };

        // Non-blocking check for all available messages
        loop {
            match run.events.try_recv() {
                Ok(ReclaimEvent::Progress(pct)) => self.progress = pct,
                Ok(ReclaimEvent::Status(text)) => self.status = text,
                Ok(ReclaimEvent::Phase(phase)) => self.phase = phase,
                Ok(ReclaimEvent::Finished(result)) => {
                    self.finish(result);
                    return;
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    self.run = None;
                    self.state = AppState::Error("The cleaning worker stopped unexpectedly.".to_string());
                    return;
                }
            }
        }
    }

    fn finish(&mut self, result: RunResult) {
        let summary = result.summary();
        if let Some(dir) = &self.log_dir
            && let Err(e) = runlog::append(dir, &result)
        {
            warn!("failed to write run log: {e:#}");
        }

        self.run = None;
        self.phase = Phase::Idle;
        self.progress = 100;
        self.status = summary.clone();
        self.state = AppState::Done(summary);
        self.last_result = Some(result);

        // Refresh disk info and the estimate after cleaning
        self.disks.refresh(true);
        self.refresh_estimate();
    }

    pub fn schedule_weekly(&mut self) {
        self.state = match register_self() {
            Ok(()) => AppState::Done("Weekly task created (Sun 12:00)".to_string()),
            Err(e) => AppState::Error(format!("Could not create the task: {e:#}")),
        };
    }
}

fn register_self() -> Result<()> {
    let exe = std::env::current_exe()?;
    schedule::register_weekly(&exe)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{BrowserLocations, PathCatalog};
    use crate::model::{Pass, PassMetrics, TrashOutcome};
    use crate::trash::{TrashBackend, TrashEmptier};
    use anyhow::Result;
    use chrono::Local;
    use std::fs;
    use std::sync::mpsc;
    use tempfile::tempdir;

    struct NoTrash;
    impl TrashBackend for NoTrash {
        fn purge(&self) -> Result<()> {
            Ok(())
        }
    }

    fn settle_estimate(app: &mut App) -> Option<u64> {
        if let Some(rx) = app.pending_estimate.take() {
            app.estimate = rx.recv().ok();
        }
        app.estimate
    }

    fn engine(temp: PathBuf) -> Arc<ReclaimEngine> {
        let catalog = PathCatalog::new(
            temp,
            BrowserLocations {
                fixed: vec![],
                profiles_parent: None,
                profile_cache: PathBuf::from("cache2"),
            },
        );
        Arc::new(ReclaimEngine::new(catalog, TrashEmptier::new(Box::new(NoTrash))))
    }

    #[test]
    fn new_app_computes_estimate() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("a.tmp"), [0u8; 300])?;

        let mut app = App::new(engine(dir.path().to_path_buf()), Settings::default(), None);
        assert!(matches!(app.state, AppState::Idle));

        assert_eq!(settle_estimate(&mut app), Some(300));
        assert!(app.pending_estimate.is_none());
        Ok(())
    }

    #[test]
    fn estimate_is_polled_without_blocking() -> Result<()> {
        let dir = tempdir()?;
        fs::write(dir.path().join("b.tmp"), [0u8; 40])?;
        let mut app = App::new(engine(dir.path().to_path_buf()), Settings::default(), None);

        let (tx, rx) = mpsc::channel();
        app.pending_estimate = Some(rx);
        app.estimate = None;
        app.check_estimate();
        assert_eq!(app.estimate, None);
        assert!(app.pending_estimate.is_some());

        tx.send(40)?;
        app.check_estimate();
        assert_eq!(app.estimate, Some(40));
        assert!(app.pending_estimate.is_none());
        Ok(())
    }

    #[test]
    fn confirm_message_reflects_options() -> Result<()> {
        let dir = tempdir()?;
        let mut app = App::new(engine(dir.path().to_path_buf()), Settings::default(), None);

        assert_eq!(
            app.confirm_message(),
            "Delete temporary files and empty the trash?"
        );
        app.toggle_browsers();
        app.toggle_dry_run();
        assert_eq!(
            app.confirm_message(),
            "Analyze temporary files and browser caches (trash skipped in dry run)?"
        );
        Ok(())
    }

    #[test]
    fn test_check_run_status_updates() -> Result<()> {
        let dir = tempdir()?;
        let log_dir = dir.path().join("logs");
        let temp = dir.path().join("tmp");
        fs::create_dir(&temp)?;
        let mut app = App::new(engine(temp), Settings::default(), Some(log_dir.clone()));

        // Simulate a run by feeding the engine's event channel by hand.
        let (tx, rx) = mpsc::channel();
        app.run = Some(RunHandle::detached(rx));
        app.state = AppState::Running;

        tx.send(ReclaimEvent::Phase(Phase::Deleting(Pass::Temp)))?;
        tx.send(ReclaimEvent::Progress(42))?;
        tx.send(ReclaimEvent::Status("Removing temporary files...".to_string()))?;
        app.check_run_status();

        assert_eq!(app.progress, 42);
        assert_eq!(app.phase, Phase::Deleting(Pass::Temp));
        assert_eq!(app.status, "Removing temporary files...");
        assert!(matches!(app.state, AppState::Running));

        let result = RunResult {
            temp: PassMetrics {
                detected_bytes: 10,
                deleted_bytes: 10,
                file_count: 1,
            },
            browsers: PassMetrics::default(),
            trash: TrashOutcome::Emptied,
            dry_run: false,
            cancelled: false,
            timestamp: Local::now(),
        };
        tx.send(ReclaimEvent::Finished(result.clone()))?;
        app.check_run_status();

        assert!(matches!(app.state, AppState::Done(_)));
        assert_eq!(app.phase, Phase::Idle);
        assert!(app.run.is_none());
        assert_eq!(app.last_result, Some(result));
        assert_eq!(fs::read_dir(&log_dir)?.count(), 1);
        Ok(())
    }

    #[test]
    fn dropped_worker_is_reported() -> Result<()> {
        let dir = tempdir()?;
        let mut app = App::new(engine(dir.path().to_path_buf()), Settings::default(), None);

        let (tx, rx) = mpsc::channel();
        app.run = Some(RunHandle::detached(rx));
        drop(tx);
        app.check_run_status();

        assert!(matches!(app.state, AppState::Error(_)));
        assert!(app.run.is_none());
        Ok(())
    }
}
