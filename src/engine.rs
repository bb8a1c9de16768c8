use crate::catalog::{PathCatalog, existing_root_count};
use crate::constants::{BROWSER_PROGRESS_END, PROGRESS_EVERY, TEMP_PROGRESS_END};
use crate::deleter;
use crate::exclude::Exclusions;
use crate::model::{
    Candidate, Pass, PassMetrics, Phase, ReclaimEvent, RunConfig, RunResult, TrashOutcome,
};
use crate::scanner::FileScanner;
use crate::trash::TrashEmptier;
use anyhow::{Result, bail};
use chrono::Local;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};
use tracing::{debug, info};

/// Drives the temp pass, the optional browser pass and the trash step.
///
/// One engine runs at most one reclaim at a time; it can be reused once a
/// run has finished.
pub struct ReclaimEngine {
    catalog: PathCatalog,
    trash: TrashEmptier,
    running: Arc<AtomicBool>,
}

/// A run in flight on a background thread.
pub struct RunHandle {
    pub events: Receiver<ReclaimEvent>,
    cancel: Arc<AtomicBool>,
    worker: JoinHandle<()>,
}

impl RunHandle {
    /// Asks the worker to stop after the candidate it is processing.
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Blocks until the worker thread has exited.
    #[allow(dead_code)]
    pub fn join(self) {
        let _ = self.worker.join();
    }

    /// A handle fed by hand, with no engine behind it.
    #[cfg(test)]
    pub fn detached(events: Receiver<ReclaimEvent>) -> Self {
        Self {
            events,
            cancel: Arc::new(AtomicBool::new(false)),
            worker: thread::spawn(|| {}),
        }
    }
}

/// Where a run reports its progress.
pub trait EventSink {
    fn emit(&self, event: ReclaimEvent);
}

impl EventSink for Sender<ReclaimEvent> {
    fn emit(&self, event: ReclaimEvent) {
        // A front end that stopped listening does not stop the run.
        let _ = self.send(event);
    }
}

/// Holds the engine's busy flag for the duration of a run.
struct RunGuard(Arc<AtomicBool>);

impl Drop for RunGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

/// Progress emitter for one pass, scaled into `[start, end]`.
struct PassProgress<'a> {
    events: &'a dyn EventSink,
    start: u8,
    end: u8,
}

impl PassProgress<'_> {
    fn report(&self, done: usize, total: usize) {
        let span = u64::from(self.end - self.start);
        let total = total.max(1) as u64;
        let done = (done as u64).min(total);
        #[allow(clippy::cast_possible_truncation)]
        let pct = self.start + (done * span / total) as u8;
        self.events.emit(ReclaimEvent::Progress(pct));
    }
}

impl ReclaimEngine {
    pub fn new(catalog: PathCatalog, trash: TrashEmptier) -> Self {
        Self {
            catalog,
            trash,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn catalog(&self) -> &PathCatalog {
        &self.catalog
    }

    #[allow(dead_code)]
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }

    fn acquire(&self) -> Result<RunGuard> {
        if self
            .running
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            bail!("A reclaim run is already in progress");
        }
        Ok(RunGuard(Arc::clone(&self.running)))
    }

    /// Starts a run on a background thread. Events, ending with exactly one
    /// `Finished`, arrive on the returned handle.
    pub fn start(self: &Arc<Self>, config: RunConfig) -> Result<RunHandle> {
        let guard = self.acquire()?;
        let (tx, rx) = mpsc::channel();
        let cancel = Arc::new(AtomicBool::new(false));

        let engine = Arc::clone(self);
        let cancel_worker = Arc::clone(&cancel);
        let worker = thread::Builder::new()
            .name("reclaim-worker".to_string())
            .spawn(move || {
                let result = engine.execute(&config, &tx, &cancel_worker);
                drop(guard);
                tx.emit(ReclaimEvent::Finished(result));
            })?;

        Ok(RunHandle {
            events: rx,
            cancel,
            worker,
        })
    }

    /// Runs to completion on the calling thread.
    #[allow(dead_code)]
    pub fn run(
        &self,
        config: &RunConfig,
        events: &dyn EventSink,
        cancel: &AtomicBool,
    ) -> Result<RunResult> {
        let guard = self.acquire()?;
        let result = self.execute(config, events, cancel);
        drop(guard);
        events.emit(ReclaimEvent::Finished(result.clone()));
        Ok(result)
    }

    /// Bytes the temp pass would currently find, without touching anything.
    pub fn estimate(&self, config: &RunConfig) -> u64 {
        let exclusions = Exclusions::new(&config.excluded_paths);
        let scanner = FileScanner::new(config.max_file_size_bytes, exclusions.clone());
        self.catalog
            .roots_for_pass(Pass::Temp, &exclusions)
            .iter()
            .flat_map(|root| scanner.scan(root))
            .map(|c| c.size_bytes)
            .sum()
    }

    fn execute(
        &self,
        config: &RunConfig,
        events: &dyn EventSink,
        cancel: &AtomicBool,
    ) -> RunResult {
        let exclusions = Exclusions::new(&config.excluded_paths);
        let scanner = FileScanner::new(config.max_file_size_bytes, exclusions.clone());
        info!(
            dry_run = config.dry_run,
            browsers = config.include_browser_caches,
            "reclaim run started"
        );

        let temp = self.temp_pass(config, &scanner, &exclusions, events, cancel);

        let browsers = if config.include_browser_caches && !is_cancelled(cancel) {
            self.browser_pass(config, &scanner, &exclusions, events, cancel)
        } else {
            PassMetrics::default()
        };

        let cancelled = is_cancelled(cancel);
        let trash = if config.dry_run || cancelled {
            let reason = if cancelled { "cancelled" } else { "dry run" };
            events.emit(ReclaimEvent::Status(format!("Trash skipped ({reason})")));
            TrashOutcome::Skipped
        } else {
            events.emit(ReclaimEvent::Phase(Phase::EmptyingTrash));
            events.emit(ReclaimEvent::Status("Emptying trash...".to_string()));
            if self.trash.empty() {
                TrashOutcome::Emptied
            } else {
                TrashOutcome::Failed
            }
        };

        events.emit(ReclaimEvent::Progress(100));
        events.emit(ReclaimEvent::Phase(Phase::Done));

        let result = RunResult {
            temp,
            browsers,
            trash,
            dry_run: config.dry_run,
            cancelled,
            timestamp: Local::now(),
        };
        info!(
            detected = result.total_detected(),
            deleted = result.total_deleted(),
            trash = result.trash.label(),
            trash_emptied = result.trash_emptied(),
            cancelled,
            "reclaim run finished"
        );
        result
    }

    fn temp_pass(
        &self,
        config: &RunConfig,
        scanner: &FileScanner,
        exclusions: &Exclusions,
        events: &dyn EventSink,
        cancel: &AtomicBool,
    ) -> PassMetrics {
        let mut metrics = PassMetrics::default();
        let progress = PassProgress {
            events,
            start: 0,
            end: TEMP_PROGRESS_END,
        };

        for root in self.catalog.roots_for_pass(Pass::Temp, exclusions) {
            events.emit(ReclaimEvent::Phase(Phase::Scanning(Pass::Temp)));
            let candidates: Vec<Candidate> = scanner.scan(&root).collect();
            debug!(root = %root.display(), count = candidates.len(), "temp candidates");

            events.emit(ReclaimEvent::Phase(Phase::Deleting(Pass::Temp)));
            let verb = if config.dry_run { "Analyzing" } else { "Removing" };
            events.emit(ReclaimEvent::Status(format!("{verb} temporary files...")));

            let finished = process_all(&candidates, config.dry_run, &mut metrics, cancel, |i| {
                if i % PROGRESS_EVERY == 0 || i == candidates.len() {
                    progress.report(i, candidates.len());
                }
            });

            if finished && !config.dry_run {
                let removed = scanner.remove_empty_dirs(&root);
                debug!(removed, "removed empty temp directories");
            }
        }
        metrics
    }

    fn browser_pass(
        &self,
        config: &RunConfig,
        scanner: &FileScanner,
        exclusions: &Exclusions,
        events: &dyn EventSink,
        cancel: &AtomicBool,
    ) -> PassMetrics {
        let mut metrics = PassMetrics::default();
        let roots = self.catalog.roots_for_pass(Pass::Browsers, exclusions);
        let total = existing_root_count(&roots);
        let span = BROWSER_PROGRESS_END - TEMP_PROGRESS_END;
        let mut done_roots = 0usize;

        for root in roots.iter().filter(|r| r.is_dir()) {
            if is_cancelled(cancel) {
                break;
            }
            events.emit(ReclaimEvent::Phase(Phase::Scanning(Pass::Browsers)));
            let candidates: Vec<Candidate> = scanner.scan(root).collect();

            events.emit(ReclaimEvent::Phase(Phase::Deleting(Pass::Browsers)));
            let verb = if config.dry_run { "Analyzing" } else { "Cleaning" };
            events.emit(ReclaimEvent::Status(format!(
                "{verb} cache: {}",
                root.display()
            )));

            // Each existing root owns an equal slice of the browser span.
            let slice = PassProgress {
                events,
                start: TEMP_PROGRESS_END + share(done_roots, total, span),
                end: TEMP_PROGRESS_END + share(done_roots + 1, total, span),
            };
            process_all(&candidates, config.dry_run, &mut metrics, cancel, |i| {
                if i % PROGRESS_EVERY == 0 {
                    slice.report(i, candidates.len());
                }
            });
            done_roots += 1;
            slice.report(candidates.len(), candidates.len());
        }
        metrics
    }
}

/// Feeds candidates to the deleter until done or cancelled. Returns false
/// if cancellation cut the list short.
fn process_all(
    candidates: &[Candidate],
    dry_run: bool,
    metrics: &mut PassMetrics,
    cancel: &AtomicBool,
    mut on_step: impl FnMut(usize),
) -> bool {
    let mut failed = 0usize;
    for (i, candidate) in candidates.iter().enumerate() {
        if is_cancelled(cancel) {
            info!(processed = i, remaining = candidates.len() - i, "run cancelled");
            return false;
        }
        let outcome = deleter::process(candidate, dry_run);
        if !outcome.succeeded {
            failed += 1;
        }
        metrics.record(&outcome);
        on_step(i + 1);
    }
    debug!(processed = candidates.len(), failed, "candidates processed");
    true
}

fn share(done: usize, total: usize, span: u8) -> u8 {
    let value = done.min(total) * usize::from(span) / total.max(1);
    u8::try_from(value).unwrap_or(span)
}

fn is_cancelled(cancel: &AtomicBool) -> bool {
    cancel.load(Ordering::Relaxed)
}
