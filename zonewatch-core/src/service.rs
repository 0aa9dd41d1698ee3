//! The long-running watch service: observers feeding a debounce tracker,
//! drained by a single scheduler task that applies zone policy per file.

use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};
use zonewatch_model::{
    ProcessingOutcome, TrustZone, WatchedDirectory, WatcherConfig,
};

use crate::marker::{MarkerStore, is_marker_stream};
use crate::outcome::OutcomeSink;
use crate::pending::PendingTracker;
use crate::policy::{SkipReason, ZoneAction, evaluate};
use crate::scan::collect_files;
use crate::watch::{WatchSet, matches_type_filter, matching_rule};

/// How long `stop` waits for an in-flight drain before tearing down anyway.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

/// Totals from one on-demand rule run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ScanSummary {
    /// Files enumerated across all enabled directories.
    pub scanned: u64,
    /// Files that matched a rule and went through the pipeline.
    pub processed: u64,
    /// Files whose marker was successfully rewritten or removed.
    pub succeeded: u64,
}

/// Watches the configured directories and applies zone policy to files
/// that settle down after a burst of activity.
///
/// Configuration is fixed for the service's lifetime; reconfiguring means
/// stopping this instance and building a new one.
pub struct WatchService {
    config: Arc<WatcherConfig>,
    marker: MarkerStore,
    sink: Arc<dyn OutcomeSink>,
    tracker: Arc<PendingTracker>,
    watchers: Option<WatchSet>,
    shutdown_tx: Option<watch::Sender<bool>>,
    drain_task: Option<JoinHandle<()>>,
}

impl WatchService {
    pub fn new(
        config: WatcherConfig,
        marker: MarkerStore,
        sink: Arc<dyn OutcomeSink>,
    ) -> Self {
        Self {
            config: Arc::new(config),
            marker,
            sink,
            tracker: Arc::new(PendingTracker::new()),
            watchers: None,
            shutdown_tx: None,
            drain_task: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.drain_task.is_some()
    }

    /// Observers currently attached (0 when stopped).
    pub fn active_watchers(&self) -> usize {
        self.watchers.as_ref().map_or(0, WatchSet::len)
    }

    /// Attach observers and launch the scheduler task.
    pub fn start(&mut self) {
        if self.is_running() {
            warn!("watch service is already running");
            return;
        }

        info!("starting watch service...");
        let watchers = WatchSet::start(&self.config, &self.tracker);
        let active = watchers.len();
        self.watchers = Some(watchers);

        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let config = Arc::clone(&self.config);
        let marker = self.marker.clone();
        let sink = Arc::clone(&self.sink);
        let tracker = Arc::clone(&self.tracker);

        let drain_task = tokio::spawn(async move {
            let debounce =
                Duration::from_millis(config.debounce_delay_ms.max(1));

            loop {
                if *shutdown_rx.borrow() {
                    break;
                }
                tokio::select! {
                    _ = tokio::time::sleep(debounce) => {}
                    changed = shutdown_rx.changed() => {
                        if changed.is_err() || *shutdown_rx.borrow() {
                            break;
                        }
                        continue;
                    }
                }

                let ready = tracker.take_ready(debounce, Utc::now());
                if !ready.is_empty() {
                    debug!("draining {} settled file(s)", ready.len());
                }
                for path in ready {
                    process_path(&config, &marker, sink.as_ref(), &path)
                        .await;
                }
            }

            info!("watch service processing loop stopped");
        });

        self.shutdown_tx = Some(shutdown_tx);
        self.drain_task = Some(drain_task);
        info!("watch service started with {active} active watcher(s)");
    }

    /// Detach all observers, then stop the scheduler task, waiting a
    /// bounded time for an in-flight drain.
    pub async fn stop(&mut self) {
        if !self.is_running() {
            return;
        }

        info!("stopping watch service...");

        // Dropping the watch set stops notification delivery first.
        self.watchers = None;

        if let Some(shutdown_tx) = self.shutdown_tx.take() {
            let _ = shutdown_tx.send(true);
        }

        if let Some(mut drain_task) = self.drain_task.take()
            && tokio::time::timeout(SHUTDOWN_TIMEOUT, &mut drain_task)
                .await
                .is_err()
        {
            warn!(
                "processing loop did not stop within {:?}, aborting",
                SHUTDOWN_TIMEOUT
            );
            drain_task.abort();
        }

        info!("watch service stopped");
    }

    /// Apply the configured rules to every file already present in the
    /// enabled directories, bypassing the debounce tracker.
    pub async fn run_rules_now(&self) -> ScanSummary {
        info!("applying rules to existing files...");
        let mut summary = ScanSummary::default();
        let mut seen = std::collections::HashSet::new();

        for dir in self.config.enabled_directories() {
            if !dir.path.is_dir() {
                warn!(
                    "watched directory does not exist: {}",
                    dir.path.display()
                );
                continue;
            }

            for path in
                collect_files(&dir.path, dir.include_subdirectories).await
            {
                if !seen.insert(path.clone()) {
                    continue;
                }
                summary.scanned += 1;

                let Some(rule) = matching_rule(&self.config, &path) else {
                    continue;
                };
                if !matches_type_filter(rule, &path) {
                    continue;
                }

                summary.processed += 1;
                if apply_rule(&self.marker, self.sink.as_ref(), rule, &path)
                    .await
                {
                    summary.succeeded += 1;
                }
            }
        }

        info!(
            "rule run complete: {} scanned, {} processed, {} succeeded",
            summary.scanned, summary.processed, summary.succeeded
        );
        summary
    }
}

impl fmt::Debug for WatchService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchService")
            .field("running", &self.is_running())
            .field("active_watchers", &self.active_watchers())
            .field("pending", &self.tracker.len())
            .finish_non_exhaustive()
    }
}

/// Full per-file pipeline for a drained tracker entry.
async fn process_path(
    config: &WatcherConfig,
    marker: &MarkerStore,
    sink: &dyn OutcomeSink,
    path: &Path,
) -> bool {
    if is_marker_stream(path) {
        return false;
    }
    match tokio::fs::try_exists(path).await {
        Ok(true) => {}
        _ => {
            debug!("file no longer exists, skipping: {}", path.display());
            return false;
        }
    }

    let Some(rule) = matching_rule(config, path) else {
        return false;
    };
    if !matches_type_filter(rule, path) {
        return false;
    }

    apply_rule(marker, sink, rule, path).await
}

/// Evaluate and act on one matched file, reporting the outcome.
///
/// Returns whether an action was taken and succeeded. Failures never
/// escape: they become failed outcomes plus log entries.
async fn apply_rule(
    marker: &MarkerStore,
    sink: &dyn OutcomeSink,
    rule: &WatchedDirectory,
    path: &Path,
) -> bool {
    if !marker.has_marker(path).await {
        debug!("no origin marker, skipping: {}", path.display());
        return false;
    }

    let observed = match marker.read_zone(path).await {
        Some(zone) => zone,
        None => {
            // Marker present but zone undeterminable: assume Internet so
            // the rule still applies.
            debug!(
                "marker present but zone unreadable, assuming zone {}: {}",
                TrustZone::Internet.id(),
                path.display()
            );
            TrustZone::Internet
        }
    };

    match evaluate(path, Some(observed), rule) {
        ZoneAction::Skip(SkipReason::RestrictedZone) => {
            warn!(
                "zone 4 (Restricted Sites) file left untouched by policy: {}",
                path.display()
            );
            false
        }
        ZoneAction::Skip(reason) => {
            debug!("skipping ({reason}): {}", path.display());
            false
        }
        ZoneAction::Assign(target) => {
            let size = file_size(path).await;
            match marker.reassign(path, target).await {
                Ok(()) => {
                    sink.on_outcome(&ProcessingOutcome::success(
                        path,
                        format!(
                            "zone reassigned {} -> {}",
                            observed.id(),
                            target.id()
                        ),
                        size,
                        target,
                    ));
                    true
                }
                Err(err) => {
                    error!(
                        "failed to reassign {}: {}",
                        path.display(),
                        err
                    );
                    sink.on_outcome(&ProcessingOutcome::failure(
                        path,
                        err.to_string(),
                        size,
                        observed,
                    ));
                    false
                }
            }
        }
        ZoneAction::Remove => {
            let size = file_size(path).await;
            match marker.remove_marker(path).await {
                Ok(()) => {
                    sink.on_outcome(&ProcessingOutcome::success(
                        path,
                        "origin marker removed",
                        size,
                        observed,
                    ));
                    true
                }
                Err(err) => {
                    error!(
                        "failed to remove marker of {}: {}",
                        path.display(),
                        err
                    );
                    sink.on_outcome(&ProcessingOutcome::failure(
                        path,
                        err.to_string(),
                        size,
                        observed,
                    ));
                    false
                }
            }
        }
    }
}

async fn file_size(path: &Path) -> u64 {
    tokio::fs::metadata(path)
        .await
        .map(|meta| meta.len())
        .unwrap_or(0)
}
