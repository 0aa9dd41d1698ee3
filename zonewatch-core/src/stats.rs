//! Processing statistics: aggregation and JSON persistence.

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::Utc;
use parking_lot::Mutex;
use tracing::{error, info};
use zonewatch_model::{ProcessingOutcome, WatcherStatistics};

use crate::outcome::OutcomeSink;

/// Load statistics from `path`, falling back to fresh defaults on a
/// missing or unreadable file. Daily history is pruned on the way in.
pub fn load(path: &Path) -> WatcherStatistics {
    let mut stats = match std::fs::read_to_string(path) {
        Ok(json) => match serde_json::from_str::<WatcherStatistics>(&json) {
            Ok(stats) => stats,
            Err(err) => {
                error!("failed to parse statistics file: {err}");
                WatcherStatistics::default()
            }
        },
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            WatcherStatistics::default()
        }
        Err(err) => {
            error!("failed to load statistics: {err}");
            WatcherStatistics::default()
        }
    };
    stats.prune_daily_history(Utc::now().date_naive());
    stats
}

/// Persist statistics as pretty-printed JSON, creating parent directories
/// as needed.
pub fn save(path: &Path, stats: &WatcherStatistics) -> std::io::Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(stats)
        .map_err(std::io::Error::other)?;
    std::fs::write(path, json)
}

/// Fold one successful outcome into the running totals.
pub fn record(stats: &mut WatcherStatistics, outcome: &ProcessingOutcome) {
    stats.total_files_processed += 1;
    stats.total_bytes_processed += outcome.size_bytes;
    stats.last_processed_date = Some(Utc::now());

    *stats.files_by_zone.entry(outcome.zone.id()).or_insert(0) += 1;

    let extension = outcome
        .path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| format!(".{}", ext.to_uppercase()))
        .unwrap_or_else(|| "(no extension)".to_string());
    *stats.files_by_extension.entry(extension).or_insert(0) += 1;

    let today = Utc::now().date_naive();
    let day = stats.day_entry(today);
    day.files_processed += 1;
    day.bytes_processed += outcome.size_bytes;
}

/// Clear all counters, stamping the reset date.
pub fn reset(stats: &mut WatcherStatistics) {
    stats.total_files_processed = 0;
    stats.total_bytes_processed = 0;
    stats.last_reset_date = Utc::now();
    stats.last_processed_date = None;
    stats.files_by_zone.clear();
    stats.files_by_extension.clear();
    stats.daily_history.clear();
}

/// Outcome sink that aggregates successful results and saves them to disk
/// after every update. Persistence failures are logged, never propagated.
pub struct StatsRecorder {
    path: PathBuf,
    stats: Mutex<WatcherStatistics>,
}

impl StatsRecorder {
    /// Recorder backed by the JSON file at `path`, seeded from its current
    /// contents.
    pub fn load_from(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let stats = load(&path);
        info!(
            "statistics loaded: {} files processed to date",
            stats.total_files_processed
        );
        Self {
            path,
            stats: Mutex::new(stats),
        }
    }

    pub fn snapshot(&self) -> WatcherStatistics {
        self.stats.lock().clone()
    }

    pub fn reset(&self) {
        let mut stats = self.stats.lock();
        reset(&mut stats);
        if let Err(err) = save(&self.path, &stats) {
            error!("failed to save statistics: {err}");
        }
    }
}

impl OutcomeSink for StatsRecorder {
    fn on_outcome(&self, outcome: &ProcessingOutcome) {
        if !outcome.success {
            return;
        }
        let mut stats = self.stats.lock();
        record(&mut stats, outcome);
        if let Err(err) = save(&self.path, &stats) {
            error!("failed to save statistics: {err}");
        }
    }
}

impl fmt::Debug for StatsRecorder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsRecorder")
            .field("path", &self.path)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use zonewatch_model::TrustZone;

    use super::*;

    fn outcome(path: &str, bytes: u64, zone: TrustZone) -> ProcessingOutcome {
        ProcessingOutcome::success(path, "origin marker removed", bytes, zone)
    }

    #[test]
    fn record_updates_all_counters() {
        let mut stats = WatcherStatistics::default();
        record(&mut stats, &outcome("/d/setup.exe", 1024, TrustZone::Internet));
        record(&mut stats, &outcome("/d/notes", 10, TrustZone::Trusted));

        assert_eq!(stats.total_files_processed, 2);
        assert_eq!(stats.total_bytes_processed, 1034);
        assert_eq!(stats.files_by_zone.get(&3), Some(&1));
        assert_eq!(stats.files_by_zone.get(&2), Some(&1));
        assert_eq!(stats.files_by_extension.get(".EXE"), Some(&1));
        assert_eq!(stats.files_by_extension.get("(no extension)"), Some(&1));
        assert_eq!(stats.daily_history.len(), 1);
        assert_eq!(stats.daily_history[0].files_processed, 2);
        assert!(stats.last_processed_date.is_some());
    }

    #[test]
    fn recorder_persists_and_ignores_failures() {
        let dir = tempfile::tempdir().unwrap();
        let stats_path = dir.path().join("stats").join("watcher-stats.json");

        let recorder = StatsRecorder::load_from(&stats_path);
        recorder.on_outcome(&outcome("/d/a.zip", 5, TrustZone::Internet));
        recorder.on_outcome(&ProcessingOutcome::failure(
            "/d/b.zip",
            "access denied",
            0,
            TrustZone::Internet,
        ));

        let reloaded = load(&stats_path);
        assert_eq!(reloaded.total_files_processed, 1);

        recorder.reset();
        let reloaded = load(&stats_path);
        assert_eq!(reloaded.total_files_processed, 0);
        assert!(reloaded.files_by_zone.is_empty());
    }

    #[test]
    fn load_survives_corrupt_files() {
        let dir = tempfile::tempdir().unwrap();
        let stats_path = dir.path().join("watcher-stats.json");
        std::fs::write(&stats_path, "not json at all").unwrap();
        let stats = load(&stats_path);
        assert_eq!(stats.total_files_processed, 0);
    }
}
