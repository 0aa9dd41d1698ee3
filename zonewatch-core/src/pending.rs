//! Debounce tracker for files with recent filesystem activity.
//!
//! Watch callbacks upsert entries concurrently; the scheduler task drains
//! whatever has been quiet for a full debounce interval. Re-touching a path
//! resets its window.

use std::path::{Path, PathBuf};
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::DashMap;

/// Concurrent map of path → last observed activity.
#[derive(Debug, Default)]
pub struct PendingTracker {
    entries: DashMap<PathBuf, DateTime<Utc>>,
}

impl PendingTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record activity on `path` now, resetting its debounce window.
    pub fn touch(&self, path: PathBuf) {
        self.entries.insert(path, Utc::now());
    }

    /// Atomically drop an entry. Returns whether one was present.
    pub fn remove(&self, path: &Path) -> bool {
        self.entries.remove(path).is_some()
    }

    /// Select every entry quiet for at least `debounce` as of `now` and
    /// remove each exactly once. Entries touched after selection are taken
    /// anyway; a notification landing after removal re-enters the map for
    /// the next drain.
    pub fn take_ready(
        &self,
        debounce: Duration,
        now: DateTime<Utc>,
    ) -> Vec<PathBuf> {
        let debounce = chrono::Duration::from_std(debounce)
            .unwrap_or_else(|_| chrono::Duration::zero());

        let ready: Vec<PathBuf> = self
            .entries
            .iter()
            .filter(|entry| now - *entry.value() >= debounce)
            .map(|entry| entry.key().clone())
            .collect();

        ready
            .into_iter()
            .filter(|path| self.entries.remove(path).is_some())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
