use std::collections::HashMap;

use chrono::{DateTime, NaiveDate, Utc};

/// Number of days of per-day history retained across loads.
pub const DAILY_HISTORY_DAYS: i64 = 30;

/// Running totals for processed files, persisted between sessions.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WatcherStatistics {
    #[cfg_attr(feature = "serde", serde(default))]
    pub total_files_processed: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub total_bytes_processed: u64,
    #[cfg_attr(feature = "serde", serde(default = "Utc::now"))]
    pub first_run_date: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(default = "Utc::now"))]
    pub last_reset_date: DateTime<Utc>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub last_processed_date: Option<DateTime<Utc>>,
    /// Counts keyed by the zone id a file carried when it was processed.
    #[cfg_attr(feature = "serde", serde(default))]
    pub files_by_zone: HashMap<u8, u64>,
    /// Counts keyed by uppercased extension (`"(no extension)"` fallback).
    #[cfg_attr(feature = "serde", serde(default))]
    pub files_by_extension: HashMap<String, u64>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub daily_history: Vec<DailyStats>,
}

impl Default for WatcherStatistics {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            total_files_processed: 0,
            total_bytes_processed: 0,
            first_run_date: now,
            last_reset_date: now,
            last_processed_date: None,
            files_by_zone: HashMap::new(),
            files_by_extension: HashMap::new(),
            daily_history: Vec::new(),
        }
    }
}

impl WatcherStatistics {
    /// Drop per-day rows older than [`DAILY_HISTORY_DAYS`] and keep the
    /// remainder date-ordered.
    pub fn prune_daily_history(&mut self, today: NaiveDate) {
        let cutoff = today - chrono::Duration::days(DAILY_HISTORY_DAYS);
        self.daily_history.retain(|day| day.date >= cutoff);
        self.daily_history.sort_by_key(|day| day.date);
    }

    /// Today's row, created on first use.
    pub fn day_entry(&mut self, today: NaiveDate) -> &mut DailyStats {
        if let Some(idx) =
            self.daily_history.iter().position(|day| day.date == today)
        {
            &mut self.daily_history[idx]
        } else {
            self.daily_history.push(DailyStats::new(today));
            self.daily_history.last_mut().expect("just pushed")
        }
    }
}

/// One day's worth of processing totals.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct DailyStats {
    pub date: NaiveDate,
    #[cfg_attr(feature = "serde", serde(default))]
    pub files_processed: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub bytes_processed: u64,
}

impl DailyStats {
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            files_processed: 0,
            bytes_processed: 0,
        }
    }
}
