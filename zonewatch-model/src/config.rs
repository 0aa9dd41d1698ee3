use std::path::PathBuf;

use crate::zone::TrustZone;

/// A single directory the watch service keeps an eye on.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WatchedDirectory {
    pub path: PathBuf,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub enabled: bool,
    #[cfg_attr(feature = "serde", serde(default))]
    pub include_subdirectories: bool,
    /// `"*"` matches everything; other entries are extensions given as
    /// `.ext` or `*.ext`, compared case-insensitively.
    #[cfg_attr(feature = "serde", serde(default = "default_filters"))]
    pub file_type_filters: Vec<String>,
    /// Marked files below this zone are left alone. `None` means any
    /// marked file qualifies.
    #[cfg_attr(feature = "serde", serde(default = "default_min_zone"))]
    pub min_zone: Option<TrustZone>,
    /// Zone to assign on a match. `None` removes the marker entirely.
    #[cfg_attr(feature = "serde", serde(default))]
    pub target_zone: Option<TrustZone>,
    /// Case-insensitive globs over the file name (`*` any run, `?` one
    /// character). A match skips the file.
    #[cfg_attr(feature = "serde", serde(default))]
    pub exclude_patterns: Vec<String>,
}

impl WatchedDirectory {
    /// Directory with the stock rule set: any file type, Internet-or-worse
    /// markers only, full removal.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            enabled: default_true(),
            include_subdirectories: false,
            file_type_filters: default_filters(),
            min_zone: default_min_zone(),
            target_zone: None,
            exclude_patterns: Vec::new(),
        }
    }
}

/// Top-level watcher configuration supplied by the host application.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "camelCase"))]
pub struct WatcherConfig {
    #[cfg_attr(feature = "serde", serde(default))]
    pub start_watching_on_launch: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_true"))]
    pub notify_on_process: bool,
    #[cfg_attr(feature = "serde", serde(default = "default_debounce_ms"))]
    pub debounce_delay_ms: u64,
    #[cfg_attr(feature = "serde", serde(default))]
    pub watched_directories: Vec<WatchedDirectory>,
}

impl WatcherConfig {
    /// The directories the watch service should actually act on.
    pub fn enabled_directories(
        &self,
    ) -> impl Iterator<Item = &WatchedDirectory> {
        self.watched_directories.iter().filter(|dir| dir.enabled)
    }
}

impl Default for WatcherConfig {
    fn default() -> Self {
        Self {
            start_watching_on_launch: false,
            notify_on_process: default_true(),
            debounce_delay_ms: default_debounce_ms(),
            watched_directories: Vec::new(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_filters() -> Vec<String> {
    vec!["*".to_string()]
}

fn default_min_zone() -> Option<TrustZone> {
    Some(TrustZone::Internet)
}

fn default_debounce_ms() -> u64 {
    2000
}

#[cfg(all(test, feature = "serde"))]
mod tests {
    use super::*;

    #[test]
    fn sparse_json_fills_defaults() {
        let dir: WatchedDirectory =
            serde_json::from_str(r#"{"path": "/home/user/Downloads"}"#)
                .unwrap();
        assert!(dir.enabled);
        assert!(!dir.include_subdirectories);
        assert_eq!(dir.file_type_filters, vec!["*".to_string()]);
        assert_eq!(dir.min_zone, Some(TrustZone::Internet));
        assert_eq!(dir.target_zone, None);
        assert!(dir.exclude_patterns.is_empty());
    }

    #[test]
    fn config_round_trips_camel_case() {
        let mut config = WatcherConfig::default();
        let mut dir = WatchedDirectory::new("/srv/incoming");
        dir.include_subdirectories = true;
        dir.target_zone = Some(TrustZone::Trusted);
        dir.exclude_patterns.push("*.tmp".into());
        config.watched_directories.push(dir);

        let json = serde_json::to_string_pretty(&config).unwrap();
        assert!(json.contains("watchedDirectories"));
        assert!(json.contains("debounceDelayMs"));
        let back: WatcherConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
