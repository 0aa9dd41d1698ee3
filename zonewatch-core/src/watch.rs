//! Filesystem observers for the configured directory set.
//!
//! One `notify` watcher per enabled directory. Callbacks run on notify's
//! own threads and only ever match paths and upsert the pending tracker;
//! all marker work happens later, on the scheduler task.

use std::fmt;
use std::path::{MAIN_SEPARATOR, Path};
use std::sync::Arc;

use notify::event::{EventKind, ModifyKind};
use notify::{
    Config as NotifyConfig, Event, RecommendedWatcher, RecursiveMode, Watcher,
};
use tracing::{debug, error, info, warn};
use zonewatch_model::{WatchedDirectory, WatcherConfig};

use crate::marker::is_marker_stream;
use crate::pending::PendingTracker;

/// The set of live filesystem observers for one watch session.
///
/// Dropping the set stops all notification streams.
pub(crate) struct WatchSet {
    watchers: Vec<RecommendedWatcher>,
}

impl WatchSet {
    /// Attach observers for every enabled directory that exists.
    ///
    /// Missing directories and watcher construction failures are logged
    /// and skipped; they are not retried.
    pub fn start(
        config: &Arc<WatcherConfig>,
        tracker: &Arc<PendingTracker>,
    ) -> WatchSet {
        let mut watchers = Vec::new();

        for dir in config.enabled_directories() {
            if !dir.path.is_dir() {
                warn!(
                    "watched directory does not exist: {}",
                    dir.path.display()
                );
                continue;
            }

            let mode = if dir.include_subdirectories {
                RecursiveMode::Recursive
            } else {
                RecursiveMode::NonRecursive
            };

            let callback_config = Arc::clone(config);
            let callback_tracker = Arc::clone(tracker);
            let root = dir.path.clone();

            let mut watcher = match RecommendedWatcher::new(
                move |res: std::result::Result<Event, notify::Error>| {
                    match res {
                        Ok(event) => route_event(
                            &callback_config,
                            &callback_tracker,
                            event,
                        ),
                        Err(err) => {
                            warn!(
                                "watch error on {}: {}",
                                root.display(),
                                err
                            );
                        }
                    }
                },
                NotifyConfig::default(),
            ) {
                Ok(watcher) => watcher,
                Err(err) => {
                    error!(
                        "failed to create watcher for {}: {}",
                        dir.path.display(),
                        err
                    );
                    continue;
                }
            };

            if let Err(err) = watcher.watch(&dir.path, mode) {
                error!("failed to watch {}: {}", dir.path.display(), err);
                continue;
            }

            info!(
                "watching: {} (subdirs: {})",
                dir.path.display(),
                dir.include_subdirectories
            );
            watchers.push(watcher);
        }

        WatchSet { watchers }
    }

    pub fn len(&self) -> usize {
        self.watchers.len()
    }
}

impl fmt::Debug for WatchSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WatchSet")
            .field("watcher_count", &self.watchers.len())
            .finish()
    }
}

fn route_event(
    config: &WatcherConfig,
    tracker: &PendingTracker,
    event: Event,
) {
    if !is_relevant_kind(&event.kind) {
        return;
    }

    for path in event.paths {
        // Marker rewrites raise their own notifications; ignore them.
        if is_marker_stream(&path) {
            continue;
        }
        // The event may be stale by the time it is delivered.
        if !path.is_file() {
            continue;
        }
        let Some(rule) = matching_rule(config, &path) else {
            continue;
        };
        if !matches_type_filter(rule, &path) {
            continue;
        }
        debug!("queued for processing: {}", path.display());
        tracker.touch(path);
    }
}

fn is_relevant_kind(kind: &EventKind) -> bool {
    matches!(
        kind,
        EventKind::Any
            | EventKind::Create(_)
            | EventKind::Modify(
                ModifyKind::Any
                    | ModifyKind::Data(_)
                    | ModifyKind::Metadata(_)
                    | ModifyKind::Name(_)
            )
    )
}

/// First enabled directory whose subtree rules claim `path`.
///
/// Non-recursive directories claim only their immediate children;
/// recursive ones claim the whole subtree. Comparison is case-insensitive,
/// matching the marker's home platform.
pub(crate) fn matching_rule<'a>(
    config: &'a WatcherConfig,
    path: &Path,
) -> Option<&'a WatchedDirectory> {
    config.enabled_directories().find(|dir| {
        if dir.include_subdirectories {
            path_is_under_fold(path, &dir.path)
        } else {
            path.parent()
                .is_some_and(|parent| paths_equal_fold(parent, &dir.path))
        }
    })
}

/// Whether `path` passes the rule's file-type filters.
pub(crate) fn matches_type_filter(
    rule: &WatchedDirectory,
    path: &Path,
) -> bool {
    if rule.file_type_filters.iter().any(|filter| filter == "*") {
        return true;
    }

    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };
    let dotted = format!(".{ext}");
    let starred = format!("*.{ext}");

    rule.file_type_filters.iter().any(|filter| {
        filter.eq_ignore_ascii_case(&dotted)
            || filter.eq_ignore_ascii_case(&starred)
    })
}

fn normalized(path: &Path) -> String {
    path.to_string_lossy()
        .trim_end_matches(['/', '\\'])
        .to_lowercase()
}

fn paths_equal_fold(a: &Path, b: &Path) -> bool {
    normalized(a) == normalized(b)
}

fn path_is_under_fold(path: &Path, root: &Path) -> bool {
    let path = normalized(path);
    let root = normalized(root);
    match path.strip_prefix(root.as_str()) {
        Some(rest) => {
            rest.is_empty()
                || rest.starts_with(MAIN_SEPARATOR)
                || rest.starts_with('/')
        }
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;

    fn config_with(dirs: Vec<WatchedDirectory>) -> WatcherConfig {
        WatcherConfig {
            watched_directories: dirs,
            ..WatcherConfig::default()
        }
    }

    #[test]
    fn non_recursive_claims_direct_children_only() {
        let config = config_with(vec![WatchedDirectory::new("/downloads")]);

        assert!(
            matching_rule(&config, Path::new("/downloads/setup.exe"))
                .is_some()
        );
        assert!(
            matching_rule(&config, Path::new("/downloads/sub/setup.exe"))
                .is_none()
        );
    }

    #[test]
    fn recursive_claims_whole_subtree_but_not_siblings() {
        let mut dir = WatchedDirectory::new("/downloads");
        dir.include_subdirectories = true;
        let config = config_with(vec![dir]);

        assert!(
            matching_rule(&config, Path::new("/downloads/a/b/c.exe"))
                .is_some()
        );
        assert!(
            matching_rule(&config, Path::new("/downloads-old/c.exe"))
                .is_none()
        );
    }

    #[test]
    fn matching_is_case_insensitive() {
        let config = config_with(vec![WatchedDirectory::new("/Downloads")]);
        assert!(
            matching_rule(&config, Path::new("/downloads/Setup.exe"))
                .is_some()
        );
    }

    #[test]
    fn disabled_directories_never_match() {
        let mut dir = WatchedDirectory::new("/downloads");
        dir.enabled = false;
        let config = config_with(vec![dir]);
        assert!(
            matching_rule(&config, Path::new("/downloads/setup.exe"))
                .is_none()
        );
    }

    #[test]
    fn type_filters_accept_dotted_and_starred_forms() {
        let mut rule = WatchedDirectory::new("/downloads");
        rule.file_type_filters = vec![".exe".into(), "*.ZIP".into()];

        assert!(matches_type_filter(&rule, Path::new("/d/Setup.EXE")));
        assert!(matches_type_filter(&rule, Path::new("/d/archive.zip")));
        assert!(!matches_type_filter(&rule, Path::new("/d/readme.txt")));
        assert!(!matches_type_filter(&rule, Path::new("/d/no_extension")));
    }

    #[test]
    fn star_filter_matches_everything() {
        let rule = WatchedDirectory::new("/downloads");
        assert!(matches_type_filter(&rule, Path::new("/d/no_extension")));
        assert!(matches_type_filter(&rule, Path::new("/d/a.bin")));
    }

    #[test]
    fn first_matching_directory_wins() {
        let mut broad = WatchedDirectory::new("/downloads");
        broad.include_subdirectories = true;
        let narrow = WatchedDirectory::new("/downloads/installers");
        let config = config_with(vec![narrow, broad]);

        let rule = matching_rule(
            &config,
            Path::new("/downloads/installers/setup.exe"),
        )
        .unwrap();
        assert_eq!(rule.path, PathBuf::from("/downloads/installers"));
    }
}
