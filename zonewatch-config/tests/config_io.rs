use tempfile::TempDir;
use zonewatch_model::{TrustZone, WatchedDirectory, WatcherConfig};

#[test]
fn first_load_creates_a_default_file() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("nested").join("watcher-config.json");

    let config = zonewatch_config::load_or_default(&path);

    assert!(path.exists());
    assert_eq!(config.debounce_delay_ms, 2000);
    assert!(config.notify_on_process);

    // Loading again round-trips the same configuration.
    let again = zonewatch_config::load_or_default(&path);
    assert_eq!(again, config);
}

#[test]
fn corrupt_files_fall_back_to_defaults() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("watcher-config.json");
    std::fs::write(&path, "{ this is not json").unwrap();

    let config = zonewatch_config::load_or_default(&path);
    assert_eq!(config.debounce_delay_ms, 2000);
}

#[test]
fn save_and_read_preserve_every_rule_field() {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join("watcher-config.json");

    let mut rule = WatchedDirectory::new("/srv/incoming");
    rule.include_subdirectories = true;
    rule.file_type_filters = vec![".exe".into(), "*.zip".into()];
    rule.min_zone = None;
    rule.target_zone = Some(TrustZone::Intranet);
    rule.exclude_patterns = vec!["*.partial".into(), "temp?.bin".into()];
    let config = WatcherConfig {
        start_watching_on_launch: true,
        notify_on_process: false,
        debounce_delay_ms: 500,
        watched_directories: vec![rule],
    };

    zonewatch_config::save_to(&path, &config).unwrap();
    let back = zonewatch_config::read_from(&path).unwrap();
    assert_eq!(back, config);
}

#[test]
fn sanitize_strips_restricted_targets_and_zero_debounce() {
    let mut rule = WatchedDirectory::new("/srv/incoming");
    rule.target_zone = Some(TrustZone::Restricted);
    let config = WatcherConfig {
        debounce_delay_ms: 0,
        watched_directories: vec![rule],
        ..WatcherConfig::default()
    };

    let config = zonewatch_config::sanitize(config);

    assert_eq!(config.debounce_delay_ms, 1);
    assert_eq!(config.watched_directories[0].target_zone, None);
}

#[test]
fn sanitize_leaves_valid_targets_alone() {
    let mut rule = WatchedDirectory::new("/srv/incoming");
    rule.target_zone = Some(TrustZone::Trusted);
    let config = WatcherConfig {
        watched_directories: vec![rule],
        ..WatcherConfig::default()
    };

    let config = zonewatch_config::sanitize(config);
    assert_eq!(
        config.watched_directories[0].target_zone,
        Some(TrustZone::Trusted)
    );
}
