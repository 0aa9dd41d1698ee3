//! Configuration persistence for the zonewatch watcher.
//!
//! The watcher configuration lives as pretty-printed JSON under the
//! per-user config directory (`<config_dir>/zonewatch/`). Loading never
//! fails the caller: missing or corrupt files fall back to a sensible
//! default, which is written back on first run.

#![allow(missing_docs)]

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{error, info, warn};
use zonewatch_model::{TrustZone, WatchedDirectory, WatcherConfig};

/// Application folder name under the platform config directory.
const APP_DIR: &str = "zonewatch";
/// Watcher configuration file name.
const CONFIG_FILE: &str = "watcher-config.json";
/// Statistics file name, kept beside the configuration.
const STATS_FILE: &str = "watcher-stats.json";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("no platform config directory available")]
    NoConfigDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, ConfigError>;

/// Directory holding zonewatch's per-user files.
pub fn config_dir() -> Result<PathBuf> {
    dirs::config_dir()
        .map(|dir| dir.join(APP_DIR))
        .ok_or(ConfigError::NoConfigDir)
}

/// Path of the watcher configuration file.
pub fn config_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE))
}

/// Path of the statistics file.
pub fn stats_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(STATS_FILE))
}

/// Load the configuration from the default location, creating a default
/// file on first run. Never fails: unreadable content logs and falls back
/// to the default configuration.
pub fn load() -> WatcherConfig {
    match config_path() {
        Ok(path) => load_or_default(&path),
        Err(err) => {
            error!("failed to resolve config path: {err}");
            sanitize(default_config())
        }
    }
}

/// Load from an explicit path with the same fallback behavior as [`load`].
pub fn load_or_default(path: &Path) -> WatcherConfig {
    if !path.exists() {
        info!("no existing config found, creating default configuration");
        let config = sanitize(default_config());
        if let Err(err) = save_to(path, &config) {
            error!("failed to write default config: {err}");
        }
        return config;
    }

    match read_from(path) {
        Ok(config) => {
            info!(
                "loaded configuration with {} watched directories",
                config.watched_directories.len()
            );
            sanitize(config)
        }
        Err(err) => {
            error!("failed to load config: {err}");
            sanitize(default_config())
        }
    }
}

/// Strict read, surfacing IO and parse errors to the caller.
pub fn read_from(path: &Path) -> Result<WatcherConfig> {
    let json = std::fs::read_to_string(path)?;
    Ok(serde_json::from_str(&json)?)
}

/// Persist the configuration to the default location.
pub fn save(config: &WatcherConfig) -> Result<()> {
    save_to(&config_path()?, config)
}

/// Persist the configuration to an explicit path, creating parent
/// directories as needed.
pub fn save_to(path: &Path, config: &WatcherConfig) -> Result<()> {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(config)?;
    std::fs::write(path, json)?;
    info!(
        "configuration saved with {} watched directories",
        config.watched_directories.len()
    );
    Ok(())
}

/// Enforce invariants the engine depends on: a non-zero debounce interval
/// and no rule targeting the restricted zone.
pub fn sanitize(mut config: WatcherConfig) -> WatcherConfig {
    if config.debounce_delay_ms == 0 {
        warn!("debounce of 0 ms clamped to 1 ms");
        config.debounce_delay_ms = 1;
    }

    for dir in &mut config.watched_directories {
        if dir.target_zone == Some(TrustZone::Restricted) {
            warn!(
                "rule for {} targets zone 4 (Restricted Sites); zone 4 is \
                 never assigned automatically - falling back to marker removal",
                dir.path.display()
            );
            dir.target_zone = None;
        }
    }

    config
}

/// Stock configuration: watch the user's Downloads folder, if present,
/// for Internet-or-worse markers.
pub fn default_config() -> WatcherConfig {
    let mut config = WatcherConfig::default();

    if let Some(downloads) = dirs::download_dir()
        && downloads.is_dir()
    {
        let mut dir = WatchedDirectory::new(downloads);
        dir.min_zone = Some(TrustZone::Internet);
        config.watched_directories.push(dir);
    }

    config
}
