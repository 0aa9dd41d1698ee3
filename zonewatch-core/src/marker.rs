//! Origin-marker side-channel access.
//!
//! A file's trust marker lives in a sibling stream addressed as
//! `<path>:Zone.Identifier` (an NTFS alternate data stream on Windows; a
//! literal colon-suffixed name elsewhere). The store reads, rewrites, and
//! removes that stream; it never touches the file's own contents.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tracing::{info, warn};
use zonewatch_model::{TrustZone, ZoneMarker};

use crate::error::{Result, ZoneError};

/// Suffix appended to a file path to address its marker stream.
pub const ZONE_STREAM_SUFFIX: &str = ":Zone.Identifier";

/// Outcome of one progressive downgrade step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WashStep {
    /// Marker rewritten one zone lower.
    Lowered { from: TrustZone, to: TrustZone },
    /// Marker was at the most-trusted zone and has been removed.
    Cleared { from: TrustZone },
    /// No determinable marker; nothing to do.
    AlreadyClean,
}

/// Accumulated results of a batch progressive wash.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct WashSummary {
    pub lowered: usize,
    pub cleared: usize,
    pub already_clean: usize,
    pub failed: usize,
}

/// Reads and writes per-file origin markers.
#[derive(Debug, Default, Clone)]
pub struct MarkerStore;

impl MarkerStore {
    pub fn new() -> Self {
        Self
    }

    /// Whether `path` carries an origin marker.
    ///
    /// Never errors: a blank path, missing file, or unreadable stream all
    /// read as "no marker" (access problems are logged).
    pub async fn has_marker(&self, path: &Path) -> bool {
        if is_blank(path) {
            return false;
        }
        match tokio::fs::try_exists(path).await {
            Ok(true) => {}
            Ok(false) => return false,
            Err(err) => {
                warn!("error checking {}: {}", path.display(), err);
                return false;
            }
        }
        match tokio::fs::try_exists(&stream_path(path)).await {
            Ok(present) => present,
            Err(err) => {
                warn!("error checking marker of {}: {}", path.display(), err);
                false
            }
        }
    }

    /// Read the full marker, or `None` when absent or undeterminable.
    pub async fn read_marker(&self, path: &Path) -> Option<ZoneMarker> {
        if is_blank(path) {
            return None;
        }
        match tokio::fs::try_exists(path).await {
            Ok(true) => {}
            _ => return None,
        }
        match tokio::fs::read_to_string(&stream_path(path)).await {
            Ok(content) => ZoneMarker::parse(&content),
            Err(err) if err.kind() == ErrorKind::NotFound => None,
            Err(err) => {
                warn!("error reading zone of {}: {}", path.display(), err);
                None
            }
        }
    }

    /// Read just the zone, or `None` when absent or undeterminable.
    pub async fn read_zone(&self, path: &Path) -> Option<TrustZone> {
        self.read_marker(path).await.map(|marker| marker.zone)
    }

    /// Stamp `path` with `zone` and the placeholder origin, replacing any
    /// existing marker wholesale.
    pub async fn set_marker(&self, path: &Path, zone: TrustZone) -> Result<()> {
        self.write_marker(path, ZoneMarker::new(zone)).await?;
        info!("marked (zone {}): {}", zone.id(), path.display());
        Ok(())
    }

    /// Direct reassignment to any zone, including `Restricted`.
    ///
    /// An existing origin URL is carried over verbatim. This is the
    /// unrestricted path for advanced callers; automatic policy reaches it
    /// only with evaluator-vetted targets.
    pub async fn reassign(&self, path: &Path, zone: TrustZone) -> Result<()> {
        let host_url =
            self.read_marker(path).await.and_then(|marker| marker.host_url);
        self.write_marker(path, ZoneMarker { zone, host_url }).await?;
        info!("reassigned to zone {}: {}", zone.id(), path.display());
        Ok(())
    }

    /// Remove the marker. Succeeds as a no-op when none exists.
    pub async fn remove_marker(&self, path: &Path) -> Result<()> {
        self.check_target(path).await?;
        match tokio::fs::remove_file(stream_path(path)).await {
            Ok(()) => {
                info!("removed origin marker: {}", path.display());
                Ok(())
            }
            Err(err) if err.kind() == ErrorKind::NotFound => {
                info!("no origin marker to remove: {}", path.display());
                Ok(())
            }
            Err(err) => Err(map_io(err)),
        }
    }

    /// Progressive downgrade: 3→2→1→0, then removal.
    ///
    /// Zone 4 files are refused outright and left untouched; files without
    /// a determinable marker succeed as [`WashStep::AlreadyClean`].
    pub async fn step_down(&self, path: &Path) -> Result<WashStep> {
        if is_blank(path) {
            return Err(ZoneError::EmptyPath);
        }

        let Some(marker) = self.read_marker(path).await else {
            info!("already clean, nothing to downgrade: {}", path.display());
            return Ok(WashStep::AlreadyClean);
        };

        if marker.zone == TrustZone::Restricted {
            warn!(
                "zone 4 (Restricted Sites) detected, refusing to downgrade: {}",
                path.display()
            );
            return Err(ZoneError::RestrictedZoneProtected);
        }

        match marker.zone.next_lower() {
            Some(target) => {
                self.write_marker(
                    path,
                    ZoneMarker {
                        zone: target,
                        host_url: marker.host_url,
                    },
                )
                .await?;
                info!(
                    "downgraded zone {} -> {}: {}",
                    marker.zone.id(),
                    target.id(),
                    path.display()
                );
                Ok(WashStep::Lowered {
                    from: marker.zone,
                    to: target,
                })
            }
            None => {
                self.remove_marker(path).await?;
                info!(
                    "downgrade removed marker (was zone {}): {}",
                    marker.zone.id(),
                    path.display()
                );
                Ok(WashStep::Cleared { from: marker.zone })
            }
        }
    }

    /// Apply [`Self::step_down`] to a batch of paths, tallying results.
    pub async fn wash_all(&self, paths: &[PathBuf]) -> WashSummary {
        let mut summary = WashSummary::default();
        for path in paths {
            match self.step_down(path).await {
                Ok(WashStep::Lowered { .. }) => summary.lowered += 1,
                Ok(WashStep::Cleared { .. }) => summary.cleared += 1,
                Ok(WashStep::AlreadyClean) => summary.already_clean += 1,
                Err(err) => {
                    warn!("wash failed for {}: {}", path.display(), err);
                    summary.failed += 1;
                }
            }
        }
        summary
    }

    async fn write_marker(&self, path: &Path, marker: ZoneMarker) -> Result<()> {
        self.check_target(path).await?;
        tokio::fs::write(stream_path(path), marker.to_wire())
            .await
            .map_err(map_io)
    }

    async fn check_target(&self, path: &Path) -> Result<()> {
        if is_blank(path) {
            return Err(ZoneError::EmptyPath);
        }
        match tokio::fs::try_exists(path).await {
            Ok(true) => Ok(()),
            Ok(false) => Err(ZoneError::NotFound(path.to_path_buf())),
            Err(err) => Err(map_io(err)),
        }
    }
}

/// Whether `path` addresses a marker stream rather than a regular file.
///
/// On non-NTFS filesystems the streams surface as ordinary directory
/// entries, so scanners and watchers filter them out explicitly.
pub(crate) fn is_marker_stream(path: &Path) -> bool {
    path.as_os_str()
        .to_string_lossy()
        .ends_with(ZONE_STREAM_SUFFIX)
}

fn stream_path(path: &Path) -> PathBuf {
    let mut raw = path.as_os_str().to_os_string();
    raw.push(ZONE_STREAM_SUFFIX);
    PathBuf::from(raw)
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().is_empty() || path.to_string_lossy().trim().is_empty()
}

fn map_io(err: std::io::Error) -> ZoneError {
    if err.kind() == ErrorKind::PermissionDenied {
        ZoneError::AccessDenied(err.to_string())
    } else {
        ZoneError::Io(err)
    }
}
