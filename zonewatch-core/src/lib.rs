//! # Zonewatch Core
//!
//! Engine behind the zonewatch tooling: reads, rewrites, and progressively
//! downgrades the per-file origin-trust marker, and keeps watch over a
//! configured set of directories to do so automatically.
//!
//! ## Overview
//!
//! - **Marker store**: the `<path>:Zone.Identifier` side-channel — presence
//!   checks, zone reads, rewrites, removal, and the progressive
//!   3→2→1→0→removed downgrade ladder.
//! - **Policy**: a pure evaluator mapping a file's current zone and its
//!   directory rule to an action. Zone 4 (Restricted Sites) is never
//!   touched and never assigned automatically.
//! - **Watch pipeline**: `notify` observers per configured directory feed
//!   a concurrent debounce tracker; a single scheduler task drains settled
//!   files through the policy pipeline and reports outcomes.
//! - **Statistics**: an outcome sink aggregating processed-file totals to
//!   a JSON file.
//!
//! Everything is wired by constructor parameters; there is no process-wide
//! state beyond what a caller chooses to share.

// TODO: Document properly
#![cfg_attr(docsrs, feature(doc_cfg))]
#![allow(missing_docs)]

/// Error types and error handling utilities
pub mod error;

/// Origin-marker side-channel store
pub mod marker;

/// Outcome observer hooks
pub mod outcome;

/// Debounce tracker for recently active files
pub mod pending;

/// Zone-downgrade policy evaluation
pub mod policy;

/// Directory enumeration for on-demand rule runs
mod scan;

/// The long-running watch service
pub mod service;

/// Statistics aggregation and persistence
pub mod stats;

/// Filesystem observers and directory/filter matching
mod watch;

pub use error::{Result, ZoneError};
pub use marker::{MarkerStore, WashStep, WashSummary, ZONE_STREAM_SUFFIX};
pub use outcome::{NoopOutcomeSink, OutcomeSink};
pub use pending::PendingTracker;
pub use policy::{SkipReason, ZoneAction, evaluate};
pub use service::{ScanSummary, WatchService};
pub use stats::StatsRecorder;
