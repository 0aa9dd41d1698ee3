//! # Zonewatch Daemon
//!
//! Headless front-end for the zonewatch engine: loads the watcher
//! configuration, wires statistics recording and log notifications into
//! the outcome stream, and runs the watch service until interrupted.
//!
//! All decision logic lives in `zonewatch-core`; this binary only starts,
//! stops, and (with `--scan`) triggers a one-shot rule run.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zonewatch_core::{MarkerStore, OutcomeSink, StatsRecorder, WatchService};
use zonewatch_model::ProcessingOutcome;

#[derive(Parser, Debug)]
#[command(
    name = "zonewatch-daemon",
    version,
    about = "Watches configured directories and downgrades origin-trust markers"
)]
struct Args {
    /// Apply the configured rules to existing files once, then exit.
    #[arg(long)]
    scan: bool,

    /// Alternate configuration file (defaults to the per-user location).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,
}

/// Routes outcomes to statistics and, when enabled, to the log as
/// user-visible notifications.
#[derive(Debug)]
struct DaemonSink {
    stats: StatsRecorder,
    notify: bool,
}

impl OutcomeSink for DaemonSink {
    fn on_outcome(&self, outcome: &ProcessingOutcome) {
        self.stats.on_outcome(outcome);

        if self.notify {
            let name = outcome
                .path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_else(|| outcome.path.display().to_string());
            if outcome.success {
                info!("{name}: {}", outcome.message);
            } else {
                warn!("{name}: {}", outcome.message);
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = match &args.config {
        Some(path) => zonewatch_config::load_or_default(path),
        None => zonewatch_config::load(),
    };
    if config.watched_directories.is_empty() {
        warn!("no watched directories configured; nothing will be processed");
    }

    let stats_path = zonewatch_config::stats_path()
        .context("failed to resolve statistics path")?;
    let sink = Arc::new(DaemonSink {
        stats: StatsRecorder::load_from(&stats_path),
        notify: config.notify_on_process,
    });

    let mut service = WatchService::new(config, MarkerStore::new(), sink);

    if args.scan {
        let summary = service.run_rules_now().await;
        info!(
            "scan finished: {} scanned, {} processed, {} succeeded",
            summary.scanned, summary.processed, summary.succeeded
        );
        return Ok(());
    }

    service.start();
    info!("zonewatch running; press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for shutdown signal")?;

    service.stop().await;
    info!("zonewatch shut down");
    Ok(())
}
