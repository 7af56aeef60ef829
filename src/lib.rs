//! # tag-harvest
//!
//! Bulk genre-tag scraper for songs listed in a CSV file.
//!
//! Each song becomes one lookup against its last.fm track page. Lookups run in
//! a bounded worker pool; every result is collected (failures included) and
//! handed back only once the whole batch has finished.
//!
//! ## Quick Start
//!
//! ```no_run
//! use tag_harvest::{Config, Harvester, Song};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let harvester = Harvester::new(&Config::default())?;
//!
//!     let songs = vec![
//!         Song::new(0, "Queen", "Innuendo"),
//!         Song::new(1, "ABBA", "Waterloo"),
//!     ];
//!     let report = harvester.run(songs).await?;
//!
//!     for outcome in &report.outcomes {
//!         println!("{} - {}: {:?}", outcome.artist, outcome.song, outcome.tags);
//!     }
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Per-song tag lookup
pub mod fetcher;
/// Run orchestration
pub mod harvester;
/// CSV input loading
pub mod input;
/// Bounded worker pool and result collection
pub mod pool;
/// JSON output
pub mod report;
/// Core types and events
pub mod types;

// Re-export commonly used types
pub use config::{Config, DEFAULT_MAX_WORKERS, FailurePolicy, PoolConfig};
pub use error::{Error, FetchError, Result};
pub use fetcher::{LastFmFetcher, TagFetcher};
pub use harvester::{Harvester, effective_workers};
pub use pool::{Collector, PoolOptions, WorkerPool};
pub use types::{Event, HarvestReport, Song, TagOutcome, TaskFailure};

/// Load the configured input, harvest the selected range, and write the output files.
///
/// A termination signal during the run cancels the remaining lookups; whatever
/// finished is still written.
///
/// # Errors
///
/// Returns an error for invalid configuration, unreadable input, an out-of-range
/// selection, or output that cannot be written. Failed lookups are not errors.
pub async fn harvest(config: &Config) -> Result<HarvestReport> {
    config.validate()?;

    let all_songs = input::load_songs(&config.input.path)?;
    let (from, to) = (config.input.songs_from, config.input.songs_to);
    tracing::info!(
        from,
        to,
        total = all_songs.len(),
        "Gonna load songs from {} to {} of {} songs",
        from,
        to,
        all_songs.len()
    );
    let songs = input::select_range(all_songs, from, to)?;

    let harvester = Harvester::new(config)?;
    let report = run_with_shutdown(&harvester, songs).await?;

    report::write_report(&config.output, &report).await?;
    tracing::info!(
        succeeded = report.succeeded(),
        failed = report.failed(),
        "Done"
    );
    Ok(report)
}

/// Run `harvester` over `songs`, cancelling it if a termination signal arrives.
///
/// - **Unix:** listens for SIGTERM and SIGINT, with fallbacks if signal registration fails.
/// - **Windows/other:** listens for Ctrl+C via `tokio::signal::ctrl_c()`.
pub async fn run_with_shutdown(harvester: &Harvester, songs: Vec<Song>) -> Result<HarvestReport> {
    let cancel_token = harvester.cancellation_token();
    let signal_watcher = tokio::spawn(async move {
        if wait_for_signal().await {
            tracing::warn!("Cancelling remaining lookups");
            cancel_token.cancel();
        }
    });

    let result = harvester.run(songs).await;
    signal_watcher.abort();
    result
}

/// Resolves once a termination signal arrives; `false` if none can ever be observed.
#[cfg(unix)]
async fn wait_for_signal() -> bool {
    use tokio::signal::unix::{SignalKind, signal};

    // Registration can fail in restricted environments (containers, tests)
    match (signal(SignalKind::terminate()), signal(SignalKind::interrupt())) {
        (Ok(mut sigterm), Ok(mut sigint)) => {
            tokio::select! {
                received = sigterm.recv() => log_signal("SIGTERM", received.is_some()),
                received = sigint.recv() => log_signal("SIGINT", received.is_some()),
            }
        }
        (Ok(mut sigterm), Err(e)) => {
            tracing::warn!(error = %e, "No SIGINT handler, waiting for SIGTERM only");
            log_signal("SIGTERM", sigterm.recv().await.is_some())
        }
        (Err(e), Ok(mut sigint)) => {
            tracing::warn!(error = %e, "No SIGTERM handler, waiting for SIGINT only");
            log_signal("SIGINT", sigint.recv().await.is_some())
        }
        (Err(e), Err(_)) => {
            tracing::error!(error = %e, "No signal handlers, falling back to ctrl_c");
            log_signal("Ctrl+C", tokio::signal::ctrl_c().await.is_ok())
        }
    }
}

#[cfg(unix)]
fn log_signal(name: &str, received: bool) -> bool {
    if received {
        tracing::info!(signal = name, "Received termination signal");
    }
    received
}

#[cfg(not(unix))]
async fn wait_for_signal() -> bool {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            tracing::info!("Received Ctrl+C signal");
            true
        }
        Err(e) => {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C signal");
            false
        }
    }
}
