//! tag-harvest command-line entry point

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tag_harvest::config::{Config, FetchConfig, InputConfig, OutputConfig, PoolConfig};
use tag_harvest::{DEFAULT_MAX_WORKERS, FailurePolicy};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Fetch last.fm genre tags for a range of songs from a CSV file
#[derive(Parser, Debug)]
#[command(name = "tag-harvest", version, about)]
struct Cli {
    /// Input CSV file (artist,song,link,text)
    #[arg(long, env = "TAG_HARVEST_INPUT_FILE", default_value = "songdata.csv")]
    input_file: PathBuf,

    /// Output JSON file
    #[arg(long, env = "TAG_HARVEST_OUTPUT_FILE", default_value = "results.json")]
    output_file: PathBuf,

    /// Index of the first song in the CSV (zero-based; 1 skips the header line)
    #[arg(long, default_value_t = 1)]
    songs_from: usize,

    /// Index one past the last song in the CSV
    #[arg(long, default_value_t = 20)]
    songs_to: usize,

    /// Number of concurrent workers
    #[arg(long, env = "TAG_HARVEST_WORKERS", default_value_t = 20)]
    workers: usize,

    /// Ceiling the worker count is clamped to
    #[arg(long, env = "TAG_HARVEST_MAX_WORKERS", default_value_t = DEFAULT_MAX_WORKERS)]
    max_workers: usize,

    /// Give up on a single song after this many seconds
    #[arg(long)]
    task_timeout_secs: Option<u64>,

    /// What to do with failed lookups: drop or record
    #[arg(long, default_value = "record")]
    failure_policy: FailurePolicy,

    /// Write failed lookups to this JSON file
    #[arg(long)]
    failures_file: Option<PathBuf>,

    /// Base URL track paths are appended to
    #[arg(long, env = "TAG_HARVEST_BASE_URL")]
    base_url: Option<String>,

    /// CSS selector matching one element per tag
    #[arg(long)]
    tag_selector: Option<String>,
}

impl Cli {
    fn into_config(self) -> Config {
        let defaults = FetchConfig::default();
        Config {
            input: InputConfig {
                path: self.input_file,
                songs_from: self.songs_from,
                songs_to: self.songs_to,
            },
            output: OutputConfig {
                path: self.output_file,
                failures_path: self.failures_file,
            },
            fetch: FetchConfig {
                base_url: self.base_url.unwrap_or(defaults.base_url),
                tag_selector: self.tag_selector.unwrap_or(defaults.tag_selector),
                ..defaults
            },
            pool: PoolConfig {
                workers: self.workers,
                max_workers: self.max_workers,
                task_timeout: self.task_timeout_secs.map(Duration::from_secs),
                failure_policy: self.failure_policy,
            },
        }
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("tag_harvest=info")),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Cli::parse().into_config();
    let report = tag_harvest::harvest(&config).await?;

    if report.failed() > 0 {
        tracing::warn!(
            failed = report.failed(),
            submitted = report.submitted,
            "Some songs could not be looked up"
        );
    }
    Ok(())
}
