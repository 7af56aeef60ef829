//! Run orchestration: one pool per run, drained after the completion barrier.

use std::sync::{Arc, Mutex, PoisonError};

use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use crate::config::{Config, PoolConfig};
use crate::error::Result;
use crate::fetcher::{LastFmFetcher, TagFetcher};
use crate::pool::{Collector, PoolOptions, WorkerPool};
use crate::types::{Event, HarvestReport, Song};

/// Capacity of the progress event channel
const EVENT_CHANNEL_CAPACITY: usize = 1024;

/// Clamp a requested worker count into `1..=ceiling`
pub fn effective_workers(requested: usize, ceiling: usize) -> usize {
    requested.min(ceiling).max(1)
}

/// Drives one or more harvest runs against a [`TagFetcher`].
///
/// Cloning is cheap; clones share the fetcher, the event channel and the
/// cancellation token.
///
/// A cancelled token is replaced when the run it cancelled returns, so a
/// harvester stays usable after [`cancel`](Self::cancel).
#[derive(Clone)]
pub struct Harvester {
    fetcher: Arc<dyn TagFetcher>,
    pool_config: PoolConfig,
    cancel_token: Arc<Mutex<CancellationToken>>,
    event_tx: broadcast::Sender<Event>,
}

impl Harvester {
    /// Build a harvester scraping last.fm as described by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid or the HTTP client
    /// cannot be created.
    pub fn new(config: &Config) -> Result<Self> {
        config.fetch.validate()?;
        config.pool.validate()?;
        let fetcher = LastFmFetcher::new(&config.fetch)?;
        Ok(Self::with_fetcher(config.pool.clone(), Arc::new(fetcher)))
    }

    /// Build a harvester around any fetcher
    pub fn with_fetcher(pool_config: PoolConfig, fetcher: Arc<dyn TagFetcher>) -> Self {
        let (event_tx, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            fetcher,
            pool_config,
            cancel_token: Arc::new(Mutex::new(CancellationToken::new())),
            event_tx,
        }
    }

    /// Subscribe to progress events
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.event_tx.subscribe()
    }

    /// Cancel queued and in-flight lookups of the current run
    ///
    /// With no run in progress, the next run is the one cancelled. The run
    /// still completes and returns a report; cancelled songs appear as
    /// failures. Runs started after it returns are unaffected.
    pub fn cancel(&self) {
        self.cancellation_token().cancel();
    }

    /// Token observed by every lookup of the current run
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Swap in a fresh token if the current one has fired
    fn reset_cancellation(&self) {
        let mut token = self
            .cancel_token
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if token.is_cancelled() {
            *token = CancellationToken::new();
        }
    }

    /// Look up every song and return once all of them have finished
    ///
    /// Individual lookup failures never fail the run.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`](crate::Error::Config) if the worker ceiling is zero.
    pub async fn run(&self, songs: Vec<Song>) -> Result<HarvestReport> {
        self.pool_config.validate()?;
        let ceiling = self.pool_config.max_workers;

        let requested = self.pool_config.workers;
        let workers = effective_workers(requested, ceiling);
        if workers != requested {
            tracing::info!(requested, workers, ceiling, "Adjusted worker count");
        }

        let cancel_token = self.cancellation_token();
        let collector = Arc::new(Collector::with_capacity(songs.len()));
        let mut pool = WorkerPool::new(
            workers,
            Arc::clone(&self.fetcher),
            Arc::clone(&collector),
            PoolOptions {
                task_timeout: self.pool_config.task_timeout,
                failure_policy: self.pool_config.failure_policy,
                cancel_token,
                event_tx: Some(self.event_tx.clone()),
            },
        );

        tracing::info!(tasks = songs.len(), workers, "Starting harvest");
        self.event_tx
            .send(Event::RunStarted {
                tasks: songs.len(),
                workers,
            })
            .ok();

        for song in songs {
            pool.submit(song)?;
        }

        // Completion barrier: every submitted task has finished past this point
        pool.shutdown().await;
        self.reset_cancellation();

        let submitted = pool.submitted();
        let (outcomes, failures) = collector.drain().await;
        let report = HarvestReport {
            outcomes,
            failures,
            submitted,
        };

        tracing::info!(
            submitted,
            succeeded = report.succeeded(),
            failed = report.failed(),
            "Harvest finished"
        );
        self.event_tx
            .send(Event::RunFinished {
                succeeded: report.succeeded(),
                failed: report.failed(),
            })
            .ok();

        Ok(report)
    }
}
