//! Worker pool for slot-limited execution of song lookups.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use tokio::sync::{Semaphore, broadcast};
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::FailurePolicy;
use crate::error::{Error, FetchError, Result};
use crate::fetcher::TagFetcher;
use crate::types::{Event, Song, TagOutcome, TaskFailure};

use super::collector::Collector;

/// Per-run knobs applied to every task in the pool
#[derive(Clone, Debug, Default)]
pub struct PoolOptions {
    /// Upper bound on one lookup, slot wait excluded (None = unbounded)
    pub task_timeout: Option<Duration>,
    /// Whether failed lookups leave a record in the collector
    pub failure_policy: FailurePolicy,
    /// Cancels queued and in-flight lookups when triggered
    pub cancel_token: CancellationToken,
    /// Progress event sink
    pub event_tx: Option<broadcast::Sender<Event>>,
}

/// State shared by every task spawned from one pool
struct Shared {
    slots: Arc<Semaphore>,
    fetcher: Arc<dyn TagFetcher>,
    collector: Arc<Collector>,
    options: PoolOptions,
}

/// Bounded-concurrency executor for song lookups.
///
/// [`submit`](Self::submit) spawns immediately; each spawned task waits for
/// one of `capacity` slots before calling the fetcher, so at most `capacity`
/// lookups run at once. [`shutdown`](Self::shutdown) is the completion
/// barrier: it returns once every submitted task has finished.
///
/// Dropping the pool aborts whatever is still tracked, so no task outlives
/// it on any exit path.
pub struct WorkerPool {
    shared: Arc<Shared>,
    capacity: usize,
    tasks: JoinSet<()>,
    submitted: usize,
    closed: bool,
}

impl WorkerPool {
    /// Create a pool with `capacity` slots (at least one)
    pub fn new(
        capacity: usize,
        fetcher: Arc<dyn TagFetcher>,
        collector: Arc<Collector>,
        options: PoolOptions,
    ) -> Self {
        let capacity = capacity.max(1);
        Self {
            shared: Arc::new(Shared {
                slots: Arc::new(Semaphore::new(capacity)),
                fetcher,
                collector,
                options,
            }),
            capacity,
            tasks: JoinSet::new(),
            submitted: 0,
            closed: false,
        }
    }

    /// Maximum number of concurrent lookups
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of songs submitted so far
    pub fn submitted(&self) -> usize {
        self.submitted
    }

    /// Number of lookups currently holding a slot
    pub fn in_flight(&self) -> usize {
        self.capacity
            .saturating_sub(self.shared.slots.available_permits())
            .min(self.tasks.len())
    }

    /// Queue a song for lookup without waiting for a free slot
    ///
    /// # Errors
    ///
    /// Returns [`Error::PoolClosed`] after [`shutdown`](Self::shutdown).
    pub fn submit(&mut self, song: Song) -> Result<()> {
        if self.closed {
            return Err(Error::PoolClosed);
        }

        let shared = Arc::clone(&self.shared);
        self.tasks.spawn(async move {
            run_task(&shared, song).await;
        });
        self.submitted += 1;
        Ok(())
    }

    /// Wait for every submitted task to finish, then release the slots
    ///
    /// Safe to call more than once; later calls return immediately.
    pub async fn shutdown(&mut self) {
        if !self.tasks.is_empty() {
            tracing::debug!(
                in_flight = self.in_flight(),
                pending = self.tasks.len(),
                "Waiting for workers to finish"
            );
        }

        while let Some(joined) = self.tasks.join_next().await {
            if let Err(e) = joined {
                if e.is_panic() {
                    tracing::error!(error = %e, "Worker task panicked outside the fetcher");
                } else {
                    tracing::debug!(error = %e, "Worker task aborted");
                }
            }
        }

        if !self.closed {
            self.shared.slots.close();
            self.closed = true;
            tracing::debug!(submitted = self.submitted, "Worker pool shut down");
        }
    }
}

/// One unit of work: fetch, then publish the outcome or report the failure.
async fn run_task(shared: &Shared, song: Song) {
    match fetch_in_slot(shared, &song).await {
        Ok(tags) => {
            emit(
                shared,
                Event::TaskFinished {
                    row: song.row,
                    tags: tags.len(),
                },
            );
            shared.collector.record(TagOutcome::new(&song, tags)).await;
        }
        Err(error) => {
            tracing::warn!(
                row = song.row,
                artist = %song.artist,
                song = %song.song,
                error = %error,
                "Failed to fetch tags"
            );
            emit(
                shared,
                Event::TaskFailed {
                    row: song.row,
                    error: error.to_string(),
                },
            );
            if shared.options.failure_policy == FailurePolicy::Record {
                shared
                    .collector
                    .record_failure(TaskFailure {
                        row: song.row,
                        url: shared.fetcher.target_url(&song),
                        artist: song.artist,
                        song: song.song,
                        error: error.to_string(),
                    })
                    .await;
            }
        }
    }
}

/// Wait for a slot, then run the guarded fetch; cancellation wins either wait.
async fn fetch_in_slot(
    shared: &Shared,
    song: &Song,
) -> std::result::Result<Vec<String>, FetchError> {
    tokio::select! {
        biased;
        _ = shared.options.cancel_token.cancelled() => Err(FetchError::Cancelled),
        result = acquire_and_fetch(shared, song) => result,
    }
}

async fn acquire_and_fetch(
    shared: &Shared,
    song: &Song,
) -> std::result::Result<Vec<String>, FetchError> {
    // Closed only by shutdown, which never races a live task
    let _permit = shared
        .slots
        .acquire()
        .await
        .map_err(|_| FetchError::Cancelled)?;

    guarded_fetch(shared, song).await
}

/// Fetch with the per-task timeout and panic isolation applied
async fn guarded_fetch(
    shared: &Shared,
    song: &Song,
) -> std::result::Result<Vec<String>, FetchError> {
    let attempt = AssertUnwindSafe(shared.fetcher.fetch_tags(song)).catch_unwind();

    let outcome = match shared.options.task_timeout {
        Some(after) => match tokio::time::timeout(after, attempt).await {
            Ok(outcome) => outcome,
            Err(_) => return Err(FetchError::Timeout { after }),
        },
        None => attempt.await,
    };

    outcome.unwrap_or_else(|panic| {
        Err(FetchError::Panicked {
            reason: panic_message(&*panic),
        })
    })
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

fn emit(shared: &Shared, event: Event) {
    if let Some(tx) = &shared.options.event_tx {
        tx.send(event).ok();
    }
}
