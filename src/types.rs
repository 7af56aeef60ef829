//! Core types for tag-harvest

use serde::{Deserialize, Serialize};

/// One song to look up
///
/// Built from one input row and never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Song {
    /// Zero-based position of the row in the input file
    pub row: usize,
    /// Artist name
    pub artist: String,
    /// Song title
    pub song: String,
    /// Link column from the input (not used for lookups)
    pub link: String,
    /// Text column from the input (not used for lookups)
    pub text: String,
}

impl Song {
    /// Create a song with empty link and text columns
    pub fn new(row: usize, artist: impl Into<String>, song: impl Into<String>) -> Self {
        Self {
            row,
            artist: artist.into(),
            song: song.into(),
            link: String::new(),
            text: String::new(),
        }
    }
}

impl std::fmt::Display for Song {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} - {}", self.artist, self.song)
    }
}

/// Tags found for one song
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TagOutcome {
    /// Artist name, copied from the song
    pub artist: String,
    /// Song title, copied from the song
    pub song: String,
    /// Tags in page order (may be empty)
    pub tags: Vec<String>,
}

impl TagOutcome {
    /// Build the outcome for `song`
    pub fn new(song: &Song, tags: Vec<String>) -> Self {
        Self {
            artist: song.artist.clone(),
            song: song.song.clone(),
            tags,
        }
    }
}

/// A lookup that failed, kept so the row can be retried by hand
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFailure {
    /// Zero-based input row
    pub row: usize,
    /// Artist name
    pub artist: String,
    /// Song title
    pub song: String,
    /// URL that was (or would have been) requested
    pub url: Option<String>,
    /// Rendered error
    pub error: String,
}

/// Everything a finished run produced
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HarvestReport {
    /// Successful lookups, in no particular order
    pub outcomes: Vec<TagOutcome>,
    /// Failed lookups (empty under [`FailurePolicy::Drop`](crate::config::FailurePolicy::Drop))
    pub failures: Vec<TaskFailure>,
    /// Number of songs submitted to the pool
    pub submitted: usize,
}

impl HarvestReport {
    /// Number of songs that produced tags
    pub fn succeeded(&self) -> usize {
        self.outcomes.len()
    }

    /// Number of songs that did not, whether or not a failure record was kept
    pub fn failed(&self) -> usize {
        self.submitted.saturating_sub(self.outcomes.len())
    }
}

/// Progress events emitted during a run
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// The pool was created and songs are about to be submitted
    RunStarted {
        /// Number of songs in the run
        tasks: usize,
        /// Effective worker count
        workers: usize,
    },

    /// A song's tags were fetched
    TaskFinished {
        /// Input row
        row: usize,
        /// Number of tags found
        tags: usize,
    },

    /// A song's lookup failed
    TaskFailed {
        /// Input row
        row: usize,
        /// Rendered error
        error: String,
    },

    /// Every song has been processed
    RunFinished {
        /// Songs with tags
        succeeded: usize,
        /// Songs without
        failed: usize,
    },
}
