//! Configuration types for tag-harvest

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::{path::PathBuf, time::Duration};

/// Hard ceiling on concurrent workers, applied regardless of the requested count
pub const DEFAULT_MAX_WORKERS: usize = 80;

/// CSS selector for the tag list on a last.fm track page
///
/// Mirrors the XPath `//*[@id="mantle_skin"]/div[4]/div/div[1]/section[1]/ul/li`.
pub const DEFAULT_TAG_SELECTOR: &str = "#mantle_skin > div:nth-of-type(4) > div > \
     div:nth-of-type(1) > section:nth-of-type(1) > ul > li";

/// Input file and the slice of it to process
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct InputConfig {
    /// CSV file with `artist,song,link,text` rows (default: "songdata.csv")
    #[serde(default = "default_input_path")]
    pub path: PathBuf,

    /// Index of the first song to process, zero-based inclusive (default: 1)
    ///
    /// The default skips the first line, which is a header in the usual dataset.
    #[serde(default = "default_songs_from")]
    pub songs_from: usize,

    /// Index one past the last song to process (default: 20)
    #[serde(default = "default_songs_to")]
    pub songs_to: usize,
}

impl Default for InputConfig {
    fn default() -> Self {
        Self {
            path: default_input_path(),
            songs_from: default_songs_from(),
            songs_to: default_songs_to(),
        }
    }
}

/// Where results go
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OutputConfig {
    /// JSON file receiving the `{artist, song, tags}` array (default: "results.json")
    #[serde(default = "default_output_path")]
    pub path: PathBuf,

    /// Optional JSON file receiving failed lookups (requires [`FailurePolicy::Record`])
    #[serde(default)]
    pub failures_path: Option<PathBuf>,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            path: default_output_path(),
            failures_path: None,
        }
    }
}

/// HTTP fetching and page extraction
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FetchConfig {
    /// Base URL that track paths are appended to (default: "https://www.last.fm/music")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// CSS selector matching one element per tag
    #[serde(default = "default_tag_selector")]
    pub tag_selector: String,

    /// Timeout for a single HTTP request (default: 30 seconds)
    #[serde(default = "default_request_timeout", with = "duration_serde")]
    pub request_timeout: Duration,

    /// User-Agent header sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            tag_selector: default_tag_selector(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// What happens to a song whose lookup failed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Log the failure and drop the song from the results
    Drop,
    /// Log the failure and keep a failure record alongside the results (default)
    #[default]
    Record,
}

impl std::str::FromStr for FailurePolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "drop" => Ok(FailurePolicy::Drop),
            "record" => Ok(FailurePolicy::Record),
            other => Err(format!(
                "unknown failure policy '{other}' (expected 'drop' or 'record')"
            )),
        }
    }
}

/// Worker pool sizing and per-task limits
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct PoolConfig {
    /// Requested number of concurrent workers (default: 20)
    #[serde(default = "default_workers")]
    pub workers: usize,

    /// Ceiling the requested count is clamped to (default: [`DEFAULT_MAX_WORKERS`])
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,

    /// Per-task timeout covering the whole lookup (None = wait indefinitely)
    #[serde(default, with = "optional_duration_serde")]
    pub task_timeout: Option<Duration>,

    /// Failure handling
    #[serde(default)]
    pub failure_policy: FailurePolicy,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: default_workers(),
            max_workers: default_max_workers(),
            task_timeout: None,
            failure_policy: FailurePolicy::default(),
        }
    }
}

/// Main configuration for a harvest run
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Config {
    /// Input file and range
    #[serde(default)]
    pub input: InputConfig,

    /// Output files
    #[serde(default)]
    pub output: OutputConfig,

    /// HTTP fetching
    #[serde(default)]
    pub fetch: FetchConfig,

    /// Worker pool
    #[serde(default)]
    pub pool: PoolConfig,
}

impl Config {
    /// Check settings that would otherwise only fail once the run is underway
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] naming the offending key.
    pub fn validate(&self) -> Result<()> {
        self.pool.validate()?;

        if self.input.songs_from > self.input.songs_to {
            return Err(Error::config(
                "songs_from",
                format!(
                    "first song ({}) is after last song ({})",
                    self.input.songs_from, self.input.songs_to
                ),
            ));
        }

        self.fetch.validate()?;

        if self.output.failures_path.is_some() && self.pool.failure_policy == FailurePolicy::Drop
        {
            tracing::warn!("failures_path is set but failure policy is 'drop'; the file will be empty");
        }

        Ok(())
    }
}

impl FetchConfig {
    /// Check that the base URL and tag selector are usable
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for `base_url` or `tag_selector`.
    pub fn validate(&self) -> Result<()> {
        let base = url::Url::parse(&self.base_url)
            .map_err(|e| Error::config("base_url", format!("'{}': {e}", self.base_url)))?;
        if base.cannot_be_a_base() {
            return Err(Error::config(
                "base_url",
                format!("'{}' cannot carry a path", self.base_url),
            ));
        }

        if scraper::Selector::parse(&self.tag_selector).is_err() {
            return Err(Error::config(
                "tag_selector",
                format!("'{}' is not a valid CSS selector", self.tag_selector),
            ));
        }

        Ok(())
    }
}

impl PoolConfig {
    /// Check that the worker ceiling leaves room for at least one worker
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] for `max_workers`.
    pub fn validate(&self) -> Result<()> {
        if self.max_workers == 0 {
            return Err(Error::config("max_workers", "must be at least 1"));
        }
        Ok(())
    }
}

fn default_input_path() -> PathBuf {
    PathBuf::from("songdata.csv")
}

fn default_output_path() -> PathBuf {
    PathBuf::from("results.json")
}

fn default_songs_from() -> usize {
    1
}

fn default_songs_to() -> usize {
    20
}

fn default_base_url() -> String {
    "https://www.last.fm/music".to_string()
}

fn default_tag_selector() -> String {
    DEFAULT_TAG_SELECTOR.to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_secs(30)
}

fn default_user_agent() -> String {
    concat!("tag-harvest/", env!("CARGO_PKG_VERSION")).to_string()
}

fn default_workers() -> usize {
    20
}

fn default_max_workers() -> usize {
    DEFAULT_MAX_WORKERS
}

// Duration serialization helper
mod duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_u64(duration.as_secs())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}

// Optional Duration serialization helper
mod optional_duration_serde {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Option<Duration>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match duration {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<Duration>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = Option::<u64>::deserialize(deserializer)?;
        Ok(secs.map(Duration::from_secs))
    }
}

// unwrap/expect are acceptable in tests for concise failure-on-error assertions
#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_reference_flags() {
        let config = Config::default();

        assert_eq!(config.input.path, PathBuf::from("songdata.csv"));
        assert_eq!(config.input.songs_from, 1);
        assert_eq!(config.input.songs_to, 20);
        assert_eq!(config.output.path, PathBuf::from("results.json"));
        assert_eq!(config.pool.workers, 20);
        assert_eq!(config.pool.max_workers, 80);
        assert_eq!(config.pool.failure_policy, FailurePolicy::Record);
        assert!(config.pool.task_timeout.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn empty_json_deserializes_to_defaults() {
        let config: Config = serde_json::from_str("{}").unwrap();

        assert_eq!(config.pool.max_workers, DEFAULT_MAX_WORKERS);
        assert_eq!(config.fetch.base_url, "https://www.last.fm/music");
        assert_eq!(config.fetch.request_timeout, Duration::from_secs(30));
    }

    #[test]
    fn durations_serialize_as_seconds() {
        let pool = PoolConfig {
            task_timeout: Some(Duration::from_secs(45)),
            ..PoolConfig::default()
        };

        let json = serde_json::to_value(&pool).unwrap();
        assert_eq!(json["task_timeout"], 45);

        let back: PoolConfig = serde_json::from_value(json).unwrap();
        assert_eq!(back.task_timeout, Some(Duration::from_secs(45)));
    }

    #[test]
    fn zero_ceiling_is_rejected() {
        let mut config = Config::default();
        config.pool.max_workers = 0;

        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("max_workers")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn inverted_range_is_rejected() {
        let mut config = Config::default();
        config.input.songs_from = 10;
        config.input.songs_to = 5;

        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn section_checks_ignore_the_input_range() {
        let mut config = Config::default();
        config.input.songs_from = 10;
        config.input.songs_to = 5;

        assert!(config.fetch.validate().is_ok());
        assert!(config.pool.validate().is_ok());

        config.pool.max_workers = 0;
        assert!(matches!(config.pool.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn bad_base_url_is_rejected() {
        let mut config = Config::default();
        config.fetch.base_url = "not a url".to_string();
        assert!(matches!(config.validate(), Err(Error::Config { .. })));

        config.fetch.base_url = "mailto:someone@example.com".to_string();
        assert!(matches!(config.validate(), Err(Error::Config { .. })));
    }

    #[test]
    fn bad_selector_is_rejected() {
        let mut config = Config::default();
        config.fetch.tag_selector = "ul >> [".to_string();

        match config.validate() {
            Err(Error::Config { key, .. }) => assert_eq!(key.as_deref(), Some("tag_selector")),
            other => panic!("expected Config error, got {other:?}"),
        }
    }

    #[test]
    fn failure_policy_parses_case_insensitively() {
        assert_eq!("drop".parse::<FailurePolicy>(), Ok(FailurePolicy::Drop));
        assert_eq!("RECORD".parse::<FailurePolicy>(), Ok(FailurePolicy::Record));
        assert!("retry".parse::<FailurePolicy>().is_err());
    }
}
