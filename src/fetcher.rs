//! Tag fetching: the per-song lookup the worker pool runs.
//!
//! The pool only sees the [`TagFetcher`] trait. [`LastFmFetcher`] is the
//! production implementation: GET the track page, select the tag list with a
//! CSS selector, return the text of each match.

use crate::config::FetchConfig;
use crate::error::{Error, FetchError, Result};
use crate::types::Song;
use scraper::{Html, Selector};
use url::Url;

/// Abstraction over a single song lookup, enabling testability.
#[async_trait::async_trait]
pub trait TagFetcher: Send + Sync {
    /// Fetch the tags for `song`, in page order
    async fn fetch_tags(&self, song: &Song) -> std::result::Result<Vec<String>, FetchError>;

    /// URL this fetcher would request for `song`, used in failure records
    fn target_url(&self, _song: &Song) -> Option<String> {
        None
    }
}

/// Scrapes tags from last.fm track pages
pub struct LastFmFetcher {
    client: reqwest::Client,
    base_url: Url,
    selector: Selector,
}

impl LastFmFetcher {
    /// Build a fetcher from configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL or selector is invalid, or the HTTP
    /// client cannot be created.
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let base_url = Url::parse(&config.base_url)?;
        if base_url.cannot_be_a_base() {
            return Err(Error::config(
                "base_url",
                format!("'{}' cannot carry a path", config.base_url),
            ));
        }

        let selector = Selector::parse(&config.tag_selector).map_err(|e| {
            Error::config(
                "tag_selector",
                format!("'{}' is not a valid CSS selector: {e}", config.tag_selector),
            )
        })?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .user_agent(config.user_agent.as_str())
            .build()?;

        Ok(Self {
            client,
            base_url,
            selector,
        })
    }

    /// Track page URL: `{base}/{artist}/_/{song}`, each segment percent-encoded
    pub fn track_url(&self, song: &Song) -> std::result::Result<Url, FetchError> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| FetchError::InvalidUrl {
                reason: format!("{} cannot carry a path", self.base_url),
            })?
            .pop_if_empty()
            .push(&song.artist)
            .push("_")
            .push(&song.song);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl TagFetcher for LastFmFetcher {
    async fn fetch_tags(&self, song: &Song) -> std::result::Result<Vec<String>, FetchError> {
        let url = self.track_url(song)?;
        tracing::debug!(row = song.row, url = %url, "Fetching track page");

        let response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Request {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let html = response.text().await.map_err(|source| FetchError::Body {
            url: url.to_string(),
            source,
        })?;

        let tags = extract_tags(&html, &self.selector);
        tracing::info!(url = %url, tags = tags.len(), "Finished");
        Ok(tags)
    }

    fn target_url(&self, song: &Song) -> Option<String> {
        self.track_url(song).ok().map(String::from)
    }
}

/// Text of every element matching `selector`, trimmed, empty matches skipped
///
/// A page without any match yields an empty list rather than an error.
pub fn extract_tags(html: &str, selector: &Selector) -> Vec<String> {
    let document = Html::parse_document(html);
    document
        .select(selector)
        .map(|element| element.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
        .collect()
}
