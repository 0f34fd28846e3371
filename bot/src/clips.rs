//! Best-effort resolution of video-clip links for a roll call.
//!
//! The clip provider has no JSON API; the only way in is a scrape of its
//! vote-search page. That scrape lives behind [`ClipResolver`] so the
//! composer stays testable without network access, and every failure mode
//! degrades to "no clip" rather than an error the thread would trip over.

use async_trait::async_trait;
use chrono::{Datelike, NaiveDate};
use regex::Regex;
use thiserror::Error;

use crate::votes::Chamber;

/// Errors building a clip resolver; resolution itself degrades to `None`.
#[derive(Debug, Error)]
pub enum ClipError {
    #[error("invalid clip link pattern: {0}")]
    Pattern(#[from] regex::Error),
}

/// Trait for resolving an optional video-clip URL for one roll call.
#[async_trait]
pub trait ClipResolver: Send + Sync {
    /// Resolve a clip link, `None` when no clip exists or the lookup fails.
    async fn resolve(
        &self,
        chamber: Chamber,
        congress: u16,
        roll_call: u32,
        date: NaiveDate,
    ) -> Option<String>;
}

/// Scrapes the C-SPAN vote search page for the first video link.
pub struct CspanClipResolver {
    client: reqwest::Client,
    base_url: String,
    video_href: Regex,
}

impl CspanClipResolver {
    /// Create a resolver against the public C-SPAN site.
    ///
    /// # Errors
    /// Fails only if the extraction pattern does not compile.
    pub fn new() -> Result<Self, ClipError> {
        Self::with_base_url("https://www.c-span.org")
    }

    /// Create a resolver against a custom base URL (for tests).
    ///
    /// # Errors
    /// Fails only if the extraction pattern does not compile.
    pub fn with_base_url(base_url: impl Into<String>) -> Result<Self, ClipError> {
        Ok(Self {
            client: reqwest::Client::new(),
            base_url: base_url.into(),
            video_href: Regex::new(r#""//www\.c-span\.org/video/\?[^"]+""#)?,
        })
    }

    fn search_url(&self, chamber: Chamber, congress: u16, roll_call: u32, date: NaiveDate) -> String {
        format!(
            "{}/congress/votes/?congress={congress}&chamber={}&vote-status-sort=all&vote-number-search={roll_call}&vote-start-date={m}%2F{d}%2F{y}&vote-end-date={m}%2F{d}%2F{y}",
            self.base_url,
            chamber.path(),
            m = date.month(),
            d = date.day(),
            y = date.year(),
        )
    }
}

#[async_trait]
impl ClipResolver for CspanClipResolver {
    async fn resolve(
        &self,
        chamber: Chamber,
        congress: u16,
        roll_call: u32,
        date: NaiveDate,
    ) -> Option<String> {
        let url = self.search_url(chamber, congress, roll_call, date);
        let response = match self.client.get(&url).send().await {
            Ok(response) => response,
            Err(err) => {
                tracing::debug!(error = %err, "clip search request failed");
                return None;
            }
        };
        if !response.status().is_success() {
            tracing::debug!(status = response.status().as_u16(), "clip search non-success");
            return None;
        }
        let body = response.text().await.ok()?;

        self.video_href.find(&body).map(|m| {
            let link = m.as_str().trim_matches('"').trim_start_matches("//");
            format!("{link}&vod")
        })
    }
}

/// Resolver that never finds a clip; for dry runs and tests.
pub struct NoClips;

#[async_trait]
impl ClipResolver for NoClips {
    async fn resolve(
        &self,
        _chamber: Chamber,
        _congress: u16,
        _roll_call: u32,
        _date: NaiveDate,
    ) -> Option<String> {
        None
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn search_url_encodes_the_vote_and_date() {
        let resolver = CspanClipResolver::with_base_url("https://cspan.test").unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        let url = resolver.search_url(Chamber::Senate, 118, 91, date);

        assert!(url.starts_with("https://cspan.test/congress/votes/?congress=118&chamber=senate"));
        assert!(url.contains("vote-number-search=91"));
        assert!(url.contains("vote-start-date=3%2F5%2F2024"));
    }

    #[test]
    fn href_pattern_extracts_the_first_video_link() {
        let resolver = CspanClipResolver::new().unwrap();
        let body = r#"<a href="//www.c-span.org/video/?c5101894/house-vote">clip</a>
                      <a href="//www.c-span.org/video/?c9999999/other">clip</a>"#;

        let m = resolver.video_href.find(body).unwrap();
        let link = m.as_str().trim_matches('"').trim_start_matches("//");
        assert_eq!(link, "www.c-span.org/video/?c5101894/house-vote");
    }
}
