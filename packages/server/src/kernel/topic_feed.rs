// ScienceDaily RSS topic source

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rss::Channel;
use std::time::Duration;
use tracing::{debug, info};

use anyhow::{Context, Result};

use crate::kernel::traits::{BaseTopicSource, TopicCandidate};

const FEED_USER_AGENT: &str = "DailyPsycho/1.0 (psychology daily site)";
const FEED_TIMEOUT: Duration = Duration::from_secs(30);

pub struct ScienceDailyFeed {
    http_client: reqwest::Client,
    feed_url: String,
}

impl ScienceDailyFeed {
    pub fn new(feed_url: impl Into<String>) -> Self {
        Self {
            http_client: reqwest::Client::builder()
                .user_agent(FEED_USER_AGENT)
                .timeout(FEED_TIMEOUT)
                .build()
                .unwrap_or_default(),
            feed_url: feed_url.into(),
        }
    }
}

#[async_trait]
impl BaseTopicSource for ScienceDailyFeed {
    async fn fetch_candidates(&self) -> Result<Vec<TopicCandidate>> {
        debug!(url = %self.feed_url, "Fetching topic feed");

        let response = self
            .http_client
            .get(&self.feed_url)
            .send()
            .await
            .context("Failed to fetch RSS feed")?
            .error_for_status()
            .context("RSS feed returned an error status")?;

        let body = response
            .bytes()
            .await
            .context("Failed to read RSS feed body")?;

        let channel = Channel::read_from(&body[..]).context("Failed to parse RSS feed")?;

        let candidates: Vec<TopicCandidate> = channel
            .items()
            .iter()
            .filter_map(|item| {
                let title = item.title()?.trim();
                let link = item.link()?.trim();
                if title.is_empty() || link.is_empty() {
                    return None;
                }
                Some(TopicCandidate {
                    title: strip_html(title),
                    link: link.to_string(),
                    description: strip_html(item.description().unwrap_or("")),
                    published_at: item.pub_date().and_then(parse_pub_date),
                })
            })
            .collect();

        info!(count = candidates.len(), "Topic feed fetched");
        Ok(candidates)
    }
}

fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc2822(raw)
        .ok()
        .map(|d| d.with_timezone(&Utc))
}

/// Drop markup tags and decode HTML entities from feed text.
pub fn strip_html(text: &str) -> String {
    let mut plain = String::with_capacity(text.len());
    let mut in_tag = false;
    for c in text.chars() {
        match c {
            '<' => in_tag = true,
            '>' if in_tag => in_tag = false,
            c if !in_tag => plain.push(c),
            _ => {}
        }
    }
    html_escape::decode_html_entities(&plain).trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_html_removes_tags() {
        assert_eq!(
            strip_html("<p>New <b>research</b> shows.</p>"),
            "New research shows."
        );
    }

    #[test]
    fn test_strip_html_decodes_entities() {
        assert_eq!(
            strip_html("Mind &amp; body &quot;study&quot;&nbsp;results"),
            "Mind & body \"study\"\u{a0}results"
        );
    }

    #[test]
    fn test_strip_html_plain_text_untouched() {
        assert_eq!(strip_html("already plain"), "already plain");
    }

    #[test]
    fn test_parse_pub_date() {
        let parsed = parse_pub_date("Mon, 10 Mar 2025 12:00:00 GMT").unwrap();
        assert_eq!(parsed.to_rfc3339(), "2025-03-10T12:00:00+00:00");
        assert!(parse_pub_date("not a date").is_none());
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_live_feed_fetch() {
        let feed =
            ScienceDailyFeed::new("https://www.sciencedaily.com/rss/mind_brain/psychology.xml");
        let candidates = feed.fetch_candidates().await.unwrap();
        assert!(!candidates.is_empty());
        assert!(!candidates[0].title.is_empty());
    }
}
