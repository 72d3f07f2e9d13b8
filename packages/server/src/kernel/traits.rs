// Infrastructure trait seams
//
// The article domain talks to the outside world only through these traits,
// so generation and topic sourcing can be swapped for fakes in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domains::articles::error::GenerateError;

/// One entry from a research news feed.
#[derive(Debug, Clone)]
pub struct TopicCandidate {
    pub title: String,
    pub link: String,
    pub description: String,
    pub published_at: Option<DateTime<Utc>>,
}

/// Text generation backend.
#[async_trait]
pub trait BaseGenerator: Send + Sync {
    /// Run one generation call and return the raw completion text.
    async fn generate(
        &self,
        system_prompt: &str,
        user_prompt: &str,
        max_tokens: u32,
    ) -> Result<String, GenerateError>;

    /// Cheap availability probe. Fail-closed: any doubt reports `false`.
    async fn check_available(&self) -> bool;
}

/// Source of article topic candidates.
#[async_trait]
pub trait BaseTopicSource: Send + Sync {
    /// Fetch current candidates, freshest first. An unreachable or
    /// unparseable feed is an error, not an empty list.
    async fn fetch_candidates(&self) -> anyhow::Result<Vec<TopicCandidate>>;
}
