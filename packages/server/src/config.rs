// Application configuration

use anyhow::{ensure, Context, Result};
use dotenvy::dotenv;
use std::env;
use std::time::Duration;

/// Default ScienceDaily psychology feed.
const DEFAULT_PSYCHOLOGY_RSS: &str = "https://www.sciencedaily.com/rss/mind_brain/psychology.xml";

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    /// Optional: without a key every generation attempt classifies as
    /// NO_API_KEY and articles are synthesized from the topic alone.
    pub groq_api_key: Option<String>,
    pub psychology_rss_url: String,
    /// Hour (0-23) after which a new article day begins.
    pub reset_hour: u32,
    /// Minute (0-59) of the reset boundary.
    pub reset_minute: u32,
    /// Cooldown between generation attempts; absorbs bursts of page loads.
    pub min_generation_interval: Duration,
    /// Upper bound on one generation round trip.
    pub generation_timeout: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        // Load .env file if present (development)
        let _ = dotenv();

        let reset_hour: u32 = env::var("RESET_HOUR")
            .unwrap_or_else(|_| "8".to_string())
            .parse()
            .context("RESET_HOUR must be a number")?;
        let reset_minute: u32 = env::var("RESET_MINUTE")
            .unwrap_or_else(|_| "0".to_string())
            .parse()
            .context("RESET_MINUTE must be a number")?;
        ensure!(reset_hour < 24, "RESET_HOUR must be 0-23");
        ensure!(reset_minute < 60, "RESET_MINUTE must be 0-59");

        let min_generation_interval_secs: u64 = env::var("MIN_GENERATION_INTERVAL_SECS")
            .unwrap_or_else(|_| "300".to_string())
            .parse()
            .context("MIN_GENERATION_INTERVAL_SECS must be a number")?;
        let generation_timeout_secs: u64 = env::var("GENERATION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "60".to_string())
            .parse()
            .context("GENERATION_TIMEOUT_SECS must be a number")?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").context("DATABASE_URL must be set")?,
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .context("PORT must be a valid number")?,
            groq_api_key: env::var("GROQ_API_KEY").ok().filter(|k| !k.is_empty()),
            psychology_rss_url: env::var("SCIENCEDAILY_PSYCHOLOGY_RSS")
                .unwrap_or_else(|_| DEFAULT_PSYCHOLOGY_RSS.to_string()),
            reset_hour,
            reset_minute,
            min_generation_interval: Duration::from_secs(min_generation_interval_secs),
            generation_timeout: Duration::from_secs(generation_timeout_secs),
        })
    }
}
