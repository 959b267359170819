use anyhow::{Context, Result};
use std::time::Duration;

use crate::tweet::{FormatterConfig, MAX_TWEET_LENGTH};

/// Appended to every tweet unless `DEFAULT_HASHTAGS` says otherwise.
/// An empty `DEFAULT_HASHTAGS` turns them off.
const DEFAULT_HASHTAGS: [&str; 3] = ["AI", "TechNews", "ArtificialIntelligence"];

const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

#[derive(Debug, Clone)]
pub struct Config {
    // Formatting
    pub max_tweet_length: usize,
    pub default_hashtags: Vec<String>,

    // Link checks
    pub link_check_timeout_secs: u64,
    pub link_check_user_agent: String,

    // Twitter
    pub twitter_api_url: String,
    pub twitter_access_token: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            // Formatting
            max_tweet_length: std::env::var("TWEET_MAX_LENGTH")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(MAX_TWEET_LENGTH),
            default_hashtags: std::env::var("DEFAULT_HASHTAGS")
                .map(|v| parse_list(&v))
                .unwrap_or_else(|_| DEFAULT_HASHTAGS.map(String::from).to_vec()),

            // Link checks
            link_check_timeout_secs: std::env::var("LINK_CHECK_TIMEOUT_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(5),
            link_check_user_agent: std::env::var("LINK_CHECK_USER_AGENT")
                .unwrap_or_else(|_| DEFAULT_USER_AGENT.to_string()),

            // Twitter - OAuth 2.0 user access token, only needed for posting
            twitter_api_url: std::env::var("TWITTER_API_URL")
                .unwrap_or_else(|_| "https://api.twitter.com".to_string()),
            twitter_access_token: std::env::var("TWITTER_ACCESS_TOKEN")
                .ok()
                .filter(|v| !v.trim().is_empty()),
        })
    }

    pub fn link_check_timeout(&self) -> Duration {
        Duration::from_secs(self.link_check_timeout_secs)
    }

    pub fn formatter_config(&self) -> FormatterConfig {
        FormatterConfig {
            max_length: self.max_tweet_length,
            default_hashtags: self.default_hashtags.clone(),
        }
    }

    pub fn require_twitter_access_token(&self) -> Result<&str> {
        self.twitter_access_token
            .as_deref()
            .context("TWITTER_ACCESS_TOKEN not set")
    }
}

/// Split a comma-separated list, dropping blank entries.
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
