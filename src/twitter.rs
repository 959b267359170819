use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::header::HeaderMap;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::config::Config;
use crate::tweet::truncate::char_len;

#[derive(Debug, Serialize)]
struct CreateTweetRequest<'a> {
    text: &'a str,
}

#[derive(Debug, Deserialize)]
struct CreateTweetResponse {
    data: CreatedTweet,
}

#[derive(Debug, Deserialize)]
struct CreatedTweet {
    id: String,
    text: String,
}

/// A tweet accepted by the platform.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PostedTweet {
    pub id: String,
    pub text: String,
    pub posted_at: DateTime<Utc>,
}

/// Posts finalized tweets through the Twitter API v2.
pub struct TwitterPoster {
    client: reqwest::Client,
    api_url: String,
    access_token: String,
    max_length: usize,
}

impl TwitterPoster {
    pub fn new(api_url: &str, access_token: &str, max_length: usize) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_url: api_url.trim_end_matches('/').to_string(),
            access_token: access_token.to_string(),
            max_length,
        }
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        let token = config.require_twitter_access_token()?;
        Ok(Self::new(
            &config.twitter_api_url,
            token,
            config.max_tweet_length,
        ))
    }

    /// Post a tweet. Text over the length limit is refused before any request.
    pub async fn post(&self, text: &str) -> Result<PostedTweet> {
        let length = char_len(text);
        if length > self.max_length {
            anyhow::bail!(
                "Tweet is {} characters, over the {} character limit",
                length,
                self.max_length
            );
        }

        info!("Posting tweet to Twitter ({} characters)", length);

        let response = self
            .client
            .post(format!("{}/2/tweets", self.api_url))
            .bearer_auth(&self.access_token)
            .json(&CreateTweetRequest { text })
            .send()
            .await
            .context("Failed to send request to Twitter API")?;

        log_rate_limit(response.headers());

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("Twitter API error ({}): {}", status, body);
        }

        let created: CreateTweetResponse = response
            .json()
            .await
            .context("Failed to parse Twitter response")?;

        info!("Tweet posted successfully. Tweet ID: {}", created.data.id);

        Ok(PostedTweet {
            id: created.data.id,
            text: created.data.text,
            posted_at: Utc::now(),
        })
    }
}

fn log_rate_limit(headers: &HeaderMap) {
    let Some(remaining) = headers.get("x-rate-limit-remaining") else {
        return;
    };

    let limit = headers
        .get("x-rate-limit-limit")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("?");
    let reset = headers
        .get("x-rate-limit-reset")
        .and_then(|v| v.to_str().ok())
        .and_then(|ts| ts.parse::<i64>().ok())
        .and_then(|ts| DateTime::from_timestamp(ts, 0))
        .map(|dt| dt.format("%H:%M:%S UTC").to_string())
        .unwrap_or_else(|| "?".to_string());

    info!(
        "Twitter API rate limit: {}/{} remaining (resets at {})",
        remaining.to_str().unwrap_or("?"),
        limit,
        reset
    );
}
