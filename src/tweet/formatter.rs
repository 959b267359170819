use futures::future::join_all;
use tracing::{info, warn};

use super::hashtag::normalize_all;
use super::truncate::{check_max_length, fit, FormattedTweet, MAX_TWEET_LENGTH};
use super::{DraftMessage, FormatError};
use crate::link::LinkValidator;

/// Formatter settings, passed in by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatterConfig {
    /// Character limit of the target platform.
    pub max_length: usize,
    /// Appended after each draft's own hashtags.
    pub default_hashtags: Vec<String>,
}

impl Default for FormatterConfig {
    fn default() -> Self {
        Self {
            max_length: MAX_TWEET_LENGTH,
            default_hashtags: Vec::new(),
        }
    }
}

/// Turns drafts into postable tweets.
///
/// Holds no mutable state, so independent drafts can be formatted
/// concurrently through a shared reference.
pub struct TweetFormatter<V> {
    validator: V,
    config: FormatterConfig,
}

impl<V: LinkValidator> TweetFormatter<V> {
    pub fn new(validator: V, config: FormatterConfig) -> Self {
        Self { validator, config }
    }

    /// Normalize hashtags, check the link, then fit everything to length.
    ///
    /// Links are tried in order (the draft's link, then its fallbacks) and
    /// the first reachable one is used. Unreachable links are dropped and
    /// logged; every check is kept on the returned tweet so callers can see why.
    pub async fn format(&self, draft: &DraftMessage) -> Result<FormattedTweet, FormatError> {
        let max_length = self.config.max_length;
        check_max_length(max_length)?;

        let hashtags = normalize_all(
            draft
                .hashtags()
                .iter()
                .chain(self.config.default_hashtags.iter()),
        );

        let candidates = draft
            .link()
            .into_iter()
            .chain(draft.fallback_links().iter().map(String::as_str));

        let mut link_checks = Vec::new();
        let mut link = None;
        for (attempt, url) in candidates.enumerate() {
            let check = self.validator.validate(url).await;
            if check.reachable {
                if attempt > 0 {
                    info!("Using fallback link {}", check.url);
                }
                link = Some(check.url.clone());
                link_checks.push(check);
                break;
            }
            warn!(
                "Dropping unreachable link {} (status: {})",
                check.url,
                check
                    .status_code
                    .map_or_else(|| "no response".to_string(), |s| s.to_string())
            );
            link_checks.push(check);
        }

        let mut tweet = fit(draft.body(), link.as_deref(), &hashtags, max_length)?;
        tweet.link_checks = link_checks;

        info!(
            "Formatted tweet ({}/{} characters{})",
            tweet.length,
            max_length,
            if tweet.truncated { ", truncated" } else { "" }
        );
        Ok(tweet)
    }

    /// Format independent drafts concurrently. Results keep input order.
    pub async fn format_all(
        &self,
        drafts: &[DraftMessage],
    ) -> Vec<Result<FormattedTweet, FormatError>> {
        join_all(drafts.iter().map(|draft| self.format(draft))).await
    }
}
