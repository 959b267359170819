//! Link existence checks.
//!
//! A link is checked once, right before it would be posted. Failures are
//! reported in the result and never retried: posting without the link is
//! an acceptable outcome, posting a dead one is not.

use async_trait::async_trait;
use reqwest::header::RANGE;
use reqwest::{redirect, Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

/// Redirect hops followed before giving up on a link.
const MAX_REDIRECTS: usize = 10;

/// Outcome of a single link check. Never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkCheckResult {
    pub url: String,
    pub reachable: bool,
    pub status_code: Option<u16>,
}

impl LinkCheckResult {
    /// Result for a URL that could not be checked at all.
    pub fn malformed(url: &str) -> Self {
        Self {
            url: url.to_string(),
            reachable: false,
            status_code: None,
        }
    }

    fn from_status(url: &str, status: StatusCode) -> Self {
        Self {
            url: url.to_string(),
            reachable: status.is_success() || status.is_redirection(),
            status_code: Some(status.as_u16()),
        }
    }
}

/// Anything that can tell whether a link is worth posting.
#[async_trait]
pub trait LinkValidator: Send + Sync {
    /// Check a URL. Never fails; problems are folded into the result.
    async fn validate(&self, url: &str) -> LinkCheckResult;
}

#[async_trait]
impl<T: LinkValidator + ?Sized> LinkValidator for Box<T> {
    async fn validate(&self, url: &str) -> LinkCheckResult {
        (**self).validate(url).await
    }
}

/// Parse a URL the way the validators accept it: `http`/`https` with a host.
pub fn parse_checkable(url: &str) -> Option<Url> {
    let parsed = Url::parse(url.trim()).ok()?;
    match parsed.scheme() {
        "http" | "https" => {}
        _ => return None,
    }
    match parsed.host_str() {
        Some(host) if !host.is_empty() => Some(parsed),
        _ => None,
    }
}

/// Servers that refuse HEAD tend to answer with one of these.
fn rejects_head(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::FORBIDDEN | StatusCode::METHOD_NOT_ALLOWED | StatusCode::NOT_IMPLEMENTED
    )
}

/// Checks links over HTTP: HEAD first, then a one-byte ranged GET when
/// the server rejects HEAD.
pub struct HttpLinkValidator {
    client: Client,
}

impl HttpLinkValidator {
    /// Build a validator whose every request is bounded by `timeout`.
    pub fn new(timeout: Duration, user_agent: &str) -> anyhow::Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .redirect(redirect::Policy::limited(MAX_REDIRECTS))
            .build()?;
        Ok(Self { client })
    }

    async fn fetch_status(&self, url: Url) -> Result<StatusCode, reqwest::Error> {
        let head = self.client.head(url.clone()).send().await?;
        if !rejects_head(head.status()) {
            return Ok(head.status());
        }

        debug!(
            "HEAD rejected ({}) for {}, retrying with ranged GET",
            head.status(),
            url
        );
        let get = self
            .client
            .get(url)
            .header(RANGE, "bytes=0-0")
            .send()
            .await?;
        Ok(get.status())
    }
}

#[async_trait]
impl LinkValidator for HttpLinkValidator {
    async fn validate(&self, url: &str) -> LinkCheckResult {
        let Some(parsed) = parse_checkable(url) else {
            warn!("Invalid URL format: {}", url);
            return LinkCheckResult::malformed(url);
        };

        match self.fetch_status(parsed).await {
            Ok(status) => {
                let result = LinkCheckResult::from_status(url, status);
                if result.reachable {
                    info!("Valid link ({}): {}", status.as_u16(), url);
                } else {
                    warn!("Invalid link (status {}): {}", status.as_u16(), url);
                }
                result
            }
            Err(e) => {
                warn!("Error validating link {}: {}", url, e);
                LinkCheckResult {
                    url: url.to_string(),
                    reachable: false,
                    status_code: None,
                }
            }
        }
    }
}

/// Accepts every well-formed link without touching the network.
pub struct TrustingLinkValidator;

impl TrustingLinkValidator {
    pub fn new() -> Self {
        debug!("Link checks disabled, trusting well-formed links");
        Self
    }
}

impl Default for TrustingLinkValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LinkValidator for TrustingLinkValidator {
    async fn validate(&self, url: &str) -> LinkCheckResult {
        LinkCheckResult {
            url: url.to_string(),
            reachable: parse_checkable(url).is_some(),
            status_code: None,
        }
    }
}
