//! Length budgeting for the final tweet.
//!
//! Lengths are counted in Unicode codepoints, which is how the platform
//! counts characters. Links are never shortened and hashtags are never
//! split; only the body is cut, and only when nothing else can give way.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::FormatError;
use crate::link::LinkCheckResult;

/// Platform character limit.
pub const MAX_TWEET_LENGTH: usize = 280;

/// Smallest limit the formatter accepts.
pub const MIN_MAX_LENGTH: usize = 10;

/// Appended to a shortened body.
pub const ELLIPSIS: &str = "…";

/// Body codepoints that must remain before a link is kept.
const MIN_BODY_CHARS: usize = 10;

/// The body keeps at least `max_length / BODY_SHARE_DIVISOR` codepoints
/// before hashtags are admitted.
const BODY_SHARE_DIVISOR: usize = 3;

/// A postable tweet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormattedTweet {
    pub text: String,
    /// Codepoint count of `text`, always `<= max_length`.
    pub length: usize,
    /// Whether the body had to be shortened.
    pub truncated: bool,
    /// Every link check behind this tweet, in the order the links were tried.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub link_checks: Vec<LinkCheckResult>,
}

impl FormattedTweet {
    fn assemble(body: &str, link: Option<&str>, hashtags: &[String], truncated: bool) -> Self {
        let tag_block = hashtags.join(" ");
        let text = [body, link.unwrap_or(""), tag_block.as_str()]
            .into_iter()
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        Self {
            length: char_len(&text),
            text,
            truncated,
            link_checks: Vec::new(),
        }
    }
}

/// Codepoint length of a string.
pub fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Reject limits that cannot hold meaningful content.
pub fn check_max_length(max_length: usize) -> Result<(), FormatError> {
    if max_length < MIN_MAX_LENGTH {
        return Err(FormatError::Configuration {
            max_length,
            minimum: MIN_MAX_LENGTH,
        });
    }
    Ok(())
}

/// Fit body, link and hashtags into `max_length` codepoints.
///
/// When everything fits it is joined as is. Otherwise space is reserved
/// for the link and then for hashtags in their given order (the first that
/// does not fit ends the list, so later tags go first), and the body is cut
/// at a word boundary into whatever remains. The link is only dropped when
/// it leaves no room for a minimal body.
pub fn fit(
    body: &str,
    link: Option<&str>,
    hashtags: &[String],
    max_length: usize,
) -> Result<FormattedTweet, FormatError> {
    check_max_length(max_length)?;

    let body = body.trim();
    if body.is_empty() {
        return Err(FormatError::MalformedInput("body is empty".to_string()));
    }
    let link = link.map(str::trim).filter(|l| !l.is_empty());

    let naive = FormattedTweet::assemble(body, link, hashtags, false);
    if naive.length <= max_length {
        return Ok(naive);
    }

    let body_len = char_len(body);

    let link_floor = body_len.min(MIN_BODY_CHARS);
    let link = match link {
        Some(l) if char_len(l) + 1 + link_floor > max_length => {
            info!("Link {} does not leave room for the body, omitting it", l);
            None
        }
        other => other,
    };
    let mut reserved = link.map_or(0, |l| char_len(l) + 1);

    let tag_floor = body_len.min(MIN_BODY_CHARS.max(max_length / BODY_SHARE_DIVISOR));
    let mut kept = 0;
    for tag in hashtags {
        let cost = char_len(tag) + 1;
        if reserved + cost + tag_floor > max_length {
            break;
        }
        reserved += cost;
        kept += 1;
    }
    if kept < hashtags.len() {
        debug!(
            "Omitting {} of {} hashtags: {:?}",
            hashtags.len() - kept,
            hashtags.len(),
            &hashtags[kept..]
        );
    }
    let hashtags = &hashtags[..kept];

    let budget = max_length - reserved;
    if body_len <= budget {
        return Ok(FormattedTweet::assemble(body, link, hashtags, false));
    }

    let shortened = shorten(body, budget);
    info!(
        "Truncated body from {} to {} characters",
        body_len,
        char_len(&shortened)
    );
    Ok(FormattedTweet::assemble(&shortened, link, hashtags, true))
}

/// Cut `body` to at most `budget` codepoints including the ellipsis.
///
/// Prefers the last whitespace at or before the cut so no word is split;
/// hard-cuts at a codepoint boundary when the kept part has no whitespace.
fn shorten(body: &str, budget: usize) -> String {
    let keep = budget.saturating_sub(char_len(ELLIPSIS));

    let cut = body.char_indices().nth(keep).map_or(body.len(), |(i, _)| i);
    let head = &body[..cut];
    let next_is_space = body[cut..].starts_with(char::is_whitespace);

    let kept = if next_is_space {
        head
    } else {
        match head.rfind(char::is_whitespace) {
            Some(i) if !head[..i].trim_end().is_empty() => &head[..i],
            _ => head,
        }
    };

    format!("{}{}", kept.trim_end(), ELLIPSIS)
}
