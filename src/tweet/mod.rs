//! Tweet formatting core.
//!
//! Takes a draft from the summarizer and produces text that is safe to post:
//! hashtags in CamelCase, no dead links, and never longer than the platform
//! allows.

pub mod draft;
pub mod error;
pub mod formatter;
pub mod hashtag;
pub mod truncate;

pub use draft::DraftMessage;
pub use error::FormatError;
pub use formatter::{FormatterConfig, TweetFormatter};
pub use truncate::{fit, FormattedTweet, MAX_TWEET_LENGTH};
