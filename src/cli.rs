//! Command-line flow: read a draft, format it, write or post the result.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs;
use std::path::PathBuf;
use tracing::info;

use crate::config::Config;
use crate::link::{HttpLinkValidator, LinkValidator, TrustingLinkValidator};
use crate::tweet::{DraftMessage, FormattedTweet, TweetFormatter};
use crate::twitter::{PostedTweet, TwitterPoster};

/// Format a summarizer's tweet for posting: CamelCase hashtags, no dead
/// links, within the character limit.
#[derive(Parser, Debug, Clone)]
#[command(name = "ai-news-tweet")]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// Raw candidate tweet text
    #[arg(long, default_value = "tweet_content.txt", conflicts_with = "draft")]
    pub input: PathBuf,

    /// JSON draft with `body`, `link` and `hashtags`
    #[arg(long)]
    pub draft: Option<PathBuf>,

    /// Source URL to attach, overriding any URL in the text
    #[arg(long)]
    pub link: Option<String>,

    /// Extra hashtag candidate (repeatable)
    #[arg(long = "hashtag")]
    pub hashtags: Vec<String>,

    /// Override TWEET_MAX_LENGTH
    #[arg(long)]
    pub max_length: Option<usize>,

    /// Trust every well-formed link instead of checking it
    #[arg(long)]
    pub skip_link_check: bool,

    /// Write the formatted text to this file
    #[arg(long, conflicts_with = "in_place")]
    pub output: Option<PathBuf>,

    /// Overwrite the input file with the formatted text
    #[arg(long, conflicts_with = "draft")]
    pub in_place: bool,

    /// Print the result as JSON
    #[arg(long)]
    pub json: bool,

    /// Post the result to Twitter
    #[arg(long)]
    pub post: bool,
}

/// What a run produced.
#[derive(Debug)]
pub struct RunOutcome {
    pub tweet: FormattedTweet,
    pub posted: Option<PostedTweet>,
}

/// Load the draft the arguments point at.
pub fn load_draft(args: &Args) -> Result<DraftMessage> {
    let draft = match &args.draft {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read draft {}", path.display()))?;
            let draft: DraftMessage = serde_json::from_str(&json)
                .with_context(|| format!("Failed to parse draft {}", path.display()))?;
            match &args.link {
                // The draft's own links stay behind the override as fallbacks
                Some(link) => {
                    let fallbacks = draft
                        .link()
                        .into_iter()
                        .chain(draft.fallback_links().iter().map(String::as_str))
                        .filter(|l| *l != link.as_str())
                        .map(str::to_string)
                        .collect();
                    DraftMessage::new(draft.body(), Some(link.clone()), draft.hashtags().to_vec())?
                        .with_fallback_links(fallbacks)
                }
                None => draft,
            }
        }
        None => {
            let raw = fs::read_to_string(&args.input)
                .with_context(|| format!("Tweet file not found: {}", args.input.display()))?;
            info!(
                "Read tweet from {} ({} characters)",
                args.input.display(),
                raw.chars().count()
            );
            DraftMessage::from_candidate(&raw, args.link.as_deref())?
        }
    };

    Ok(draft.with_extra_hashtags(args.hashtags.iter().cloned()))
}

/// Run the whole flow with an explicit validator.
pub async fn run_with<V: LinkValidator>(
    args: &Args,
    config: &Config,
    validator: V,
) -> Result<RunOutcome> {
    let draft = load_draft(args)?;

    let mut formatter_config = config.formatter_config();
    if let Some(max_length) = args.max_length {
        formatter_config.max_length = max_length;
    }

    let formatter = TweetFormatter::new(validator, formatter_config);
    let tweet = formatter.format(&draft).await?;

    let destination = if args.in_place {
        Some(&args.input)
    } else {
        args.output.as_ref()
    };
    if let Some(path) = destination {
        fs::write(path, &tweet.text)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Saved formatted tweet to {}", path.display());
    }

    let posted = if args.post {
        let poster = TwitterPoster::from_config(config)?;
        Some(poster.post(&tweet.text).await?)
    } else {
        None
    };

    Ok(RunOutcome { tweet, posted })
}

/// Run the whole flow, checking links over HTTP unless told not to.
pub async fn run(args: &Args, config: &Config) -> Result<RunOutcome> {
    let validator: Box<dyn LinkValidator> = if args.skip_link_check {
        Box::new(TrustingLinkValidator::new())
    } else {
        Box::new(HttpLinkValidator::new(
            config.link_check_timeout(),
            &config.link_check_user_agent,
        )?)
    };

    run_with(args, config, validator).await
}

/// Human-readable or JSON report for stdout.
pub fn render(outcome: &RunOutcome, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(&outcome.tweet)?);
    }

    let mut out = format!(
        "{}\n\n({} characters{})",
        outcome.tweet.text,
        outcome.tweet.length,
        if outcome.tweet.truncated { ", truncated" } else { "" }
    );
    for check in outcome.tweet.link_checks.iter().filter(|c| !c.reachable) {
        out.push_str(&format!("\nDropped unreachable link: {}", check.url));
    }
    if let Some(posted) = &outcome.posted {
        out.push_str(&format!("\nPosted tweet ID: {}", posted.id));
    }
    Ok(out)
}
