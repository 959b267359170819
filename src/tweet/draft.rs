use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use tracing::debug;

use super::FormatError;

/// Marker the summarizer puts in front of the tweet it produced.
const TWEET_TEXT_MARKER: &str = "TWEET_TEXT:";

static URL_REGEX: OnceLock<Regex> = OnceLock::new();
static HASHTAG_REGEX: OnceLock<Regex> = OnceLock::new();
static WHITESPACE_REGEX: OnceLock<Regex> = OnceLock::new();
static SENTENCE_GAP_REGEX: OnceLock<Regex> = OnceLock::new();
static EMPTY_PARENS_REGEX: OnceLock<Regex> = OnceLock::new();
static LONE_PUNCTUATION_REGEX: OnceLock<Regex> = OnceLock::new();
static BLANK_LINE_REGEX: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_REGEX.get_or_init(|| Regex::new(r"https?://\S+").expect("valid URL regex"))
}

fn hashtag_regex() -> &'static Regex {
    HASHTAG_REGEX.get_or_init(|| Regex::new(r"(^|\s)#(\w+)").expect("valid hashtag regex"))
}

fn whitespace_regex() -> &'static Regex {
    WHITESPACE_REGEX.get_or_init(|| Regex::new(r"\s+").expect("valid whitespace regex"))
}

fn sentence_gap_regex() -> &'static Regex {
    SENTENCE_GAP_REGEX
        .get_or_init(|| Regex::new(r"([.!?])(\p{Lu})").expect("valid sentence regex"))
}

fn empty_parens_regex() -> &'static Regex {
    EMPTY_PARENS_REGEX.get_or_init(|| Regex::new(r"\(\s*\)").expect("valid parens regex"))
}

fn lone_punctuation_regex() -> &'static Regex {
    LONE_PUNCTUATION_REGEX
        .get_or_init(|| Regex::new(r"\s+([.,;:!?)])").expect("valid punctuation regex"))
}

fn blank_line_regex() -> &'static Regex {
    BLANK_LINE_REGEX
        .get_or_init(|| Regex::new(r"\r?\n[ \t]*\r?\n").expect("valid blank line regex"))
}

/// Unformatted tweet content handed over by the summarizer.
///
/// The body is guaranteed non-blank; hashtags are kept raw and in the
/// order given, since that order decides which ones survive truncation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawDraft")]
pub struct DraftMessage {
    body: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    link: Option<String>,
    /// Tried in order when `link` turns out to be unreachable.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fallback_links: Vec<String>,
    hashtags: Vec<String>,
}

#[derive(Deserialize)]
struct RawDraft {
    body: String,
    #[serde(default)]
    link: Option<String>,
    #[serde(default)]
    fallback_links: Vec<String>,
    #[serde(default)]
    hashtags: Vec<String>,
}

impl TryFrom<RawDraft> for DraftMessage {
    type Error = FormatError;

    fn try_from(raw: RawDraft) -> Result<Self, Self::Error> {
        Ok(DraftMessage::new(raw.body, raw.link, raw.hashtags)?
            .with_fallback_links(raw.fallback_links))
    }
}

impl DraftMessage {
    /// Build a draft, rejecting a blank body.
    ///
    /// A blank link (`Some("")`) is treated as no link.
    pub fn new(
        body: impl Into<String>,
        link: Option<String>,
        hashtags: Vec<String>,
    ) -> Result<Self, FormatError> {
        let body = body.into();
        if body.trim().is_empty() {
            return Err(FormatError::MalformedInput("body is empty".to_string()));
        }

        let link = link
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty());

        Ok(Self {
            body,
            link,
            fallback_links: Vec::new(),
            hashtags,
        })
    }

    /// Build a draft from the summarizer's raw tweet text.
    ///
    /// URLs and inline `#hashtags` are pulled out of the text so the
    /// formatter can place them itself. `source_url`, when given, wins over
    /// any URL found in the text. Only one link is ever posted; the other
    /// URLs become fallbacks for when it is unreachable.
    pub fn from_candidate(raw: &str, source_url: Option<&str>) -> Result<Self, FormatError> {
        let text = strip_marker(raw);

        // Only the URL itself is cut out; closing punctuation stays with its sentence
        let mut urls = Vec::new();
        let mut without_urls = String::with_capacity(text.len());
        let mut last = 0;
        for m in url_regex().find_iter(text) {
            let url = trim_url_punctuation(m.as_str());
            without_urls.push_str(&text[last..m.start()]);
            without_urls.push(' ');
            last = m.start() + url.len();
            urls.push(url.to_string());
        }
        without_urls.push_str(&text[last..]);

        let hashtags: Vec<String> = hashtag_regex()
            .captures_iter(&without_urls)
            .map(|c| c[2].to_string())
            .collect();
        let without_tags = hashtag_regex().replace_all(&without_urls, "$1");

        let body = clean_whitespace(&without_tags);

        let link = match source_url {
            Some(url) => Some(url.to_string()),
            None if urls.is_empty() => None,
            None => Some(urls.remove(0)),
        };
        let mut fallback_links = Vec::new();
        for url in urls {
            if link.as_deref() != Some(url.as_str()) && !fallback_links.contains(&url) {
                fallback_links.push(url);
            }
        }
        if !fallback_links.is_empty() {
            debug!("Keeping {} fallback link(s): {:?}", fallback_links.len(), fallback_links);
        }

        if body.is_empty() {
            return Err(FormatError::MalformedInput(
                "candidate has no text besides links and hashtags".to_string(),
            ));
        }

        Ok(Self::new(body, link, hashtags)?.with_fallback_links(fallback_links))
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn link(&self) -> Option<&str> {
        self.link.as_deref()
    }

    pub fn fallback_links(&self) -> &[String] {
        &self.fallback_links
    }

    /// Replace the fallback links, dropping blanks.
    pub fn with_fallback_links(mut self, links: Vec<String>) -> Self {
        self.fallback_links = links
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect();
        self
    }

    pub fn hashtags(&self) -> &[String] {
        &self.hashtags
    }

    /// Append hashtags after the draft's own, so they are dropped first.
    pub fn with_extra_hashtags<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.hashtags.extend(extra.into_iter().map(Into::into));
        self
    }
}

/// Keep only what follows the `TWEET_TEXT:` marker, up to the first blank line.
fn strip_marker(raw: &str) -> &str {
    match raw.split_once(TWEET_TEXT_MARKER) {
        Some((_, rest)) => {
            let rest = rest.trim_start();
            blank_line_regex().split(rest).next().unwrap_or(rest)
        }
        None => raw,
    }
}

fn trim_url_punctuation(url: &str) -> &str {
    url.trim_end_matches(['.', ',', ';', ':', '!', '?', ')'])
}

/// Collapse whitespace runs, drop empty parentheses, reattach punctuation
/// left alone by removed links or hashtags and restore the space after
/// sentence punctuation.
pub fn clean_whitespace(text: &str) -> String {
    let without_parens = empty_parens_regex().replace_all(text, " ");
    let collapsed = whitespace_regex().replace_all(without_parens.trim(), " ");
    let attached = lone_punctuation_regex().replace_all(&collapsed, "$1");
    sentence_gap_regex()
        .replace_all(&attached, "$1 $2")
        .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== new Tests ====================

    #[test]
    fn test_new_rejects_empty_body() {
        let result = DraftMessage::new("", None, vec![]);
        assert!(matches!(result, Err(FormatError::MalformedInput(_))));
    }

    #[test]
    fn test_new_rejects_whitespace_body() {
        let result = DraftMessage::new("  \n\t ", None, vec![]);
        assert!(matches!(result, Err(FormatError::MalformedInput(_))));
    }

    #[test]
    fn test_new_blank_link_is_none() {
        let draft = DraftMessage::new("Body", Some("  ".to_string()), vec![]).unwrap();
        assert!(draft.link().is_none());
    }

    #[test]
    fn test_new_keeps_fields() {
        let draft = DraftMessage::new(
            "OpenAI ships a model",
            Some("https://openai.com/blog".to_string()),
            vec!["ai".to_string(), "ml".to_string()],
        )
        .unwrap();

        assert_eq!(draft.body(), "OpenAI ships a model");
        assert_eq!(draft.link(), Some("https://openai.com/blog"));
        assert_eq!(draft.hashtags(), &["ai".to_string(), "ml".to_string()]);
    }

    #[test]
    fn test_with_extra_hashtags_appends() {
        let draft = DraftMessage::new("Body", None, vec!["first".to_string()])
            .unwrap()
            .with_extra_hashtags(["AI", "TechNews"]);

        assert_eq!(draft.hashtags(), &["first", "AI", "TechNews"]);
    }

    // ==================== Deserialization Tests ====================

    #[test]
    fn test_deserialize_full() {
        let json = r#"{
            "body": "Anthropic publishes research",
            "link": "https://www.anthropic.com/research",
            "hashtags": ["AI safety", "research"]
        }"#;

        let draft: DraftMessage = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(draft.body(), "Anthropic publishes research");
        assert_eq!(draft.link(), Some("https://www.anthropic.com/research"));
        assert_eq!(draft.hashtags().len(), 2);
    }

    #[test]
    fn test_deserialize_fallback_links() {
        let json = r#"{
            "body": "Two sources",
            "link": "https://a.example.com",
            "fallback_links": ["https://b.example.com", " "]
        }"#;

        let draft: DraftMessage = serde_json::from_str(json).expect("Should deserialize");
        assert_eq!(draft.fallback_links(), &["https://b.example.com"]);
    }

    #[test]
    fn test_deserialize_optional_fields_missing() {
        let json = r#"{"body": "Just a body"}"#;

        let draft: DraftMessage = serde_json::from_str(json).expect("Should deserialize");
        assert!(draft.link().is_none());
        assert!(draft.hashtags().is_empty());
    }

    #[test]
    fn test_deserialize_rejects_empty_body() {
        let json = r#"{"body": "   ", "hashtags": ["ai"]}"#;

        let result: Result<DraftMessage, _> = serde_json::from_str(json);
        let err = result.unwrap_err().to_string();
        assert!(err.contains("body is empty"), "unexpected error: {}", err);
    }

    // ==================== from_candidate Tests ====================

    #[test]
    fn test_from_candidate_extracts_link_and_hashtags() {
        let raw = "OpenAI releases a new model https://openai.com/blog/new-model #AI #machine_learning";

        let draft = DraftMessage::from_candidate(raw, None).unwrap();
        assert_eq!(draft.body(), "OpenAI releases a new model");
        assert_eq!(draft.link(), Some("https://openai.com/blog/new-model"));
        assert_eq!(draft.hashtags(), &["AI", "machine_learning"]);
    }

    #[test]
    fn test_from_candidate_source_url_wins() {
        let raw = "Big news today https://example.com/other";

        let draft = DraftMessage::from_candidate(raw, Some("https://openai.com/blog")).unwrap();
        assert_eq!(draft.link(), Some("https://openai.com/blog"));
        assert!(!draft.body().contains("example.com"));
    }

    #[test]
    fn test_from_candidate_keeps_extra_urls_as_fallbacks() {
        let raw = "1. Model https://a.example.com 2. Chips https://b.example.com";

        let draft = DraftMessage::from_candidate(raw, None).unwrap();
        assert_eq!(draft.link(), Some("https://a.example.com"));
        assert_eq!(draft.fallback_links(), &["https://b.example.com"]);
        assert_eq!(draft.body(), "1. Model 2. Chips");
    }

    #[test]
    fn test_from_candidate_second_url_survives_as_fallback() {
        let raw = "Check https://dead.example.com or https://ok.example.com today";

        let draft = DraftMessage::from_candidate(raw, None).unwrap();
        assert_eq!(draft.link(), Some("https://dead.example.com"));
        assert_eq!(draft.fallback_links(), &["https://ok.example.com"]);
        assert_eq!(draft.body(), "Check or today");
    }

    #[test]
    fn test_from_candidate_source_url_keeps_text_urls_as_fallbacks() {
        let raw = "News https://a.example.com and https://a.example.com again";

        let draft = DraftMessage::from_candidate(raw, Some("https://source.example.com")).unwrap();
        assert_eq!(draft.link(), Some("https://source.example.com"));
        assert_eq!(draft.fallback_links(), &["https://a.example.com"]);
    }

    #[test]
    fn test_from_candidate_strips_trailing_punctuation_from_url() {
        let raw = "Read more (https://example.com/post).";

        let draft = DraftMessage::from_candidate(raw, None).unwrap();
        assert_eq!(draft.link(), Some("https://example.com/post"));
        assert_eq!(draft.body(), "Read more.");
    }

    #[test]
    fn test_from_candidate_hashtag_before_period() {
        let draft = DraftMessage::from_candidate("Great news #AI.", None).unwrap();

        assert_eq!(draft.body(), "Great news.");
        assert_eq!(draft.hashtags(), &["AI"]);
    }

    #[test]
    fn test_from_candidate_url_mid_sentence_keeps_comma() {
        let raw = "OpenAI shipped https://openai.com/blog, and Google followed";

        let draft = DraftMessage::from_candidate(raw, None).unwrap();
        assert_eq!(draft.link(), Some("https://openai.com/blog"));
        assert_eq!(draft.body(), "OpenAI shipped, and Google followed");
    }

    #[test]
    fn test_from_candidate_keeps_mid_word_hash() {
        let raw = "C# developers get new AI tooling";

        let draft = DraftMessage::from_candidate(raw, None).unwrap();
        assert_eq!(draft.body(), "C# developers get new AI tooling");
        assert!(draft.hashtags().is_empty());
    }

    #[test]
    fn test_from_candidate_reads_after_marker() {
        let raw = "Here is your tweet.\n\nTWEET_TEXT: Google announces Gemini update #AI\n\nNotes: none";

        let draft = DraftMessage::from_candidate(raw, None).unwrap();
        assert_eq!(draft.body(), "Google announces Gemini update");
        assert_eq!(draft.hashtags(), &["AI"]);
    }

    #[test]
    fn test_from_candidate_marker_with_windows_line_endings() {
        let raw = "TWEET_TEXT: Windows\r\n\r\nnotes here";

        let draft = DraftMessage::from_candidate(raw, None).unwrap();
        assert_eq!(draft.body(), "Windows");
    }

    #[test]
    fn test_from_candidate_marker_blank_line_with_spaces() {
        let raw = "TWEET_TEXT: Tweet body\n   \nNotes: none";

        let draft = DraftMessage::from_candidate(raw, None).unwrap();
        assert_eq!(draft.body(), "Tweet body");
    }

    #[test]
    fn test_from_candidate_cleans_whitespace() {
        let raw = "Today's AI News:\n  1. Google    announces\n\n 2. Microsoft   partners";

        let draft = DraftMessage::from_candidate(raw, None).unwrap();
        assert_eq!(draft.body(), "Today's AI News: 1. Google announces 2. Microsoft partners");
    }

    #[test]
    fn test_from_candidate_only_links_and_tags_is_malformed() {
        let raw = "https://example.com #AI #ML";

        let result = DraftMessage::from_candidate(raw, None);
        assert!(matches!(result, Err(FormatError::MalformedInput(_))));
    }

    #[test]
    fn test_from_candidate_empty_is_malformed() {
        assert!(DraftMessage::from_candidate("", None).is_err());
    }

    // ==================== clean_whitespace Tests ====================

    #[test]
    fn test_clean_whitespace_collapses_runs() {
        assert_eq!(clean_whitespace("  a \n\n b\t\tc  "), "a b c");
    }

    #[test]
    fn test_clean_whitespace_adds_space_after_sentence() {
        assert_eq!(clean_whitespace("Big day.Next up!Really?Yes"), "Big day. Next up! Really? Yes");
    }

    #[test]
    fn test_clean_whitespace_drops_empty_parens() {
        assert_eq!(clean_whitespace("Details ( ) inside"), "Details inside");
        assert_eq!(clean_whitespace("Read more ( )."), "Read more.");
    }

    #[test]
    fn test_clean_whitespace_attaches_lone_punctuation() {
        assert_eq!(clean_whitespace("Great news . Really !"), "Great news. Really!");
        assert_eq!(clean_whitespace("one , two ; three"), "one, two; three");
    }

    #[test]
    fn test_clean_whitespace_leaves_lowercase_after_dot() {
        assert_eq!(clean_whitespace("version 4.o and e.g. this"), "version 4.o and e.g. this");
    }
}
