/// Errors surfaced by the tweet formatting core.
///
/// Link problems are deliberately absent: an unreachable or malformed link
/// is reported through [`LinkCheckResult`](crate::link::LinkCheckResult)
/// and handled by dropping the link.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatError {
    /// The draft has no usable body text.
    #[error("Malformed draft: {0}")]
    MalformedInput(String),

    /// The length limit is too small to hold any meaningful content.
    #[error("Max tweet length {max_length} is below the minimum of {minimum}")]
    Configuration { max_length: usize, minimum: usize },
}
