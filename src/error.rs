//! Error taxonomy for the pipeline.
//!
//! Only [`PipelineError`] is allowed to escape the pipeline: it marks a caller
//! contract violation (a programming error). Fetch, parse, and capability
//! failures are absorbed where they happen and degrade output quality instead
//! of aborting the run.

use thiserror::Error;

/// Network-layer failure while downloading a page.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("unexpected status {0}")]
    Status(reqwest::StatusCode),
}

/// Failure of a single extraction strategy. Always caught by the chain driver;
/// a strategy error only means "try the next one".
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error("invalid article url: {0}")]
    BadUrl(#[from] url::ParseError),
    #[error("no article content found")]
    NoContent,
    #[error("extracted text shorter than {min_len} characters")]
    TooShort { min_len: usize },
}

/// Failure of the model-backed summarization tier.
#[derive(Debug, Error)]
pub enum SummarizeError {
    #[error("summarization endpoint not configured")]
    NotConfigured,
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("model returned empty output")]
    EmptyOutput,
}

/// Caller contract violations. The only hard failures the pipeline raises.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("similarity threshold must be in (0, 1], got {0}")]
    InvalidThreshold(f64),
}
