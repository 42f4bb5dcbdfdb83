//! Error types for every layer of the filtering pipeline.
//!
//! Item-level failures (`ProbeError`, `ClassifyError`) are skipped by the feed
//! filter; feed-level failures (`FilterError`, `FeedError`) abort a single request.

use thiserror::Error;

/// The request's cancellation token fired before the operation completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

#[derive(Debug, Error)]
pub enum CacheError {
    /// Connectivity or protocol failure talking to Redis
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// TTL rounds down to zero milliseconds
    #[error("Invalid TTL: {0:?}")]
    InvalidTtl(std::time::Duration),
}

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("Probe request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Status outside the 2xx/3xx ranges the classifier understands
    #[error("Probe returned HTTP {0}")]
    UnexpectedStatus(u16),
}

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error(transparent)]
    Probe(#[from] ProbeError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

/// Failures of the upstream fetch-and-parse collaborator.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Upstream answered 404 for the requested feed
    #[error("Upstream feed not found")]
    NotFound,

    #[error("Upstream returned HTTP {0}")]
    Status(u16),

    #[error("Upstream request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upstream feed could not be parsed: {0}")]
    Parse(#[from] feed_rs::parser::ParseFeedError),
}

#[derive(Debug, Error)]
pub enum FilterError {
    /// The upstream feed does not exist; cached negatively by the feed service
    #[error("Feed not found")]
    NotFound,

    #[error(transparent)]
    Upstream(SourceError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl From<SourceError> for FilterError {
    fn from(err: SourceError) -> Self {
        match err {
            SourceError::NotFound => FilterError::NotFound,
            other => FilterError::Upstream(other),
        }
    }
}

#[derive(Debug, Error)]
#[error("Feed rendering failed: {0}")]
pub struct RenderError(#[from] pub quick_xml::DeError);

/// Feed-level failure, rendered as HTTP 500 by the server.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Filter(FilterError),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error(transparent)]
    Cancelled(#[from] Cancelled),
}

impl From<FilterError> for FeedError {
    fn from(err: FilterError) -> Self {
        match err {
            FilterError::Cancelled(c) => FeedError::Cancelled(c),
            other => FeedError::Filter(other),
        }
    }
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config Error: {name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}
