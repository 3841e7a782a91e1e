//! Upstream access to the LeetCode API.
//!
//! Provides:
//! - The [`StatsSource`] seam the cache fetches through
//! - The GraphQL client used in production
//! - Retry with exponential backoff for transient failures

pub mod leetcode;
pub mod payload;
pub mod retry;

pub use leetcode::*;
pub use payload::*;
pub use retry::*;

use futures::future::BoxFuture;

/// Something that can fetch the raw profile payload for a username.
pub trait StatsSource: Send + Sync {
    fn fetch_profile<'a>(&'a self, username: &'a str)
        -> BoxFuture<'a, Result<GraphQlResponse, FetchError>>;
}

/// Why an upstream fetch failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
    /// Connection refused, reset, DNS failure and the like.
    Network(String),
    /// The request exceeded the configured timeout.
    Timeout,
    /// Upstream answered 429.
    RateLimited,
    /// Upstream answered with another non-success status.
    Status(u16),
    /// The body could not be decoded or failed validation.
    Invalid(String),
}

impl FetchError {
    /// Whether another attempt may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            FetchError::Network(_) | FetchError::Timeout | FetchError::RateLimited
        )
    }
}

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchError::Network(e) => write!(f, "Network error: {}", e),
            FetchError::Timeout => write!(f, "Upstream request timed out"),
            FetchError::RateLimited => write!(f, "Upstream rate limit exceeded"),
            FetchError::Status(code) => write!(f, "Upstream responded with status {}", code),
            FetchError::Invalid(e) => write!(f, "Invalid upstream payload: {}", e),
        }
    }
}

impl std::error::Error for FetchError {}
