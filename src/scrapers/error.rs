//! Crawl error types.

use thiserror::Error;

use crate::repository::DieselError;
use crate::state::StateError;

/// Errors raised while crawling the storefront.
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The storefront answered 403: the crawler has been blocked.
    #[error("Storefront refused the request (HTTP 403): {url}")]
    Forbidden { url: String },
    /// A response did not have the expected structure.
    #[error("Malformed storefront response: {0}")]
    Parse(String),
    #[error("Unexpected HTTP {status} from {url}")]
    UnexpectedStatus { status: u16, url: String },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("State store error: {0}")]
    State(#[from] StateError),
    #[error("Database error: {0}")]
    Database(#[from] DieselError),
}

impl CrawlError {
    /// True when the site has blocked the crawler and the run should stop.
    pub fn is_forbidden(&self) -> bool {
        matches!(self, CrawlError::Forbidden { .. })
    }
}

impl From<serde_json::Error> for CrawlError {
    fn from(e: serde_json::Error) -> Self {
        CrawlError::Parse(e.to_string())
    }
}
