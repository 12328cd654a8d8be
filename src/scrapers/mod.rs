//! Storefront crawling: listing discovery, review pagination and reply
//! enrichment.

pub mod api;
pub mod comments;
pub mod discovery;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod orchestrator;
pub mod reviews;
#[cfg(test)]
pub(crate) mod testing;

pub use api::{CommentsRequest, StorefrontApi};
pub use comments::CommentEnricher;
pub use discovery::ProductDiscoverer;
pub use envelope::Envelope;
pub use error::CrawlError;
pub use http_client::{ApiResponse, HttpClient, RetryPolicy};
pub use orchestrator::{CrawlOrchestrator, CrawlSummary};
pub use reviews::{CutoffPolicy, PersistOutcome, ProductReport, RawReview, ReviewPaginator, StopReason};
