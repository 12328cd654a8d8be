//! ozon-reviews - incremental harvester for storefront product reviews.
//!
//! Discovers products from category listing pages, walks each product's
//! review feed back to a time-based cutoff, and stores the reviews together
//! with the first reply each one received.

pub mod cli;
pub mod config;
pub mod models;
pub mod repository;
pub mod schema;
pub mod scrapers;
pub mod state;

pub use config::Config;
pub use models::{ProductTag, Review};
pub use repository::{AsyncSqlitePool, DieselDbContext, DieselReviewRepository};
pub use scrapers::{CrawlError, CrawlOrchestrator, CrawlSummary, HttpClient, StorefrontApi};
pub use state::{CrawlState, StateBackend, StateError};
