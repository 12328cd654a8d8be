//! Whole-run sequencing: listing pages, then every product they list.

use std::sync::Arc;

use tracing::{error, info, warn};

use super::api::StorefrontApi;
use super::discovery::ProductDiscoverer;
use super::error::CrawlError;
use super::reviews::ReviewPaginator;
use crate::config::Config;
use crate::repository::DieselReviewRepository;
use crate::state::CrawlState;

/// Totals of one crawl run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CrawlSummary {
    pub listing_pages: u32,
    pub products: usize,
    pub products_failed: usize,
    pub reviews_stored: usize,
    pub reviews_failed: usize,
    pub review_pages: u32,
}

/// Runs a full crawl.
///
/// Listing pages are processed one after another; each one replaces the
/// discovered tag set, and every tag in it is crawled to completion before
/// the next listing page is requested.
pub struct CrawlOrchestrator {
    discoverer: ProductDiscoverer,
    paginator: ReviewPaginator,
    state: CrawlState,
    reviews: DieselReviewRepository,
    first_page: u32,
    page_count: u32,
}

impl CrawlOrchestrator {
    pub fn new(
        config: &Config,
        api: Arc<dyn StorefrontApi>,
        state: CrawlState,
        reviews: DieselReviewRepository,
    ) -> Self {
        let discoverer = ProductDiscoverer::new(
            api.clone(),
            state.clone(),
            &config.storefront.category_path,
        );
        let paginator =
            ReviewPaginator::from_config(api, state.clone(), reviews.clone(), &config.crawl);

        Self {
            discoverer,
            paginator,
            state,
            reviews,
            first_page: config.crawl.first_listing_page,
            page_count: config.crawl.listing_pages,
        }
    }

    /// Run the crawl.
    ///
    /// The review store is emptied once before anything is fetched.
    /// Forbidden aborts the run, as does any failure on a listing page.
    /// A product whose pagination fails is logged and skipped; reviews
    /// stored before an abort are kept.
    pub async fn run(&self) -> Result<CrawlSummary, CrawlError> {
        let removed = self.reviews.truncate().await?;
        info!("Cleared {} reviews from previous run", removed);

        let mut summary = CrawlSummary::default();
        let last_page = self
            .first_page
            .saturating_add(self.page_count.saturating_sub(1));

        for page in self.first_page..=last_page {
            self.discoverer.discover(page).await?;
            summary.listing_pages += 1;

            let tags = self.state.tags().await?;
            info!("Listing page {}: crawling {} products", page, tags.len());

            for tag in &tags {
                summary.products += 1;
                match self.paginator.crawl_product(tag).await {
                    Ok(report) => {
                        summary.review_pages += report.pages;
                        summary.reviews_stored += report.stored;
                        summary.reviews_failed += report.failed;
                    }
                    Err(e) if e.is_forbidden() => {
                        warn!("Storefront blocked the crawler at product {}", tag);
                        return Err(e);
                    }
                    Err(e) => {
                        summary.products_failed += 1;
                        error!("Product {} failed: {}", tag, e);
                    }
                }
            }
        }

        info!(
            "Crawl finished: {} listing pages, {} products ({} failed), {} reviews stored",
            summary.listing_pages, summary.products, summary.products_failed, summary.reviews_stored
        );
        Ok(summary)
    }
}
