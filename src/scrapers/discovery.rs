//! Product discovery from category listing pages.

use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::Deserialize;
use tracing::{debug, info};

use super::api::StorefrontApi;
use super::envelope::Envelope;
use super::error::CrawlError;
use crate::models::ProductTag;
use crate::state::CrawlState;

/// Widget carrying the listing's product cards.
pub const SEARCH_WIDGET: &str = "searchResultsV2";

/// Product links look like `/product/<tag>/?...`.
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/product/([a-zA-Z0-9\-]+)/\?").expect("tag pattern is a valid regex")
});

#[derive(Debug, Deserialize)]
struct ListingWidget {
    items: Vec<ListingItem>,
}

#[derive(Debug, Deserialize)]
struct ListingItem {
    action: ListingAction,
}

#[derive(Debug, Deserialize)]
struct ListingAction {
    link: String,
}

/// Pull the product tag out of a listing link.
pub fn extract_tag(link: &str) -> Option<ProductTag> {
    TAG_PATTERN
        .captures(link)
        .and_then(|caps| caps.get(1))
        .map(|m| ProductTag::new(m.as_str()))
}

/// Path and query of one category listing page.
pub fn listing_url_param(category_path: &str, page: u32) -> String {
    format!(
        "{}?layout_container=categorySearchMegapagination&layout_page_index={}&page={}",
        category_path, page, page
    )
}

/// Discovers the products listed on category pages.
#[derive(Clone)]
pub struct ProductDiscoverer {
    api: Arc<dyn StorefrontApi>,
    state: CrawlState,
    category_path: String,
}

impl ProductDiscoverer {
    pub fn new(api: Arc<dyn StorefrontApi>, state: CrawlState, category_path: &str) -> Self {
        Self {
            api,
            state,
            category_path: category_path.to_string(),
        }
    }

    /// Fetch listing page `page` (1-based) and make its products the
    /// current tag set, replacing whatever the previous page left.
    pub async fn discover(&self, page: u32) -> Result<Vec<ProductTag>, CrawlError> {
        self.api.open_session().await?;

        let url_param = listing_url_param(&self.category_path, page);
        debug!("Fetching listing page {}: {}", page, url_param);

        let response = self
            .api
            .session_page(&url_param)
            .await?
            .require_success()?;
        let envelope = Envelope::parse(&response.body)?;

        let listing: ListingWidget = envelope.widget(SEARCH_WIDGET)?.ok_or_else(|| {
            CrawlError::Parse(format!(
                "listing page {} has no {} widget",
                page, SEARCH_WIDGET
            ))
        })?;

        let tags = listing
            .items
            .iter()
            .map(|item| {
                extract_tag(&item.action.link).ok_or_else(|| {
                    CrawlError::Parse(format!(
                        "listing link without a product tag: {}",
                        item.action.link
                    ))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.state.replace_tags(&tags).await?;
        info!("Listing page {}: discovered {} products", page, tags.len());

        Ok(tags)
    }
}
