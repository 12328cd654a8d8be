//! Per-product review pagination.
//!
//! A product's review feed is walked page by page until the storefront
//! stops returning reviews, stops offering a continuation link, or a review
//! falls outside the cutoff window. The window is anchored on the first
//! review seen for the product in the current run, not on the wall clock.
//!
//! The feed is assumed to be newest-first: one review past the cutoff means
//! everything after it is older still, so the walk ends right there.

use std::sync::{Arc, LazyLock};
use std::time::Duration;

use chrono::DateTime;
use regex::Regex;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::{debug, error, info};

use super::api::StorefrontApi;
use super::comments::CommentEnricher;
use super::envelope::Envelope;
use super::error::CrawlError;
use crate::config::CrawlConfig;
use crate::models::{NewReview, ProductTag, Review};
use crate::repository::DieselReviewRepository;
use crate::state::CrawlState;

/// Widget carrying a page of reviews.
pub const REVIEWS_WIDGET: &str = "webListReviews";

/// Default cutoff window in seconds.
pub const ONE_MONTH: i64 = 30 * 24 * 60 * 60;

static PAGE_PARAM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"page=(\d+)").expect("page pattern is a valid regex"));

#[derive(Debug, Deserialize)]
struct ReviewPage {
    #[serde(default)]
    reviews: Option<Vec<Value>>,
}

/// One review as the storefront sends it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawReview {
    /// Only needed to look up replies; a review without it is still stored.
    #[serde(default)]
    pub uuid: Option<String>,
    #[serde(default, deserialize_with = "lenient_opt_i64")]
    pub item_id: Option<i64>,
    #[serde(deserialize_with = "lenient_i64")]
    pub created_at: i64,
    #[serde(default)]
    pub content: ReviewContent,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ReviewContent {
    #[serde(default)]
    pub comment: Option<String>,
    #[serde(default)]
    pub positive: Option<String>,
    #[serde(default)]
    pub negative: Option<String>,
    #[serde(default)]
    pub photos: Option<Vec<Photo>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Photo {
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrString {
    Number(i64),
    Text(String),
}

impl NumberOrString {
    fn into_i64<E: serde::de::Error>(self) -> Result<i64, E> {
        match self {
            NumberOrString::Number(n) => Ok(n),
            NumberOrString::Text(s) => s.trim().parse().map_err(E::custom),
        }
    }
}

/// Numbers sometimes arrive quoted.
fn lenient_i64<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    NumberOrString::deserialize(deserializer)?.into_i64()
}

fn lenient_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<NumberOrString>::deserialize(deserializer)?
        .map(NumberOrString::into_i64)
        .transpose()
}

impl RawReview {
    pub fn from_value(value: Value) -> Result<Self, CrawlError> {
        serde_json::from_value(value)
            .map_err(|e| CrawlError::Parse(format!("malformed review: {}", e)))
    }

    /// Review id for log lines.
    pub fn label(&self) -> &str {
        self.uuid.as_deref().unwrap_or("<no uuid>")
    }

    /// Review uuid and product sku the reply RPC is keyed by.
    pub fn reply_key(&self) -> Result<(&str, i64), CrawlError> {
        match (self.uuid.as_deref(), self.item_id) {
            (Some(uuid), Some(sku)) => Ok((uuid, sku)),
            _ => Err(CrawlError::Parse(format!(
                "review {} has no uuid or itemId to look up replies",
                self.label()
            ))),
        }
    }

    /// URL of the first attached photo.
    pub fn first_photo(&self) -> Option<&str> {
        self.content
            .photos
            .as_ref()
            .and_then(|photos| photos.first())
            .and_then(|photo| photo.url.as_deref())
    }

    /// Build the record to store for this review.
    pub fn to_new_review(&self, tag: &ProductTag) -> Result<NewReview, CrawlError> {
        let published_at = DateTime::from_timestamp(self.created_at, 0)
            .ok_or_else(|| {
                CrawlError::Parse(format!(
                    "review {} has an out-of-range timestamp {}",
                    self.label(), self.created_at
                ))
            })?
            .date_naive();

        Ok(NewReview {
            text: self.content.comment.clone().unwrap_or_default(),
            advantages: self.content.positive.clone(),
            disadvantages: self.content.negative.clone(),
            published_at,
            image: self.first_photo().map(str::to_string),
            product_tag: tag.clone(),
        })
    }
}

/// How far behind its anchor a review may be and still be kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CutoffPolicy {
    pub window_secs: i64,
}

impl Default for CutoffPolicy {
    fn default() -> Self {
        Self {
            window_secs: ONE_MONTH,
        }
    }
}

impl CutoffPolicy {
    pub fn from_days(days: u32) -> Self {
        Self {
            window_secs: i64::from(days) * 24 * 60 * 60,
        }
    }

    /// A review exactly `window_secs` behind the anchor is still kept.
    pub fn is_too_old(&self, anchor: i64, created_at: i64) -> bool {
        anchor - created_at > self.window_secs
    }
}

/// Result of trying to store one review.
#[derive(Debug, Clone, PartialEq)]
pub enum PersistOutcome {
    Stored(Review),
    TooOld { anchor: i64, created_at: i64 },
}

/// Why a product's pagination ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The page had no reviews widget.
    NoWidget,
    /// The reviews widget was empty.
    NoReviews,
    /// A review fell outside the cutoff window.
    CutoffReached,
    /// The page offered no continuation link.
    LastPage,
}

enum PageStep {
    Next(String),
    Stop(StopReason),
}

/// What crawling one product produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductReport {
    pub tag: ProductTag,
    pub pages: u32,
    pub stored: usize,
    /// Reviews that could not be parsed, stored or enriched.
    pub failed: usize,
    pub stop: StopReason,
}

#[derive(Default)]
struct PageTally {
    stored: usize,
    failed: usize,
}

/// Path and query of the next review page.
///
/// The first page is built from the product path; later pages reuse the
/// storefront's continuation link with its `page=` parameter set to `page`.
pub fn review_url_param(
    previous: Option<&str>,
    tag: &ProductTag,
    page: u32,
    review_page_index: u32,
) -> String {
    match previous {
        None => format!(
            "{}?layout_container=reviewshelfpaginator&layout_page_index={}",
            tag.product_path(),
            review_page_index
        ),
        Some(link) => PAGE_PARAM
            .replace_all(link, format!("page={}", page).as_str())
            .into_owned(),
    }
}

/// Walks one product's review feed and stores what it finds.
#[derive(Clone)]
pub struct ReviewPaginator {
    api: Arc<dyn StorefrontApi>,
    state: CrawlState,
    reviews: DieselReviewRepository,
    enricher: CommentEnricher,
    cutoff: CutoffPolicy,
    page_delay: Duration,
    review_page_index: u32,
}

impl ReviewPaginator {
    pub fn new(
        api: Arc<dyn StorefrontApi>,
        state: CrawlState,
        reviews: DieselReviewRepository,
    ) -> Self {
        let enricher = CommentEnricher::new(api.clone(), reviews.clone());
        Self {
            api,
            state,
            reviews,
            enricher,
            cutoff: CutoffPolicy::default(),
            page_delay: Duration::from_secs(2),
            review_page_index: 3,
        }
    }

    /// Create a paginator using crawl settings from configuration.
    pub fn from_config(
        api: Arc<dyn StorefrontApi>,
        state: CrawlState,
        reviews: DieselReviewRepository,
        config: &CrawlConfig,
    ) -> Self {
        Self::new(api, state, reviews)
            .with_cutoff(CutoffPolicy::from_days(config.cutoff_days))
            .with_page_delay(Duration::from_millis(config.page_delay_ms))
            .with_review_page_index(config.review_page_index)
    }

    pub fn with_cutoff(mut self, cutoff: CutoffPolicy) -> Self {
        self.cutoff = cutoff;
        self
    }

    /// Pause between two review pages of the same product.
    pub fn with_page_delay(mut self, delay: Duration) -> Self {
        self.page_delay = delay;
        self
    }

    pub fn with_review_page_index(mut self, index: u32) -> Self {
        self.review_page_index = index;
        self
    }

    /// Crawl every qualifying review of `tag`.
    ///
    /// Only [`CrawlError::Forbidden`] and page-level failures (unexpected
    /// status, malformed envelope, state store errors) end the product
    /// early with an error. Failures of a single review are logged and
    /// counted in the report.
    pub async fn crawl_product(&self, tag: &ProductTag) -> Result<ProductReport, CrawlError> {
        self.state.clear_anchor(tag).await?;

        let mut cursor: Option<String> = None;
        let mut page = 1u32;
        let mut pages = 0u32;
        let mut tally = PageTally::default();

        let stop = loop {
            let link = review_url_param(cursor.as_deref(), tag, page, self.review_page_index);
            let step = self.crawl_page(&link, tag, &mut tally).await?;
            pages += 1;

            match step {
                PageStep::Next(next) => {
                    cursor = Some(next);
                    page += 1;
                }
                PageStep::Stop(reason) => break reason,
            }
        };

        info!(
            "Product {}: {} pages, {} reviews stored, {} failed ({:?})",
            tag, pages, tally.stored, tally.failed, stop
        );

        Ok(ProductReport {
            tag: tag.clone(),
            pages,
            stored: tally.stored,
            failed: tally.failed,
            stop,
        })
    }

    async fn crawl_page(
        &self,
        link: &str,
        tag: &ProductTag,
        tally: &mut PageTally,
    ) -> Result<PageStep, CrawlError> {
        debug!("Fetching reviews of {}: {}", tag, link);

        let response = self.api.page(link).await?.require_success()?;
        let envelope = Envelope::parse(&response.body)?;

        let Some(widget) = envelope.widget::<ReviewPage>(REVIEWS_WIDGET)? else {
            return Ok(PageStep::Stop(StopReason::NoWidget));
        };
        let reviews = match widget.reviews {
            Some(reviews) if !reviews.is_empty() => reviews,
            _ => return Ok(PageStep::Stop(StopReason::NoReviews)),
        };

        for value in reviews {
            let raw = match RawReview::from_value(value) {
                Ok(raw) => raw,
                Err(e) => {
                    tally.failed += 1;
                    error!("Skipping review of {}: {}", tag, e);
                    continue;
                }
            };

            let review = match self.persist(&raw, tag).await {
                Ok(PersistOutcome::Stored(review)) => review,
                Ok(PersistOutcome::TooOld { anchor, created_at }) => {
                    info!(
                        "Review {} of {} is older than the cutoff (anchor {}, created {})",
                        raw.label(), tag, anchor, created_at
                    );
                    return Ok(PageStep::Stop(StopReason::CutoffReached));
                }
                Err(e) => {
                    self.review_failed(tag, &raw, e, tally)?;
                    continue;
                }
            };
            tally.stored += 1;

            if let Err(e) = self.enricher.enrich(&raw, &review).await {
                self.review_failed(tag, &raw, e, tally)?;
            }
        }

        if !self.page_delay.is_zero() {
            tokio::time::sleep(self.page_delay).await;
        }

        Ok(match envelope.next_page() {
            Some(next) => PageStep::Next(next.to_string()),
            None => PageStep::Stop(StopReason::LastPage),
        })
    }

    /// Record a failed review, or hand back errors that must end the run.
    fn review_failed(
        &self,
        tag: &ProductTag,
        raw: &RawReview,
        e: CrawlError,
        tally: &mut PageTally,
    ) -> Result<(), CrawlError> {
        if e.is_forbidden() {
            return Err(e);
        }
        tally.failed += 1;
        error!("Review {} of {} failed: {}", raw.label(), tag, e);
        Ok(())
    }

    /// Store `raw` unless it is outside the cutoff window of its product.
    ///
    /// The first review persisted for a tag fixes the tag's anchor.
    pub async fn persist(
        &self,
        raw: &RawReview,
        tag: &ProductTag,
    ) -> Result<PersistOutcome, CrawlError> {
        let anchor = self.state.anchor_or_init(tag, raw.created_at).await?;
        if self.cutoff.is_too_old(anchor, raw.created_at) {
            return Ok(PersistOutcome::TooOld {
                anchor,
                created_at: raw.created_at,
            });
        }

        let review = self.reviews.create(&raw.to_new_review(tag)?).await?;
        Ok(PersistOutcome::Stored(review))
    }
}
