//! First-reply enrichment for stored reviews.

use std::sync::Arc;

use serde::Deserialize;
use tracing::debug;

use super::api::{CommentsRequest, StorefrontApi};
use super::error::CrawlError;
use super::reviews::RawReview;
use crate::models::Review;
use crate::repository::DieselReviewRepository;

#[derive(Debug, Deserialize)]
struct CommentsResponse {
    #[serde(default)]
    comments: Option<Vec<Comment>>,
}

#[derive(Debug, Deserialize)]
struct Comment {
    #[serde(default)]
    comment: Option<String>,
}

/// Fetches the first reply to a review and stores it on the review.
#[derive(Clone)]
pub struct CommentEnricher {
    api: Arc<dyn StorefrontApi>,
    reviews: DieselReviewRepository,
}

impl CommentEnricher {
    pub fn new(api: Arc<dyn StorefrontApi>, reviews: DieselReviewRepository) -> Self {
        Self { api, reviews }
    }

    /// Attach the first reply to `review`. Returns the reply text, if any.
    ///
    /// A review nobody answered is left with no reply text. Any status
    /// other than 200, 403 included, fails this review only.
    pub async fn enrich(
        &self,
        raw: &RawReview,
        review: &Review,
    ) -> Result<Option<String>, CrawlError> {
        let (uuid, sku) = raw.reply_key()?;
        let request = CommentsRequest::first_page(uuid, sku);
        let response = self.api.review_comments(&request).await?;
        if response.status != reqwest::StatusCode::OK {
            return Err(CrawlError::UnexpectedStatus {
                status: response.status.as_u16(),
                url: response.url,
            });
        }

        let body: CommentsResponse = response.json()?;
        let first = body
            .comments
            .and_then(|comments| comments.into_iter().next())
            .and_then(|c| c.comment);

        debug!(
            "Review {} ({}): {}",
            uuid,
            review.product_tag,
            if first.is_some() { "has reply" } else { "no reply" }
        );
        self.reviews
            .set_first_response(review.id, first.as_deref())
            .await?;

        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{NewReview, ProductTag};
    use crate::repository::DieselDbContext;
    use crate::scrapers::testing::{ok, status, ScriptedStorefront};
    use chrono::NaiveDate;
    use tempfile::tempdir;

    struct Fixture {
        api: Arc<ScriptedStorefront>,
        reviews: DieselReviewRepository,
        enricher: CommentEnricher,
        _dir: tempfile::TempDir,
    }

    async fn setup() -> Fixture {
        let dir = tempdir().unwrap();
        let ctx = DieselDbContext::new(&dir.path().join("test.db").display().to_string());
        ctx.init_schema().await.unwrap();
        let api = Arc::new(ScriptedStorefront::new());
        let enricher = CommentEnricher::new(api.clone(), ctx.reviews());
        Fixture {
            api,
            reviews: ctx.reviews(),
            enricher,
            _dir: dir,
        }
    }

    fn raw_review() -> RawReview {
        serde_json::from_value(serde_json::json!({
            "uuid": "0191f1c2-review",
            "itemId": 1583041283,
            "createdAt": 1727000000,
            "content": {"comment": "nice"}
        }))
        .unwrap()
    }

    async fn stored(reviews: &DieselReviewRepository) -> Review {
        reviews
            .create(&NewReview {
                text: "nice".to_string(),
                advantages: None,
                disadvantages: None,
                published_at: NaiveDate::from_ymd_opt(2024, 9, 22).unwrap(),
                image: None,
                product_tag: ProductTag::new("dress-1"),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_first_reply_is_stored() {
        let f = setup().await;
        let review = stored(&f.reviews).await;
        f.api.push_comments(ok(
            r#"{"comments": [{"comment": "Thanks for the feedback"}, {"comment": "second"}]}"#,
        ));

        let reply = f.enricher.enrich(&raw_review(), &review).await.unwrap();
        assert_eq!(reply.as_deref(), Some("Thanks for the feedback"));

        let saved = f.reviews.get(review.id).await.unwrap().unwrap();
        assert_eq!(
            saved.first_response_text.as_deref(),
            Some("Thanks for the feedback")
        );
        assert_eq!(
            f.api.comment_requests(),
            vec![CommentsRequest::first_page("0191f1c2-review", 1583041283)]
        );
    }

    #[tokio::test]
    async fn test_no_reply_leaves_field_empty() {
        let f = setup().await;
        let review = stored(&f.reviews).await;
        f.api.push_comments(ok(r#"{"comments": []}"#));

        assert_eq!(f.enricher.enrich(&raw_review(), &review).await.unwrap(), None);
        let saved = f.reviews.get(review.id).await.unwrap().unwrap();
        assert_eq!(saved.first_response_text, None);

        f.api.push_comments(ok(r#"{"comments": null}"#));
        assert_eq!(f.enricher.enrich(&raw_review(), &review).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_non_ok_status_fails() {
        let f = setup().await;
        let review = stored(&f.reviews).await;

        f.api.push_comments(status(500));
        assert!(matches!(
            f.enricher.enrich(&raw_review(), &review).await,
            Err(CrawlError::UnexpectedStatus { status: 500, .. })
        ));

        f.api.push_comments(status(403));
        assert!(matches!(
            f.enricher.enrich(&raw_review(), &review).await,
            Err(CrawlError::UnexpectedStatus { status: 403, .. })
        ));
    }
}
