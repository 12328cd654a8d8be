//! Storefront API surface used by the crawler.

use async_trait::async_trait;
use serde::Serialize;

use super::error::CrawlError;
use super::http_client::ApiResponse;

/// Path of the page-json entry point, relative to the storefront root.
pub const ENTRYPOINT_PATH: &str = "/api/entrypoint-api.bx/page/json/v2?url=";

/// Path of the review-reply RPC, relative to the storefront root.
pub const COMMENTS_PATH: &str = "/api/composer-api.bx/_action/rpGetCommentsByReviewUuid";

/// Build the page-json URL for a storefront path and query.
pub fn entrypoint_url(base_url: &str, path_and_query: &str) -> String {
    format!(
        "{}{}{}",
        base_url.trim_end_matches('/'),
        ENTRYPOINT_PATH,
        urlencoding::encode(path_and_query)
    )
}

/// Body of the review-reply RPC.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CommentsRequest {
    pub limit: u32,
    pub offset: u32,
    pub review_uuid: String,
    pub sku: i64,
}

impl CommentsRequest {
    /// Request the first page of replies to a review.
    pub fn first_page(review_uuid: &str, sku: i64) -> Self {
        Self {
            limit: 10,
            offset: 0,
            review_uuid: review_uuid.to_string(),
            sku,
        }
    }
}

/// Transport to the storefront.
///
/// Implementations return every HTTP response as-is (403 included); mapping
/// statuses to crawl outcomes is the caller's job.
#[async_trait]
pub trait StorefrontApi: Send + Sync {
    /// Start a fresh cookie session by visiting the storefront root.
    async fn open_session(&self) -> Result<(), CrawlError>;

    /// Fetch a page-json document using the current session's cookies.
    async fn session_page(&self, path_and_query: &str) -> Result<ApiResponse, CrawlError>;

    /// Fetch a page-json document without session cookies.
    async fn page(&self, path_and_query: &str) -> Result<ApiResponse, CrawlError>;

    /// Ask for replies to a review.
    async fn review_comments(&self, request: &CommentsRequest) -> Result<ApiResponse, CrawlError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entrypoint_url_encodes_path() {
        let url = entrypoint_url(
            "https://www.ozon.ru/",
            "/product/abc-123/?layout_container=reviewshelfpaginator&layout_page_index=3",
        );
        assert_eq!(
            url,
            "https://www.ozon.ru/api/entrypoint-api.bx/page/json/v2?url=\
             %2Fproduct%2Fabc-123%2F%3Flayout_container%3Dreviewshelfpaginator%26layout_page_index%3D3"
        );
    }

    #[test]
    fn test_comments_request_body() {
        let body = serde_json::to_value(CommentsRequest::first_page("u-1", 42)).unwrap();
        assert_eq!(
            body,
            serde_json::json!({"limit": 10, "offset": 0, "reviewUuid": "u-1", "sku": 42})
        );
    }
}
