//! Scripted storefront for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde_json::Value;

use super::api::{CommentsRequest, StorefrontApi};
use super::error::CrawlError;
use super::http_client::ApiResponse;

/// Build a page envelope whose widgets are encoded as JSON strings.
pub(crate) fn envelope_body(widgets: &[(&str, Value)], next_page: Option<&str>) -> String {
    let states: serde_json::Map<String, Value> = widgets
        .iter()
        .map(|(key, value)| (key.to_string(), Value::String(value.to_string())))
        .collect();
    serde_json::json!({ "widgetStates": states, "nextPage": next_page }).to_string()
}

pub(crate) fn ok(body: impl Into<String>) -> ApiResponse {
    ApiResponse::new(StatusCode::OK, "https://shop.test/", body)
}

pub(crate) fn status(code: u16) -> ApiResponse {
    ApiResponse::new(
        StatusCode::from_u16(code).unwrap(),
        "https://shop.test/",
        "",
    )
}

/// Storefront that replays queued responses and records what was asked.
///
/// Empty queues answer with an envelope carrying no widgets (review pages,
/// listings) or an empty reply list (comments).
#[derive(Default)]
pub(crate) struct ScriptedStorefront {
    listings: Mutex<VecDeque<ApiResponse>>,
    pages: Mutex<VecDeque<ApiResponse>>,
    comments: Mutex<VecDeque<ApiResponse>>,
    pub sessions: Mutex<usize>,
    pub listing_requests: Mutex<Vec<String>>,
    pub page_requests: Mutex<Vec<String>>,
    pub comment_requests: Mutex<Vec<CommentsRequest>>,
}

impl ScriptedStorefront {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push_listing(&self, response: ApiResponse) {
        self.listings.lock().unwrap().push_back(response);
    }

    pub fn push_page(&self, response: ApiResponse) {
        self.pages.lock().unwrap().push_back(response);
    }

    pub fn push_comments(&self, response: ApiResponse) {
        self.comments.lock().unwrap().push_back(response);
    }

    pub fn page_requests(&self) -> Vec<String> {
        self.page_requests.lock().unwrap().clone()
    }

    pub fn comment_requests(&self) -> Vec<CommentsRequest> {
        self.comment_requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl StorefrontApi for ScriptedStorefront {
    async fn open_session(&self) -> Result<(), CrawlError> {
        *self.sessions.lock().unwrap() += 1;
        Ok(())
    }

    async fn session_page(&self, path_and_query: &str) -> Result<ApiResponse, CrawlError> {
        self.listing_requests
            .lock()
            .unwrap()
            .push(path_and_query.to_string());
        Ok(self
            .listings
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ok(envelope_body(&[], None))))
    }

    async fn page(&self, path_and_query: &str) -> Result<ApiResponse, CrawlError> {
        self.page_requests
            .lock()
            .unwrap()
            .push(path_and_query.to_string());
        Ok(self
            .pages
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ok(envelope_body(&[], None))))
    }

    async fn review_comments(&self, request: &CommentsRequest) -> Result<ApiResponse, CrawlError> {
        self.comment_requests.lock().unwrap().push(request.clone());
        Ok(self
            .comments
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| ok(r#"{"comments": []}"#)))
    }
}
