//! HTTP response wrapper.

use reqwest::StatusCode;
use serde::de::DeserializeOwned;

use crate::scrapers::CrawlError;

/// A fully read storefront response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub url: String,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, url: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            status,
            url: url.into(),
            body: body.into(),
        }
    }

    /// Check if the response is successful.
    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Check if the storefront refused the request.
    pub fn is_forbidden(&self) -> bool {
        self.status == StatusCode::FORBIDDEN
    }

    /// Fail with [`CrawlError::Forbidden`] on 403, pass anything else through.
    pub fn reject_forbidden(self) -> Result<Self, CrawlError> {
        if self.is_forbidden() {
            return Err(CrawlError::Forbidden { url: self.url });
        }
        Ok(self)
    }

    /// Fail unless the status is 2xx (403 maps to Forbidden).
    pub fn require_success(self) -> Result<Self, CrawlError> {
        let response = self.reject_forbidden()?;
        if !response.is_success() {
            return Err(CrawlError::UnexpectedStatus {
                status: response.status.as_u16(),
                url: response.url,
            });
        }
        Ok(response)
    }

    /// Decode the body as JSON.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, CrawlError> {
        Ok(serde_json::from_str(&self.body)?)
    }
}
