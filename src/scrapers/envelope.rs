//! Storefront response envelope.
//!
//! Page-json responses carry their content as a `widgetStates` map from
//! generated widget ids (e.g. `webListReviews-1234567-default-1`) to
//! JSON documents encoded as strings. Finding a widget is a substring scan
//! over the ids; decoding happens only once a key has been chosen.

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::error::CrawlError;

/// Top-level page-json response.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Envelope {
    #[serde(default)]
    widget_states: Option<Map<String, Value>>,
    #[serde(default)]
    next_page: Option<String>,
}

impl Envelope {
    /// Decode an envelope from a response body.
    pub fn parse(body: &str) -> Result<Self, CrawlError> {
        serde_json::from_str(body)
            .map_err(|e| CrawlError::Parse(format!("response is not a page envelope: {}", e)))
    }

    fn widget_states(&self) -> Result<&Map<String, Value>, CrawlError> {
        self.widget_states
            .as_ref()
            .ok_or_else(|| CrawlError::Parse("response has no widgetStates".to_string()))
    }

    /// First widget id (in response order) containing `needle`.
    ///
    /// `Ok(None)` means the widget is simply not on this page. A response
    /// without any `widgetStates` is not a page envelope at all and fails.
    pub fn find_widget_key(&self, needle: &str) -> Result<Option<&str>, CrawlError> {
        let key = self
            .widget_states()?
            .keys()
            .find(|key| key.contains(needle))
            .map(String::as_str);
        if let Some(key) = key {
            debug!("Matched widget {} for {}", key, needle);
        }
        Ok(key)
    }

    /// Decode the widget stored under an exact key.
    pub fn decode_widget<T: DeserializeOwned>(&self, key: &str) -> Result<T, CrawlError> {
        let raw = self
            .widget_states()?
            .get(key)
            .ok_or_else(|| CrawlError::Parse(format!("widget {} is missing", key)))?;
        let encoded = raw
            .as_str()
            .ok_or_else(|| CrawlError::Parse(format!("widget {} is not a JSON string", key)))?;
        serde_json::from_str(encoded)
            .map_err(|e| CrawlError::Parse(format!("widget {} is malformed: {}", key, e)))
    }

    /// Find and decode the first widget whose id contains `needle`.
    pub fn widget<T: DeserializeOwned>(&self, needle: &str) -> Result<Option<T>, CrawlError> {
        match self.find_widget_key(needle)? {
            Some(key) => self.decode_widget(key).map(Some),
            None => Ok(None),
        }
    }

    /// Continuation link for the next page, if the feed has one.
    pub fn next_page(&self) -> Option<&str> {
        self.next_page.as_deref().filter(|link| !link.is_empty())
    }
}
