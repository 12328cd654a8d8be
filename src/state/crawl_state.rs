//! Crawl progress kept in the state store between pagination calls.
//!
//! Two kinds of entries live here: the tag set discovered from the current
//! listing page (a hash of page-local index to tag) and, per tag, the
//! cutoff anchor: the creation time of the first review seen for that tag
//! in this run.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;

use super::backend::{StateBackend, StateError, StateResult};
use crate::models::ProductTag;

/// Key of the hash holding the current listing page's tags.
pub const PRODUCTS_KEY: &str = "ozon_products";

/// Typed access to crawl state over any [`StateBackend`].
#[derive(Clone)]
pub struct CrawlState {
    backend: Arc<dyn StateBackend>,
}

impl CrawlState {
    pub fn new(backend: Arc<dyn StateBackend>) -> Self {
        Self { backend }
    }

    /// Replace the discovered tag set with `tags`, indexed by position.
    pub async fn replace_tags(&self, tags: &[ProductTag]) -> StateResult<()> {
        let entries: Vec<(String, String)> = tags
            .iter()
            .enumerate()
            .map(|(index, tag)| (index.to_string(), tag.to_string()))
            .collect();
        self.backend.replace_hash(PRODUCTS_KEY, &entries).await
    }

    /// The discovered tag set, keyed by listing-page index.
    pub async fn tag_set(&self) -> StateResult<BTreeMap<usize, ProductTag>> {
        let raw = self.backend.hash_get_all(PRODUCTS_KEY).await?;
        raw.into_iter()
            .map(|(field, tag)| {
                field
                    .parse::<usize>()
                    .map(|index| (index, ProductTag::new(tag)))
                    .map_err(|_| StateError::Corrupt {
                        key: PRODUCTS_KEY.to_string(),
                        value: field,
                    })
            })
            .collect()
    }

    /// The discovered tags in listing order.
    pub async fn tags(&self) -> StateResult<Vec<ProductTag>> {
        Ok(self.tag_set().await?.into_values().collect())
    }

    /// Forget the cutoff anchor of a tag.
    pub async fn clear_anchor(&self, tag: &ProductTag) -> StateResult<()> {
        self.backend.delete(tag.as_str()).await
    }

    /// Current cutoff anchor of a tag, if one was recorded.
    pub async fn anchor(&self, tag: &ProductTag) -> StateResult<Option<i64>> {
        match self.backend.get(tag.as_str()).await? {
            Some(raw) => parse_anchor(tag, raw).map(Some),
            None => Ok(None),
        }
    }

    /// Return the tag's anchor, recording `candidate` first if none exists.
    ///
    /// Once recorded, an anchor is never overwritten.
    pub async fn anchor_or_init(&self, tag: &ProductTag, candidate: i64) -> StateResult<i64> {
        if self
            .backend
            .set_if_absent(tag.as_str(), &candidate.to_string())
            .await?
        {
            debug!("Cutoff anchor for {} set to {}", tag, candidate);
            return Ok(candidate);
        }

        match self.anchor(tag).await? {
            Some(anchor) => Ok(anchor),
            None => Err(StateError::Backend(format!(
                "anchor for '{}' vanished after set",
                tag
            ))),
        }
    }
}

fn parse_anchor(tag: &ProductTag, raw: String) -> StateResult<i64> {
    raw.trim().parse().map_err(|_| StateError::Corrupt {
        key: tag.to_string(),
        value: raw,
    })
}
