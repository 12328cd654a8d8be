//! Pluggable backend trait for crawl state storage.
//!
//! Allows swapping between an in-memory map (single process, tests) and
//! Redis (shared between processes, survives restarts).

use std::collections::HashMap;

use async_trait::async_trait;

/// Result type for state store operations.
pub type StateResult<T> = Result<T, StateError>;

/// Errors from state backend operations.
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("State backend error: {0}")]
    Backend(String),
    #[error("State backend unavailable: {0}")]
    Unavailable(String),
    #[error("Corrupt value under '{key}': {value:?}")]
    Corrupt { key: String, value: String },
}

/// Key-value operations the crawler needs from its state store.
///
/// Keys hold either a plain string or a hash of string fields, mirroring
/// the Redis data model. Implementations must be thread-safe.
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Remove a key of any type. Missing keys are not an error.
    async fn delete(&self, key: &str) -> StateResult<()>;

    /// Set one field of the hash stored under `key`.
    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StateResult<()>;

    /// Read every field of the hash under `key` (empty if the key is missing).
    async fn hash_get_all(&self, key: &str) -> StateResult<HashMap<String, String>>;

    /// Read a string value.
    async fn get(&self, key: &str) -> StateResult<Option<String>>;

    /// Write a string value, replacing whatever was there.
    async fn set(&self, key: &str, value: &str) -> StateResult<()>;

    /// Write a string value only if the key is missing.
    /// Returns true if the value was written.
    async fn set_if_absent(&self, key: &str, value: &str) -> StateResult<bool> {
        if self.get(key).await?.is_some() {
            return Ok(false);
        }
        self.set(key, value).await?;
        Ok(true)
    }

    /// Replace the hash under `key` with exactly `entries`.
    async fn replace_hash(&self, key: &str, entries: &[(String, String)]) -> StateResult<()> {
        self.delete(key).await?;
        for (field, value) in entries {
            self.hash_set(key, field, value).await?;
        }
        Ok(())
    }
}
