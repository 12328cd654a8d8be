//! In-memory state backend for single-process operation.
//!
//! State is not persisted across restarts.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::backend::{StateBackend, StateError, StateResult};

#[derive(Debug, Clone)]
enum Entry {
    Value(String),
    Hash(HashMap<String, String>),
}

fn wrong_type(key: &str) -> StateError {
    StateError::Backend(format!(
        "WRONGTYPE operation against key '{}' holding the wrong kind of value",
        key
    ))
}

/// In-memory state backend.
#[derive(Clone, Default)]
pub struct InMemoryStateBackend {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryStateBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of keys currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl StateBackend for InMemoryStateBackend {
    async fn delete(&self, key: &str) -> StateResult<()> {
        self.entries.write().await.remove(key);
        Ok(())
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StateResult<()> {
        let mut entries = self.entries.write().await;
        let entry = entries
            .entry(key.to_string())
            .or_insert_with(|| Entry::Hash(HashMap::new()));
        match entry {
            Entry::Hash(fields) => {
                fields.insert(field.to_string(), value.to_string());
                Ok(())
            }
            Entry::Value(_) => Err(wrong_type(key)),
        }
    }

    async fn hash_get_all(&self, key: &str) -> StateResult<HashMap<String, String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(Entry::Hash(fields)) => Ok(fields.clone()),
            Some(Entry::Value(_)) => Err(wrong_type(key)),
            None => Ok(HashMap::new()),
        }
    }

    async fn get(&self, key: &str) -> StateResult<Option<String>> {
        let entries = self.entries.read().await;
        match entries.get(key) {
            Some(Entry::Value(v)) => Ok(Some(v.clone())),
            Some(Entry::Hash(_)) => Err(wrong_type(key)),
            None => Ok(None),
        }
    }

    async fn set(&self, key: &str, value: &str) -> StateResult<()> {
        self.entries
            .write()
            .await
            .insert(key.to_string(), Entry::Value(value.to_string()));
        Ok(())
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> StateResult<bool> {
        let mut entries = self.entries.write().await;
        if entries.contains_key(key) {
            return Ok(false);
        }
        entries.insert(key.to_string(), Entry::Value(value.to_string()));
        Ok(true)
    }

    async fn replace_hash(&self, key: &str, entries: &[(String, String)]) -> StateResult<()> {
        let mut map = self.entries.write().await;
        if entries.is_empty() {
            map.remove(key);
        } else {
            map.insert(key.to_string(), Entry::Hash(entries.iter().cloned().collect()));
        }
        Ok(())
    }
}
