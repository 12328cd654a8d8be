//! Redis-backed crawl state for runs shared between processes.

use std::collections::HashMap;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::AsyncCommands;

use super::backend::{StateBackend, StateError, StateResult};

/// Default key prefix for crawl state in Redis.
pub const DEFAULT_KEY_PREFIX: &str = "ozon-reviews:";

/// Redis-backed state storage.
#[derive(Clone)]
pub struct RedisStateBackend {
    conn: ConnectionManager,
    prefix: String,
}

impl RedisStateBackend {
    /// Connect to Redis.
    ///
    /// # Arguments
    /// * `redis_url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `prefix` - Prepended to every logical key
    pub async fn new(redis_url: &str, prefix: &str) -> StateResult<Self> {
        let client = redis::Client::open(redis_url)
            .map_err(|e| StateError::Unavailable(format!("Redis connection error: {}", e)))?;

        let conn = ConnectionManager::new(client).await.map_err(|e| {
            StateError::Unavailable(format!("Redis connection manager error: {}", e))
        })?;

        Ok(Self {
            conn,
            prefix: prefix.to_string(),
        })
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

fn backend_error(e: redis::RedisError) -> StateError {
    StateError::Backend(e.to_string())
}

#[async_trait]
impl StateBackend for RedisStateBackend {
    async fn delete(&self, key: &str) -> StateResult<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.key(key))
            .await
            .map_err(backend_error)
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> StateResult<()> {
        let mut conn = self.conn.clone();
        conn.hset::<_, _, _, ()>(self.key(key), field, value)
            .await
            .map_err(backend_error)
    }

    async fn hash_get_all(&self, key: &str) -> StateResult<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        conn.hgetall(self.key(key)).await.map_err(backend_error)
    }

    async fn get(&self, key: &str) -> StateResult<Option<String>> {
        let mut conn = self.conn.clone();
        conn.get(self.key(key)).await.map_err(backend_error)
    }

    async fn set(&self, key: &str, value: &str) -> StateResult<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(self.key(key), value)
            .await
            .map_err(backend_error)
    }

    async fn set_if_absent(&self, key: &str, value: &str) -> StateResult<bool> {
        let mut conn = self.conn.clone();
        conn.set_nx(self.key(key), value)
            .await
            .map_err(backend_error)
    }

    /// Delete and refill inside one MULTI so readers never see a mixed set.
    async fn replace_hash(&self, key: &str, entries: &[(String, String)]) -> StateResult<()> {
        let mut conn = self.conn.clone();
        let key = self.key(key);

        let mut pipe = redis::pipe();
        pipe.atomic().del(&key).ignore();
        if !entries.is_empty() {
            pipe.hset_multiple(&key, entries).ignore();
        }
        pipe.query_async::<()>(&mut conn)
            .await
            .map_err(backend_error)
    }
}
