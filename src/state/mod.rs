//! Crawl state store.
//!
//! Provides the run-scoped memory the crawler shares between calls, with
//! pluggable backends:
//! - In-memory (default, ephemeral)
//! - Redis (shared, survives restarts)

mod backend;
mod crawl_state;
mod memory;

#[cfg(feature = "redis-backend")]
mod redis;

pub use backend::{StateBackend, StateError, StateResult};
pub use crawl_state::{CrawlState, PRODUCTS_KEY};
pub use memory::InMemoryStateBackend;

#[cfg(feature = "redis-backend")]
pub use self::redis::{RedisStateBackend, DEFAULT_KEY_PREFIX};

use std::sync::Arc;

/// Build a state backend from a configured URL.
///
/// `None` selects the in-memory backend; `redis://` URLs select Redis.
pub async fn connect_backend(url: Option<&str>) -> StateResult<Arc<dyn StateBackend>> {
    match url {
        None => Ok(Arc::new(InMemoryStateBackend::new())),
        Some(u) if u == "memory" => Ok(Arc::new(InMemoryStateBackend::new())),
        #[cfg(feature = "redis-backend")]
        Some(u) if u.starts_with("redis://") || u.starts_with("rediss://") => Ok(Arc::new(
            RedisStateBackend::new(u, DEFAULT_KEY_PREFIX).await?,
        )),
        Some(u) => Err(StateError::Unavailable(format!(
            "Unsupported state backend: {}",
            u
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_connect_memory_backend() {
        let backend = connect_backend(None).await.unwrap();
        backend.set("k", "v").await.unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));

        assert!(connect_backend(Some("memory")).await.is_ok());
    }

    #[tokio::test]
    async fn test_connect_unknown_backend() {
        assert!(connect_backend(Some("etcd://localhost")).await.is_err());
    }
}
