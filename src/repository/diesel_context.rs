//! Database context: schema setup and repository access.

use diesel_async::SimpleAsyncConnection;
use tracing::debug;

use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::diesel_review::DieselReviewRepository;

/// Owns the connection factory and hands out repositories.
#[derive(Clone, Debug)]
pub struct DieselDbContext {
    pool: AsyncSqlitePool,
}

impl DieselDbContext {
    /// Create a context for a SQLite database URL or path.
    pub fn new(database_url: &str) -> Self {
        Self {
            pool: AsyncSqlitePool::new(database_url),
        }
    }

    /// Get a review repository.
    pub fn reviews(&self) -> DieselReviewRepository {
        DieselReviewRepository::new(self.pool.clone())
    }

    /// Initialize the database schema.
    ///
    /// This creates the necessary tables if they don't exist.
    pub async fn init_schema(&self) -> Result<(), DieselError> {
        debug!("Ensuring schema at {}", self.pool.database_url());
        let mut conn = self.pool.get().await?;
        conn.batch_execute(
            r#"
            CREATE TABLE IF NOT EXISTS reviews (
                id INTEGER PRIMARY KEY AUTOINCREMENT NOT NULL,
                text TEXT NOT NULL,
                advantages TEXT,
                disadvantages TEXT,
                published_at TEXT NOT NULL,
                image TEXT,
                first_response_text TEXT,
                text_id TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_reviews_text_id ON reviews(text_id);
            "#,
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_init_schema_is_idempotent() {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let ctx = DieselDbContext::new(&db_path.display().to_string());

        ctx.init_schema().await.unwrap();
        ctx.init_schema().await.unwrap();

        assert_eq!(ctx.reviews().count().await.unwrap(), 0);
    }
}
