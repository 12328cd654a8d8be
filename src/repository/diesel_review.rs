//! Diesel-based review repository for SQLite.
//!
//! Uses diesel-async's SyncConnectionWrapper to provide an async interface
//! while maintaining Diesel's compile-time query checking.

use chrono::NaiveDate;
use diesel::dsl::count_star;
use diesel::prelude::*;
use diesel_async::RunQueryDsl;

use super::diesel_models::{NewReviewRecord, ReviewRecord};
use super::diesel_pool::{AsyncSqlitePool, DieselError};
use super::util::to_diesel_error;
use crate::models::{NewReview, ProductTag, Review};
use crate::schema::reviews;

/// Storage format of `published_at`.
const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt, column_name = "last_insert_rowid()")]
    id: i64,
}

/// Convert a database record to a domain model.
impl From<ReviewRecord> for Review {
    fn from(record: ReviewRecord) -> Self {
        Review {
            id: record.id,
            text: record.text,
            advantages: record.advantages,
            disadvantages: record.disadvantages,
            published_at: NaiveDate::parse_from_str(&record.published_at, DATE_FORMAT)
                .unwrap_or_default(),
            image: record.image,
            first_response_text: record.first_response_text,
            product_tag: ProductTag::new(record.text_id),
        }
    }
}

/// Diesel-based review repository with compile-time query checking.
#[derive(Clone, Debug)]
pub struct DieselReviewRepository {
    pool: AsyncSqlitePool,
}

impl DieselReviewRepository {
    /// Create a new review repository with an existing pool.
    pub fn new(pool: AsyncSqlitePool) -> Self {
        Self { pool }
    }

    /// Store a new review and return it with its assigned id.
    pub async fn create(&self, review: &NewReview) -> Result<Review, DieselError> {
        let mut conn = self.pool.get().await?;
        let published_at = review.published_at.format(DATE_FORMAT).to_string();

        diesel::insert_into(reviews::table)
            .values(NewReviewRecord {
                text: &review.text,
                advantages: review.advantages.as_deref(),
                disadvantages: review.disadvantages.as_deref(),
                published_at: &published_at,
                image: review.image.as_deref(),
                text_id: review.product_tag.as_str(),
            })
            .execute(&mut conn)
            .await?;

        let id = diesel::sql_query("SELECT last_insert_rowid()")
            .get_result::<LastInsertRowId>(&mut conn)
            .await?
            .id;

        Ok(Review {
            id: i32::try_from(id).map_err(to_diesel_error)?,
            text: review.text.clone(),
            advantages: review.advantages.clone(),
            disadvantages: review.disadvantages.clone(),
            published_at: review.published_at,
            image: review.image.clone(),
            first_response_text: None,
            product_tag: review.product_tag.clone(),
        })
    }

    /// Attach the first reply text to a stored review.
    pub async fn set_first_response(
        &self,
        id: i32,
        text: Option<&str>,
    ) -> Result<bool, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows = diesel::update(reviews::table.find(id))
            .set(reviews::first_response_text.eq(text))
            .execute(&mut conn)
            .await?;

        Ok(rows > 0)
    }

    /// Get a review by id.
    pub async fn get(&self, id: i32) -> Result<Option<Review>, DieselError> {
        let mut conn = self.pool.get().await?;

        reviews::table
            .find(id)
            .select(ReviewRecord::as_select())
            .first(&mut conn)
            .await
            .optional()
            .map(|opt| opt.map(Review::from))
    }

    /// All reviews of one product, in insertion order.
    pub async fn list_by_tag(&self, tag: &ProductTag) -> Result<Vec<Review>, DieselError> {
        let mut conn = self.pool.get().await?;

        reviews::table
            .filter(reviews::text_id.eq(tag.as_str()))
            .order(reviews::id.asc())
            .select(ReviewRecord::as_select())
            .load(&mut conn)
            .await
            .map(|records| records.into_iter().map(Review::from).collect())
    }

    /// Total number of stored reviews.
    pub async fn count(&self) -> Result<i64, DieselError> {
        let mut conn = self.pool.get().await?;

        reviews::table
            .select(count_star())
            .first(&mut conn)
            .await
    }

    /// Review counts grouped by product tag, ordered by tag.
    pub async fn count_by_tag(&self) -> Result<Vec<(ProductTag, i64)>, DieselError> {
        let mut conn = self.pool.get().await?;

        let rows: Vec<(String, i64)> = reviews::table
            .group_by(reviews::text_id)
            .select((reviews::text_id, count_star()))
            .order(reviews::text_id.asc())
            .load(&mut conn)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(tag, count)| (ProductTag::new(tag), count))
            .collect())
    }

    /// Remove every stored review and reset the id sequence.
    pub async fn truncate(&self) -> Result<usize, DieselError> {
        let mut conn = self.pool.get().await?;

        let removed = diesel::delete(reviews::table).execute(&mut conn).await?;
        diesel::sql_query("DELETE FROM sqlite_sequence WHERE name = 'reviews'")
            .execute(&mut conn)
            .await?;

        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::DieselDbContext;
    use tempfile::tempdir;

    async fn setup_test_db() -> (DieselReviewRepository, tempfile::TempDir) {
        let dir = tempdir().unwrap();
        let db_path = dir.path().join("test.db");
        let ctx = DieselDbContext::new(&db_path.display().to_string());
        ctx.init_schema().await.unwrap();
        (ctx.reviews(), dir)
    }

    fn new_review(tag: &str, text: &str) -> NewReview {
        NewReview {
            text: text.to_string(),
            advantages: Some("soft fabric".to_string()),
            disadvantages: None,
            published_at: NaiveDate::from_ymd_opt(2024, 9, 20).unwrap(),
            image: Some("https://cdn.example.com/1.jpg".to_string()),
            product_tag: ProductTag::new(tag),
        }
    }

    #[tokio::test]
    async fn test_review_crud() {
        let (repo, _dir) = setup_test_db().await;

        let created = repo.create(&new_review("dress-1", "fits well")).await.unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.first_response_text, None);

        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched, created);
        assert_eq!(
            fetched.published_at,
            NaiveDate::from_ymd_opt(2024, 9, 20).unwrap()
        );

        assert!(repo
            .set_first_response(created.id, Some("thank you!"))
            .await
            .unwrap());
        let fetched = repo.get(created.id).await.unwrap().unwrap();
        assert_eq!(fetched.first_response_text.as_deref(), Some("thank you!"));

        assert!(!repo.set_first_response(999, Some("nobody")).await.unwrap());
        assert!(repo.get(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_count_by_tag_and_list() {
        let (repo, _dir) = setup_test_db().await;

        repo.create(&new_review("b-tag", "one")).await.unwrap();
        repo.create(&new_review("a-tag", "two")).await.unwrap();
        repo.create(&new_review("b-tag", "three")).await.unwrap();

        assert_eq!(repo.count().await.unwrap(), 3);
        assert_eq!(
            repo.count_by_tag().await.unwrap(),
            vec![(ProductTag::new("a-tag"), 1), (ProductTag::new("b-tag"), 2)]
        );

        let listed = repo.list_by_tag(&ProductTag::new("b-tag")).await.unwrap();
        let texts: Vec<&str> = listed.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["one", "three"]);
    }

    #[tokio::test]
    async fn test_truncate_resets_ids() {
        let (repo, _dir) = setup_test_db().await;

        repo.create(&new_review("t", "one")).await.unwrap();
        repo.create(&new_review("t", "two")).await.unwrap();

        assert_eq!(repo.truncate().await.unwrap(), 2);
        assert_eq!(repo.count().await.unwrap(), 0);

        let created = repo.create(&new_review("t", "again")).await.unwrap();
        assert_eq!(created.id, 1);
    }

    #[tokio::test]
    async fn test_create_rejects_id_beyond_i32() {
        let (repo, _dir) = setup_test_db().await;

        let mut conn = repo.pool.get().await.unwrap();
        diesel::sql_query(
            "INSERT INTO reviews (id, text, published_at, text_id) \
             VALUES (2147483647, 'last', '2024-01-01', 't')",
        )
        .execute(&mut conn)
        .await
        .unwrap();

        assert!(repo.create(&new_review("t", "overflow")).await.is_err());
    }
}
