//! Repository layer for database persistence.
//!
//! All database access uses Diesel ORM with compile-time query checking
//! against a SQLite database.

pub mod diesel_context;
pub mod diesel_models;
pub mod diesel_pool;
pub mod diesel_review;
pub mod util;

pub use diesel_context::DieselDbContext;
pub use diesel_models::{NewReviewRecord, ReviewRecord};
pub use diesel_pool::{AsyncSqliteConnection, AsyncSqlitePool, DieselError};
pub use diesel_review::DieselReviewRepository;
