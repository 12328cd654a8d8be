//! Diesel ORM models for database tables.

use diesel::prelude::*;

use crate::schema;

/// Review record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::reviews)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct ReviewRecord {
    pub id: i32,
    pub text: String,
    pub advantages: Option<String>,
    pub disadvantages: Option<String>,
    pub published_at: String,
    pub image: Option<String>,
    pub first_response_text: Option<String>,
    pub text_id: String,
}

/// New review for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::reviews)]
pub struct NewReviewRecord<'a> {
    pub text: &'a str,
    pub advantages: Option<&'a str>,
    pub disadvantages: Option<&'a str>,
    pub published_at: &'a str,
    pub image: Option<&'a str>,
    pub text_id: &'a str,
}
