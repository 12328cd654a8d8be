//! Stored review entity.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::ProductTag;

/// A review as stored in the database.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Review {
    pub id: i32,
    /// Free-text body (empty when the reviewer left none).
    pub text: String,
    pub advantages: Option<String>,
    pub disadvantages: Option<String>,
    /// Day the review was written.
    pub published_at: NaiveDate,
    /// First attached photo, if any.
    pub image: Option<String>,
    /// Text of the first reply, filled in after the review is stored.
    pub first_response_text: Option<String>,
    /// Product the review belongs to.
    pub product_tag: ProductTag,
}

/// Attributes for a review that has not been stored yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewReview {
    pub text: String,
    pub advantages: Option<String>,
    pub disadvantages: Option<String>,
    pub published_at: NaiveDate,
    pub image: Option<String>,
    pub product_tag: ProductTag,
}
