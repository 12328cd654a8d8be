//! Domain models.

mod product;
mod review;

pub use product::ProductTag;
pub use review::{NewReview, Review};
