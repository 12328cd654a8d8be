//! Storefront product identifiers.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque storefront product identifier taken from a listing link
/// (`/product/<tag>/...`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProductTag(String);

impl ProductTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Path of the product's review shelf, relative to the storefront root.
    pub fn product_path(&self) -> String {
        format!("/product/{}/", self.0)
    }
}

impl fmt::Display for ProductTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ProductTag {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ProductTag {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ProductTag {
    fn from(s: String) -> Self {
        Self(s)
    }
}
