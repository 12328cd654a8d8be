//! Configuration management for ozon-reviews using the prefer crate.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::repository::util::validate_database_url;

/// Name used for config discovery and the default data directory.
pub const APP_NAME: &str = "ozon-reviews";

/// Default database filename inside the data directory.
pub const DEFAULT_DATABASE_FILENAME: &str = "ozon-reviews.db";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("Failed to parse {format} config: {message}")]
    Parse {
        format: &'static str,
        message: String,
    },
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Where and how to talk to the storefront.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorefrontConfig {
    /// Storefront root, e.g. `https://www.ozon.ru`.
    pub base_url: String,
    /// Category whose listing pages are crawled.
    pub category_path: String,
    /// User agent. `None` uses the crate's own; `"impersonate"` gives each
    /// storefront session its own browser user agent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Request timeout in seconds.
    pub request_timeout: u64,
}

impl Default for StorefrontConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.ozon.ru".to_string(),
            category_path: "/category/zhenskaya-odezhda-7501/".to_string(),
            user_agent: None,
            request_timeout: 30,
        }
    }
}

/// Crawl pacing and limits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CrawlConfig {
    /// Number of listing pages to process per run.
    pub listing_pages: u32,
    /// First listing page (1-based).
    pub first_listing_page: u32,
    /// Pause between review pages, in milliseconds.
    pub page_delay_ms: u64,
    /// Reviews more than this many days behind the product's anchor review
    /// end that product's pagination.
    pub cutoff_days: u32,
    /// `layout_page_index` of a product's first review page.
    pub review_page_index: u32,
    /// Retries after a failed request.
    pub max_retries: u32,
    /// Backoff before the first retry, doubled on each further one.
    pub retry_base_delay_ms: u64,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            listing_pages: 3,
            first_listing_page: 2,
            page_delay_ms: 2000,
            cutoff_days: 30,
            review_page_index: 3,
            max_retries: 3,
            retry_base_delay_ms: 500,
        }
    }
}

/// Configuration file structure.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub storefront: StorefrontConfig,
    pub crawl: CrawlConfig,
    /// SQLite database URL or path.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Crawl state store URL (`redis://...`). In-memory when unset.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub state_backend: Option<String>,
    /// Path to the config file this was loaded from (not serialized).
    #[serde(skip)]
    pub source_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration using prefer crate for discovery.
    ///
    /// Falls back to defaults when no config file is found or it cannot
    /// be parsed. Environment overrides are applied either way.
    pub async fn load() -> Self {
        let config = match prefer::load(APP_NAME).await {
            Ok(found) => match found.source_path() {
                Some(path) => match Self::load_from_path(path).await {
                    Ok(config) => config,
                    Err(e) => {
                        tracing::warn!("Ignoring config at {}: {}", path.display(), e);
                        Self::default()
                    }
                },
                None => Self::default(),
            },
            Err(_) => Self::default(),
        };
        config.with_env_overrides()
    }

    /// Load configuration from a specific file path.
    /// Supports JSON, TOML and YAML based on file extension.
    pub async fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents =
            tokio::fs::read_to_string(path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })?;

        let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
        let mut config = Self::parse(ext, &contents)?;
        config.source_path = Some(path.to_path_buf());
        Ok(config)
    }

    fn parse(ext: &str, contents: &str) -> Result<Self, ConfigError> {
        match ext {
            "toml" => toml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "TOML",
                message: e.to_string(),
            }),
            "yaml" | "yml" => serde_yaml::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "YAML",
                message: e.to_string(),
            }),
            _ => serde_json::from_str(contents).map_err(|e| ConfigError::Parse {
                format: "JSON",
                message: e.to_string(),
            }),
        }
    }

    /// Apply `DATABASE_URL` and `REDIS_URL` from the environment.
    pub fn with_env_overrides(self) -> Self {
        self.with_overrides(
            std::env::var("DATABASE_URL").ok(),
            std::env::var("REDIS_URL").ok(),
        )
    }

    fn with_overrides(mut self, database: Option<String>, redis: Option<String>) -> Self {
        if let Some(url) = database.filter(|s| !s.is_empty()) {
            self.database = Some(url);
        }
        if let Some(url) = redis.filter(|s| !s.is_empty()) {
            self.state_backend = Some(url);
        }
        self
    }

    /// Reject settings a run cannot work with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.crawl.listing_pages == 0 {
            return Err(ConfigError::Invalid(
                "crawl.listing_pages must be at least 1".to_string(),
            ));
        }
        if self.crawl.first_listing_page == 0 {
            return Err(ConfigError::Invalid(
                "crawl.first_listing_page is 1-based".to_string(),
            ));
        }
        if self
            .crawl
            .first_listing_page
            .checked_add(self.crawl.listing_pages - 1)
            .is_none()
        {
            return Err(ConfigError::Invalid(
                "crawl.first_listing_page + crawl.listing_pages is out of range".to_string(),
            ));
        }
        if self.storefront.base_url.is_empty() {
            return Err(ConfigError::Invalid(
                "storefront.base_url is empty".to_string(),
            ));
        }
        validate_database_url(&self.database_url()).map_err(ConfigError::Invalid)
    }

    /// Database URL, defaulting to a file in the user's data directory.
    pub fn database_url(&self) -> String {
        match &self.database {
            Some(url) => url.clone(),
            None => default_database_path().display().to_string(),
        }
    }
}

/// `<data dir>/ozon-reviews/ozon-reviews.db`
pub fn default_database_path() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(DEFAULT_DATABASE_FILENAME)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.crawl.listing_pages, 3);
        assert_eq!(config.crawl.first_listing_page, 2);
        assert_eq!(config.crawl.page_delay_ms, 2000);
        assert_eq!(config.crawl.cutoff_days, 30);
        assert_eq!(config.storefront.base_url, "https://www.ozon.ru");
        assert!(config.state_backend.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = Config::parse(
            "toml",
            r#"
            database = "sqlite:///tmp/reviews.db"

            [crawl]
            listing_pages = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.crawl.listing_pages, 5);
        assert_eq!(config.crawl.first_listing_page, 2);
        assert_eq!(config.database_url(), "sqlite:///tmp/reviews.db");
        assert_eq!(config.storefront, StorefrontConfig::default());
    }

    #[test]
    fn test_yaml_and_json() {
        let yaml = Config::parse("yml", "storefront:\n  request_timeout: 5\n").unwrap();
        assert_eq!(yaml.storefront.request_timeout, 5);

        let json = Config::parse("json", r#"{"state_backend": "redis://localhost"}"#).unwrap();
        assert_eq!(json.state_backend.as_deref(), Some("redis://localhost"));

        assert!(matches!(
            Config::parse("toml", "crawl = 3"),
            Err(ConfigError::Parse { format: "TOML", .. })
        ));
    }

    #[tokio::test]
    async fn test_load_from_path_records_source() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("ozon-reviews.toml");
        std::fs::write(&path, "[crawl]\npage_delay_ms = 0\n").unwrap();

        let config = Config::load_from_path(&path).await.unwrap();
        assert_eq!(config.crawl.page_delay_ms, 0);
        assert_eq!(config.source_path.as_deref(), Some(path.as_path()));

        let missing = dir.path().join("missing.toml");
        assert!(matches!(
            Config::load_from_path(&missing).await,
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn test_overrides() {
        let config = Config::default().with_overrides(
            Some("/tmp/override.db".to_string()),
            Some(String::new()),
        );
        assert_eq!(config.database.as_deref(), Some("/tmp/override.db"));
        assert!(config.state_backend.is_none());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.crawl.listing_pages = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.crawl.first_listing_page = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.crawl.first_listing_page = u32::MAX;
        config.crawl.listing_pages = 2;
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
        config.crawl.listing_pages = 1;
        assert!(config.validate().is_ok());

        let config = Config {
            database: Some("postgres://localhost/reviews".to_string()),
            ..Config::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn test_default_database_path() {
        let path = default_database_path();
        assert!(path.ends_with("ozon-reviews/ozon-reviews.db"));
    }
}
