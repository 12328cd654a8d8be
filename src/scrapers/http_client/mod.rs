//! HTTP client for the storefront's JSON endpoints.
//!
//! Two underlying clients are kept: a plain one for review pages and reply
//! RPCs, and a session client whose cookie jar is replaced every time a new
//! session is opened. Each session also settles on its user agent when it
//! is opened. Transient failures are retried with exponential
//! backoff; 403 responses are returned untouched so callers can stop.

mod response;
mod user_agent;

pub use response::ApiResponse;
pub use user_agent::{UserAgentPolicy, BROWSER_USER_AGENTS, IMPERSONATE, USER_AGENT};

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::cookie::Jar;
use reqwest::{Client, RequestBuilder, StatusCode};
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::api::{entrypoint_url, CommentsRequest, StorefrontApi, COMMENTS_PATH};
use super::error::CrawlError;
use crate::config::{CrawlConfig, StorefrontConfig};

/// Calculate exponential backoff delay for a given attempt.
pub fn backoff_delay(attempt: u32, base: Duration) -> Duration {
    let factor = 2u32.saturating_pow(attempt);
    base.saturating_mul(factor).min(Duration::from_secs(60))
}

/// How often and how patiently failed requests are retried.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Retries after the first attempt.
    pub max_retries: u32,
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(500),
        }
    }
}

impl RetryPolicy {
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            max_retries: config.max_retries,
            base_delay: Duration::from_millis(config.retry_base_delay_ms),
        }
    }
}

/// Statuses worth another attempt.
fn is_retryable_status(status: StatusCode) -> bool {
    status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
}

/// Transport errors worth another attempt.
fn is_retryable_error(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_request()
}

/// HTTP client for the storefront.
pub struct HttpClient {
    client: Client,
    session: RwLock<Client>,
    base_url: String,
    user_agents: UserAgentPolicy,
    sessions_opened: AtomicUsize,
    timeout: Duration,
    retry: RetryPolicy,
}

impl HttpClient {
    /// Create a new HTTP client.
    pub fn new(config: &StorefrontConfig, retry: RetryPolicy) -> Result<Self, CrawlError> {
        let user_agents = UserAgentPolicy::from_config(config.user_agent.as_deref());
        let timeout = Duration::from_secs(config.request_timeout);

        let first_agent = user_agents.for_session(0);
        let client = Self::build_client(first_agent, timeout, None)?;
        let session = Self::build_client(first_agent, timeout, Some(Arc::new(Jar::default())))?;

        Ok(Self {
            client,
            session: RwLock::new(session),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            user_agents,
            sessions_opened: AtomicUsize::new(0),
            timeout,
            retry,
        })
    }

    fn build_client(
        user_agent: &str,
        timeout: Duration,
        jar: Option<Arc<Jar>>,
    ) -> Result<Client, CrawlError> {
        let mut builder = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .gzip(true)
            .brotli(true);
        if let Some(jar) = jar {
            builder = builder.cookie_provider(jar);
        }
        Ok(builder.build()?)
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send a request, retrying transient failures.
    ///
    /// `build` is called once per attempt since request builders are
    /// consumed by `send`.
    async fn send<F>(&self, url: &str, build: F) -> Result<ApiResponse, CrawlError>
    where
        F: Fn() -> RequestBuilder + Send + Sync,
    {
        let mut attempt = 0u32;
        loop {
            debug!("Requesting {} (attempt {})", url, attempt + 1);
            let retries_left = attempt < self.retry.max_retries;

            match build().send().await {
                Ok(response) => {
                    let status = response.status();
                    if is_retryable_status(status) && retries_left {
                        let delay = backoff_delay(attempt, self.retry.base_delay);
                        warn!("HTTP {} from {}, retrying in {:?}", status, url, delay);
                        tokio::time::sleep(delay).await;
                        attempt += 1;
                        continue;
                    }
                    let body = response.text().await?;
                    return Ok(ApiResponse::new(status, url, body));
                }
                Err(e) if is_retryable_error(&e) && retries_left => {
                    let delay = backoff_delay(attempt, self.retry.base_delay);
                    warn!("Request to {} failed: {}, retrying in {:?}", url, e, delay);
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

#[async_trait]
impl StorefrontApi for HttpClient {
    async fn open_session(&self) -> Result<(), CrawlError> {
        let session = self.sessions_opened.fetch_add(1, Ordering::Relaxed);
        let user_agent = self.user_agents.for_session(session);
        let jar = Arc::new(Jar::default());
        let client = Self::build_client(user_agent, self.timeout, Some(jar))?;

        let root = format!("{}/", self.base_url);
        self.send(&root, || client.get(&root))
            .await?
            .reject_forbidden()?;

        *self.session.write().await = client;
        debug!("Opened storefront session {} as {}", session + 1, user_agent);
        Ok(())
    }

    async fn session_page(&self, path_and_query: &str) -> Result<ApiResponse, CrawlError> {
        let client = self.session.read().await.clone();
        let url = entrypoint_url(&self.base_url, path_and_query);
        self.send(&url, || client.get(&url)).await
    }

    async fn page(&self, path_and_query: &str) -> Result<ApiResponse, CrawlError> {
        let url = entrypoint_url(&self.base_url, path_and_query);
        self.send(&url, || self.client.get(&url)).await
    }

    async fn review_comments(&self, request: &CommentsRequest) -> Result<ApiResponse, CrawlError> {
        let url = format!("{}{}", self.base_url, COMMENTS_PATH);
        self.send(&url, || self.client.post(&url).json(request))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_delay_doubles_and_caps() {
        let base = Duration::from_millis(500);
        assert_eq!(backoff_delay(0, base), Duration::from_millis(500));
        assert_eq!(backoff_delay(1, base), Duration::from_millis(1000));
        assert_eq!(backoff_delay(3, base), Duration::from_millis(4000));
        assert_eq!(backoff_delay(20, base), Duration::from_secs(60));
        assert_eq!(backoff_delay(40, base), Duration::from_secs(60));
    }

    #[test]
    fn test_retryable_statuses() {
        assert!(is_retryable_status(StatusCode::TOO_MANY_REQUESTS));
        assert!(is_retryable_status(StatusCode::BAD_GATEWAY));
        assert!(!is_retryable_status(StatusCode::FORBIDDEN));
        assert!(!is_retryable_status(StatusCode::NOT_FOUND));
        assert!(!is_retryable_status(StatusCode::OK));
    }

    #[test]
    fn test_client_trims_base_url() {
        let config = StorefrontConfig {
            base_url: "https://shop.example/".to_string(),
            ..StorefrontConfig::default()
        };
        let client = HttpClient::new(&config, RetryPolicy::default()).unwrap();
        assert_eq!(client.base_url(), "https://shop.example");
    }

    #[test]
    fn test_client_reads_user_agent_policy() {
        let config = StorefrontConfig {
            user_agent: Some(IMPERSONATE.to_string()),
            ..StorefrontConfig::default()
        };
        let client = HttpClient::new(&config, RetryPolicy::default()).unwrap();
        assert_eq!(client.user_agents, UserAgentPolicy::Browser);
        assert_eq!(client.sessions_opened.load(Ordering::Relaxed), 0);
    }
}
