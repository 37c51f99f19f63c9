//! HTTP client for the e-uprava slot listings.
//!
//! The listing endpoint only answers AJAX-shaped requests made within a
//! session, so the client keeps a cookie store, performs one warmup request
//! against the main page, and retries transient failures with exponential
//! backoff.

use std::time::Duration;

use rand::Rng;
use tokio::time::sleep;

use crate::error::{Result, ScrapeError};

/// Base URL of the live site
const DEFAULT_BASE_URL: &str = "https://e-uprava.gov.si";

/// Path of the main listing page, fetched once to establish session cookies
pub const MAIN_PATH: &str = "/javne-evidence/prosti-termini.html?lang=si";

/// Path of the paginated AJAX fragment endpoint
pub const AJAX_PATH: &str = "/si/javne-evidence/prosti-termini/content/singleton.html";

/// Default User-Agent mimicking a modern browser
const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/139.0.0.0 Safari/537.36";

/// Default Accept-Language header for Slovenian content
const DEFAULT_ACCEPT_LANGUAGE: &str = "sl-SI,sl;q=0.9,en-US;q=0.8,en;q=0.7";

/// Total attempts per request, including the first one
const MAX_ATTEMPTS: u32 = 3;

/// Base delay for exponential backoff (in milliseconds)
const BASE_RETRY_DELAY_MS: u64 = 1000;

/// Ceiling for the backoff delay (in milliseconds)
const MAX_RETRY_DELAY_MS: u64 = 8000;

/// Upper bound of the random jitter added to each backoff delay
const MAX_JITTER_MS: u64 = 250;

/// Configuration for the slot listing HTTP client
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin to fetch from; tests point this at a mock server
    pub base_url: String,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Whether to add random jitter to retry backoff (default: true)
    pub retry_jitter: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 30,
            retry_jitter: true,
        }
    }
}

/// HTTP client with a shared cookie session and retry logic.
///
/// One client instance belongs to one crawl; the cookie store it mutates is
/// what ties the paginated requests into a single virtual session, so a
/// client must not be shared between concurrent crawls.
pub struct UpravaClient {
    client: reqwest::Client,
    base_url: String,
    retry_jitter: bool,
}

impl UpravaClient {
    /// Create a new client pointed at the live site.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_config(ClientConfig::default())
    }

    /// Create a new client with custom configuration.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn with_config(config: ClientConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .cookie_store(true)
            .user_agent(DEFAULT_USER_AGENT)
            .default_headers({
                let mut headers = reqwest::header::HeaderMap::new();
                headers.insert(
                    reqwest::header::ACCEPT_LANGUAGE,
                    reqwest::header::HeaderValue::from_static(DEFAULT_ACCEPT_LANGUAGE),
                );
                headers
            })
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url,
            retry_jitter: config.retry_jitter,
        })
    }

    /// Full URL of the main listing page
    pub fn main_url(&self) -> String {
        format!("{}{}", self.base_url, MAIN_PATH)
    }

    /// Fetch the main listing page once so the server hands out its session
    /// cookies; they persist in the cookie store for all later requests.
    ///
    /// The response status is not checked: any answer may set cookies, and
    /// the AJAX endpoint decides for itself whether the session is good
    /// enough.
    ///
    /// # Errors
    /// Returns an error only when the request fails at the transport level.
    pub async fn warm_up(&self) -> Result<()> {
        let response = self.client.get(self.main_url()).send().await?;
        tracing::debug!(status = %response.status(), "warmup request completed");
        Ok(())
    }

    /// Fetch one page of slot fragments from the AJAX endpoint.
    ///
    /// # Arguments
    /// * `query` - Encoded query string, without the leading `?`
    ///
    /// # Errors
    /// Returns [`ScrapeError::Retrieval`] once all attempts are exhausted;
    /// a non-success HTTP status counts as a failed attempt.
    pub async fn fetch_page(&self, query: &str) -> Result<String> {
        let url = format!("{}{}?{}", self.base_url, AJAX_PATH, query);
        let mut last_error = String::new();

        for attempt in 0..MAX_ATTEMPTS {
            if attempt > 0 {
                sleep(self.backoff_delay(attempt - 1)).await;
            }

            match self.try_fetch(&url).await {
                Ok(body) => return Ok(body),
                Err(reason) => {
                    tracing::warn!(
                        url = %url,
                        attempt = attempt + 1,
                        error = %reason,
                        "page fetch attempt failed"
                    );
                    last_error = reason;
                }
            }
        }

        Err(ScrapeError::Retrieval {
            url,
            attempts: MAX_ATTEMPTS,
            last_error,
        })
    }

    /// One request against the AJAX endpoint, with the headers the site
    /// expects from its own in-page script.
    async fn try_fetch(&self, url: &str) -> std::result::Result<String, String> {
        let response = self
            .client
            .get(url)
            .header("X-Requested-With", "XMLHttpRequest")
            .header(reqwest::header::REFERER, self.main_url())
            .header(reqwest::header::ACCEPT, "text/html, */*;q=0.01")
            .send()
            .await
            .map_err(|e| e.to_string())?;

        let status = response.status();
        if !status.is_success() {
            return Err(format!("HTTP {status}"));
        }

        response.text().await.map_err(|e| e.to_string())
    }

    /// Backoff before the next attempt: 1s, 2s, 4s, capped at 8s, plus up
    /// to 250ms of jitter when enabled.
    fn backoff_delay(&self, completed_attempts: u32) -> Duration {
        let exponential = BASE_RETRY_DELAY_MS.saturating_mul(1u64 << completed_attempts.min(6));
        let mut delay_ms = exponential.min(MAX_RETRY_DELAY_MS);
        if self.retry_jitter {
            delay_ms += rand::thread_rng().gen_range(0..=MAX_JITTER_MS);
        }
        Duration::from_millis(delay_ms)
    }
}
