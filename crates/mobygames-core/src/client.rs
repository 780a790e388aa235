//! HTTP client with rate limiting and the MobyGames quota protocol
//!
//! Every outbound call goes through [`RateLimiter`] so calls are spaced
//! at least `request_interval` apart. HTTP 429 answers trigger the
//! rate-window backoff, which asks the user whether to wait.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::Mutex;
use tokio::time::{sleep, timeout};

use crate::credentials::{CredentialProvider, EnvCredential};
use crate::error::{Result, ScraperError};
use crate::prompt::{RateLimitDecision, RateLimitNotice, UserPrompt};
use crate::url::{DEFAULT_BASE_URL, redact_api_key};

const USER_AGENT: &str = concat!("mobygames-core/", env!("CARGO_PKG_VERSION"));
const GENERIC_ERROR_MESSAGE: &str = "Unknown/unspecified error.";

/// Configuration for the scraper and its HTTP client
#[derive(Debug, Clone)]
pub struct ScraperConfig {
    /// API root, without a trailing slash (default: `https://api.mobygames.com/v1`)
    pub base_url: String,
    /// MobyGames API key (default: none, scraper disabled)
    pub api_key: Option<String>,
    /// Directory for the disk cache; `None` keeps the cache in memory
    pub cache_dir: Option<PathBuf>,
    /// Minimum spacing between calls (default: 1 s)
    pub request_interval: Duration,
    /// Spacing before the single download retry (default: 5 s)
    pub download_retry_delay: Duration,
    /// How long the quota window lasts after a 429 (default: 16 min)
    pub rate_window: Duration,
    /// Waits allowed per request after 429 answers (default: 3)
    pub max_retries: u32,
    /// How long the rate-limit prompt may take before waiting is assumed (default: 60 s)
    pub prompt_timeout: Duration,
    /// Request timeout in seconds (default: 30)
    pub timeout_secs: u64,
    /// Where raw JSON responses are dumped, if anywhere
    pub debug_dump_dir: Option<PathBuf>,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: None,
            cache_dir: None,
            request_interval: Duration::from_millis(1000),
            download_retry_delay: Duration::from_millis(5000),
            rate_window: Duration::from_secs(960),
            max_retries: 3,
            prompt_timeout: Duration::from_secs(60),
            timeout_secs: 30,
            debug_dump_dir: None,
        }
    }
}

impl ScraperConfig {
    /// Defaults overlaid with `MOBYGAMES_API_KEY`, `MOBYGAMES_CACHE_DIR`
    /// and `MOBYGAMES_DEBUG_DIR`
    pub fn from_env() -> Self {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.trim().is_empty());
        Self {
            api_key: EnvCredential::default().api_key(),
            cache_dir: var("MOBYGAMES_CACHE_DIR").map(PathBuf::from),
            debug_dump_dir: var("MOBYGAMES_DEBUG_DIR").map(PathBuf::from),
            ..Self::default()
        }
    }
}

/// Rate limiter to control request frequency
///
/// Ensures calls are spaced at least `min_interval` apart, measured from
/// the end of the previous call.
pub struct RateLimiter {
    min_interval: Duration,
    last_call: Arc<Mutex<Option<Instant>>>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: Arc::new(Mutex::new(None)),
        }
    }

    /// Sleeps until the default interval has passed since the last call
    pub async fn acquire(&self) {
        self.acquire_with(self.min_interval).await;
    }

    /// Sleeps until `interval` has passed since the last call
    pub async fn acquire_with(&self, interval: Duration) {
        let last = *self.last_call.lock().await;
        if let Some(last) = last {
            let elapsed = last.elapsed();
            if elapsed < interval {
                sleep(interval - elapsed).await;
            }
        }
    }

    /// Marks the end of a call, successful or not
    pub async fn record_call(&self) {
        *self.last_call.lock().await = Some(Instant::now());
    }
}

/// Raw HTTP answer; error statuses are data, not failures
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

/// Network access used by the client
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Performs a GET. Only transport failures are errors.
    async fn get(&self, url: &str) -> Result<HttpResponse>;

    /// Saves the body of a successful GET to `destination`
    async fn download_to_file(&self, url: &str, destination: &Path) -> Result<()>;
}

/// [`HttpTransport`] backed by `reqwest`
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new(timeout_secs: u64) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ScraperError::Network(e.to_string()))?;
        Ok(Self { client })
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn get(&self, url: &str) -> Result<HttpResponse> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| ScraperError::Network(redact_api_key(&e.to_string())))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| ScraperError::Network(redact_api_key(&e.to_string())))?;
        Ok(HttpResponse {
            status,
            body: body.to_vec(),
        })
    }

    async fn download_to_file(&self, url: &str, destination: &Path) -> Result<()> {
        let response = self.get(url).await?;
        if response.status != 200 {
            return Err(ScraperError::Http {
                status: response.status,
                message: GENERIC_ERROR_MESSAGE.to_string(),
            });
        }
        if let Some(parent) = destination.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        tokio::fs::write(destination, &response.body).await?;
        Ok(())
    }
}

/// HTTP client wrapper implementing the MobyGames call protocol
///
/// Handles:
/// - Spacing calls with the rate limiter
/// - 429 backoff with a user decision, bounded by `max_retries`
/// - Decoding the error message MobyGames puts in non-200 bodies
pub struct MobyGamesClient {
    transport: Box<dyn HttpTransport>,
    prompt: Box<dyn UserPrompt>,
    rate_limiter: RateLimiter,
    download_retry_delay: Duration,
    rate_window: Duration,
    max_retries: u32,
    prompt_timeout: Duration,
}

impl MobyGamesClient {
    pub fn new(
        config: &ScraperConfig,
        transport: Box<dyn HttpTransport>,
        prompt: Box<dyn UserPrompt>,
    ) -> Self {
        Self {
            transport,
            prompt,
            rate_limiter: RateLimiter::new(config.request_interval),
            download_retry_delay: config.download_retry_delay,
            rate_window: config.rate_window,
            max_retries: config.max_retries,
            prompt_timeout: config.prompt_timeout,
        }
    }

    /// Fetches a URL and decodes the body as JSON
    ///
    /// # Errors
    /// - `Network` - no response was received
    /// - `Http` - non-200 status other than an honoured 429
    /// - `RateLimited` - 429 after all retries
    /// - `Cancelled` - the user declined to wait out a 429
    /// - `MalformedResponse` - body is not JSON
    pub async fn get_json(&self, url: &str) -> Result<Value> {
        let url_log = redact_api_key(url);
        let mut retry = 0;

        loop {
            self.rate_limiter.acquire().await;
            tracing::debug!(url = %url_log, "GET");
            let response = self.transport.get(url).await;
            self.rate_limiter.record_call().await;
            let response = response?;

            if response.status == 200 {
                return serde_json::from_slice(&response.body)
                    .map_err(|e| ScraperError::MalformedResponse(e.to_string()));
            }

            let message = decode_error_message(&response.body);
            tracing::error!(status = response.status, url = %url_log, "MobyGames msg \"{}\"", message);

            if response.status != 429 {
                return Err(ScraperError::Http {
                    status: response.status,
                    message,
                });
            }
            if retry >= self.max_retries {
                return Err(ScraperError::RateLimited { retries: retry });
            }

            let retry_at = Instant::now() + self.rate_window;
            let notice = RateLimitNotice {
                retry_at: chrono::Local::now()
                    + chrono::Duration::from_std(self.rate_window).unwrap_or(chrono::Duration::zero()),
                wait: self.rate_window,
                retry,
                max_retries: self.max_retries,
                server_message: message,
                answer_within: self.prompt_timeout,
            };
            let decision = timeout(self.prompt_timeout, self.prompt.confirm_rate_limit_wait(&notice))
                .await
                .unwrap_or_else(|_| {
                    tracing::info!("No answer to rate limit prompt, using default decision");
                    RateLimitDecision::default()
                });
            match decision {
                RateLimitDecision::Cancel => {
                    tracing::warn!("Rate limit wait cancelled, disabling MobyGames scraper");
                    return Err(ScraperError::Cancelled);
                }
                RateLimitDecision::Wait => {
                    let remaining = retry_at.saturating_duration_since(Instant::now());
                    tracing::info!(remaining_secs = remaining.as_secs(), retry, "Sleeping until rate window expires");
                    sleep(remaining).await;
                    retry += 1;
                }
            }
        }
    }

    /// Downloads an image, retrying once after a longer pause if no file appeared
    pub async fn download(&self, url: &str, destination: &Path) -> Result<()> {
        self.rate_limiter.acquire().await;
        let first = self.transport.download_to_file(url, destination).await;
        self.rate_limiter.record_call().await;
        if let Err(e) = &first {
            tracing::debug!(error = %e, "Download attempt failed");
        }

        if destination.exists() {
            return Ok(());
        }

        tracing::debug!(
            delay_ms = self.download_retry_delay.as_millis() as u64,
            "Download failed. Retrying once"
        );
        self.rate_limiter.acquire_with(self.download_retry_delay).await;
        let second = self.transport.download_to_file(url, destination).await;
        self.rate_limiter.record_call().await;

        if destination.exists() {
            return Ok(());
        }
        Err(ScraperError::DownloadFailed(match second {
            Err(e) => e.to_string(),
            Ok(()) => format!("{} not written", destination.display()),
        }))
    }
}

/// MobyGames sends a JSON body with a `message` field even on errors
fn decode_error_message(body: &[u8]) -> String {
    serde_json::from_slice::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_string))
        .unwrap_or_else(|| GENERIC_ERROR_MESSAGE.to_string())
}
