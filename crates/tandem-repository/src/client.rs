//! HTTP client with per-host rate limiting and retry.

use crate::error::{RepositoryError, Result};
use backon::{ExponentialBuilder, Retryable};
use dashmap::DashMap;
use governor::{
    Quota, RateLimiter,
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
};
use parking_lot::RwLock;
use reqwest::{Client, StatusCode, header};
use serde::de::DeserializeOwned;
use std::num::NonZeroU32;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, warn};
use url::Url;

/// HTTP client configuration.
#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    /// Request timeout.
    pub timeout: Duration,
    /// Connection timeout.
    pub connect_timeout: Duration,
    /// Maximum retries.
    pub max_retries: usize,
    /// Initial retry delay.
    pub retry_delay: Duration,
    /// Maximum retry delay.
    pub max_retry_delay: Duration,
    /// Requests per second per host.
    pub rate_limit_per_host: u32,
    /// User agent string.
    pub user_agent: String,
}

impl Default for HttpClientConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            connect_timeout: Duration::from_secs(10),
            max_retries: 3,
            retry_delay: Duration::from_millis(100),
            max_retry_delay: Duration::from_secs(10),
            rate_limit_per_host: 20,
            user_agent: format!("tandem/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl HttpClientConfig {
    /// Build from user settings.
    #[must_use]
    pub fn from_settings(
        timeout_secs: u64,
        connect_timeout_secs: u64,
        max_retries: u32,
        rate_limit_per_host: u32,
    ) -> Self {
        Self {
            timeout: Duration::from_secs(timeout_secs),
            connect_timeout: Duration::from_secs(connect_timeout_secs),
            max_retries: max_retries as usize,
            rate_limit_per_host,
            ..Self::default()
        }
    }
}

/// HTTP client statistics.
#[derive(Debug, Default)]
pub struct HttpClientStats {
    /// Total requests made, retries included.
    pub requests: AtomicU64,
    /// Successful requests (2xx).
    pub successes: AtomicU64,
    /// Client errors (4xx).
    pub client_errors: AtomicU64,
    /// Server errors (5xx).
    pub server_errors: AtomicU64,
    /// Retries attempted.
    pub retries: AtomicU64,
    /// Rate limit responses.
    pub rate_limited: AtomicU64,
    /// Total bytes received.
    pub bytes_received: AtomicU64,
    total_request_time_ms: AtomicU64,
}

impl HttpClientStats {
    /// Average request time in milliseconds.
    #[must_use]
    pub fn avg_request_time_ms(&self) -> f64 {
        let total = self.total_request_time_ms.load(Ordering::Relaxed);
        let count = self.requests.load(Ordering::Relaxed);
        if count == 0 {
            0.0
        } else {
            total as f64 / count as f64
        }
    }

    fn record_request(&self, duration: Duration) {
        self.requests.fetch_add(1, Ordering::Relaxed);
        self.total_request_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }
}

/// A successful response.
#[derive(Debug)]
pub struct HttpResponse {
    /// Response body.
    pub body: Vec<u8>,
    /// HTTP status code.
    pub status: StatusCode,
}

type HostRateLimiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// HTTP client shared by the metadata clients.
#[derive(Debug)]
pub struct HttpClient {
    client: Client,
    config: HttpClientConfig,
    rate_limiters: DashMap<String, Arc<HostRateLimiter>>,
    bearer_tokens: RwLock<Vec<(String, String)>>,
    stats: Arc<HttpClientStats>,
}

impl HttpClient {
    /// Create a client with default configuration.
    ///
    /// # Errors
    /// Returns error if the client cannot be created.
    pub fn new() -> Result<Self> {
        Self::with_config(HttpClientConfig::default())
    }

    /// Create a client with custom configuration.
    ///
    /// # Errors
    /// Returns error if the client cannot be created.
    pub fn with_config(config: HttpClientConfig) -> Result<Self> {
        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::USER_AGENT,
            config
                .user_agent
                .parse()
                .map_err(|_| RepositoryError::InvalidConfig {
                    message: "Invalid user agent".into(),
                })?,
        );
        headers.insert(header::ACCEPT, header::HeaderValue::from_static("application/json"));

        let client = Client::builder()
            .timeout(config.timeout)
            .connect_timeout(config.connect_timeout)
            .pool_idle_timeout(Duration::from_secs(90))
            .gzip(true)
            .brotli(true)
            .deflate(true)
            .zstd(true)
            .default_headers(headers)
            .build()
            .map_err(|e| RepositoryError::InvalidConfig {
                message: format!("Failed to create HTTP client: {e}"),
            })?;

        Ok(Self {
            client,
            config,
            rate_limiters: DashMap::new(),
            bearer_tokens: RwLock::new(Vec::new()),
            stats: Arc::new(HttpClientStats::default()),
        })
    }

    /// Send `token` as a bearer token to `host`.
    pub fn set_bearer_token(&self, host: &str, token: &str) {
        let mut tokens = self.bearer_tokens.write();
        tokens.retain(|(h, _)| h != host);
        tokens.push((host.to_string(), token.to_string()));
        debug!(host = %host, "authentication configured");
    }

    fn bearer_token(&self, host: &str) -> Option<String> {
        self.bearer_tokens
            .read()
            .iter()
            .find(|(h, _)| h == host)
            .map(|(_, t)| t.clone())
    }

    fn rate_limiter(&self, host: &str) -> Arc<HostRateLimiter> {
        self.rate_limiters
            .entry(host.to_string())
            .or_insert_with(|| {
                let quota = Quota::per_second(
                    NonZeroU32::new(self.config.rate_limit_per_host).unwrap_or(NonZeroU32::MIN),
                );
                Arc::new(RateLimiter::direct(quota))
            })
            .clone()
    }

    /// GET a URL with rate limiting and retry of transient failures.
    ///
    /// # Errors
    /// Returns the last error once retries are exhausted, or the first
    /// non-retryable error.
    pub async fn get(&self, url: &Url) -> Result<HttpResponse> {
        let host = url.host_str().ok_or_else(|| RepositoryError::InvalidUrl {
            url: url.to_string(),
            message: "No host in URL".into(),
        })?;
        let token = self.bearer_token(host);
        let limiter = self.rate_limiter(host);
        let url_str = url.to_string();
        let stats = &self.stats;

        (|| async {
            limiter.until_ready().await;
            let mut request = self.client.get(url.clone());
            if let Some(ref token) = token {
                request = request.bearer_auth(token);
            }

            let start = Instant::now();
            let result = request.send().await;
            stats.record_request(start.elapsed());

            let resp = match result {
                Ok(resp) => resp,
                Err(e) if e.is_timeout() => {
                    return Err(RepositoryError::Timeout {
                        url: url_str.clone(),
                        timeout_secs: self.config.timeout.as_secs(),
                    });
                }
                Err(e) if e.is_connect() => {
                    return Err(RepositoryError::Unavailable {
                        url: url_str.clone(),
                        message: "Connection failed".into(),
                    });
                }
                Err(e) => {
                    return Err(RepositoryError::Network {
                        url: url_str.clone(),
                        message: e.to_string(),
                        status: None,
                    });
                }
            };

            let status = resp.status();
            if status.is_success() {
                stats.successes.fetch_add(1, Ordering::Relaxed);
                let body = resp.bytes().await.map_err(|e| RepositoryError::Network {
                    url: url_str.clone(),
                    message: format!("Failed to read body: {e}"),
                    status: None,
                })?;
                stats
                    .bytes_received
                    .fetch_add(body.len() as u64, Ordering::Relaxed);
                return Ok(HttpResponse {
                    body: body.to_vec(),
                    status,
                });
            }

            Err(self.status_error(&url_str, status, &resp))
        })
        .retry(
            ExponentialBuilder::default()
                .with_min_delay(self.config.retry_delay)
                .with_max_delay(self.config.max_retry_delay)
                .with_max_times(self.config.max_retries),
        )
        .when(RepositoryError::is_retryable)
        .notify(|err, dur| {
            stats.retries.fetch_add(1, Ordering::Relaxed);
            warn!(error = %err, retry_in = ?dur, "retrying request");
        })
        .await
    }

    fn status_error(&self, url: &str, status: StatusCode, resp: &reqwest::Response) -> RepositoryError {
        let url = url.to_string();
        match status {
            StatusCode::TOO_MANY_REQUESTS => {
                self.stats.rate_limited.fetch_add(1, Ordering::Relaxed);
                let retry_after = resp
                    .headers()
                    .get(header::RETRY_AFTER)
                    .and_then(|v| v.to_str().ok())
                    .and_then(|s| s.parse().ok());
                RepositoryError::RateLimited { url, retry_after }
            }
            StatusCode::UNAUTHORIZED => {
                self.stats.client_errors.fetch_add(1, Ordering::Relaxed);
                RepositoryError::AuthRequired { url }
            }
            StatusCode::FORBIDDEN => {
                self.stats.client_errors.fetch_add(1, Ordering::Relaxed);
                RepositoryError::AuthFailed {
                    url,
                    message: "Access forbidden".into(),
                }
            }
            StatusCode::NOT_FOUND => {
                self.stats.client_errors.fetch_add(1, Ordering::Relaxed);
                RepositoryError::Network {
                    url,
                    message: "Not found".into(),
                    status: Some(404),
                }
            }
            s if s.is_client_error() => {
                self.stats.client_errors.fetch_add(1, Ordering::Relaxed);
                RepositoryError::Network {
                    url,
                    message: format!("Client error: {s}"),
                    status: Some(s.as_u16()),
                }
            }
            s if s.is_server_error() => {
                self.stats.server_errors.fetch_add(1, Ordering::Relaxed);
                RepositoryError::Network {
                    url,
                    message: format!("Server error: {s}"),
                    status: Some(s.as_u16()),
                }
            }
            s => RepositoryError::Network {
                url,
                message: format!("Unexpected status: {s}"),
                status: Some(s.as_u16()),
            },
        }
    }

    /// GET a URL and decode its JSON body.
    ///
    /// # Errors
    /// Returns error if the request fails or the body does not decode.
    pub async fn get_json<T: DeserializeOwned>(&self, url: &Url) -> Result<T> {
        let response = self.get(url).await?;
        sonic_rs::from_slice(&response.body).map_err(|e| RepositoryError::parse(url.as_str(), e))
    }

    /// Client statistics.
    #[must_use]
    pub fn stats(&self) -> &HttpClientStats {
        &self.stats
    }
}

/// Join `path` onto a base URL, treating the base as a directory.
pub(crate) fn join_url(base: &Url, path: &str) -> Result<Url> {
    let mut base = base.clone();
    if !base.path().ends_with('/') {
        let dir = format!("{}/", base.path());
        base.set_path(&dir);
    }
    base.join(path).map_err(|e| RepositoryError::InvalidUrl {
        url: format!("{base}{path}"),
        message: e.to_string(),
    })
}
