//! Blocking HTTP client used by every platform checker.
//!
//! # Design Notes
//!
//! - Checkers only see the `HttpFetch` trait, so tests swap in scripted transports
//! - `ReqwestFetcher` is the production implementation (rustls, redirects followed)
//! - GET requests are retried on 429/5xx and network errors with exponential backoff
//! - When retries are exhausted on a status code, the last response is returned
//!   so the checker can classify it (e.g. rate limited -> Unknown)

use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_LANGUAGE};
use reqwest::redirect::Policy;
use thiserror::Error;
use tracing::{debug, warn};

/// HTTP method used for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Head,
}

impl Method {
    fn as_str(&self) -> &'static str {
        match self {
            Method::Get => "GET",
            Method::Head => "HEAD",
        }
    }
}

/// HTTP response from the server
#[derive(Debug, Clone, Default)]
pub struct HttpResponse {
    /// HTTP status code
    pub status: u16,
    /// Final URL after redirects
    pub url: String,
    /// Response headers
    pub headers: Vec<(String, String)>,
    /// Response body (empty for HEAD)
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, url: impl Into<String>, body: impl Into<String>) -> Self {
        HttpResponse {
            status,
            url: url.into(),
            headers: Vec::new(),
            body: body.into(),
        }
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    /// Check if the response indicates success (2xx status)
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Get a header value by name (case-insensitive)
    pub fn get_header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }
}

/// Transport-level failure. Never produced for a well-formed HTTP response,
/// whatever its status code.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },

    #[error("connection to {url} failed: {message}")]
    Connect { url: String, message: String },

    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("reading response body from {url} failed: {message}")]
    Body { url: String, message: String },

    #[error("http client setup failed: {message}")]
    Build { message: String },
}

/// The only capability checkers need from the network.
pub trait HttpFetch: Send + Sync {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError>;

    fn head(&self, url: &str) -> Result<HttpResponse, TransportError>;
}

/// Configuration for HTTP requests
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Per-request timeout
    pub timeout: Duration,
    /// Maximum retry attempts for GET
    pub max_retries: u32,
    /// Initial retry delay in milliseconds (doubles with each retry)
    pub retry_delay_ms: u64,
    /// User-Agent header value
    pub user_agent: String,
    /// Redirect hops followed before giving up
    pub max_redirects: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        HttpConfig {
            timeout: Duration::from_secs(10),
            max_retries: 2,
            retry_delay_ms: 500,
            user_agent: crate::version::user_agent(),
            max_redirects: 10,
        }
    }
}

/// Production transport backed by `reqwest::blocking`
pub struct ReqwestFetcher {
    client: Client,
    config: HttpConfig,
}

impl ReqwestFetcher {
    pub fn new(config: HttpConfig) -> Result<Self, TransportError> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));

        let client = Client::builder()
            .user_agent(config.user_agent.clone())
            .default_headers(headers)
            .timeout(config.timeout)
            .redirect(Policy::limited(config.max_redirects))
            .build()
            .map_err(|e| TransportError::Build {
                message: e.to_string(),
            })?;

        Ok(ReqwestFetcher { client, config })
    }

    pub fn config(&self) -> &HttpConfig {
        &self.config
    }

    fn send_with_retries(&self, method: Method, url: &str) -> Result<HttpResponse, TransportError> {
        let retries = match method {
            Method::Get => self.config.max_retries,
            Method::Head => 0,
        };
        let mut last = None;

        for attempt in 0..=retries {
            if attempt > 0 {
                std::thread::sleep(retry_delay(self.config.retry_delay_ms, attempt));
            }

            debug!(method = method.as_str(), url, attempt, "sending request");
            match self.send_once(method, url) {
                Ok(response) if is_retryable_status(response.status) && attempt < retries => {
                    warn!(url, status = response.status, attempt, "retryable status, backing off");
                    last = Some(Ok(response));
                }
                Ok(response) => return Ok(response),
                Err(e) => {
                    if attempt < retries {
                        warn!(url, error = %e, attempt, "request failed, backing off");
                    }
                    last = Some(Err(e));
                }
            }
        }

        last.unwrap_or_else(|| {
            Err(TransportError::Request {
                url: url.to_string(),
                message: "no attempt was made".to_string(),
            })
        })
    }

    fn send_once(&self, method: Method, url: &str) -> Result<HttpResponse, TransportError> {
        let request = match method {
            Method::Get => self.client.get(url),
            Method::Head => self.client.head(url),
        };

        let response = request.send().map_err(|e| map_reqwest_error(url, e))?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let headers = response
            .headers()
            .iter()
            .map(|(k, v)| {
                (
                    k.as_str().to_string(),
                    String::from_utf8_lossy(v.as_bytes()).into_owned(),
                )
            })
            .collect();

        let body = match method {
            Method::Get => response.text().map_err(|e| TransportError::Body {
                url: url.to_string(),
                message: e.to_string(),
            })?,
            Method::Head => String::new(),
        };

        Ok(HttpResponse {
            status,
            url: final_url,
            headers,
            body,
        })
    }
}

impl HttpFetch for ReqwestFetcher {
    fn get(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.send_with_retries(Method::Get, url)
    }

    fn head(&self, url: &str) -> Result<HttpResponse, TransportError> {
        self.send_with_retries(Method::Head, url)
    }
}

/// Statuses the transport retries before handing the response back
pub fn is_retryable_status(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

fn map_reqwest_error(url: &str, e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout {
            url: url.to_string(),
        }
    } else if e.is_connect() {
        TransportError::Connect {
            url: url.to_string(),
            message: e.to_string(),
        }
    } else {
        TransportError::Request {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}

/// Pause before retry `attempt` (1-based): the first delay, doubled for
/// each earlier retry. Saturates instead of overflowing.
fn retry_delay(first_ms: u64, attempt: u32) -> Duration {
    let factor = 1u64
        .checked_shl(attempt.saturating_sub(1))
        .unwrap_or(u64::MAX);
    Duration::from_millis(first_ms.saturating_mul(factor))
}
