//! HTTP client abstraction so catalog and tile access can be served from
//! memory in tests.

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::Client;
use thiserror::Error;

/// Transport-level failure (no HTTP status was obtained).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    #[error("request timed out")]
    Timeout,

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// Status and body of a completed request. Non-2xx statuses are not errors
/// at this level; callers decide what a status means.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Bytes,
}

impl HttpResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200
    }
}

/// Performs GET requests with a per-request timeout.
#[async_trait]
pub trait HttpFetch: Send + Sync {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FetchError>;
}

/// Real HTTP client implementation using reqwest.
pub struct ReqwestFetch {
    client: Client,
}

impl ReqwestFetch {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .pool_max_idle_per_host(8)
            .tcp_nodelay(true)
            .user_agent(concat!("rain-zones/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| FetchError::Request(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client })
    }
}

#[async_trait]
impl HttpFetch for ReqwestFetch {
    async fn get(&self, url: &str, timeout: Duration) -> Result<HttpResponse, FetchError> {
        let response = self
            .client
            .get(url)
            .timeout(timeout)
            .send()
            .await
            .map_err(classify)?;

        let status = response.status().as_u16();
        let body = response.bytes().await.map_err(classify)?;

        Ok(HttpResponse { status, body })
    }
}

fn classify(err: reqwest::Error) -> FetchError {
    if err.is_timeout() {
        FetchError::Timeout
    } else if err.is_connect() {
        FetchError::Connect(err.to_string())
    } else {
        FetchError::Request(err.to_string())
    }
}
