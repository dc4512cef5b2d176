//! Shared HTTP transport
//!
//! A single client instance is reused across all providers and calls;
//! connection pooling is a pure performance optimization, never a
//! correctness requirement. Every outbound request carries the same fixed
//! timeout so a stalled external service cannot block the caller
//! indefinitely. No automatic retry happens at this layer.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

/// Fixed deadline applied to every outbound request, for every provider.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Raw response handed back to providers: status plus the unparsed body.
#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: String,
}

impl TransportResponse {
    #[must_use]
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }
}

/// Transport-level failures, before any status or body interpretation.
#[derive(Debug, Error)]
pub enum TransportError {
    /// The fixed request deadline elapsed.
    #[error("request deadline elapsed")]
    Timeout,
    /// Any other network-level failure (connect, TLS, body read).
    #[error("network error: {0}")]
    Network(String),
}

/// Outbound HTTP capability used by every provider.
///
/// Object-safe so tests can substitute a stub and assert on the exact
/// requests a provider makes.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// POST a `application/x-www-form-urlencoded` body.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Timeout` when the fixed deadline elapses and
    /// `TransportError::Network` for any other transport failure.
    async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError>;

    /// GET with optional extra headers.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Timeout` when the fixed deadline elapses and
    /// `TransportError::Network` for any other transport failure.
    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError>;
}

/// Production transport over one shared `reqwest` client.
#[derive(Debug, Clone)]
pub struct HttpClient {
    client: reqwest::Client,
}

impl HttpClient {
    /// Build the shared client with the fixed request timeout.
    ///
    /// # Errors
    ///
    /// Returns `TransportError::Network` if the underlying TLS backend
    /// cannot be initialized.
    pub fn new() -> Result<Self, TransportError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("signet/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::Network(e.to_string()))?;
        Ok(Self { client })
    }

    fn map_err(err: &reqwest::Error) -> TransportError {
        if err.is_timeout() {
            TransportError::Timeout
        } else {
            TransportError::Network(err.to_string())
        }
    }

    async fn finish(response: reqwest::Response) -> Result<TransportResponse, TransportError> {
        let status = response.status().as_u16();
        let body = response.text().await.map_err(|e| Self::map_err(&e))?;
        Ok(TransportResponse { status, body })
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn post_form(
        &self,
        url: &str,
        params: &[(&str, &str)],
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.post(url).form(params);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().await.map_err(|e| Self::map_err(&e))?;
        Self::finish(response).await
    }

    async fn get(
        &self,
        url: &str,
        headers: &[(&str, &str)],
    ) -> Result<TransportResponse, TransportError> {
        let mut request = self.client.get(url);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }
        let response = request.send().await.map_err(|e| Self::map_err(&e))?;
        Self::finish(response).await
    }
}
