//! Single-attempt HTTP transport
//!
//! [`Transport`] is the only suspension point of a provider call. The retry
//! policy and the classifier only see [`RawResponse`] and [`TransportError`], so
//! a stub transport can stand in for the network in tests.

use async_trait::async_trait;
use reqwest::Client as ReqwestClient;
use thiserror::Error;
use url::Url;

use crate::http::timeout::TimeoutConfig;
use crate::types::{Headers, HttpMethod};
use crate::USER_AGENT;

/// Fully built request, ready to be sent as many times as the retry policy asks
#[derive(Debug, Clone, PartialEq)]
pub struct PreparedRequest {
    pub method: HttpMethod,
    pub url: Url,
    pub headers: Headers,
    pub body: Option<String>,
}

/// Any HTTP response that made it back, whatever its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

impl RawResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to obtain a response at all
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("request timed out: {message}")]
    Timeout { message: String },

    #[error("connection failed: {message}")]
    Connect { message: String },

    #[error("failed to read response body: {message}")]
    Decode { message: String },

    #[error("request could not be sent: {message}")]
    Request { message: String },
}

impl TransportError {
    /// Timeouts and connection failures are worth another attempt
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            TransportError::Timeout { .. } | TransportError::Connect { .. }
        )
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(err: reqwest::Error) -> Self {
        let message = err.to_string();
        if err.is_timeout() {
            TransportError::Timeout { message }
        } else if err.is_connect() {
            TransportError::Connect { message }
        } else if err.is_body() || err.is_decode() {
            TransportError::Decode { message }
        } else if err.is_request() {
            // Connection resets while sending surface as request errors.
            TransportError::Connect { message }
        } else {
            TransportError::Request { message }
        }
    }
}

/// Issues one HTTP request
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError>;
}

/// [`Transport`] backed by `reqwest`, with per-attempt timeouts
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: ReqwestClient,
}

impl ReqwestTransport {
    pub fn new(timeouts: &TimeoutConfig) -> crate::Result<Self> {
        let client = ReqwestClient::builder()
            .connect_timeout(timeouts.connect_timeout)
            .timeout(timeouts.request_timeout)
            .user_agent(USER_AGENT)
            // A 3xx is an outcome to classify, and signed headers must not follow it.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| crate::Error::HttpClient {
                message: format!("Failed to create HTTP client: {}", e),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client })
    }

    /// Wrap an existing client; its own timeout settings apply
    pub fn with_client(client: ReqwestClient) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(&self, request: &PreparedRequest) -> Result<RawResponse, TransportError> {
        let mut builder = self
            .client
            .request(request.method.into(), request.url.clone());

        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;

        Ok(RawResponse { status, body })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(TransportError::Timeout { message: "t".into() }.is_transient());
        assert!(TransportError::Connect { message: "c".into() }.is_transient());
        assert!(!TransportError::Decode { message: "d".into() }.is_transient());
        assert!(!TransportError::Request { message: "r".into() }.is_transient());
    }

    #[test]
    fn test_raw_response_success_range() {
        assert!(RawResponse::new(200, "").is_success());
        assert!(RawResponse::new(299, "").is_success());
        assert!(!RawResponse::new(300, "").is_success());
        assert!(!RawResponse::new(404, "").is_success());
    }

    #[test]
    fn test_transport_builds_with_default_timeouts() {
        assert!(ReqwestTransport::new(&TimeoutConfig::default()).is_ok());
    }

    #[tokio::test]
    async fn test_connection_refused_is_transient() {
        let transport = ReqwestTransport::new(&TimeoutConfig::default()).unwrap();
        let request = PreparedRequest {
            method: HttpMethod::Get,
            url: Url::parse("http://127.0.0.1:1/unreachable").unwrap(),
            headers: Headers::new(),
            body: None,
        };

        let err = transport.send(&request).await.unwrap_err();
        assert!(err.is_transient(), "unexpected error: {:?}", err);
    }
}
