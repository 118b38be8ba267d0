//! Request/response logging
//!
//! Clients receive their logger at construction; there is no process-wide
//! default. [`TracingLogger`] forwards to `tracing` and leaves subscriber
//! installation to the application.

use std::time::Duration;

use url::Url;

use crate::http::error::ErrorKind;
use crate::types::{Headers, HttpMethod, Provider};

/// One classified request/response exchange
#[derive(Debug, Clone, PartialEq)]
pub struct ExchangeRecord {
    pub provider: Provider,
    pub method: HttpMethod,
    pub url: String,
    /// Status of the last response, if any arrived
    pub status: Option<u16>,
    pub attempts: u32,
    pub duration: Duration,
    /// Classification when the call failed
    pub error_kind: Option<ErrorKind>,
}

impl ExchangeRecord {
    pub fn is_success(&self) -> bool {
        self.error_kind.is_none()
    }
}

/// Receives exactly one record per logical call, after classification
pub trait RequestLogger: Send + Sync {
    fn record_exchange(&self, record: &ExchangeRecord);
}

/// Structured logging through `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl RequestLogger for TracingLogger {
    fn record_exchange(&self, record: &ExchangeRecord) {
        let status = record.status.map(|s| s.to_string());
        let status = status.as_deref().unwrap_or("none");

        match record.error_kind {
            None => tracing::info!(
                provider = %record.provider,
                method = %record.method,
                url = %record.url,
                status = status,
                attempts = record.attempts,
                duration_ms = record.duration.as_millis() as u64,
                "Provider request completed"
            ),
            Some(kind) => tracing::warn!(
                provider = %record.provider,
                method = %record.method,
                url = %record.url,
                status = status,
                attempts = record.attempts,
                duration_ms = record.duration.as_millis() as u64,
                error_kind = %kind,
                "Provider request failed"
            ),
        }
    }
}

/// URL as it should appear in logs: no query string, which may carry a nonce
/// and caller data
pub fn loggable_url(url: &Url) -> String {
    let mut url = url.clone();
    url.set_query(None);
    url.to_string()
}

/// Copy of `headers` with credential-bearing values masked
pub fn redact_headers(headers: &Headers) -> Headers {
    headers
        .iter()
        .map(|(name, value)| {
            if is_sensitive_header(name) {
                (name.clone(), "***".to_string())
            } else {
                (name.clone(), value.clone())
            }
        })
        .collect()
}

fn is_sensitive_header(name: &str) -> bool {
    let name = name.to_lowercase();
    name == "sign"
        || name == "public"
        || name.contains("auth")
        || name.contains("key")
        || name.contains("secret")
        || name.contains("token")
}
