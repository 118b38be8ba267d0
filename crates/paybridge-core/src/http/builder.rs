//! HTTP request builder for provider API requests
//!
//! Turns a method, endpoint path and parameter set into a [`PreparedRequest`].
//! Query-string requests carry the canonical encoding verbatim, so the bytes a
//! signature covers are the bytes on the wire.

use reqwest::header::{HeaderName, HeaderValue};
use serde_json::Value;
use url::Url;

use crate::http::canonical::canonical_string;
use crate::http::error::{ClassifiedError, ErrorKind};
use crate::http::transport::PreparedRequest;
use crate::types::{Headers, HttpMethod, Params};
use crate::USER_AGENT;

/// Headers sent on every request unless the caller overrides them
pub fn default_headers() -> Headers {
    Headers::from([
        ("Content-Type".to_string(), "application/json".to_string()),
        ("Accept".to_string(), "application/json".to_string()),
        ("User-Agent".to_string(), USER_AGENT.to_string()),
    ])
}

/// Builder for provider requests against one base URL
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    base_url: String,
    default_headers: Headers,
}

impl RequestBuilder {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            default_headers: default_headers(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build a request
    ///
    /// Headers merge as defaults < `headers` < `auth_headers`, comparing names
    /// case-insensitively.
    pub fn build(
        &self,
        method: HttpMethod,
        path: &str,
        params: &Params,
        headers: &Headers,
        auth_headers: &Headers,
    ) -> Result<PreparedRequest, ClassifiedError> {
        let mut url = self.build_url(path)?;

        let body = if method.params_in_query() {
            let query = canonical_string(params);
            if !query.is_empty() {
                url.set_query(Some(query.as_str()));
            }
            None
        } else {
            let body = serde_json::to_string(&Value::Object(params.clone())).map_err(|e| {
                ClassifiedError::new(
                    ErrorKind::Provider,
                    format!("Failed to serialize request body: {}", e),
                )
            })?;
            Some(body)
        };

        let mut merged = self.default_headers.clone();
        for (name, value) in headers.iter().chain(auth_headers.iter()) {
            insert_header(&mut merged, name, value)?;
        }

        Ok(PreparedRequest {
            method,
            url,
            headers: merged,
            body,
        })
    }

    /// Base URL and endpoint path joined with exactly one slash
    fn build_url(&self, path: &str) -> Result<Url, ClassifiedError> {
        let joined = format!(
            "{}/{}",
            self.base_url.trim_end_matches('/'),
            path.trim_start_matches('/')
        );

        Url::parse(&joined).map_err(|e| {
            ClassifiedError::new(
                ErrorKind::Provider,
                format!("Invalid request URL '{}': {}", joined, e),
            )
        })
    }
}

/// Insert a header, replacing any existing one with the same name in any case
fn insert_header(headers: &mut Headers, name: &str, value: &str) -> Result<(), ClassifiedError> {
    HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
        ClassifiedError::new(ErrorKind::Provider, format!("Invalid header name '{}'", name))
    })?;
    HeaderValue::from_str(value).map_err(|_| {
        ClassifiedError::new(
            ErrorKind::Provider,
            format!("Invalid value for header '{}'", name),
        )
    })?;

    headers.retain(|existing, _| !existing.eq_ignore_ascii_case(name));
    headers.insert(name.to_string(), value.to_string());
    Ok(())
}
