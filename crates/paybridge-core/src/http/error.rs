//! Response classification
//!
//! Maps every outcome of a provider call, an HTTP response of any status or a
//! transport failure, onto the closed [`ErrorKind`] taxonomy. Successful
//! responses are decoded as JSON; nothing that failed to decode is ever handed
//! back as a success.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::http::transport::{RawResponse, TransportError};

/// Classification of a failed provider call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorKind {
    /// 400 - the provider rejected the parameters
    Validation,
    /// 401/403 - credentials or signature rejected
    Authentication,
    /// 404
    NotFound,
    /// 429
    RateLimit,
    /// 5xx and any status with no better classification
    ServerError,
    /// Timeout or connection failure, after retries
    Network,
    /// Response body could not be read or decoded
    Malformed,
    /// Anything else
    Provider,
}

impl ErrorKind {
    /// Only network failures are retried, and only by the transport layer
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorKind::Network)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::Authentication => "authentication",
            ErrorKind::NotFound => "not_found",
            ErrorKind::RateLimit => "rate_limit",
            ErrorKind::ServerError => "server_error",
            ErrorKind::Network => "network",
            ErrorKind::Malformed => "malformed",
            ErrorKind::Provider => "provider",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Classified failure of a provider call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClassifiedError {
    /// Error classification
    pub kind: ErrorKind,
    /// Human-readable error message
    pub message: String,
    /// HTTP status code if a response was received
    pub status_code: Option<u16>,
    /// Parsed error body, when the provider sent JSON
    pub details: Option<Value>,
}

impl ClassifiedError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status_code: None,
            details: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status_code = Some(status);
        self
    }

    pub fn with_details(mut self, details: Option<Value>) -> Self {
        self.details = details;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn status_code(&self) -> Option<u16> {
        self.status_code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn is_retryable(&self) -> bool {
        self.kind.is_retryable()
    }
}

impl fmt::Display for ClassifiedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status_code {
            Some(status) => write!(f, "{} error [HTTP {}]: {}", self.kind, status, self.message),
            None => write!(f, "{} error: {}", self.kind, self.message),
        }
    }
}

impl std::error::Error for ClassifiedError {}

impl From<TransportError> for ClassifiedError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Timeout { message } => {
                ClassifiedError::new(ErrorKind::Network, format!("Request timeout: {}", message))
            }
            TransportError::Connect { message } => {
                ClassifiedError::new(ErrorKind::Network, format!("Connection failed: {}", message))
            }
            TransportError::Decode { message } => ClassifiedError::new(
                ErrorKind::Malformed,
                format!("Failed to read response body: {}", message),
            ),
            TransportError::Request { message } => {
                ClassifiedError::new(ErrorKind::Provider, message)
            }
        }
    }
}

/// Classify a transport outcome into a decoded payload or a typed error
pub fn classify(outcome: Result<RawResponse, TransportError>) -> Result<Value, ClassifiedError> {
    match outcome {
        Ok(response) => classify_response(&response),
        Err(err) => Err(err.into()),
    }
}

/// Classify a received HTTP response
pub fn classify_response(response: &RawResponse) -> Result<Value, ClassifiedError> {
    let status = response.status;

    if response.is_success() {
        return parse_success_body(status, &response.body);
    }

    let details = serde_json::from_str::<Value>(&response.body).ok();
    let error = match status {
        400 => ClassifiedError::new(ErrorKind::Validation, extract_message(details.as_ref())),
        401 | 403 => ClassifiedError::new(ErrorKind::Authentication, "Invalid credentials"),
        404 => ClassifiedError::new(ErrorKind::NotFound, "Resource not found"),
        429 => ClassifiedError::new(ErrorKind::RateLimit, "Rate limit exceeded"),
        500..=599 => {
            ClassifiedError::new(ErrorKind::ServerError, format!("Server error: HTTP {}", status))
        }
        _ => ClassifiedError::new(
            ErrorKind::ServerError,
            format!("Unexpected response: HTTP {}", status),
        ),
    };

    Err(error.with_status(status).with_details(details))
}

fn parse_success_body(status: u16, body: &str) -> Result<Value, ClassifiedError> {
    if body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(body).map_err(|e| {
        ClassifiedError::new(ErrorKind::Malformed, format!("Invalid JSON response: {}", e))
            .with_status(status)
    })
}

/// Message from a provider error body: `error` (string, or object with a
/// `message`), then `message`, else "Unknown error"
fn extract_message(details: Option<&Value>) -> String {
    let Some(json) = details else {
        return "Unknown error".to_string();
    };

    if let Some(error) = json.get("error") {
        if let Some(message) = error.as_str() {
            return message.to_string();
        }
        if let Some(message) = error.get("message").and_then(|m| m.as_str()) {
            return message.to_string();
        }
    }

    json.get("message")
        .and_then(|m| m.as_str())
        .unwrap_or("Unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn classify_status(status: u16, body: &str) -> ClassifiedError {
        classify_response(&RawResponse::new(status, body)).unwrap_err()
    }

    #[test]
    fn test_success_parses_json() {
        let value = classify_response(&RawResponse::new(200, r#"{"id":"ch_1","amount":100.0}"#))
            .unwrap();
        assert_eq!(value, json!({"id": "ch_1", "amount": 100.0}));

        let value = classify_response(&RawResponse::new(201, "[1,2]")).unwrap();
        assert_eq!(value, json!([1, 2]));

        let value = classify_response(&RawResponse::new(200, "\"ok\"")).unwrap();
        assert_eq!(value, json!("ok"));
    }

    #[test]
    fn test_empty_success_body_is_null() {
        assert_eq!(classify_response(&RawResponse::new(204, "")).unwrap(), Value::Null);
    }

    #[test]
    fn test_invalid_success_body_is_malformed() {
        let err = classify_response(&RawResponse::new(200, "<html>")).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);
        assert_eq!(err.status_code(), Some(200));
    }

    #[test]
    fn test_validation_message_extraction() {
        let err = classify_status(400, r#"{"error":"Bad request"}"#);
        assert_eq!(err.kind(), ErrorKind::Validation);
        assert_eq!(err.message(), "Bad request");
        assert_eq!(err.status_code(), Some(400));

        let err = classify_status(400, r#"{"message":"amount must be positive"}"#);
        assert_eq!(err.message(), "amount must be positive");

        let err = classify_status(400, r#"{"error":{"message":"nested"}}"#);
        assert_eq!(err.message(), "nested");

        let err = classify_status(400, "not json");
        assert_eq!(err.message(), "Unknown error");
        assert_eq!(err.details, None);
    }

    #[test]
    fn test_status_table() {
        let err = classify_status(401, "");
        assert_eq!(err.kind(), ErrorKind::Authentication);
        assert_eq!(err.message(), "Invalid credentials");

        assert_eq!(classify_status(403, "").kind(), ErrorKind::Authentication);
        assert_eq!(classify_status(404, "").kind(), ErrorKind::NotFound);
        assert_eq!(classify_status(429, "").kind(), ErrorKind::RateLimit);

        let err = classify_status(500, "");
        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert!(err.message().contains("500"));

        let err = classify_status(503, r#"{"error":"maintenance"}"#);
        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert_eq!(err.details, Some(json!({"error": "maintenance"})));
    }

    #[test]
    fn test_unexpected_status() {
        let err = classify_status(302, "");
        assert_eq!(err.kind(), ErrorKind::ServerError);
        assert!(err.message().contains("Unexpected response"));
        assert!(err.message().contains("302"));

        assert_eq!(classify_status(422, "").kind(), ErrorKind::ServerError);
    }

    #[test]
    fn test_transport_errors() {
        let err = classify(Err(TransportError::Timeout {
            message: "deadline elapsed".into(),
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.message().to_lowercase().contains("timeout"));
        assert_eq!(err.status_code(), None);

        let err = classify(Err(TransportError::Connect {
            message: "refused".into(),
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Network);
        assert!(err.message().to_lowercase().contains("connection failed"));

        let err = classify(Err(TransportError::Decode {
            message: "eof".into(),
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Malformed);

        let err = classify(Err(TransportError::Request {
            message: "redirect loop".into(),
        }))
        .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Provider);
    }

    #[test]
    fn test_display() {
        let err = classify_status(404, "");
        assert_eq!(err.to_string(), "not_found error [HTTP 404]: Resource not found");
        assert!(!err.is_retryable());
        assert!(ErrorKind::Network.is_retryable());
    }
}
