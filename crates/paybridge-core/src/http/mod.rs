//! HTTP layer for provider API communication
//!
//! This module provides:
//! - Canonical parameter encoding and HMAC-SHA512 signing
//! - A single-attempt transport with per-attempt timeouts
//! - Retry logic with exponential backoff for transient failures
//! - Classification of every outcome into a closed error taxonomy
//! - The provider client tying these together

pub mod builder;
pub mod canonical;
pub mod client;
pub mod error;
pub mod retry;
pub mod signer;
pub mod timeout;
pub mod transport;

pub use builder::{default_headers, RequestBuilder};
pub use canonical::{canonical_string, encode_pairs, flatten_params, CanonicalString};
pub use client::ProviderClient;
pub use error::{classify, classify_response, ClassifiedError, ErrorKind};
pub use retry::{execute_with_retry, run_with_retry, RetryDecision, RetryHandler, RetryPolicy};
pub use signer::{ClockNonce, Nonce, NonceSource, Signature, SignedRequest, Signer};
pub use timeout::TimeoutConfig;
pub use transport::{PreparedRequest, RawResponse, ReqwestTransport, Transport, TransportError};
