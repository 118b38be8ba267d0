//! Paybridge Core - HTTP client core for payment-provider integrations
//!
//! This crate turns a method, endpoint path and parameter set into a
//! provider call and its outcome into either a decoded JSON payload or a
//! classified error.
//!
//! # Main Components
//!
//! - **Canonical Encoding**: Order-independent, percent-encoded parameter strings
//! - **Signing**: HMAC-SHA512 over the canonical string with a freshness nonce
//! - **Retry**: Exponential backoff on transient transport failures only
//! - **Classification**: Every response or failure mapped to an [`ErrorKind`]
//! - **Provider Clients**: Signed and unsigned execution, dispatched by [`Provider`]
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use paybridge_core::{
//!     ClientConfig, Credentials, Headers, HttpMethod, Params, Provider, ProviderClient,
//!     TracingLogger,
//! };
//!
//! async fn example() -> paybridge_core::Result<()> {
//!     let config = ClientConfig::new(Provider::Crypto, "https://api.example.com");
//!     let client = ProviderClient::new(config, Arc::new(TracingLogger))?
//!         .with_credentials(Credentials::new("public-key", "secret-key"));
//!
//!     let mut params = Params::new();
//!     params.insert("currency".into(), "BTC".into());
//!
//!     let balance = client
//!         .execute_signed(HttpMethod::Get, "/balance", params, Headers::new())
//!         .await?;
//!     println!("{}", balance);
//!     Ok(())
//! }
//! ```

pub mod config;
pub mod error;
pub mod gateway;
pub mod http;
pub mod logging;
pub mod types;

// Re-export main types for convenience
pub use config::{ClientConfig, Credentials};
pub use error::{Error, Result};
pub use gateway::PaymentGateway;
pub use http::{
    canonical_string, classify, ClassifiedError, ErrorKind, Nonce, NonceSource, ProviderClient,
    RetryPolicy, Signer, TimeoutConfig, Transport,
};
pub use logging::{ExchangeRecord, RequestLogger, TracingLogger};
pub use types::{AuthScheme, Headers, HttpMethod, Params, Provider, RequestSpec};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// User-Agent sent with every provider request
pub const USER_AGENT: &str = concat!("paybridge/", env!("CARGO_PKG_VERSION"));
