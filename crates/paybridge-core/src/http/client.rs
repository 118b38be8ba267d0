//! Provider client orchestrating all components
//!
//! One logical call: compact params, sign if required, build the request,
//! send it through the retry policy, classify, log once.

use std::sync::Arc;
use std::time::{Duration, Instant};

use serde_json::Value;

use crate::config::{ClientConfig, Credentials};
use crate::error::Result;
use crate::http::builder::RequestBuilder;
use crate::http::error::{classify, ClassifiedError, ErrorKind};
use crate::http::retry::run_with_retry;
use crate::http::signer::{ClockNonce, NonceSource, Signer, PUBLIC_HEADER, SIGN_HEADER};
use crate::http::transport::{ReqwestTransport, Transport};
use crate::logging::{loggable_url, redact_headers, ExchangeRecord, RequestLogger, TracingLogger};
use crate::types::{compact_params, AuthScheme, Headers, HttpMethod, Params, Provider, RequestSpec};

/// Client for one payment provider
///
/// `Send + Sync`; share it behind an `Arc` rather than cloning.
pub struct ProviderClient {
    config: ClientConfig,
    builder: RequestBuilder,
    transport: Arc<dyn Transport>,
    logger: Arc<dyn RequestLogger>,
    nonce_source: Arc<dyn NonceSource>,
    credentials: Option<Credentials>,
}

impl ProviderClient {
    /// Create a client with a reqwest transport and the given logger
    pub fn new(config: ClientConfig, logger: Arc<dyn RequestLogger>) -> Result<Self> {
        config.validate()?;
        let transport = ReqwestTransport::new(&config.timeout)?;

        Ok(Self {
            builder: RequestBuilder::new(config.base_url.clone()),
            config,
            transport: Arc::new(transport),
            logger,
            nonce_source: Arc::new(ClockNonce),
            credentials: None,
        })
    }

    /// Create a client that logs through `tracing`
    pub fn with_default_logger(config: ClientConfig) -> Result<Self> {
        Self::new(config, Arc::new(TracingLogger))
    }

    /// Load config and, for signed providers, credentials from the environment
    pub fn from_env(provider: Provider) -> Result<Self> {
        let client = Self::with_default_logger(ClientConfig::from_env(provider)?)?;
        match provider.auth_scheme() {
            AuthScheme::HmacSigned => Ok(client.with_credentials(Credentials::from_env(provider)?)),
            AuthScheme::Unsigned => Ok(client),
        }
    }

    pub fn with_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = transport;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_nonce_source(mut self, nonce_source: Arc<dyn NonceSource>) -> Self {
        self.nonce_source = nonce_source;
        self
    }

    pub fn provider(&self) -> Provider {
        self.config.provider
    }

    pub fn auth_scheme(&self) -> AuthScheme {
        self.config.provider.auth_scheme()
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Upper bound on the duration of one call
    pub fn worst_case_duration(&self) -> Duration {
        self.config.worst_case_duration()
    }

    /// Execute a request with default and caller headers only
    pub async fn execute_unsigned(
        &self,
        method: HttpMethod,
        path: &str,
        params: Params,
        headers: Headers,
    ) -> std::result::Result<Value, ClassifiedError> {
        self.dispatch(method, path, params, headers, None).await
    }

    /// Execute a signed request with the client's own credentials
    pub async fn execute_signed(
        &self,
        method: HttpMethod,
        path: &str,
        params: Params,
        headers: Headers,
    ) -> std::result::Result<Value, ClassifiedError> {
        let Some(credentials) = self.credentials.as_ref() else {
            let error = ClassifiedError::new(
                ErrorKind::Authentication,
                format!("No credentials configured for provider {}", self.provider()),
            );
            self.log_exchange(method, path.to_string(), None, 0, Duration::ZERO, Some(error.kind));
            return Err(error);
        };

        self.dispatch(method, path, params, headers, Some(credentials))
            .await
    }

    /// Execute a signed request with per-call credentials
    pub async fn execute_signed_with(
        &self,
        method: HttpMethod,
        path: &str,
        params: Params,
        headers: Headers,
        credentials: &Credentials,
    ) -> std::result::Result<Value, ClassifiedError> {
        self.dispatch(method, path, params, headers, Some(credentials))
            .await
    }

    /// Execute a request the way this provider expects
    pub async fn execute(&self, request: RequestSpec) -> std::result::Result<Value, ClassifiedError> {
        let RequestSpec {
            method,
            path,
            params,
            headers,
        } = request;

        match self.auth_scheme() {
            AuthScheme::Unsigned => self.execute_unsigned(method, &path, params, headers).await,
            AuthScheme::HmacSigned => self.execute_signed(method, &path, params, headers).await,
        }
    }

    async fn dispatch(
        &self,
        method: HttpMethod,
        path: &str,
        params: Params,
        headers: Headers,
        credentials: Option<&Credentials>,
    ) -> std::result::Result<Value, ClassifiedError> {
        let started = Instant::now();
        let mut params = compact_params(params);
        let mut auth_headers = Headers::new();

        if let Some(credentials) = credentials {
            let nonce = self.nonce_source.next_nonce();
            let signed = Signer::new(&credentials.secret_key).sign_request(&params, nonce);
            auth_headers.insert(PUBLIC_HEADER.to_string(), credentials.public_key.clone());
            auth_headers.insert(SIGN_HEADER.to_string(), signed.signature.to_string());
            params = signed.params;
        }

        let request = match self
            .builder
            .build(method, path, &params, &headers, &auth_headers)
        {
            Ok(request) => request,
            Err(error) => {
                self.log_exchange(
                    method,
                    path.to_string(),
                    None,
                    0,
                    started.elapsed(),
                    Some(error.kind),
                );
                return Err(error);
            }
        };

        let url = loggable_url(&request.url);
        tracing::debug!(
            provider = %self.provider(),
            method = %method,
            url = %url,
            headers = ?redact_headers(&request.headers),
            "Sending provider request"
        );

        let transport = &self.transport;
        let prepared = &request;
        let outcome = run_with_retry(move |_| transport.send(prepared), &self.config.retry).await;

        let status = outcome.result.as_ref().ok().map(|response| response.status);
        let result = classify(outcome.result);

        self.log_exchange(
            method,
            url,
            status,
            outcome.attempts,
            started.elapsed(),
            result.as_ref().err().map(|error| error.kind),
        );

        result
    }

    fn log_exchange(
        &self,
        method: HttpMethod,
        url: String,
        status: Option<u16>,
        attempts: u32,
        duration: Duration,
        error_kind: Option<ErrorKind>,
    ) {
        self.logger.record_exchange(&ExchangeRecord {
            provider: self.provider(),
            method,
            url,
            status,
            attempts,
            duration,
            error_kind,
        });
    }
}

impl std::fmt::Debug for ProviderClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderClient")
            .field("config", &self.config)
            .field("credentials", &self.credentials)
            .finish_non_exhaustive()
    }
}
