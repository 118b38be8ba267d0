//! Client configuration
//!
//! Values come from an outer configuration layer, either deserialized with
//! serde or read from `PAYBRIDGE_<PROVIDER>_*` environment variables.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::error::{Error, Result};
use crate::http::retry::RetryPolicy;
use crate::http::timeout::TimeoutConfig;
use crate::types::Provider;

/// Per-provider client configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    pub provider: Provider,
    /// Base URL every endpoint path is joined onto
    pub base_url: String,
    #[serde(default)]
    pub timeout: TimeoutConfig,
    #[serde(default)]
    pub retry: RetryPolicy,
}

impl ClientConfig {
    pub fn new(provider: Provider, base_url: impl Into<String>) -> Self {
        Self {
            provider,
            base_url: base_url.into(),
            timeout: TimeoutConfig::default(),
            retry: RetryPolicy::default(),
        }
    }

    /// Per-attempt timeout in seconds
    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout = TimeoutConfig::from_secs(timeout_secs);
        self
    }

    pub fn with_timeout(mut self, timeout: TimeoutConfig) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.retry.max_attempts = max_attempts;
        self
    }

    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }

    /// Load from `PAYBRIDGE_<PROVIDER>_BASE_URL`, `_TIMEOUT_SECS` and `_MAX_ATTEMPTS`
    pub fn from_env(provider: Provider) -> Result<Self> {
        Self::from_lookup(provider, env_lookup)
    }

    /// Same as [`ClientConfig::from_env`], reading variables through `lookup`
    pub fn from_lookup<F>(provider: Provider, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let base_url = required_var(&lookup, &env_key(provider, "BASE_URL"))?;
        let mut config = Self::new(provider, base_url);

        if let Some(timeout_secs) =
            parsed_var::<u64, _>(&lookup, &env_key(provider, "TIMEOUT_SECS"))?
        {
            config = config.with_timeout_secs(timeout_secs);
        }

        if let Some(max_attempts) =
            parsed_var::<u32, _>(&lookup, &env_key(provider, "MAX_ATTEMPTS"))?
        {
            config = config.with_max_attempts(max_attempts);
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let url = Url::parse(&self.base_url).map_err(|e| Error::Configuration {
            message: format!("Invalid base URL '{}'", self.base_url),
            source: Some(e.into()),
        })?;

        if !matches!(url.scheme(), "http" | "https") {
            return Err(Error::configuration(format!(
                "Base URL must use http or https, got '{}'",
                url.scheme()
            )));
        }

        self.timeout.validate().map_err(Error::configuration)?;

        if self.retry.max_attempts == 0 {
            return Err(Error::configuration("max_attempts must be at least 1"));
        }

        if self.retry.backoff_unit.is_zero() {
            return Err(Error::configuration("backoff unit cannot be zero"));
        }

        Ok(())
    }

    /// Longest a single logical call can take: every attempt timing out plus
    /// every backoff wait in between
    pub fn worst_case_duration(&self) -> Duration {
        self.timeout
            .call_bound(self.retry.effective_attempts(), self.retry.total_backoff())
    }
}

/// Key pair for signed providers
///
/// The secret never leaves the process; `Debug` masks both halves.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub public_key: String,
    pub secret_key: String,
}

impl Credentials {
    pub fn new(public_key: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            public_key: public_key.into(),
            secret_key: secret_key.into(),
        }
    }

    /// Load from `PAYBRIDGE_<PROVIDER>_PUBLIC_KEY` and `_SECRET_KEY`
    pub fn from_env(provider: Provider) -> Result<Self> {
        Self::from_lookup(provider, env_lookup)
    }

    /// Same as [`Credentials::from_env`], reading variables through `lookup`
    pub fn from_lookup<F>(provider: Provider, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credentials = Self::new(
            required_var(&lookup, &env_key(provider, "PUBLIC_KEY"))?,
            required_var(&lookup, &env_key(provider, "SECRET_KEY"))?,
        );
        credentials.validate()?;
        Ok(credentials)
    }

    pub fn validate(&self) -> Result<()> {
        if self.public_key.trim().is_empty() {
            return Err(Error::configuration("public key cannot be empty"));
        }
        if self.secret_key.is_empty() {
            return Err(Error::configuration("secret key cannot be empty"));
        }
        Ok(())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("public_key", &"***")
            .field("secret_key", &"***")
            .finish()
    }
}

fn env_key(provider: Provider, suffix: &str) -> String {
    format!("PAYBRIDGE_{}_{}", provider.name().to_uppercase(), suffix)
}

fn env_lookup(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

fn required_var<F>(lookup: &F, key: &str) -> Result<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .ok_or_else(|| Error::configuration(format!("{} environment variable is required", key)))
}

fn parsed_var<T, F>(lookup: &F, key: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: fmt::Display,
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        Some(raw) => raw
            .trim()
            .parse()
            .map(Some)
            .map_err(|e| Error::configuration(format!("{} must be a number: {}", key, e))),
        None => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_config_defaults() {
        let config = ClientConfig::new(Provider::Pix, "https://pix.example.com");
        assert_eq!(config.timeout.request_timeout, Duration::from_secs(30));
        assert_eq!(config.retry.max_attempts, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_rejects_bad_values() {
        assert!(ClientConfig::new(Provider::Pix, "").validate().is_err());
        assert!(ClientConfig::new(Provider::Pix, "ftp://files.example.com")
            .validate()
            .is_err());
        assert!(ClientConfig::new(Provider::Pix, "https://pix.example.com")
            .with_max_attempts(0)
            .validate()
            .is_err());
        assert!(ClientConfig::new(Provider::Pix, "https://pix.example.com")
            .with_timeout_secs(0)
            .validate()
            .is_err());
    }

    #[test]
    fn test_worst_case_duration() {
        let config = ClientConfig::new(Provider::Crypto, "https://crypto.example.com")
            .with_timeout_secs(10)
            .with_max_attempts(3);
        // 3 × 10s + 2s + 4s
        assert_eq!(config.worst_case_duration(), Duration::from_secs(36));
    }

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_from_lookup() {
        let vars = lookup(&[
            ("PAYBRIDGE_CRYPTO_BASE_URL", "https://crypto.example.com"),
            ("PAYBRIDGE_CRYPTO_TIMEOUT_SECS", "12"),
            ("PAYBRIDGE_CRYPTO_MAX_ATTEMPTS", "5"),
            ("PAYBRIDGE_CRYPTO_PUBLIC_KEY", "pk"),
            ("PAYBRIDGE_CRYPTO_SECRET_KEY", "sk"),
        ]);

        let config = ClientConfig::from_lookup(Provider::Crypto, &vars).unwrap();
        assert_eq!(config.base_url, "https://crypto.example.com");
        assert_eq!(config.timeout.request_timeout, Duration::from_secs(12));
        assert_eq!(config.retry.max_attempts, 5);

        let credentials = Credentials::from_lookup(Provider::Crypto, &vars).unwrap();
        assert_eq!(credentials.public_key, "pk");
    }

    #[test]
    fn test_from_lookup_missing_base_url() {
        let err = ClientConfig::from_lookup(Provider::Pix, lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("PAYBRIDGE_PIX_BASE_URL"));
    }

    #[test]
    fn test_from_lookup_rejects_non_numeric_timeout() {
        let vars = lookup(&[
            ("PAYBRIDGE_PIX_BASE_URL", "https://pix.example.com"),
            ("PAYBRIDGE_PIX_TIMEOUT_SECS", "soon"),
        ]);
        let err = ClientConfig::from_lookup(Provider::Pix, vars).unwrap_err();
        assert!(err.to_string().contains("PAYBRIDGE_PIX_TIMEOUT_SECS"));
    }

    #[test]
    fn test_credentials_debug_masks_secret() {
        let rendered = format!("{:?}", Credentials::new("pk_live", "sk_live"));
        assert!(!rendered.contains("sk_live"));
        assert!(!rendered.contains("pk_live"));
        assert!(Credentials::new("pk", "").validate().is_err());
    }
}
