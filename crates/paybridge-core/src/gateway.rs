//! Provider dispatch
//!
//! One variant per provider, each owning a configured [`ProviderClient`].

use serde_json::Value;

use crate::error::Result;
use crate::http::client::ProviderClient;
use crate::http::error::ClassifiedError;
use crate::types::{Headers, HttpMethod, Params, Provider};

/// Configured client for one of the supported providers
#[derive(Debug)]
pub enum PaymentGateway {
    /// Unsigned requests
    Pix(ProviderClient),
    /// HMAC-signed requests
    Crypto(ProviderClient),
}

impl PaymentGateway {
    /// Wrap a client in the variant matching its provider
    pub fn from_client(client: ProviderClient) -> Self {
        match client.provider() {
            Provider::Pix => PaymentGateway::Pix(client),
            Provider::Crypto => PaymentGateway::Crypto(client),
        }
    }

    /// Build a gateway from `PAYBRIDGE_<PROVIDER>_*` environment variables
    pub fn from_env(provider: Provider) -> Result<Self> {
        ProviderClient::from_env(provider).map(Self::from_client)
    }

    pub fn provider(&self) -> Provider {
        match self {
            PaymentGateway::Pix(_) => Provider::Pix,
            PaymentGateway::Crypto(_) => Provider::Crypto,
        }
    }

    pub fn client(&self) -> &ProviderClient {
        match self {
            PaymentGateway::Pix(client) | PaymentGateway::Crypto(client) => client,
        }
    }

    /// Execute a request, signing it if the provider requires it
    pub async fn execute(
        &self,
        method: HttpMethod,
        path: &str,
        params: Params,
        headers: Headers,
    ) -> std::result::Result<Value, ClassifiedError> {
        match self {
            PaymentGateway::Pix(client) => {
                client.execute_unsigned(method, path, params, headers).await
            }
            PaymentGateway::Crypto(client) => {
                client.execute_signed(method, path, params, headers).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ClientConfig, Credentials};
    use crate::http::transport::{PreparedRequest, RawResponse, Transport, TransportError};
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct EchoTransport {
        requests: Mutex<Vec<PreparedRequest>>,
    }

    #[async_trait]
    impl Transport for EchoTransport {
        async fn send(
            &self,
            request: &PreparedRequest,
        ) -> std::result::Result<RawResponse, TransportError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok(RawResponse::new(200, r#"{"ok":true}"#))
        }
    }

    fn gateway(provider: Provider, transport: Arc<EchoTransport>) -> PaymentGateway {
        let client =
            ProviderClient::with_default_logger(ClientConfig::new(provider, "https://api.example.com"))
                .unwrap()
                .with_transport(transport)
                .with_credentials(Credentials::new("pk", "sk"));
        PaymentGateway::from_client(client)
    }

    #[test]
    fn test_variant_matches_provider() {
        for provider in Provider::ALL {
            let gateway = gateway(provider, Arc::new(EchoTransport::default()));
            assert_eq!(gateway.provider(), provider);
            assert_eq!(gateway.client().provider(), provider);
        }
    }

    #[tokio::test]
    async fn test_pix_is_unsigned_and_crypto_is_signed() {
        let transport = Arc::new(EchoTransport::default());
        gateway(Provider::Pix, transport.clone())
            .execute(HttpMethod::Get, "/charges", Params::new(), Headers::new())
            .await
            .unwrap();
        gateway(Provider::Crypto, transport.clone())
            .execute(HttpMethod::Get, "/balance", Params::new(), Headers::new())
            .await
            .unwrap();

        let requests = transport.requests.lock().unwrap();
        assert!(!requests[0].headers.contains_key("sign"));
        assert!(requests[1].headers.contains_key("sign"));
        assert_eq!(requests[1].headers["public"], "pk");
        assert!(requests[1].url.query().unwrap_or("").contains("nonce="));
    }
}
