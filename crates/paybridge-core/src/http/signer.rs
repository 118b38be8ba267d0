//! HMAC-SHA512 request signing
//!
//! The signature covers the canonical encoding of the request parameters with
//! the freshness nonce merged in under the `nonce` key. The provider recomputes
//! the same input from the parameters it receives, so the nonce travels both in
//! the parameters and, implicitly, in the signature.

use std::fmt;

use hmac::{Hmac, Mac};
use serde_json::Value;
use sha2::Sha512;

use crate::http::canonical::{canonical_string, CanonicalString};
use crate::types::Params;

type HmacSha512 = Hmac<Sha512>;

/// Parameter key the nonce is merged under
pub const NONCE_PARAM: &str = "nonce";

/// Header carrying the provider-issued public identifier
pub const PUBLIC_HEADER: &str = "public";

/// Header carrying the hex signature
pub const SIGN_HEADER: &str = "sign";

/// Freshness token included in every signed request
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Nonce(u64);

impl Nonce {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Current wall-clock time in whole seconds
    pub fn now() -> Self {
        Self(chrono::Utc::now().timestamp().max(0) as u64)
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for Nonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Source of nonces for signed requests
///
/// Called once per logical call; implementations must not hand the same value
/// to calls that are meant to be distinct.
pub trait NonceSource: Send + Sync {
    fn next_nonce(&self) -> Nonce;
}

/// Nonces from the system clock at second granularity
///
/// Two signed calls started within the same second get the same nonce and the
/// provider will reject the second one. Inject a different [`NonceSource`] if
/// concurrent signed calls are needed.
#[derive(Debug, Clone, Copy, Default)]
pub struct ClockNonce;

impl NonceSource for ClockNonce {
    fn next_nonce(&self) -> Nonce {
        Nonce::now()
    }
}

/// Lowercase hex HMAC-SHA512 digest
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Signature(String);

impl Signature {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Parameters as sent (nonce included) together with their signature
#[derive(Debug, Clone, PartialEq)]
pub struct SignedRequest {
    pub params: Params,
    pub canonical: CanonicalString,
    pub signature: Signature,
}

/// Signs parameter sets with a provider-issued secret key
#[derive(Clone)]
pub struct Signer {
    secret: Vec<u8>,
}

impl Signer {
    pub fn new(secret_key: impl AsRef<[u8]>) -> Self {
        Self {
            secret: secret_key.as_ref().to_vec(),
        }
    }

    /// Signature over `params` with `nonce` merged in
    pub fn sign(&self, params: &Params, nonce: Nonce) -> Signature {
        self.sign_request(params, nonce).signature
    }

    /// Merge the nonce, encode canonically and sign
    pub fn sign_request(&self, params: &Params, nonce: Nonce) -> SignedRequest {
        let mut params = params.clone();
        params.insert(NONCE_PARAM.to_string(), Value::from(nonce.value()));

        let canonical = canonical_string(&params);
        let signature = self.sign_canonical(&canonical);

        SignedRequest {
            params,
            canonical,
            signature,
        }
    }

    /// HMAC over an already canonical string
    pub fn sign_canonical(&self, canonical: &CanonicalString) -> Signature {
        let mut mac =
            HmacSha512::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(canonical.as_bytes());
        Signature(hex::encode(mac.finalize().into_bytes()))
    }
}

impl fmt::Debug for Signer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signer").field("secret", &"***").finish()
    }
}
