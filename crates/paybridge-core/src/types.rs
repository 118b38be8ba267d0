//! Core types shared by the provider clients
//!
//! Providers are a closed set: adding one means adding a [`Provider`] variant and
//! letting the compiler point at every match that needs a new arm.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Request parameters: string keys mapped to scalars, nested objects or arrays
pub type Params = Map<String, Value>;

/// Extra headers supplied by the caller for a single request
pub type Headers = BTreeMap<String, String>;

/// Payment providers known to the library
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Brazilian instant-payment provider
    Pix,
    /// Cryptocurrency payment provider
    Crypto,
}

impl Provider {
    /// All known providers
    pub const ALL: [Provider; 2] = [Provider::Pix, Provider::Crypto];

    /// Lowercase name used in logs and environment variable prefixes
    pub fn name(&self) -> &'static str {
        match self {
            Provider::Pix => "pix",
            Provider::Crypto => "crypto",
        }
    }

    /// How requests to this provider are authenticated
    pub fn auth_scheme(&self) -> AuthScheme {
        match self {
            Provider::Pix => AuthScheme::Unsigned,
            Provider::Crypto => AuthScheme::HmacSigned,
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Request authentication scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuthScheme {
    /// Default headers only; credentials, if any, travel in caller headers
    Unsigned,
    /// `public` + `sign` headers carrying an HMAC-SHA512 over the canonical params
    HmacSigned,
}

/// HTTP methods supported by the provider APIs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }

    /// Whether parameters travel in the query string rather than a JSON body
    pub fn params_in_query(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<HttpMethod> for reqwest::Method {
    fn from(method: HttpMethod) -> Self {
        match method {
            HttpMethod::Get => reqwest::Method::GET,
            HttpMethod::Post => reqwest::Method::POST,
            HttpMethod::Put => reqwest::Method::PUT,
            HttpMethod::Delete => reqwest::Method::DELETE,
        }
    }
}

/// A single provider call: method, endpoint path, parameters and extra headers
#[derive(Debug, Clone, PartialEq)]
pub struct RequestSpec {
    pub method: HttpMethod,
    pub path: String,
    pub params: Params,
    pub headers: Headers,
}

impl RequestSpec {
    /// Create a request with no parameters and no extra headers
    pub fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            params: Params::new(),
            headers: Headers::new(),
        }
    }

    /// Set the parameters, dropping absent (null) values
    pub fn with_params(mut self, params: Params) -> Self {
        self.params = compact_params(params);
        self
    }

    /// Add one parameter; a null value removes the key instead
    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        match compact_value(value.into()) {
            Some(value) => {
                self.params.insert(key, value);
            }
            None => {
                self.params.remove(&key);
            }
        }
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers.extend(headers);
        self
    }
}

/// Remove null values at every nesting level
///
/// Absent values must never reach the encoder as empty strings. Nulls inside
/// arrays are removed too and the remaining elements are renumbered, so
/// `tags: ["a", null, "b"]` encodes as `tags[0]=a&tags[1]=b`.
pub fn compact_params(params: Params) -> Params {
    params
        .into_iter()
        .filter_map(|(key, value)| compact_value(value).map(|value| (key, value)))
        .collect()
}

fn compact_value(value: Value) -> Option<Value> {
    match value {
        Value::Null => None,
        Value::Object(map) => Some(Value::Object(compact_params(map))),
        Value::Array(items) => Some(Value::Array(
            items.into_iter().filter_map(compact_value).collect(),
        )),
        other => Some(other),
    }
}
