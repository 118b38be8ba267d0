//! Canonical parameter encoding
//!
//! Flattens nested parameters into `key=value` pairs, sorts them by key and
//! form-urlencodes the result. The output is the exact byte string that gets
//! signed, so two parameter sets that differ only in insertion order must
//! encode identically.

use std::fmt;

use serde_json::Value;
use url::form_urlencoded;

use crate::types::Params;

/// Sorted, flattened, percent-encoded representation of a parameter set
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CanonicalString(String);

impl CanonicalString {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CanonicalString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CanonicalString {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Flatten parameters into `(key, value)` pairs in flattening order
///
/// Nested object keys are appended to their parent key with no separator.
/// Array elements get `[index]` appended. Nulls are skipped.
pub fn flatten_params(params: &Params) -> Vec<(String, String)> {
    let mut pairs = Vec::with_capacity(params.len());
    for (key, value) in params {
        flatten_into(&mut pairs, key.clone(), value);
    }
    pairs
}

fn flatten_into(pairs: &mut Vec<(String, String)>, key: String, value: &Value) {
    match value {
        Value::Null => {}
        Value::Object(map) => {
            for (child_key, child) in map {
                flatten_into(pairs, format!("{}{}", key, child_key), child);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                flatten_into(pairs, format!("{}[{}]", key, index), item);
            }
        }
        scalar => {
            if let Some(text) = scalar_to_string(scalar) {
                pairs.push((key, text));
            }
        }
    }
}

/// Canonical text of a scalar: strings verbatim, numbers as serialized by
/// `serde_json` (`100.0` stays `100.0`), booleans as `true`/`false`
fn scalar_to_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Null | Value::Object(_) | Value::Array(_) => None,
    }
}

/// Encode a parameter set into its canonical query string
pub fn canonical_string(params: &Params) -> CanonicalString {
    encode_pairs(flatten_params(params))
}

/// Sort flattened pairs and form-urlencode them
///
/// Pairs are ordered by key, then by value, so duplicate flattened keys (e.g.
/// `{"a": {"b": 1}, "ab": 2}`) encode the same whatever order they arrive in.
pub fn encode_pairs(mut pairs: Vec<(String, String)>) -> CanonicalString {
    pairs.sort();

    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in &pairs {
        serializer.append_pair(key, value);
    }
    CanonicalString(serializer.finish())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn params(value: Value) -> Params {
        match value {
            Value::Object(map) => map,
            _ => panic!("test params must be an object"),
        }
    }

    #[test]
    fn test_nested_mapping_concatenates_keys() {
        let pairs = flatten_params(&params(json!({"a": {"b": 1}})));
        assert_eq!(pairs, vec![("ab".to_string(), "1".to_string())]);
    }

    #[test]
    fn test_sequence_elements_are_indexed() {
        let pairs = flatten_params(&params(json!({"x": ["first", "second"]})));
        assert_eq!(
            pairs,
            vec![
                ("x[0]".to_string(), "first".to_string()),
                ("x[1]".to_string(), "second".to_string()),
            ]
        );
    }

    #[test]
    fn test_mapping_inside_sequence() {
        let pairs = flatten_params(&params(json!({
            "items": [{"sku": "A1", "qty": 2}]
        })));
        assert!(pairs.contains(&("items[0]sku".to_string(), "A1".to_string())));
        assert!(pairs.contains(&("items[0]qty".to_string(), "2".to_string())));
    }

    #[test]
    fn test_numbers_keep_canonical_form() {
        let encoded = canonical_string(&params(json!({
            "float": 100.0,
            "int": 100,
            "neg": -3.25
        })));
        assert_eq!(encoded.as_str(), "float=100.0&int=100&neg=-3.25");
    }

    #[test]
    fn test_booleans_and_nulls() {
        let encoded = canonical_string(&params(json!({
            "active": true,
            "archived": false,
            "note": null
        })));
        assert_eq!(encoded.as_str(), "active=true&archived=false");
    }

    #[test]
    fn test_keys_sorted_by_byte_order() {
        let encoded = canonical_string(&params(json!({
            "b": "2",
            "B": "1",
            "a": "3"
        })));
        assert_eq!(encoded.as_str(), "B=1&a=3&b=2");
    }

    #[test]
    fn test_percent_encoding() {
        let encoded = canonical_string(&params(json!({
            "k": "é/&",
            "x": ["a b"]
        })));
        assert_eq!(encoded.as_str(), "k=%C3%A9%2F%26&x%5B0%5D=a+b");
    }

    #[test]
    fn test_reference_canonical_string() {
        let encoded = canonical_string(&params(json!({
            "service": "pix",
            "nonce": 1700000000u64,
            "amount": 100.0
        })));
        assert_eq!(encoded.as_str(), "amount=100.0&nonce=1700000000&service=pix");
    }

    #[test]
    fn test_duplicate_flattened_keys_ordered_by_value() {
        let encoded = canonical_string(&params(json!({"a": {"b": "1"}, "ab": "2"})));
        assert_eq!(encoded.as_str(), "ab=1&ab=2");

        let forward = vec![
            ("ab".to_string(), "2".to_string()),
            ("ab".to_string(), "1".to_string()),
        ];
        let mut reversed = forward.clone();
        reversed.reverse();
        assert_eq!(encode_pairs(forward), encode_pairs(reversed));
    }

    #[test]
    fn test_empty_params() {
        assert!(canonical_string(&Params::new()).is_empty());
    }
}
