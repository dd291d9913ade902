//! Cache Key Module
//!
//! Normalized request identity used to match cache entries and timers.

use std::collections::BTreeMap;
use std::fmt;

use serde_json::Value;

/// Header that classifies a request as a prefetch. Never part of identity.
pub const PURPOSE_HEADER: &str = "Purpose";

// == Cache Key ==
/// Hashable request fingerprint.
///
/// Built from the request method, URL, payload and headers after removing
/// everything that must not influence matching: the `Purpose` header,
/// lifecycle callbacks and cache policy (`cache_for`, `cache_tags`). Payloads
/// are stored in a canonical JSON form with sorted object keys, so two
/// structurally equal payloads always produce the same key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey {
    method: String,
    url: String,
    data: String,
    headers: BTreeMap<String, String>,
}

impl CacheKey {
    // == Constructor ==
    /// Normalizes request parts into a key.
    ///
    /// A top-level payload that is `null` or an empty object counts as "no
    /// payload". Header names are lowercased and `Purpose` is dropped.
    pub fn new(method: &str, url: &str, data: &Value, headers: &BTreeMap<String, String>) -> Self {
        let data = match data {
            Value::Null => String::from("{}"),
            Value::Object(map) if map.is_empty() => String::from("{}"),
            other => canonical_json(other),
        };

        let headers = headers
            .iter()
            .filter(|(name, _)| !name.eq_ignore_ascii_case(PURPOSE_HEADER))
            .map(|(name, value)| (name.to_ascii_lowercase(), value.clone()))
            .collect();

        Self {
            method: method.to_ascii_lowercase(),
            url: url.to_string(),
            data,
            headers,
        }
    }

    /// Lowercase HTTP verb.
    pub fn method(&self) -> &str {
        &self.method
    }

    /// URL after query merging.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Canonical JSON form of the payload.
    pub fn data(&self) -> &str {
        &self.data
    }

    /// Identity headers with lowercase names, without `Purpose`.
    pub fn headers(&self) -> &BTreeMap<String, String> {
        &self.headers
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.method, self.url, self.data)
    }
}

// == Canonical JSON ==
/// Renders a JSON value with object keys in sorted order.
///
/// Independent of whether `serde_json` preserves insertion order.
pub fn canonical_json(value: &Value) -> String {
    let mut out = String::new();
    write_canonical(value, &mut out);
    out
}

fn write_canonical(value: &Value, out: &mut String) {
    match value {
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_canonical(item, out);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut keys: Vec<&String> = map.keys().collect();
            keys.sort();

            out.push('{');
            for (i, key) in keys.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                out.push_str(&Value::String(key.clone()).to_string());
                out.push(':');
                write_canonical(&map[key], out);
            }
            out.push('}');
        }
        scalar => out.push_str(&scalar.to_string()),
    }
}
