//! Query-string merging for GET payloads.
//!
//! A GET request carries its payload in the URL. Merging keeps the shape of
//! the original href: absolute URLs keep their origin, absolute paths stay
//! absolute, relative paths stay relative and fragments survive.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use url::Url;

use crate::error::PrefetchError;

/// How arrays are written into the query string.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArrayFormat {
    /// `ids[]=1&ids[]=2`
    #[default]
    Brackets,
    /// `ids[0]=1&ids[1]=2`
    Indices,
}

impl FromStr for ArrayFormat {
    type Err = PrefetchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "brackets" => Ok(ArrayFormat::Brackets),
            "indices" => Ok(ArrayFormat::Indices),
            other => Err(PrefetchError::InvalidRequest(format!(
                "Unknown query array format: {other}"
            ))),
        }
    }
}

impl fmt::Display for ArrayFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArrayFormat::Brackets => f.write_str("brackets"),
            ArrayFormat::Indices => f.write_str("indices"),
        }
    }
}

/// Moves a GET payload into the URL's query string.
///
/// Returns the rewritten href and the remaining body payload: `{}` when the
/// payload was merged, otherwise `data` unchanged. Payload keys replace
/// existing query parameters with the same root name.
pub fn merge_data_into_query_string(
    method: &str,
    href: &str,
    data: Value,
    format: ArrayFormat,
) -> (String, Value) {
    let payload = match &data {
        Value::Object(map) if method.eq_ignore_ascii_case("get") && !map.is_empty() => {
            Some(map.clone())
        }
        _ => None,
    };

    let has_host = has_scheme(href);
    let has_absolute_path = has_host || href.starts_with('/');
    let has_relative_path = !has_absolute_path && !href.starts_with('#') && !href.starts_with('?');
    let has_search = href.contains('?') || payload.is_some();
    let has_hash = href.contains('#');

    let Ok(mut url) = Url::parse("http://localhost").and_then(|base| base.join(href)) else {
        return (href.to_string(), data);
    };

    let data = match payload {
        Some(payload) => {
            let query = merged_query(url.query(), &payload, format);
            url.set_query((!query.is_empty()).then_some(query.as_str()));
            Value::Object(Map::new())
        }
        None => data,
    };

    let mut merged = String::new();
    if has_host {
        merged.push_str(url.scheme());
        merged.push_str("://");
        merged.push_str(url.host_str().unwrap_or_default());
        if let Some(port) = url.port() {
            merged.push_str(&format!(":{port}"));
        }
    }
    if has_absolute_path {
        merged.push_str(url.path());
    }
    if has_relative_path {
        merged.push_str(url.path().strip_prefix('/').unwrap_or(url.path()));
    }
    if has_search {
        if let Some(query) = url.query().filter(|q| !q.is_empty()) {
            merged.push('?');
            merged.push_str(query);
        }
    }
    if has_hash {
        if let Some(fragment) = url.fragment().filter(|f| !f.is_empty()) {
            merged.push('#');
            merged.push_str(fragment);
        }
    }

    (merged, data)
}

/// Serializes a payload object as `key=value` pairs joined by `&`.
///
/// Keys are written raw, values are percent-encoded.
pub fn encode_query(payload: &Map<String, Value>, format: ArrayFormat) -> String {
    let mut pairs = Vec::new();
    for (key, value) in payload {
        encode_pairs(key, value, format, &mut pairs);
    }
    pairs.join("&")
}

fn merged_query(existing: Option<&str>, payload: &Map<String, Value>, format: ArrayFormat) -> String {
    // Existing pairs are kept byte-for-byte; only their decoded key is inspected
    let mut pairs: Vec<String> = existing
        .map(|query| {
            query
                .split('&')
                .filter(|pair| !pair.is_empty())
                .filter(|pair| !payload.contains_key(root_key(&decoded_key(pair))))
                .map(String::from)
                .collect()
        })
        .unwrap_or_default();

    for (key, value) in payload {
        encode_pairs(key, value, format, &mut pairs);
    }

    pairs.join("&")
}

fn encode_pairs(prefix: &str, value: &Value, format: ArrayFormat, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, nested) in map {
                encode_pairs(&format!("{prefix}[{key}]"), nested, format, out);
            }
        }
        Value::Array(items) => {
            for (index, item) in items.iter().enumerate() {
                let key = match format {
                    ArrayFormat::Brackets => format!("{prefix}[]"),
                    ArrayFormat::Indices => format!("{prefix}[{index}]"),
                };
                encode_pairs(&key, item, format, out);
            }
        }
        Value::Null => out.push(format!("{prefix}=")),
        Value::String(s) => out.push(format!("{prefix}={}", urlencoding::encode(s))),
        scalar => out.push(format!(
            "{prefix}={}",
            urlencoding::encode(&scalar.to_string())
        )),
    }
}

fn decoded_key(pair: &str) -> String {
    url::form_urlencoded::parse(pair.as_bytes())
        .next()
        .map(|(key, _)| key.into_owned())
        .unwrap_or_default()
}

fn root_key(key: &str) -> &str {
    key.split('[').next().unwrap_or(key)
}

/// True for hrefs like `https://host/...`.
fn has_scheme(href: &str) -> bool {
    let Some((scheme, _)) = href.split_once("://") else {
        return false;
    };

    let mut chars = scheme.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}
