//! Property-Based Tests for Cache Module
//!
//! Uses proptest to check request identity and store invariants.

use proptest::prelude::*;
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::cache::{normalize_tags, CacheEntry, CacheKey, CacheStore, PrefetchCache, TagSet};
use crate::prefetch::PrefetchResponse;

// == Strategies ==
/// Generates arbitrary JSON payloads (nested objects and arrays)
fn json_strategy() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9 ]{0,12}".prop_map(Value::String),
    ];

    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<String, Value>>())),
        ]
    })
}

fn method_strategy() -> impl Strategy<Value = String> {
    prop::sample::select(vec!["get", "GET", "post", "Put", "patch", "delete"])
        .prop_map(String::from)
}

fn url_strategy() -> impl Strategy<Value = String> {
    "/[a-z]{1,8}(/[a-z0-9]{1,4})?".prop_map(|s| s)
}

fn headers_strategy() -> impl Strategy<Value = BTreeMap<String, String>> {
    prop::collection::btree_map("X-[A-Za-z]{1,8}", "[a-z0-9]{0,8}", 0..3)
}

fn tags_strategy() -> impl Strategy<Value = Vec<String>> {
    prop::collection::vec(prop::sample::select(vec!["a", "b", "c", "d"]).prop_map(String::from), 0..3)
}

fn response(url: &str) -> Arc<PrefetchResponse> {
    Arc::new(PrefetchResponse::new(200, url, "body"))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // Equivalence is symmetric and reflexive for any request parts.
    #[test]
    fn prop_equivalence_symmetric(
        method in method_strategy(),
        url in url_strategy(),
        data_a in json_strategy(),
        data_b in json_strategy(),
        headers in headers_strategy(),
    ) {
        let a = CacheKey::new(&method, &url, &data_a, &headers);
        let b = CacheKey::new(&method, &url, &data_b, &headers);

        prop_assert_eq!(a == b, b == a);
        prop_assert_eq!(a.clone(), a);
    }

    // Adding a Purpose header, in any casing, never changes identity.
    #[test]
    fn prop_purpose_header_invariance(
        method in method_strategy(),
        url in url_strategy(),
        data in json_strategy(),
        headers in headers_strategy(),
        purpose_name in prop::sample::select(vec!["Purpose", "purpose", "PURPOSE"]),
        purpose_value in "[a-z]{1,10}",
    ) {
        let plain = CacheKey::new(&method, &url, &data, &headers);

        let mut with_purpose = headers.clone();
        with_purpose.insert(purpose_name.to_string(), purpose_value);
        let tagged = CacheKey::new(&method, &url, &data, &with_purpose);

        prop_assert_eq!(plain, tagged);
    }

    // Keys are equal exactly when the canonical payloads are equal.
    #[test]
    fn prop_payload_drives_identity(
        url in url_strategy(),
        data_a in json_strategy(),
        data_b in json_strategy(),
    ) {
        let headers = BTreeMap::new();
        let a = CacheKey::new("post", &url, &data_a, &headers);
        let b = CacheKey::new("post", &url, &data_b, &headers);

        let empty = |v: &Value| v.is_null() || v.as_object().is_some_and(|m| m.is_empty());
        let same_payload = data_a == data_b || (empty(&data_a) && empty(&data_b));
        prop_assert_eq!(a == b, same_payload);
    }

    // Setting the same key twice keeps exactly one entry holding the newer value.
    #[test]
    fn prop_overwrite_semantics(
        url in url_strategy(),
        data in json_strategy(),
        headers in headers_strategy(),
    ) {
        let mut store = CacheStore::new();
        let key = CacheKey::new("get", &url, &data, &headers);

        store.set(key.clone(), CacheEntry::new(response("first"), TagSet::new()));
        store.set(key.clone(), CacheEntry::new(response("second"), TagSet::new()));

        prop_assert_eq!(store.size(), 1);
        prop_assert_eq!(store.get(&key).unwrap().response.url.as_str(), "second");
    }

    // Tag invalidation removes exactly the entries whose tags intersect.
    #[test]
    fn prop_tag_invalidation(
        entries in prop::collection::btree_map(url_strategy(), tags_strategy(), 1..12),
        target in tags_strategy(),
    ) {
        let cache = PrefetchCache::new();
        let headers = BTreeMap::new();
        let target_set = normalize_tags(target.clone());

        for (url, tags) in &entries {
            let key = CacheKey::new("get", url, &Value::Null, &headers);
            cache.set(key, CacheEntry::new(response(url), normalize_tags(tags.clone())));
        }

        let expected_removed = entries
            .values()
            .filter(|tags| tags.iter().any(|t| target_set.contains(t)))
            .count();

        let removed = cache.invalidate(target);
        prop_assert_eq!(removed, expected_removed);
        prop_assert_eq!(cache.size(), entries.len() - expected_removed);

        for (_, entry) in cache.entries() {
            prop_assert!(!entry.has_any_tag(&target_set));
        }
    }
}
