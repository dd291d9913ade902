//! Protocol headers attached to direct prefetch requests.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use uuid::Uuid;

use crate::cache::PURPOSE_HEADER;

pub const ACCEPT: &str = "text/html, application/xhtml+xml";
pub const X_INERTIA: &str = "X-Inertia";
pub const X_INERTIA_VERSION: &str = "X-Inertia-Version";
pub const X_MODAL: &str = "X-InertiaUI-Modal";
pub const X_MODAL_USE_ROUTER: &str = "X-InertiaUI-Modal-Use-Router";
pub const X_MODAL_BASE_URL: &str = "X-InertiaUI-Modal-Base-Url";

/// Prefix of generated modal ids.
pub const MODAL_ID_PREFIX: &str = "inertiaui_modal_";

/// Builds the protocol header set.
///
/// `version` and `base_url` are left out when unknown.
pub fn protocol_headers(
    version: Option<&str>,
    base_url: Option<&str>,
    modal_id: &str,
    use_router: bool,
    purpose: Option<&str>,
) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    headers.insert("Accept".to_string(), ACCEPT.to_string());
    headers.insert(X_INERTIA.to_string(), "true".to_string());
    headers.insert(X_MODAL.to_string(), modal_id.to_string());
    headers.insert(
        X_MODAL_USE_ROUTER.to_string(),
        if use_router { "1" } else { "0" }.to_string(),
    );

    if let Some(version) = version {
        headers.insert(X_INERTIA_VERSION.to_string(), version.to_string());
    }
    if let Some(base_url) = base_url {
        headers.insert(X_MODAL_BASE_URL.to_string(), base_url.to_string());
    }
    if let Some(purpose) = purpose {
        headers.insert(PURPOSE_HEADER.to_string(), purpose.to_string());
    }

    headers
}

type IdFn = Arc<dyn Fn() -> String + Send + Sync>;

/// Source of modal ids: random UUIDs unless a custom generator is installed.
#[derive(Clone, Default)]
pub struct ModalIdGenerator {
    custom: Option<IdFn>,
}

impl ModalIdGenerator {
    /// Uses `generate` for every id instead of the UUID default.
    pub fn using<F>(generate: F) -> Self
    where
        F: Fn() -> String + Send + Sync + 'static,
    {
        Self {
            custom: Some(Arc::new(generate)),
        }
    }

    pub fn generate(&self) -> String {
        match &self.custom {
            Some(generate) => generate(),
            None => format!("{MODAL_ID_PREFIX}{}", Uuid::new_v4()),
        }
    }
}

impl fmt::Debug for ModalIdGenerator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModalIdGenerator")
            .field("custom", &self.custom.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_protocol_headers_full() {
        let headers = protocol_headers(
            Some("abc123"),
            Some("https://app.test"),
            "modal-1",
            false,
            Some("prefetch"),
        );

        assert_eq!(headers["Accept"], "text/html, application/xhtml+xml");
        assert_eq!(headers["X-Inertia"], "true");
        assert_eq!(headers["X-Inertia-Version"], "abc123");
        assert_eq!(headers["X-InertiaUI-Modal"], "modal-1");
        assert_eq!(headers["X-InertiaUI-Modal-Use-Router"], "0");
        assert_eq!(headers["X-InertiaUI-Modal-Base-Url"], "https://app.test");
        assert_eq!(headers["Purpose"], "prefetch");
    }

    #[test]
    fn test_protocol_headers_minimal() {
        let headers = protocol_headers(None, None, "modal-1", true, None);

        assert_eq!(headers["X-InertiaUI-Modal-Use-Router"], "1");
        assert!(!headers.contains_key("X-Inertia-Version"));
        assert!(!headers.contains_key("X-InertiaUI-Modal-Base-Url"));
        assert!(!headers.contains_key("Purpose"));
    }

    #[test]
    fn test_default_ids_are_prefixed_and_unique() {
        let ids = ModalIdGenerator::default();
        let a = ids.generate();
        let b = ids.generate();

        assert!(a.starts_with(MODAL_ID_PREFIX));
        assert_ne!(a, b);
    }

    #[test]
    fn test_custom_generator() {
        let counter = Arc::new(AtomicUsize::new(0));
        let handle = counter.clone();
        let ids = ModalIdGenerator::using(move || {
            format!("modal-{}", handle.fetch_add(1, Ordering::SeqCst))
        });

        assert_eq!(ids.generate(), "modal-0");
        assert_eq!(ids.clone().generate(), "modal-1");
    }
}
