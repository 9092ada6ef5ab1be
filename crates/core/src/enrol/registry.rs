//! Registry of installed enrolment methods, keyed by tag.

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use enrol_common::config::EnrolConfig;
use regex::Regex;

use super::method::EnrolMethod;

static METHOD_NAME_RE: LazyLock<Regex> = LazyLock::new(|| {
    #[allow(clippy::expect_used)]
    Regex::new(r"^[a-z][a-z0-9_]*$").expect("valid regex")
});

/// Whether `name` is a well-formed method tag.
#[must_use]
pub fn is_valid_method_name(name: &str) -> bool {
    METHOD_NAME_RE.is_match(name)
}

/// Installed enrolment methods and the site-wide enabled subset.
///
/// Built once at startup; lookups never touch storage.
#[derive(Clone, Default)]
pub struct EnrolRegistry {
    methods: BTreeMap<&'static str, Arc<dyn EnrolMethod>>,
    enabled: Vec<String>,
}

impl EnrolRegistry {
    /// Empty registry with the given enabled tags, in display order.
    #[must_use]
    pub fn new(enabled: Vec<String>) -> Self {
        Self {
            methods: BTreeMap::new(),
            enabled,
        }
    }

    /// Empty registry taking the enabled tags from configuration.
    #[must_use]
    pub fn from_config(config: &EnrolConfig) -> Self {
        Self::new(config.enabled_methods.clone())
    }

    /// Install a method. A later method with the same tag replaces the earlier.
    pub fn register(&mut self, method: Arc<dyn EnrolMethod>) {
        let name = method.name();
        if !is_valid_method_name(name) {
            tracing::warn!(method = name, "Ignoring enrolment method with invalid name");
            return;
        }
        tracing::debug!(method = name, enabled = self.is_enabled(name), "Registered enrolment method");
        self.methods.insert(name, method);
    }

    /// Builder-style [`register`](Self::register).
    #[must_use]
    pub fn with(mut self, method: Arc<dyn EnrolMethod>) -> Self {
        self.register(method);
        self
    }

    /// An installed method, enabled or not.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<dyn EnrolMethod>> {
        self.methods.get(name).cloned()
    }

    /// An installed method that is also enabled site-wide.
    #[must_use]
    pub fn get_enabled(&self, name: &str) -> Option<Arc<dyn EnrolMethod>> {
        if self.is_enabled(name) {
            self.get(name)
        } else {
            None
        }
    }

    /// Whether a tag is enabled site-wide.
    #[must_use]
    pub fn is_enabled(&self, name: &str) -> bool {
        self.enabled.iter().any(|m| m == name)
    }

    /// Installed methods in tag order.
    pub fn installed(&self) -> impl Iterator<Item = &Arc<dyn EnrolMethod>> {
        self.methods.values()
    }
}

impl std::fmt::Debug for EnrolRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnrolRegistry")
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .field("enabled", &self.enabled)
            .finish()
    }
}
