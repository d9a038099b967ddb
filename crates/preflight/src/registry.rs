//! Check registry - maps identifiers to check capabilities

use crate::check::{BoxedCheck, Check};
use std::collections::BTreeMap;

/// Registration table built once at startup
#[derive(Default)]
pub struct CheckRegistry {
    checks: BTreeMap<String, BoxedCheck>,
}

impl CheckRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a capability, replacing any previous one for `id`
    pub fn register(&mut self, id: impl Into<String>, check: BoxedCheck) {
        let id = id.into();
        if self.checks.insert(id.clone(), check).is_some() {
            log::debug!("replaced check capability for {id}");
        }
    }

    /// Builder-style variant of [`register`](Self::register)
    pub fn with(mut self, id: impl Into<String>, check: BoxedCheck) -> Self {
        self.register(id, check);
        self
    }

    /// Look up a capability. Unknown identifiers resolve to `None`.
    pub fn resolve(&self, id: &str) -> Option<&dyn Check> {
        self.checks.get(id).map(|c| c.as_ref())
    }

    /// Check if a capability is registered
    pub fn contains(&self, id: &str) -> bool {
        self.checks.contains_key(id)
    }

    /// Registered identifiers, sorted
    pub fn ids(&self) -> Vec<&str> {
        self.checks.keys().map(String::as_str).collect()
    }

    /// Number of registered capabilities
    pub fn len(&self) -> usize {
        self.checks.len()
    }

    /// Check if nothing is registered
    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}
