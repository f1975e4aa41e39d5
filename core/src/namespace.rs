//! Namespace scopes.
//!
//! A [`NamespaceScope`] is a bidirectional prefix <-> URI table. Every
//! compilation builds one from the model's declared and imported
//! namespaces; the registry keeps one per tenant domain and resolves
//! tenant bindings ahead of shared ones.

use crate::{CoreError, CoreResult};
use std::collections::BTreeMap;

/// Maps short prefixes to namespace URIs and back.
pub trait PrefixResolver {
    /// The URI bound to `prefix`, if any.
    fn namespace_uri(&self, prefix: &str) -> Option<String>;

    /// Every prefix bound to `uri`, in binding order.
    fn prefixes(&self, uri: &str) -> Vec<String>;

    /// Whether any prefix is bound to `uri`.
    fn knows_uri(&self, uri: &str) -> bool {
        !self.prefixes(uri).is_empty()
    }
}

/// A prefix <-> URI table.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceScope {
    /// Prefix to URI.
    uris: BTreeMap<String, String>,
    /// URI to prefixes, in binding order.
    prefixes: BTreeMap<String, Vec<String>>,
}

impl NamespaceScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind `prefix` to `uri`.
    ///
    /// Re-binding the same pair is a no-op; binding a prefix that already
    /// maps to another URI is a [`CoreError::PrefixClash`].
    pub fn bind(&mut self, prefix: impl Into<String>, uri: impl Into<String>) -> CoreResult<()> {
        let prefix = prefix.into();
        let uri = uri.into();

        if let Some(existing) = self.uris.get(&prefix) {
            if *existing == uri {
                return Ok(());
            }
            return Err(CoreError::prefix_clash(prefix, existing.clone(), uri));
        }

        self.prefixes
            .entry(uri.clone())
            .or_default()
            .push(prefix.clone());
        self.uris.insert(prefix, uri);
        Ok(())
    }

    /// Check whether `prefix` could be bound to `uri` without a clash.
    pub fn check_bind(&self, prefix: &str, uri: &str) -> CoreResult<()> {
        match self.uris.get(prefix) {
            Some(existing) if existing != uri => {
                Err(CoreError::prefix_clash(prefix, existing.clone(), uri))
            }
            _ => Ok(()),
        }
    }

    /// Remove a URI and every prefix bound to it.
    pub fn unbind_uri(&mut self, uri: &str) {
        if let Some(prefixes) = self.prefixes.remove(uri) {
            for prefix in prefixes {
                self.uris.remove(&prefix);
            }
        }
    }
}

impl PrefixResolver for NamespaceScope {
    fn namespace_uri(&self, prefix: &str) -> Option<String> {
        self.uris.get(prefix).cloned()
    }

    fn prefixes(&self, uri: &str) -> Vec<String> {
        self.prefixes.get(uri).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bind_and_lookup() {
        // GIVEN
        let mut scope = NamespaceScope::new();

        // WHEN
        scope.bind("d", "urn:dictionary").unwrap();
        scope.bind("dict", "urn:dictionary").unwrap();

        // THEN both prefixes resolve and are listed in binding order
        assert_eq!(scope.namespace_uri("d").as_deref(), Some("urn:dictionary"));
        assert_eq!(scope.prefixes("urn:dictionary"), vec!["d", "dict"]);
        assert!(scope.knows_uri("urn:dictionary"));
    }

    #[test]
    fn test_rebind_same_pair_is_noop() {
        let mut scope = NamespaceScope::new();
        scope.bind("d", "urn:dictionary").unwrap();
        scope.bind("d", "urn:dictionary").unwrap();

        assert_eq!(scope.prefixes("urn:dictionary"), vec!["d"]);
    }

    #[test]
    fn test_prefix_clash() {
        // GIVEN d bound to one uri
        let mut scope = NamespaceScope::new();
        scope.bind("d", "urn:one").unwrap();

        // WHEN binding d to another uri
        let result = scope.bind("d", "urn:two");

        // THEN the clash is reported and the original binding survives
        assert!(matches!(result, Err(CoreError::PrefixClash { .. })));
        assert!(scope.check_bind("d", "urn:two").is_err());
        assert_eq!(scope.namespace_uri("d").as_deref(), Some("urn:one"));
    }

    #[test]
    fn test_unbind_uri_removes_all_prefixes() {
        let mut scope = NamespaceScope::new();
        scope.bind("a", "urn:x").unwrap();
        scope.bind("b", "urn:x").unwrap();
        scope.bind("c", "urn:y").unwrap();

        scope.unbind_uri("urn:x");

        assert_eq!(scope.namespace_uri("a"), None);
        assert_eq!(scope.namespace_uri("b"), None);
        assert_eq!(scope.namespace_uri("c").as_deref(), Some("urn:y"));
        assert!(!scope.knows_uri("urn:x"));
    }
}
