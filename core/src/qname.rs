//! Qualified names.
//!
//! A QName is a (namespace URI, local name) pair and the identity of every
//! schema element. Two text forms are understood:
//! - `{uri}local` (Clark notation, self-contained)
//! - `prefix:local` (needs a [`PrefixResolver`] to map the prefix)

use crate::{CoreError, CoreResult, PrefixResolver};
use std::fmt;
use std::str::FromStr;

/// Separator between prefix and local name in the short form.
pub const PREFIX_SEPARATOR: char = ':';

/// A namespace-qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QName {
    namespace_uri: String,
    local_name: String,
}

impl QName {
    /// Create a QName from its parts.
    pub fn new(namespace_uri: impl Into<String>, local_name: impl Into<String>) -> Self {
        Self {
            namespace_uri: namespace_uri.into(),
            local_name: local_name.into(),
        }
    }

    /// The namespace URI.
    pub fn namespace_uri(&self) -> &str {
        &self.namespace_uri
    }

    /// The local name.
    pub fn local_name(&self) -> &str {
        &self.local_name
    }

    /// A sibling name in the same namespace.
    pub fn with_local_name(&self, local_name: impl Into<String>) -> Self {
        Self::new(self.namespace_uri.clone(), local_name)
    }

    /// Resolve `prefix:local`, `{uri}local` or a bare `local` (default namespace).
    pub fn resolve(text: &str, resolver: &dyn PrefixResolver) -> CoreResult<Self> {
        let text = text.trim();
        if text.starts_with('{') {
            return text.parse();
        }

        let (prefix, local) = match text.split_once(PREFIX_SEPARATOR) {
            Some((prefix, local)) => (prefix, local),
            None => ("", text),
        };
        if local.is_empty() || local.contains(PREFIX_SEPARATOR) {
            return Err(CoreError::invalid_qname(text));
        }

        match resolver.namespace_uri(prefix) {
            Some(uri) => Ok(Self::new(uri, local)),
            // An unbound empty prefix means "no namespace"
            None if prefix.is_empty() => Ok(Self::new("", local)),
            None => Err(CoreError::unknown_prefix(prefix, text)),
        }
    }
}

impl fmt::Display for QName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{{}}}{}", self.namespace_uri, self.local_name)
    }
}

impl FromStr for QName {
    type Err = CoreError;

    /// Parse Clark notation: `{uri}local`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let rest = s
            .strip_prefix('{')
            .ok_or_else(|| CoreError::invalid_qname(s))?;
        let (uri, local) = rest
            .split_once('}')
            .ok_or_else(|| CoreError::invalid_qname(s))?;
        if local.is_empty() {
            return Err(CoreError::invalid_qname(s));
        }
        Ok(Self::new(uri, local))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::NamespaceScope;

    fn scope() -> NamespaceScope {
        let mut scope = NamespaceScope::new();
        scope.bind("test", "http://example.com/test").unwrap();
        scope
    }

    #[test]
    fn test_resolve_prefixed_name() {
        // GIVEN a scope binding test -> http://example.com/test
        let scope = scope();

        // WHEN resolving "test:base"
        let qname = QName::resolve("test:base", &scope).unwrap();

        // THEN the uri and local name are split out
        assert_eq!(qname.namespace_uri(), "http://example.com/test");
        assert_eq!(qname.local_name(), "base");
    }

    #[test]
    fn test_resolve_unknown_prefix() {
        // GIVEN an empty scope
        let scope = NamespaceScope::new();

        // WHEN resolving a prefixed name
        let result = QName::resolve("nope:base", &scope);

        // THEN the prefix is reported
        assert!(matches!(result, Err(CoreError::UnknownPrefix { prefix, .. }) if prefix == "nope"));
    }

    #[test]
    fn test_clark_notation_round_trip() {
        let qname = QName::new("http://example.com/test", "base");

        let text = qname.to_string();
        let parsed: QName = text.parse().unwrap();

        assert_eq!(text, "{http://example.com/test}base");
        assert_eq!(parsed, qname);
    }

    #[test]
    fn test_clark_notation_in_resolve() {
        let qname = QName::resolve("{urn:x}y", &NamespaceScope::new()).unwrap();
        assert_eq!(qname, QName::new("urn:x", "y"));
    }

    #[test]
    fn test_bare_local_name_uses_default_namespace() {
        let qname = QName::resolve("plain", &NamespaceScope::new()).unwrap();
        assert_eq!(qname, QName::new("", "plain"));
    }

    #[test]
    fn test_invalid_names() {
        let scope = scope();
        assert!(QName::resolve("test:", &scope).is_err());
        assert!(QName::resolve("a:b:c", &scope).is_err());
        assert!("{unterminated".parse::<QName>().is_err());
        assert!("{urn:x}".parse::<QName>().is_err());
    }
}
