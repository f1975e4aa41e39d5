//! Registry configuration.

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistryConfig {
    /// Domain whose models every tenant sees unless it overrides them.
    pub shared_domain: String,
    /// Rebuild a missing tenant cache from the store on first read.
    pub lazy_reinit: bool,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            shared_domain: String::new(),
            lazy_reinit: true,
        }
    }
}

impl RegistryConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_shared_domain(mut self, domain: impl Into<String>) -> Self {
        self.shared_domain = domain.into();
        self
    }

    pub fn with_lazy_reinit(mut self, lazy_reinit: bool) -> Self {
        self.lazy_reinit = lazy_reinit;
        self
    }
}
