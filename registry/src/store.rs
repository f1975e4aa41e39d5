//! Persistent model store boundary.

use crate::{RegistryError, RegistryResult};
use dictum_core::{RawModel, RawModelSource};
use parking_lot::RwLock;
use std::collections::HashMap;

/// Enumerates the active model descriptors of a domain.
///
/// The order of the returned descriptors carries no meaning; the registry
/// sorts them by import dependencies itself.
pub trait ModelStore: Send + Sync {
    fn active_models(&self, domain: &str) -> RegistryResult<Vec<RawModel>>;
}

/// A store held in memory, keyed by domain and model name.
#[derive(Debug, Default)]
pub struct InMemoryModelStore {
    domains: RwLock<HashMap<String, Vec<RawModel>>>,
}

impl InMemoryModelStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Save a descriptor, replacing any with the same name.
    pub fn save(&self, domain: &str, model: RawModel) {
        let mut domains = self.domains.write();
        let models = domains.entry(domain.to_string()).or_default();
        models.retain(|m| m.name != model.name);
        models.push(model);
    }

    /// Parse `bytes` with `source` and save the result.
    pub fn load(
        &self,
        domain: &str,
        source: &dyn RawModelSource,
        bytes: &[u8],
    ) -> RegistryResult<String> {
        let model = source.parse(bytes)?;
        let name = model.name.clone();
        self.save(domain, model);
        Ok(name)
    }

    /// Delete a descriptor by its `prefix:local` name.
    pub fn delete(&self, domain: &str, name: &str) -> RegistryResult<()> {
        let mut domains = self.domains.write();
        let models = domains
            .get_mut(domain)
            .ok_or_else(|| RegistryError::store(format!("unknown domain '{}'", domain)))?;
        let before = models.len();
        models.retain(|m| m.name != name);
        if models.len() == before {
            return Err(RegistryError::store(format!(
                "no model '{}' in domain '{}'",
                name, domain
            )));
        }
        Ok(())
    }
}

impl ModelStore for InMemoryModelStore {
    fn active_models(&self, domain: &str) -> RegistryResult<Vec<RawModel>> {
        Ok(self
            .domains
            .read()
            .get(domain)
            .cloned()
            .unwrap_or_default())
    }
}
