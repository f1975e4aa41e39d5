//! Per-domain cache entries and the layered view over them.

use crate::{RegistryError, RegistryResult};
use dictum_compiler::{
    AssociationDef, ClassDef, ClassKind, CompiledModel, ConstraintDef, DataTypeDef, ModelQuery,
    PropertyDef,
};
use dictum_core::{NamespaceScope, PrefixResolver, QName};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;

/// The compiled models of one tenant domain.
#[derive(Debug, Clone, Default)]
pub(crate) struct TenantEntry {
    pub(crate) models: BTreeMap<QName, Arc<CompiledModel>>,
    /// Declared and imported namespace URI to the models using it.
    uri_to_models: BTreeMap<String, Vec<Arc<CompiledModel>>>,
    /// Prefixes of every declared namespace.
    namespaces: NamespaceScope,
    /// Bumped on every structural change.
    pub(crate) generation: u64,
}

impl TenantEntry {
    pub(crate) fn empty(generation: u64) -> Self {
        Self {
            generation,
            ..Self::default()
        }
    }

    /// Check that `model` can take its declared namespaces here.
    ///
    /// A model replacing an earlier version of itself may keep or change
    /// the namespaces that version declared.
    pub(crate) fn check_namespaces(&self, model: &CompiledModel) -> RegistryResult<()> {
        let name = model.name();
        let mut scope = self.namespaces.clone();
        if let Some(previous) = self.models.get(name) {
            for ns in &previous.model_def.namespaces {
                scope.unbind_uri(&ns.uri);
            }
        }

        for ns in &model.model_def.namespaces {
            let owner = self
                .models
                .values()
                .find(|other| other.name() != name && other.model_def.declares(&ns.uri));
            if let Some(owner) = owner {
                return Err(RegistryError::namespace(
                    name.clone(),
                    format!(
                        "namespace '{}' is already declared by model '{}'",
                        ns.uri,
                        owner.name()
                    ),
                ));
            }
            scope
                .check_bind(&ns.prefix, &ns.uri)
                .map_err(|e| RegistryError::namespace(name.clone(), e.to_string()))?;
        }
        Ok(())
    }

    /// Register `model`, replacing any model of the same name.
    ///
    /// Nothing changes if a declared prefix clashes.
    pub(crate) fn register(&mut self, model: Arc<CompiledModel>) -> RegistryResult<()> {
        let name = model.name().clone();
        let saved_namespaces = self.namespaces.clone();
        let previous = self.unregister(&name);

        let mut scope = self.namespaces.clone();
        for ns in &model.model_def.namespaces {
            if let Err(e) = scope.bind(ns.prefix.as_str(), ns.uri.as_str()) {
                if let Some(previous) = previous {
                    self.restore(previous, saved_namespaces);
                }
                return Err(RegistryError::namespace(name, e.to_string()));
            }
        }
        self.namespaces = scope;

        let uris = model
            .model_def
            .namespaces
            .iter()
            .chain(&model.model_def.imports)
            .map(|ns| ns.uri.clone());
        for uri in uris {
            let models = self.uri_to_models.entry(uri).or_default();
            if !models.iter().any(|m| m.name() == &name) {
                models.push(model.clone());
            }
        }

        self.models.insert(name, model);
        Ok(())
    }

    /// Remove a model and every namespace mapping it contributed.
    pub(crate) fn unregister(&mut self, name: &QName) -> Option<Arc<CompiledModel>> {
        let model = self.models.remove(name)?;
        for ns in &model.model_def.namespaces {
            self.namespaces.unbind_uri(&ns.uri);
        }
        self.uri_to_models.retain(|_, models| {
            models.retain(|m| m.name() != name);
            !models.is_empty()
        });
        Some(model)
    }

    /// Put back a model that was registered before, with the scope it was
    /// registered under.
    fn restore(&mut self, model: Arc<CompiledModel>, namespaces: NamespaceScope) {
        self.namespaces = namespaces;
        let uris = model
            .model_def
            .namespaces
            .iter()
            .chain(&model.model_def.imports)
            .map(|ns| ns.uri.clone());
        for uri in uris {
            self.uri_to_models.entry(uri).or_default().push(model.clone());
        }
        self.models.insert(model.name().clone(), model);
    }
}

/// The shared entry with an optional tenant entry layered over it.
#[derive(Clone, Copy, Default)]
pub(crate) struct Layers<'a> {
    pub(crate) shared: Option<&'a TenantEntry>,
    pub(crate) tenant: Option<&'a TenantEntry>,
}

impl Layers<'_> {
    pub(crate) fn model(&self, name: &QName) -> Option<Arc<CompiledModel>> {
        self.tenant
            .and_then(|t| t.models.get(name))
            .or_else(|| self.shared.and_then(|s| s.models.get(name)))
            .cloned()
    }

    /// Every visible model; tenant models replace shared models of the same name.
    pub(crate) fn all_models(&self) -> BTreeMap<QName, Arc<CompiledModel>> {
        let mut models = self
            .shared
            .map(|s| s.models.clone())
            .unwrap_or_default();
        if let Some(tenant) = self.tenant {
            models.extend(tenant.models.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        models
    }

    /// The models mapped to `uri`, shared first, minus those the tenant replaces.
    pub(crate) fn models_for_uri(&self, uri: &str) -> Vec<Arc<CompiledModel>> {
        let mut merged = Vec::new();
        if let Some(shared) = self.shared.and_then(|s| s.uri_to_models.get(uri)) {
            merged.extend(
                shared
                    .iter()
                    .filter(|m| !self.tenant.is_some_and(|t| t.models.contains_key(m.name())))
                    .cloned(),
            );
        }
        if let Some(tenant) = self.tenant.and_then(|t| t.uri_to_models.get(uri)) {
            merged.extend(tenant.iter().cloned());
        }
        merged
    }

    fn find<T>(
        &self,
        name: &QName,
        lookup: impl Fn(&CompiledModel) -> Option<&Arc<T>>,
    ) -> Option<Arc<T>> {
        self.models_for_uri(name.namespace_uri())
            .iter()
            .rev()
            .find_map(|model| lookup(model.as_ref()).cloned())
    }

    /// Whether `sub` is `sup` or descends from it.
    ///
    /// Unknown names and a type compared with an aspect give false.
    pub(crate) fn is_sub_class(&self, sub: &QName, sup: &QName) -> bool {
        let (Some(class), Some(target)) = (self.get_class(sub), self.get_class(sup)) else {
            return false;
        };
        if class.kind != target.kind {
            return false;
        }
        let mut seen = HashSet::new();
        let mut current = Some(class);
        while let Some(class) = current {
            if class.name == *sup {
                return true;
            }
            if !seen.insert(class.name.clone()) {
                break;
            }
            current = class.parent.as_ref().and_then(|p| self.get_class(p));
        }
        false
    }

    /// Classes of `kind` below `name`: direct children, or with `follow`
    /// every descendant including `name` itself.
    pub(crate) fn sub_classes(&self, name: &QName, kind: ClassKind, follow: bool) -> BTreeSet<QName> {
        let mut found = BTreeSet::new();
        for model in self.all_models().values() {
            let classes = match kind {
                ClassKind::Type => &model.types,
                ClassKind::Aspect => &model.aspects,
            };
            for class in classes.values() {
                let matches = if follow {
                    self.is_sub_class(&class.name, name)
                } else {
                    class.parent.as_ref() == Some(name)
                };
                if matches {
                    found.insert(class.name.clone());
                }
            }
        }
        found
    }
}

impl ModelQuery for Layers<'_> {
    fn get_data_type(&self, name: &QName) -> Option<Arc<DataTypeDef>> {
        self.find(name, |m| m.data_types.get(name))
    }

    fn get_class(&self, name: &QName) -> Option<Arc<ClassDef>> {
        self.find(name, |m| m.classes.get(name))
    }

    fn get_property(&self, name: &QName) -> Option<Arc<PropertyDef>> {
        self.find(name, |m| m.properties.get(name))
    }

    fn get_association(&self, name: &QName) -> Option<Arc<AssociationDef>> {
        self.find(name, |m| m.associations.get(name))
    }

    fn get_constraint(&self, name: &QName) -> Option<Arc<ConstraintDef>> {
        self.find(name, |m| m.constraints.get(name))
    }
}

impl PrefixResolver for Layers<'_> {
    fn namespace_uri(&self, prefix: &str) -> Option<String> {
        self.tenant
            .and_then(|t| t.namespaces.namespace_uri(prefix))
            .or_else(|| self.shared.and_then(|s| s.namespaces.namespace_uri(prefix)))
    }

    fn prefixes(&self, uri: &str) -> Vec<String> {
        let mut prefixes = self
            .tenant
            .map(|t| t.namespaces.prefixes(uri))
            .unwrap_or_default();
        if let Some(shared) = self.shared {
            for prefix in shared.namespaces.prefixes(uri) {
                if !prefixes.contains(&prefix) {
                    prefixes.push(prefix);
                }
            }
        }
        prefixes
    }
}

/// A point-in-time copy of what one domain sees.
///
/// Snapshots are detached from the registry: later registrations do not
/// show up in them. They answer model queries and prefix lookups, so a
/// model can be compiled against one without holding any lock.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    domain: String,
    shared: Option<TenantEntry>,
    tenant: Option<TenantEntry>,
}

impl RegistrySnapshot {
    pub(crate) fn new(
        domain: impl Into<String>,
        shared: Option<TenantEntry>,
        tenant: Option<TenantEntry>,
    ) -> Self {
        Self {
            domain: domain.into(),
            shared,
            tenant,
        }
    }

    /// The domain the snapshot was taken for.
    pub fn domain(&self) -> &str {
        &self.domain
    }

    pub(crate) fn layers(&self) -> Layers<'_> {
        Layers {
            shared: self.shared.as_ref(),
            tenant: self.tenant.as_ref(),
        }
    }

    pub(crate) fn generations(&self) -> (Option<u64>, Option<u64>) {
        (
            self.shared.as_ref().map(|e| e.generation),
            self.tenant.as_ref().map(|e| e.generation),
        )
    }

    /// Hide a model from both layers.
    pub(crate) fn excluding(mut self, name: &QName) -> Self {
        if let Some(shared) = self.shared.as_mut() {
            shared.unregister(name);
        }
        if let Some(tenant) = self.tenant.as_mut() {
            tenant.unregister(name);
        }
        self
    }

    /// A visible model by name.
    pub fn model(&self, name: &QName) -> Option<Arc<CompiledModel>> {
        self.layers().model(name)
    }

    /// Names of every visible model.
    pub fn model_names(&self) -> BTreeSet<QName> {
        self.layers().all_models().into_keys().collect()
    }

    pub fn is_sub_class(&self, sub: &QName, sup: &QName) -> bool {
        self.layers().is_sub_class(sub, sup)
    }
}

impl ModelQuery for RegistrySnapshot {
    fn get_data_type(&self, name: &QName) -> Option<Arc<DataTypeDef>> {
        self.layers().get_data_type(name)
    }

    fn get_class(&self, name: &QName) -> Option<Arc<ClassDef>> {
        self.layers().get_class(name)
    }

    fn get_property(&self, name: &QName) -> Option<Arc<PropertyDef>> {
        self.layers().get_property(name)
    }

    fn get_association(&self, name: &QName) -> Option<Arc<AssociationDef>> {
        self.layers().get_association(name)
    }

    fn get_constraint(&self, name: &QName) -> Option<Arc<ConstraintDef>> {
        self.layers().get_constraint(name)
    }
}

impl PrefixResolver for RegistrySnapshot {
    fn namespace_uri(&self, prefix: &str) -> Option<String> {
        self.layers().namespace_uri(prefix)
    }

    fn prefixes(&self, uri: &str) -> Vec<String> {
        self.layers().prefixes(uri)
    }
}
