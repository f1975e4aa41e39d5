//! The Registry - tenant-scoped cache of compiled models.

use crate::bootstrap::bootstrap_order;
use crate::entry::{Layers, RegistrySnapshot, TenantEntry};
use crate::{ModelStore, RegistryConfig, RegistryError, RegistryResult, SingleTenant, TenantProvider};
use dictum_compiler::{
    AssociationDef, ClassDef, ClassKind, CompiledModel, Compiler, ConstraintDef, DataTypeDef,
    ModelQuery, PropertyDef,
};
use dictum_core::{NamespaceScope, PrefixResolver, QName, RawModel};
use dictum_diff::{diff, non_incremental, ElementDiff};
use parking_lot::{RwLock, RwLockReadGuard};
use std::collections::{BTreeSet, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Every cached domain plus a clock for entry generations.
#[derive(Debug, Default)]
struct State {
    domains: HashMap<String, TenantEntry>,
    /// Last generation handed out; never reused, even across destroy.
    clock: u64,
}

impl State {
    fn layers<'a>(&'a self, shared: &str, domain: &str) -> Layers<'a> {
        if domain == shared {
            Layers {
                shared: self.domains.get(shared),
                tenant: None,
            }
        } else {
            Layers {
                shared: self.domains.get(shared),
                tenant: self.domains.get(domain),
            }
        }
    }

    fn tick(&mut self) -> u64 {
        self.clock += 1;
        self.clock
    }
}

/// The ModelRegistry compiles, publishes and looks up models per tenant domain.
///
/// Every call is scoped by the domain the [`TenantProvider`] reports. A
/// tenant sees the models of the shared domain unless it registers a model
/// of the same name itself. Compilation runs against a detached
/// [`RegistrySnapshot`]; the write lock is held only to swap the result in.
pub struct ModelRegistry {
    state: RwLock<State>,
    store: Arc<dyn ModelStore>,
    tenants: Arc<dyn TenantProvider>,
    config: RegistryConfig,
    compiler: Compiler,
}

impl fmt::Debug for ModelRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModelRegistry")
            .field("config", &self.config)
            .field("compiler", &self.compiler)
            .finish_non_exhaustive()
    }
}

impl ModelRegistry {
    /// Create a registry that loads domains from `store` and runs every
    /// call in the shared domain.
    pub fn new(store: Arc<dyn ModelStore>) -> Self {
        Self {
            state: RwLock::new(State::default()),
            store,
            tenants: Arc::new(SingleTenant),
            config: RegistryConfig::default(),
            compiler: Compiler::new(),
        }
    }

    pub fn with_tenant_provider(mut self, tenants: Arc<dyn TenantProvider>) -> Self {
        self.tenants = tenants;
        self
    }

    pub fn with_config(mut self, config: RegistryConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_compiler(mut self, compiler: Compiler) -> Self {
        self.compiler = compiler;
        self
    }

    pub fn config(&self) -> &RegistryConfig {
        &self.config
    }

    /// The domain calls are currently scoped to.
    pub fn current_domain(&self) -> String {
        self.tenants
            .current_domain()
            .unwrap_or_else(|| self.config.shared_domain.clone())
    }

    fn is_shared(&self, domain: &str) -> bool {
        domain == self.config.shared_domain
    }

    // ==================== Cache Lifecycle ====================

    fn is_initialized(&self, state: &State, domain: &str) -> bool {
        state.domains.contains_key(&self.config.shared_domain)
            && state.domains.contains_key(domain)
    }

    /// Make sure the shared entry and the entry of `domain` exist.
    fn ensure_initialized(&self, domain: &str) -> RegistryResult<()> {
        if self.is_initialized(&self.state.read(), domain) {
            return Ok(());
        }

        if !self.config.lazy_reinit {
            let mut guard = self.state.write();
            let state = &mut *guard;
            for name in [self.config.shared_domain.as_str(), domain] {
                if !state.domains.contains_key(name) {
                    let generation = state.tick();
                    state
                        .domains
                        .insert(name.to_string(), TenantEntry::empty(generation));
                }
            }
            return Ok(());
        }

        info!(domain, "Model cache missing, reinitializing");
        let shared = self.config.shared_domain.as_str();
        if !self.state.read().domains.contains_key(shared) {
            self.reset_domain(shared)?;
        }
        if !self.is_shared(domain) && !self.state.read().domains.contains_key(domain) {
            self.reset_domain(domain)?;
        }

        if self.is_initialized(&self.state.read(), domain) {
            Ok(())
        } else {
            Err(RegistryError::concurrency(domain))
        }
    }

    /// Rebuild the entry of `domain` from the store and swap it in.
    fn reset_domain(&self, domain: &str) -> RegistryResult<()> {
        let raws = bootstrap_order(self.store.active_models(domain)?)?;
        let shared = if self.is_shared(domain) {
            None
        } else {
            self.state
                .read()
                .domains
                .get(&self.config.shared_domain)
                .cloned()
        };

        let mut fresh = TenantEntry::default();
        for raw in &raws {
            let layers = Layers {
                shared: shared.as_ref(),
                tenant: Some(&fresh),
            };
            let model = self.compiler.compile(raw, &layers, &layers)?;
            if let Some(shared) = shared.as_ref() {
                shared.check_namespaces(&model)?;
            }
            fresh.check_namespaces(&model)?;
            fresh.register(Arc::new(model))?;
        }

        let models = fresh.models.len();
        let mut state = self.state.write();
        fresh.generation = state.tick();
        state.domains.insert(domain.to_string(), fresh);
        info!(domain, models, "Model cache reset");
        Ok(())
    }

    /// Reload the current domain from the store.
    pub fn reset(&self) -> RegistryResult<()> {
        let domain = self.current_domain();
        let shared = self.config.shared_domain.as_str();
        if !self.is_shared(&domain) && !self.state.read().domains.contains_key(shared) {
            self.reset_domain(shared)?;
        }
        self.reset_domain(&domain)
    }

    /// Drop the cache of the current domain.
    ///
    /// The next call rebuilds it from the store when lazy reinitialisation
    /// is enabled.
    pub fn destroy(&self) {
        let domain = self.current_domain();
        let removed = self.state.write().domains.remove(&domain).is_some();
        info!(domain = %domain, removed, "Model cache destroyed");
    }

    // ==================== Registration ====================

    /// Compile `raw` and publish it in the current domain.
    ///
    /// A model of the same name is replaced; on any error the previous
    /// state stays in place.
    pub fn put(&self, raw: &RawModel) -> RegistryResult<QName> {
        let domain = self.current_domain();
        let name = declared_name(raw)?;
        let snapshot = self.snapshot_of(&domain)?.excluding(&name);
        let model = self.compiler.compile(raw, &snapshot, &snapshot)?;
        self.publish(&domain, &snapshot, Arc::new(model))
    }

    fn publish(
        &self,
        domain: &str,
        snapshot: &RegistrySnapshot,
        model: Arc<CompiledModel>,
    ) -> RegistryResult<QName> {
        let name = model.name().clone();
        let mut guard = self.state.write();
        let state = &mut *guard;

        let layers = state.layers(&self.config.shared_domain, domain);
        let current = (
            layers.shared.map(|e| e.generation),
            layers.tenant.map(|e| e.generation),
        );
        if current != snapshot.generations() {
            warn!(domain, model = %name, "Model cache changed during compilation, discarding");
            return Err(RegistryError::stale_snapshot(domain));
        }
        if let (Some(shared), Some(_)) = (layers.shared, layers.tenant) {
            shared.check_namespaces(&model)?;
        }

        let generation = state.clock + 1;
        let entry = state
            .domains
            .get_mut(domain)
            .ok_or_else(|| RegistryError::concurrency(domain))?;
        entry.check_namespaces(&model)?;
        let replaced = entry.models.contains_key(&name);
        entry.register(model)?;
        entry.generation = generation;
        state.clock = generation;

        info!(domain, model = %name, replaced, "Model registered");
        Ok(name)
    }

    /// Unregister a model from the current domain; absent models are ignored.
    pub fn remove(&self, name: &QName) -> RegistryResult<()> {
        let domain = self.current_domain();
        self.ensure_initialized(&domain)?;
        let mut guard = self.state.write();
        let state = &mut *guard;
        let Some(entry) = state.domains.get_mut(&domain) else {
            return Ok(());
        };
        if entry.unregister(name).is_none() {
            debug!(domain = %domain, model = %name, "Model not registered, nothing to remove");
            return Ok(());
        }
        state.clock += 1;
        entry.generation = state.clock;
        info!(domain = %domain, model = %name, "Model removed");
        Ok(())
    }

    // ==================== Snapshots ====================

    fn snapshot_of(&self, domain: &str) -> RegistryResult<RegistrySnapshot> {
        let state = self.read_state(domain)?;
        let layers = state.layers(&self.config.shared_domain, domain);
        Ok(RegistrySnapshot::new(
            domain,
            layers.shared.cloned(),
            layers.tenant.cloned(),
        ))
    }

    /// A detached copy of what the current domain sees.
    pub fn snapshot(&self) -> RegistryResult<RegistrySnapshot> {
        self.snapshot_of(&self.current_domain())
    }

    /// Read access to an initialized cache for `domain`.
    fn read_state(&self, domain: &str) -> RegistryResult<RwLockReadGuard<'_, State>> {
        self.ensure_initialized(domain)?;
        self.initialized_state(domain)
    }

    /// Fails with a retryable error if the cache of `domain` was destroyed
    /// after it was initialized.
    fn initialized_state(&self, domain: &str) -> RegistryResult<RwLockReadGuard<'_, State>> {
        let state = self.state.read();
        if !self.is_initialized(&state, domain) {
            return Err(RegistryError::concurrency(domain));
        }
        Ok(state)
    }

    fn read<T>(&self, f: impl FnOnce(Layers<'_>) -> T) -> RegistryResult<T> {
        let domain = self.current_domain();
        let state = self.read_state(&domain)?;
        Ok(f(state.layers(&self.config.shared_domain, &domain)))
    }

    fn lookup<T>(
        &self,
        kind: &'static str,
        name: &QName,
        f: impl FnOnce(Layers<'_>) -> Option<T>,
    ) -> RegistryResult<T> {
        self.read(f)?
            .ok_or_else(|| RegistryError::not_found(kind, name))
    }

    // ==================== Lookups ====================

    pub fn get_model(&self, name: &QName) -> RegistryResult<Arc<CompiledModel>> {
        self.lookup("model", name, |l| l.model(name))
    }

    /// Names of every model the current domain sees.
    pub fn get_all_models(&self) -> RegistryResult<BTreeSet<QName>> {
        self.read(|l| l.all_models().into_keys().collect())
    }

    pub fn get_data_type(&self, name: &QName) -> RegistryResult<Arc<DataTypeDef>> {
        self.lookup("data type", name, |l| l.get_data_type(name))
    }

    pub fn get_class(&self, name: &QName) -> RegistryResult<Arc<ClassDef>> {
        self.lookup("class", name, |l| l.get_class(name))
    }

    pub fn get_type(&self, name: &QName) -> RegistryResult<Arc<ClassDef>> {
        self.lookup("type", name, |l| l.get_type(name))
    }

    pub fn get_aspect(&self, name: &QName) -> RegistryResult<Arc<ClassDef>> {
        self.lookup("aspect", name, |l| l.get_aspect(name))
    }

    pub fn get_property(&self, name: &QName) -> RegistryResult<Arc<PropertyDef>> {
        self.lookup("property", name, |l| l.get_property(name))
    }

    /// A property as `class` sees it, overrides applied.
    pub fn get_class_property(
        &self,
        class: &QName,
        property: &QName,
    ) -> RegistryResult<Arc<PropertyDef>> {
        let class = self.get_class(class)?;
        class
            .inherited_properties
            .get(property)
            .cloned()
            .ok_or_else(|| RegistryError::not_found("property", property))
    }

    pub fn get_association(&self, name: &QName) -> RegistryResult<Arc<AssociationDef>> {
        self.lookup("association", name, |l| l.get_association(name))
    }

    pub fn get_constraint(&self, name: &QName) -> RegistryResult<Arc<ConstraintDef>> {
        self.lookup("constraint", name, |l| l.get_constraint(name))
    }

    /// The types and aspects a model defines.
    pub fn get_classes(&self, model: &QName) -> RegistryResult<Vec<Arc<ClassDef>>> {
        let model = self.get_model(model)?;
        Ok(model.classes.values().cloned().collect())
    }

    /// Properties of a model, or the inherited properties of a class.
    pub fn get_properties(&self, selector: &QName) -> RegistryResult<Vec<Arc<PropertyDef>>> {
        self.lookup("model or class", selector, |l| {
            if let Some(model) = l.model(selector) {
                Some(model.properties.values().cloned().collect())
            } else {
                l.get_class(selector)
                    .map(|class| class.inherited_properties.values().cloned().collect())
            }
        })
    }

    /// Associations of a model, or the inherited associations of a class.
    pub fn get_associations(&self, selector: &QName) -> RegistryResult<Vec<Arc<AssociationDef>>> {
        self.lookup("model or class", selector, |l| {
            if let Some(model) = l.model(selector) {
                Some(model.associations.values().cloned().collect())
            } else {
                l.get_class(selector)
                    .map(|class| class.inherited_associations.values().cloned().collect())
            }
        })
    }

    /// Named constraints of a model, or the constraints of a property.
    pub fn get_constraints(&self, selector: &QName) -> RegistryResult<Vec<Arc<ConstraintDef>>> {
        self.lookup("model or property", selector, |l| {
            if let Some(model) = l.model(selector) {
                Some(model.named_constraints().cloned().collect())
            } else {
                l.get_property(selector)
                    .map(|property| property.constraints.clone())
            }
        })
    }

    /// Whether `sub` is `sup` or one of its descendants.
    pub fn is_sub_class(&self, sub: &QName, sup: &QName) -> RegistryResult<bool> {
        self.read(|l| l.is_sub_class(sub, sup))
    }

    /// Types below `name`; `follow` walks the whole hierarchy.
    pub fn get_sub_types(&self, name: &QName, follow: bool) -> RegistryResult<BTreeSet<QName>> {
        self.read(|l| l.sub_classes(name, ClassKind::Type, follow))
    }

    /// Aspects below `name`; `follow` walks the whole hierarchy.
    pub fn get_sub_aspects(&self, name: &QName, follow: bool) -> RegistryResult<BTreeSet<QName>> {
        self.read(|l| l.sub_classes(name, ClassKind::Aspect, follow))
    }

    pub fn namespace_uri(&self, prefix: &str) -> RegistryResult<String> {
        self.read(|l| l.namespace_uri(prefix))?
            .ok_or_else(|| RegistryError::not_found("namespace prefix", prefix))
    }

    pub fn prefixes(&self, uri: &str) -> RegistryResult<Vec<String>> {
        self.read(|l| l.prefixes(uri))
    }

    // ==================== Update Validation ====================

    fn compile_candidate(
        &self,
        raw: &RawModel,
    ) -> RegistryResult<(Option<Arc<CompiledModel>>, CompiledModel)> {
        let name = declared_name(raw)?;
        let snapshot = self.snapshot()?;
        let previous = snapshot.model(&name);
        let snapshot = snapshot.excluding(&name);
        let candidate = self.compiler.compile(raw, &snapshot, &snapshot)?;
        Ok((previous, candidate))
    }

    /// Diff `raw` against the registered version of the same model.
    pub fn diff_model(&self, raw: &RawModel) -> RegistryResult<Vec<ElementDiff>> {
        let (previous, candidate) = self.compile_candidate(raw)?;
        Ok(diff(previous.as_deref(), Some(&candidate))?)
    }

    /// Check that replacing the registered model with `raw` only adds.
    ///
    /// Nothing is published. Every non-incremental change is reported.
    pub fn validate_update(&self, raw: &RawModel) -> RegistryResult<Vec<ElementDiff>> {
        let (previous, candidate) = self.compile_candidate(raw)?;
        let diffs = diff(previous.as_deref(), Some(&candidate))?;
        let rejected = non_incremental(&diffs);
        if !rejected.is_empty() {
            return Err(RegistryError::ValidationRejected {
                model: candidate.name().clone(),
                diffs: rejected,
            });
        }
        Ok(diffs)
    }
}

/// The QName a descriptor will be registered under.
fn declared_name(raw: &RawModel) -> RegistryResult<QName> {
    let mut scope = NamespaceScope::new();
    for ns in raw.scope_namespaces() {
        scope.bind(ns.prefix.as_str(), ns.uri.as_str())?;
    }
    Ok(QName::resolve(&raw.name, &scope)?)
}
