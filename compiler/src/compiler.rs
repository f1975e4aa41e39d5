//! Main compiler implementation.

use crate::constraints::{ConstraintDraft, ConstraintResolver};
use crate::inheritance::{
    flatten, ClassShape, ConstraintLink, FlatClass, OverrideShape, PropertySlot, PropertySpec,
};
use crate::model::{
    AssociationDef, AssociationEnd, ChildAssociationDetails, ClassDef, ClassKind, CompiledModel,
    ConstraintDef, DataTypeDef, ModelDef, NativeType, PropertyDef,
};
use crate::query::ModelQuery;
use crate::{CompileError, CompileResult, CompilerConfig};
use dictum_constraint::ConstraintFactories;
use dictum_core::{
    NamespaceScope, PrefixResolver, QName, RawAssociation, RawAssociationEnd, RawClass,
    RawConstraint, RawDataType, RawModel, RawProperty, RawPropertyOverride,
};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// The Compiler transforms raw model descriptors into compiled models.
#[derive(Debug, Clone, Default)]
pub struct Compiler {
    config: CompilerConfig,
    factories: ConstraintFactories,
}

/// A property with its constraint names assigned.
struct PropertyDraft<'r> {
    name: QName,
    raw: &'r RawProperty,
    constraints: Vec<QName>,
}

/// A property override with its constraint names assigned.
struct OverrideDraft<'r> {
    name: QName,
    raw: &'r RawPropertyOverride,
    constraints: Option<Vec<QName>>,
}

struct ClassDraft<'r> {
    name: QName,
    kind: ClassKind,
    raw: &'r RawClass,
    properties: Vec<PropertyDraft<'r>>,
    associations: Vec<(QName, &'r RawAssociation)>,
    overrides: Vec<OverrideDraft<'r>>,
}

/// Output of the construct phase: every element named, nothing resolved.
struct Constructed<'r> {
    scope: NamespaceScope,
    model_def: ModelDef,
    data_types: BTreeMap<QName, &'r RawDataType>,
    classes: BTreeMap<QName, ClassDraft<'r>>,
    constraints: BTreeMap<QName, ConstraintDraft<'r>>,
}

/// Output of the dependency phase: every reference checked.
struct Resolved<'r> {
    scope: NamespaceScope,
    model_def: ModelDef,
    data_types: BTreeMap<QName, Arc<DataTypeDef>>,
    classes: BTreeMap<QName, ClassShape<'r>>,
    constraints: BTreeMap<QName, ConstraintDraft<'r>>,
}

/// Per-compilation naming state.
struct Namer<'a> {
    config: &'a CompilerConfig,
    scope: &'a NamespaceScope,
    model_def: &'a ModelDef,
    anonymous: usize,
}

impl Namer<'_> {
    fn resolve(&self, text: &str) -> CompileResult<QName> {
        QName::resolve(text, self.scope).map_err(|e| CompileError::name(text, e))
    }

    /// Resolve the name of an element this model defines.
    fn define(&self, kind: &'static str, text: &str) -> CompileResult<QName> {
        let name = self.resolve(text)?;
        if self.config.enforce_declared_namespaces && !self.model_def.declares(name.namespace_uri()) {
            return Err(CompileError::undeclared_namespace(
                kind,
                name,
                self.model_def.name.clone(),
            ));
        }
        Ok(name)
    }

    fn constraint_name(&mut self, property: &QName, raw: &RawConstraint) -> CompileResult<(QName, bool)> {
        match &raw.name {
            Some(name) => Ok((self.define("constraint", name)?, false)),
            None => {
                let local = format!("{}_anon_{}", property.local_name(), self.anonymous);
                self.anonymous += 1;
                Ok((property.with_local_name(local), true))
            }
        }
    }
}

fn insert_unique<V>(
    map: &mut BTreeMap<QName, V>,
    kind: &'static str,
    name: QName,
    value: V,
) -> CompileResult<()> {
    if map.contains_key(&name) {
        return Err(CompileError::duplicate(kind, name));
    }
    map.insert(name, value);
    Ok(())
}

fn association_end(raw: &RawAssociationEnd) -> AssociationEnd {
    AssociationEnd {
        role: raw.role.clone(),
        mandatory: raw.mandatory,
        mandatory_enforced: raw.mandatory_enforced,
        many: raw.many,
    }
}

impl Compiler {
    /// Create a compiler with default configuration and the built-in constraint kinds.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(mut self, config: CompilerConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_factories(mut self, factories: ConstraintFactories) -> Self {
        self.factories = factories;
        self
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile `raw` into a [`CompiledModel`].
    ///
    /// `query` answers for every element the model references but does not
    /// define; `namespaces` is the scope imported URIs must be known in.
    /// The first error aborts compilation and nothing partial is returned.
    pub fn compile(
        &self,
        raw: &RawModel,
        query: &dyn ModelQuery,
        namespaces: &dyn PrefixResolver,
    ) -> CompileResult<CompiledModel> {
        let constructed = self.construct(raw)?;
        let model = constructed.model_def.name.clone();
        debug!(model = %model, phase = "construct", classes = constructed.classes.len(), "Compile phase complete");

        let resolved = self.resolve_dependencies(constructed, query, namespaces)?;
        debug!(model = %model, phase = "dependencies", "Compile phase complete");

        let flat = flatten(&resolved.classes, query)?;
        debug!(model = %model, phase = "inheritance", "Compile phase complete");

        let constraints = ConstraintResolver::new(
            &model,
            &resolved.constraints,
            &resolved.scope,
            query,
            &self.factories,
        )
        .resolve_all()?;
        debug!(model = %model, phase = "constraints", constraints = constraints.len(), "Compile phase complete");

        let compiled = link(raw, resolved.model_def, resolved.data_types, flat, constraints)?;
        debug!(
            model = %model,
            types = compiled.types.len(),
            aspects = compiled.aspects.len(),
            properties = compiled.properties.len(),
            "Model compiled"
        );
        Ok(compiled)
    }

    /// Phase 1: name every element and reject duplicates per kind.
    fn construct<'r>(&self, raw: &'r RawModel) -> CompileResult<Constructed<'r>> {
        let mut scope = NamespaceScope::new();
        for ns in raw.scope_namespaces() {
            scope
                .bind(ns.prefix.as_str(), ns.uri.as_str())
                .map_err(|e| CompileError::name(ns.prefix.as_str(), e))?;
        }

        if raw.name.trim().is_empty() {
            return Err(CompileError::missing_name("model"));
        }
        let model_name = QName::resolve(&raw.name, &scope).map_err(|e| CompileError::name(raw.name.as_str(), e))?;
        let model_def = ModelDef {
            name: model_name,
            description: raw.description.clone(),
            author: raw.author.clone(),
            published: raw.published.clone(),
            version: raw.version.clone(),
            namespaces: raw.namespaces.clone(),
            imports: raw.imports.clone(),
        };

        let mut namer = Namer {
            config: &self.config,
            scope: &scope,
            model_def: &model_def,
            anonymous: 0,
        };

        let mut data_types = BTreeMap::new();
        for data_type in &raw.data_types {
            let name = namer.define("data type", &data_type.name)?;
            insert_unique(&mut data_types, "data type", name, data_type)?;
        }

        let mut classes = BTreeMap::new();
        let mut properties = BTreeMap::new();
        let mut associations = BTreeMap::new();
        let mut constraints = BTreeMap::new();

        let declared = raw
            .types
            .iter()
            .map(|c| (ClassKind::Type, c))
            .chain(raw.aspects.iter().map(|c| (ClassKind::Aspect, c)));
        for (kind, class) in declared {
            let class_name = namer.define(kind.label(), &class.name)?;

            let mut class_properties = Vec::with_capacity(class.properties.len());
            for property in &class.properties {
                let name = namer.define("property", &property.name)?;
                insert_unique(&mut properties, "property", name.clone(), ())?;
                let mut names = Vec::with_capacity(property.constraints.len());
                for constraint in &property.constraints {
                    let (constraint_name, anonymous) = namer.constraint_name(&name, constraint)?;
                    names.push(constraint_name.clone());
                    insert_unique(
                        &mut constraints,
                        "constraint",
                        constraint_name.clone(),
                        ConstraintDraft {
                            name: constraint_name,
                            raw: constraint,
                            anonymous,
                        },
                    )?;
                }
                class_properties.push(PropertyDraft {
                    name,
                    raw: property,
                    constraints: names,
                });
            }

            let mut overrides: Vec<OverrideDraft<'r>> = Vec::with_capacity(class.property_overrides.len());
            for property_override in &class.property_overrides {
                let name = namer.resolve(&property_override.name)?;
                if overrides.iter().any(|o| o.name == name) {
                    return Err(CompileError::duplicate("property override", name));
                }
                let names = match &property_override.constraints {
                    None => None,
                    Some(list) => {
                        let mut names = Vec::with_capacity(list.len());
                        for constraint in list {
                            let (constraint_name, anonymous) = namer.constraint_name(&name, constraint)?;
                            names.push(constraint_name.clone());
                            insert_unique(
                                &mut constraints,
                                "constraint",
                                constraint_name.clone(),
                                ConstraintDraft {
                                    name: constraint_name,
                                    raw: constraint,
                                    anonymous,
                                },
                            )?;
                        }
                        Some(names)
                    }
                };
                overrides.push(OverrideDraft {
                    name,
                    raw: property_override,
                    constraints: names,
                });
            }

            let mut class_associations = Vec::with_capacity(class.associations.len());
            for association in &class.associations {
                let name = namer.define("association", &association.name)?;
                insert_unique(&mut associations, "association", name.clone(), ())?;
                class_associations.push((name, association));
            }

            insert_unique(
                &mut classes,
                "class",
                class_name.clone(),
                ClassDraft {
                    name: class_name,
                    kind,
                    raw: class,
                    properties: class_properties,
                    associations: class_associations,
                    overrides,
                },
            )?;
        }

        for constraint in &raw.constraints {
            let text = constraint.name.as_deref().ok_or_else(|| {
                CompileError::missing_name(format!(
                    "constraint declared outside a property in model '{}'",
                    model_def.name
                ))
            })?;
            let name = namer.define("constraint", text)?;
            insert_unique(
                &mut constraints,
                "constraint",
                name.clone(),
                ConstraintDraft {
                    name,
                    raw: constraint,
                    anonymous: false,
                },
            )?;
        }

        Ok(Constructed {
            scope,
            model_def,
            data_types,
            classes,
            constraints,
        })
    }

    /// Phase 2: check that every reference resolves, locally or through `query`.
    fn resolve_dependencies<'r>(
        &self,
        constructed: Constructed<'r>,
        query: &dyn ModelQuery,
        namespaces: &dyn PrefixResolver,
    ) -> CompileResult<Resolved<'r>> {
        let Constructed {
            scope,
            model_def,
            data_types: raw_data_types,
            classes: drafts,
            constraints,
        } = constructed;
        let model = &model_def.name;
        let resolve = |text: &str| QName::resolve(text, &scope).map_err(|e| CompileError::name(text, e));

        for import in &model_def.imports {
            if !model_def.declares(&import.uri) && !namespaces.knows_uri(&import.uri) {
                return Err(CompileError::unknown_import(model.clone(), import.uri.as_str()));
            }
        }

        let mut data_types = BTreeMap::new();
        for (name, data_type) in raw_data_types {
            let native = NativeType::from_keyword(&data_type.native_type)
                .ok_or_else(|| CompileError::unknown_native_type(name.clone(), data_type.native_type.as_str()))?;
            let def = DataTypeDef {
                name: name.clone(),
                title: data_type.title.clone(),
                description: data_type.description.clone(),
                native,
                model: model.clone(),
            };
            data_types.insert(name, Arc::new(def));
        }

        let class_kind = |name: &QName| -> Option<ClassKind> {
            drafts
                .get(name)
                .map(|draft| draft.kind)
                .or_else(|| query.get_class(name).map(|class| class.kind))
        };
        let data_type_exists =
            |name: &QName| data_types.contains_key(name) || query.get_data_type(name).is_some();
        let property_exists = |name: &QName| {
            drafts
                .values()
                .any(|draft| draft.properties.iter().any(|p| &p.name == name))
                || query.get_property(name).is_some()
        };

        let mut classes = BTreeMap::new();
        for (name, draft) in &drafts {
            let parent = match &draft.raw.parent_name {
                None => None,
                Some(text) => {
                    let parent = resolve(text)?;
                    match class_kind(&parent) {
                        None => {
                            return Err(CompileError::unresolved("parent class", parent, name.clone()))
                        }
                        Some(kind) if kind != draft.kind => {
                            return Err(CompileError::parent_kind(name.clone(), parent))
                        }
                        Some(_) => Some(parent),
                    }
                }
            };

            let mut mandatory_aspects = Vec::with_capacity(draft.raw.mandatory_aspects.len());
            for text in &draft.raw.mandatory_aspects {
                let aspect = resolve(text)?;
                if class_kind(&aspect) != Some(ClassKind::Aspect) {
                    return Err(CompileError::unresolved("mandatory aspect", aspect, name.clone()));
                }
                if !mandatory_aspects.contains(&aspect) {
                    mandatory_aspects.push(aspect);
                }
            }

            let mut properties = Vec::with_capacity(draft.properties.len());
            for property in &draft.properties {
                let data_type = resolve(&property.raw.type_name)?;
                if !data_type_exists(&data_type) {
                    return Err(CompileError::unresolved("data type", data_type, property.name.clone()));
                }
                properties.push(PropertySpec {
                    name: property.name.clone(),
                    container_class: name.clone(),
                    title: property.raw.title.clone(),
                    description: property.raw.description.clone(),
                    data_type,
                    multi_valued: property.raw.multi_valued,
                    mandatory: property.raw.mandatory,
                    mandatory_enforced: property.raw.mandatory_enforced,
                    protected: property.raw.protected,
                    default_value: property.raw.default_value.clone(),
                    index: property.raw.index,
                    constraints: property
                        .constraints
                        .iter()
                        .cloned()
                        .map(ConstraintLink::Local)
                        .collect(),
                    is_override: false,
                });
            }

            let mut associations = Vec::with_capacity(draft.associations.len());
            for (assoc_name, association) in &draft.associations {
                let target_class = resolve(&association.target_class)?;
                if class_kind(&target_class).is_none() {
                    return Err(CompileError::unresolved(
                        "target class",
                        target_class,
                        assoc_name.clone(),
                    ));
                }
                associations.push(Arc::new(AssociationDef {
                    name: assoc_name.clone(),
                    source_class: name.clone(),
                    target_class,
                    title: association.title.clone(),
                    description: association.description.clone(),
                    protected: association.protected,
                    source: association_end(&association.source),
                    target: association_end(&association.target),
                    child: association.child.as_ref().map(|child| ChildAssociationDetails {
                        required_child_name: child.required_child_name.clone(),
                        duplicate_child_names_allowed: child.duplicate_child_names_allowed,
                        propagate_timestamps: child.propagate_timestamps,
                    }),
                }));
            }

            let mut overrides = Vec::with_capacity(draft.overrides.len());
            for property_override in &draft.overrides {
                if !property_exists(&property_override.name) {
                    return Err(CompileError::unresolved(
                        "overridden property",
                        property_override.name.clone(),
                        name.clone(),
                    ));
                }
                overrides.push(OverrideShape {
                    name: property_override.name.clone(),
                    raw: property_override.raw,
                    constraints: property_override.constraints.clone(),
                });
            }

            classes.insert(
                name.clone(),
                ClassShape {
                    name: name.clone(),
                    kind: draft.kind,
                    raw: draft.raw,
                    parent,
                    mandatory_aspects,
                    properties,
                    associations,
                    overrides,
                },
            );
        }

        Ok(Resolved {
            scope,
            model_def,
            data_types,
            classes,
            constraints,
        })
    }
}

/// Turns property specs into definitions, sharing one `Arc` per (class, property).
struct Linker<'a> {
    constraints: &'a BTreeMap<QName, Arc<ConstraintDef>>,
    cache: BTreeMap<(QName, QName), Arc<PropertyDef>>,
}

impl Linker<'_> {
    fn constraint(&self, link: &ConstraintLink, property: &QName) -> CompileResult<Arc<ConstraintDef>> {
        match link {
            ConstraintLink::Shared(def) => Ok(def.clone()),
            ConstraintLink::Local(name) => self
                .constraints
                .get(name)
                .cloned()
                .ok_or_else(|| CompileError::unresolved("constraint", name.clone(), property.clone())),
        }
    }

    fn property(&mut self, spec: &PropertySpec) -> CompileResult<Arc<PropertyDef>> {
        let key = (spec.container_class.clone(), spec.name.clone());
        if let Some(def) = self.cache.get(&key) {
            return Ok(def.clone());
        }
        let constraints = spec
            .constraints
            .iter()
            .map(|link| self.constraint(link, &spec.name))
            .collect::<CompileResult<Vec<_>>>()?;
        let def = Arc::new(PropertyDef {
            name: spec.name.clone(),
            container_class: spec.container_class.clone(),
            title: spec.title.clone(),
            description: spec.description.clone(),
            data_type: spec.data_type.clone(),
            multi_valued: spec.multi_valued,
            mandatory: spec.mandatory,
            mandatory_enforced: spec.mandatory_enforced,
            protected: spec.protected,
            default_value: spec.default_value.clone(),
            index: spec.index,
            constraints,
            is_override: spec.is_override,
        });
        self.cache.insert(key, def.clone());
        Ok(def)
    }

    fn slot(&mut self, slot: &PropertySlot) -> CompileResult<Arc<PropertyDef>> {
        match slot {
            PropertySlot::Def(def) => Ok(def.clone()),
            PropertySlot::Spec(spec) => self.property(spec),
        }
    }
}

/// Final step: attach resolved constraints and assemble the model.
fn link(
    raw: &RawModel,
    model_def: ModelDef,
    data_types: BTreeMap<QName, Arc<DataTypeDef>>,
    flat: BTreeMap<QName, FlatClass>,
    constraints: BTreeMap<QName, Arc<ConstraintDef>>,
) -> CompileResult<CompiledModel> {
    let mut linker = Linker {
        constraints: &constraints,
        cache: BTreeMap::new(),
    };

    let mut classes = BTreeMap::new();
    let mut properties = BTreeMap::new();
    let mut associations = BTreeMap::new();

    for (name, class) in flat {
        let mut declared = BTreeMap::new();
        for spec in &class.declared {
            let def = linker.property(spec)?;
            properties.insert(def.name.clone(), def.clone());
            declared.insert(def.name.clone(), def);
        }
        let mut overrides = BTreeMap::new();
        for spec in &class.overrides {
            let def = linker.property(spec)?;
            overrides.insert(def.name.clone(), def);
        }
        let mut inherited = BTreeMap::new();
        for (property, slot) in &class.inherited {
            inherited.insert(property.clone(), linker.slot(slot)?);
        }
        for (assoc_name, assoc) in &class.associations {
            associations.insert(assoc_name.clone(), assoc.clone());
        }

        let def = ClassDef {
            name: name.clone(),
            kind: class.kind,
            title: class.title,
            description: class.description,
            parent: class.parent,
            model: model_def.name.clone(),
            archive: class.archive,
            properties: declared,
            property_overrides: overrides,
            inherited_properties: inherited,
            associations: class.associations,
            inherited_associations: class.inherited_associations,
            mandatory_aspects: class.mandatory_aspects,
            default_aspects: class.default_aspects,
        };
        classes.insert(name, Arc::new(def));
    }

    let types = classes
        .iter()
        .filter(|(_, class)| class.kind == ClassKind::Type)
        .map(|(name, class)| (name.clone(), class.clone()))
        .collect();
    let aspects = classes
        .iter()
        .filter(|(_, class)| class.kind == ClassKind::Aspect)
        .map(|(name, class)| (name.clone(), class.clone()))
        .collect();

    Ok(CompiledModel {
        model_def,
        raw: Arc::new(raw.clone()),
        data_types,
        classes,
        types,
        aspects,
        properties,
        associations,
        constraints,
    })
}
