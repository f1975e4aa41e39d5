//! Class hierarchy flattening.
//!
//! Classes are grouped by depth (parent hops within the model being
//! compiled) and processed in ascending depth order, so a local parent's
//! inherited view always exists before its children are visited.
//!
//! Property constraints are not resolved yet at this point; local
//! properties carry constraint names and are linked to resolved
//! definitions afterwards.

use crate::model::{AssociationDef, ClassDef, ClassKind, ConstraintDef, PropertyDef};
use crate::query::ModelQuery;
use crate::{CompileError, CompileResult};
use dictum_core::{QName, RawClass, RawIndex, RawPropertyOverride};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

/// A property constraint before or after resolution.
#[derive(Debug, Clone)]
pub(crate) enum ConstraintLink {
    /// A constraint defined by the model being compiled.
    Local(QName),
    /// A constraint of an already compiled property.
    Shared(Arc<ConstraintDef>),
}

/// A property definition whose constraints may still be unresolved.
#[derive(Debug, Clone)]
pub(crate) struct PropertySpec {
    pub name: QName,
    pub container_class: QName,
    pub title: Option<String>,
    pub description: Option<String>,
    pub data_type: QName,
    pub multi_valued: bool,
    pub mandatory: bool,
    pub mandatory_enforced: bool,
    pub protected: bool,
    pub default_value: Option<String>,
    pub index: RawIndex,
    pub constraints: Vec<ConstraintLink>,
    pub is_override: bool,
}

impl PropertySpec {
    fn from_def(def: &PropertyDef) -> Self {
        Self {
            name: def.name.clone(),
            container_class: def.container_class.clone(),
            title: def.title.clone(),
            description: def.description.clone(),
            data_type: def.data_type.clone(),
            multi_valued: def.multi_valued,
            mandatory: def.mandatory,
            mandatory_enforced: def.mandatory_enforced,
            protected: def.protected,
            default_value: def.default_value.clone(),
            index: def.index,
            constraints: def
                .constraints
                .iter()
                .cloned()
                .map(ConstraintLink::Shared)
                .collect(),
            is_override: def.is_override,
        }
    }
}

/// An entry of an inherited property view.
#[derive(Debug, Clone)]
pub(crate) enum PropertySlot {
    /// Defined (or overridden) by the model being compiled.
    Spec(Arc<PropertySpec>),
    /// Inherited unchanged from another model.
    Def(Arc<PropertyDef>),
}

impl PropertySlot {
    fn to_spec(&self) -> PropertySpec {
        match self {
            PropertySlot::Spec(spec) => (**spec).clone(),
            PropertySlot::Def(def) => PropertySpec::from_def(def),
        }
    }
}

/// A property override with its target and constraint names resolved.
#[derive(Debug)]
pub(crate) struct OverrideShape<'r> {
    pub name: QName,
    pub raw: &'r RawPropertyOverride,
    /// `Some` replaces the inherited constraint list.
    pub constraints: Option<Vec<QName>>,
}

/// A class whose references have been validated but not flattened.
#[derive(Debug)]
pub(crate) struct ClassShape<'r> {
    pub name: QName,
    pub kind: ClassKind,
    pub raw: &'r RawClass,
    pub parent: Option<QName>,
    pub mandatory_aspects: Vec<QName>,
    pub properties: Vec<PropertySpec>,
    pub associations: Vec<Arc<AssociationDef>>,
    pub overrides: Vec<OverrideShape<'r>>,
}

/// A class with its inherited view computed.
#[derive(Debug)]
pub(crate) struct FlatClass {
    pub name: QName,
    pub kind: ClassKind,
    pub title: Option<String>,
    pub description: Option<String>,
    pub parent: Option<QName>,
    pub archive: Option<bool>,
    pub declared: Vec<Arc<PropertySpec>>,
    pub overrides: Vec<Arc<PropertySpec>>,
    pub inherited: BTreeMap<QName, PropertySlot>,
    pub associations: BTreeMap<QName, Arc<AssociationDef>>,
    pub inherited_associations: BTreeMap<QName, Arc<AssociationDef>>,
    pub mandatory_aspects: Vec<QName>,
    pub default_aspects: Vec<QName>,
}

/// What a class inherits from its parent.
#[derive(Default)]
struct ParentView {
    properties: BTreeMap<QName, PropertySlot>,
    associations: BTreeMap<QName, Arc<AssociationDef>>,
    default_aspects: Vec<QName>,
    archive: Option<bool>,
}

impl ParentView {
    fn from_local(parent: &FlatClass) -> Self {
        Self {
            properties: parent.inherited.clone(),
            associations: parent.inherited_associations.clone(),
            default_aspects: parent.default_aspects.clone(),
            archive: parent.archive,
        }
    }

    fn from_compiled(parent: &ClassDef) -> Self {
        Self {
            properties: parent
                .inherited_properties
                .iter()
                .map(|(name, def)| (name.clone(), PropertySlot::Def(def.clone())))
                .collect(),
            associations: parent.inherited_associations.clone(),
            default_aspects: parent.default_aspects.clone(),
            archive: parent.archive,
        }
    }
}

/// Number of parent hops that stay inside `classes`.
fn depth_of(name: &QName, classes: &BTreeMap<QName, ClassShape<'_>>) -> CompileResult<usize> {
    let mut depth = 0;
    let mut seen = BTreeSet::from([name]);
    let mut cursor = classes.get(name).and_then(|c| c.parent.as_ref());
    while let Some(parent) = cursor {
        let Some(shape) = classes.get(parent) else {
            break;
        };
        if !seen.insert(parent) {
            return Err(CompileError::hierarchy_cycle(name.clone()));
        }
        depth += 1;
        cursor = shape.parent.as_ref();
    }
    Ok(depth)
}

/// Class names grouped by depth, shallowest first.
pub(crate) fn depth_order(classes: &BTreeMap<QName, ClassShape<'_>>) -> CompileResult<Vec<QName>> {
    let mut by_depth: BTreeMap<usize, Vec<QName>> = BTreeMap::new();
    for name in classes.keys() {
        by_depth
            .entry(depth_of(name, classes)?)
            .or_default()
            .push(name.clone());
    }
    Ok(by_depth.into_values().flatten().collect())
}

fn apply_override(
    class: &QName,
    base: &PropertySlot,
    shape: &OverrideShape<'_>,
) -> CompileResult<PropertySpec> {
    let mut spec = base.to_spec();

    // Overrides may tighten mandatory flags but never relax them
    if let Some(mandatory) = shape.raw.mandatory {
        if spec.mandatory && !mandatory {
            return Err(CompileError::incompatible_override(
                class.clone(),
                shape.name.clone(),
                "mandatory",
            ));
        }
        spec.mandatory = mandatory;
    }
    if let Some(enforced) = shape.raw.mandatory_enforced {
        if spec.mandatory_enforced && !enforced {
            return Err(CompileError::incompatible_override(
                class.clone(),
                shape.name.clone(),
                "mandatory_enforced",
            ));
        }
        spec.mandatory_enforced = enforced;
    }
    if let Some(default_value) = &shape.raw.default_value {
        spec.default_value = Some(default_value.clone());
    }
    if let Some(constraints) = &shape.constraints {
        spec.constraints = constraints
            .iter()
            .cloned()
            .map(ConstraintLink::Local)
            .collect();
    }
    spec.container_class = class.clone();
    spec.is_override = true;
    Ok(spec)
}

/// Flatten every class in `classes`.
pub(crate) fn flatten(
    classes: &BTreeMap<QName, ClassShape<'_>>,
    query: &dyn ModelQuery,
) -> CompileResult<BTreeMap<QName, FlatClass>> {
    let mut flat: BTreeMap<QName, FlatClass> = BTreeMap::new();

    for name in depth_order(classes)? {
        let Some(shape) = classes.get(&name) else {
            continue;
        };

        let parent_view = match &shape.parent {
            None => ParentView::default(),
            Some(parent) => match flat.get(parent) {
                Some(local) => ParentView::from_local(local),
                None => {
                    let compiled = query.get_class(parent).ok_or_else(|| {
                        CompileError::unresolved("parent class", parent.clone(), name.clone())
                    })?;
                    ParentView::from_compiled(&compiled)
                }
            },
        };
        let ParentView {
            properties: mut inherited,
            associations: mut inherited_associations,
            default_aspects: mut defaults,
            archive: parent_archive,
        } = parent_view;

        let mut overrides = Vec::with_capacity(shape.overrides.len());
        for override_shape in &shape.overrides {
            let base = inherited.get(&override_shape.name).ok_or_else(|| {
                CompileError::unresolved(
                    "overridden property",
                    override_shape.name.clone(),
                    name.clone(),
                )
            })?;
            let spec = Arc::new(apply_override(&name, base, override_shape)?);
            inherited.insert(spec.name.clone(), PropertySlot::Spec(spec.clone()));
            overrides.push(spec);
        }

        let mut declared = Vec::with_capacity(shape.properties.len());
        for property in &shape.properties {
            if inherited.contains_key(&property.name) {
                return Err(CompileError::duplicate_in_hierarchy(
                    "property",
                    property.name.clone(),
                    name.clone(),
                ));
            }
            let spec = Arc::new(property.clone());
            inherited.insert(spec.name.clone(), PropertySlot::Spec(spec.clone()));
            declared.push(spec);
        }

        let mut associations = BTreeMap::new();
        for association in &shape.associations {
            if inherited_associations.contains_key(&association.name) {
                return Err(CompileError::duplicate_in_hierarchy(
                    "association",
                    association.name.clone(),
                    name.clone(),
                ));
            }
            inherited_associations.insert(association.name.clone(), association.clone());
            associations.insert(association.name.clone(), association.clone());
        }

        for aspect in &shape.mandatory_aspects {
            if !defaults.contains(aspect) {
                defaults.push(aspect.clone());
            }
        }

        let class = FlatClass {
            name: name.clone(),
            kind: shape.kind,
            title: shape.raw.title.clone(),
            description: shape.raw.description.clone(),
            parent: shape.parent.clone(),
            archive: shape.raw.archive.or(parent_archive),
            declared,
            overrides,
            inherited,
            associations,
            inherited_associations,
            mandatory_aspects: shape.mandatory_aspects.clone(),
            default_aspects: defaults,
        };
        flat.insert(name, class);
    }

    Ok(flat)
}
