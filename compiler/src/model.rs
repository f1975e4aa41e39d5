//! Compiled model definitions.
//!
//! Everything here is immutable once compilation returns. Definitions are
//! shared through `Arc` so that inherited views, the registry and callers
//! all point at the same values.

use dictum_constraint::{ConstraintImpl, Violation, Violations};
use dictum_core::{QName, RawIndex, RawModel, RawNamespace};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Backing native representation of a data type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum NativeType {
    Text,
    MlText,
    Content,
    Int,
    Long,
    Float,
    Double,
    Date,
    DateTime,
    Boolean,
    QName,
    NodeRef,
    ChildAssocRef,
    AssocRef,
    Path,
    Category,
    Locale,
    Version,
    Period,
    Any,
}

impl NativeType {
    pub const ALL: [NativeType; 20] = [
        NativeType::Text,
        NativeType::MlText,
        NativeType::Content,
        NativeType::Int,
        NativeType::Long,
        NativeType::Float,
        NativeType::Double,
        NativeType::Date,
        NativeType::DateTime,
        NativeType::Boolean,
        NativeType::QName,
        NativeType::NodeRef,
        NativeType::ChildAssocRef,
        NativeType::AssocRef,
        NativeType::Path,
        NativeType::Category,
        NativeType::Locale,
        NativeType::Version,
        NativeType::Period,
        NativeType::Any,
    ];

    /// Keyword used in descriptors.
    pub fn keyword(self) -> &'static str {
        match self {
            NativeType::Text => "text",
            NativeType::MlText => "mltext",
            NativeType::Content => "content",
            NativeType::Int => "int",
            NativeType::Long => "long",
            NativeType::Float => "float",
            NativeType::Double => "double",
            NativeType::Date => "date",
            NativeType::DateTime => "datetime",
            NativeType::Boolean => "boolean",
            NativeType::QName => "qname",
            NativeType::NodeRef => "noderef",
            NativeType::ChildAssocRef => "childassocref",
            NativeType::AssocRef => "assocref",
            NativeType::Path => "path",
            NativeType::Category => "category",
            NativeType::Locale => "locale",
            NativeType::Version => "version",
            NativeType::Period => "period",
            NativeType::Any => "any",
        }
    }

    /// Case-insensitive lookup by keyword.
    pub fn from_keyword(keyword: &str) -> Option<Self> {
        let keyword = keyword.trim();
        Self::ALL
            .into_iter()
            .find(|native| native.keyword().eq_ignore_ascii_case(keyword))
    }
}

/// Model-level metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelDef {
    pub name: QName,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published: Option<String>,
    pub version: Option<String>,
    pub namespaces: Vec<RawNamespace>,
    pub imports: Vec<RawNamespace>,
}

impl ModelDef {
    /// Whether this model declares (owns) `uri`.
    pub fn declares(&self, uri: &str) -> bool {
        self.namespaces.iter().any(|ns| ns.uri == uri)
    }

    /// Whether this model imports `uri`.
    pub fn imports(&self, uri: &str) -> bool {
        self.imports.iter().any(|ns| ns.uri == uri)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataTypeDef {
    pub name: QName,
    pub title: Option<String>,
    pub description: Option<String>,
    pub native: NativeType,
    pub model: QName,
}

/// Whether a class is a type or an aspect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Type,
    Aspect,
}

impl ClassKind {
    pub fn label(self) -> &'static str {
        match self {
            ClassKind::Type => "type",
            ClassKind::Aspect => "aspect",
        }
    }
}

/// A resolved constraint.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintDef {
    pub name: QName,
    pub title: Option<String>,
    pub description: Option<String>,
    /// The constraint this one was resolved through, if declared by `ref`.
    pub reference: Option<QName>,
    pub implementation: Arc<ConstraintImpl>,
    pub model: QName,
    /// Whether the name was synthesized for an inline declaration.
    pub anonymous: bool,
}

impl ConstraintDef {
    pub fn type_name(&self) -> &str {
        self.implementation.type_name()
    }

    pub fn evaluate(&self, value: &str) -> Result<(), Violation> {
        self.implementation.evaluate(value)
    }
}

/// A resolved property, either declared or an override copy.
#[derive(Debug, Clone, PartialEq)]
pub struct PropertyDef {
    pub name: QName,
    /// Class that declares (or overrides) this definition.
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
    /// Constraints in declaration order.
    pub constraints: Vec<Arc<ConstraintDef>>,
    /// Whether this definition is an override of an inherited property.
    pub is_override: bool,
}

impl PropertyDef {
    /// Evaluate a candidate value against every constraint, in order.
    pub fn evaluate(&self, value: &str) -> Violations {
        let mut violations = Violations::new();
        for constraint in &self.constraints {
            violations.record(constraint.evaluate(value));
        }
        violations
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationEnd {
    pub role: Option<String>,
    pub mandatory: bool,
    pub mandatory_enforced: bool,
    pub many: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChildAssociationDetails {
    pub required_child_name: Option<String>,
    pub duplicate_child_names_allowed: bool,
    pub propagate_timestamps: bool,
}

/// A resolved association.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssociationDef {
    pub name: QName,
    pub source_class: QName,
    pub target_class: QName,
    pub title: Option<String>,
    pub description: Option<String>,
    pub protected: bool,
    pub source: AssociationEnd,
    pub target: AssociationEnd,
    /// `Some` for a child association.
    pub child: Option<ChildAssociationDetails>,
}

impl AssociationDef {
    pub fn is_child(&self) -> bool {
        self.child.is_some()
    }
}

/// A resolved type or aspect, with its inherited view.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDef {
    pub name: QName,
    pub kind: ClassKind,
    pub title: Option<String>,
    pub description: Option<String>,
    pub parent: Option<QName>,
    pub model: QName,
    /// Own flag if declared, otherwise the parent's; `None` at a root with none.
    pub archive: Option<bool>,
    /// Properties declared on this class.
    pub properties: BTreeMap<QName, Arc<PropertyDef>>,
    /// Override copies this class applies to inherited properties.
    pub property_overrides: BTreeMap<QName, Arc<PropertyDef>>,
    /// Declared plus inherited properties, overrides applied.
    pub inherited_properties: BTreeMap<QName, Arc<PropertyDef>>,
    /// Associations declared on this class.
    pub associations: BTreeMap<QName, Arc<AssociationDef>>,
    /// Declared plus inherited associations.
    pub inherited_associations: BTreeMap<QName, Arc<AssociationDef>>,
    /// Aspects this class itself declares mandatory.
    pub mandatory_aspects: Vec<QName>,
    /// Mandatory aspects of this class and all its ancestors.
    pub default_aspects: Vec<QName>,
}

impl ClassDef {
    pub fn is_aspect(&self) -> bool {
        self.kind == ClassKind::Aspect
    }

    pub fn is_archived(&self) -> bool {
        self.archive.unwrap_or(false)
    }

    /// Inherited associations of the child kind.
    pub fn child_associations(&self) -> impl Iterator<Item = &Arc<AssociationDef>> {
        self.inherited_associations
            .values()
            .filter(|assoc| assoc.is_child())
    }

    /// Look a property up in the inherited view.
    pub fn property(&self, name: &QName) -> Option<&Arc<PropertyDef>> {
        self.inherited_properties.get(name)
    }
}

/// The output of one compilation.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledModel {
    pub model_def: ModelDef,
    /// The descriptor this model was compiled from.
    pub raw: Arc<RawModel>,
    pub data_types: BTreeMap<QName, Arc<DataTypeDef>>,
    /// Types and aspects together.
    pub classes: BTreeMap<QName, Arc<ClassDef>>,
    pub types: BTreeMap<QName, Arc<ClassDef>>,
    pub aspects: BTreeMap<QName, Arc<ClassDef>>,
    /// Declared properties of every class.
    pub properties: BTreeMap<QName, Arc<PropertyDef>>,
    pub associations: BTreeMap<QName, Arc<AssociationDef>>,
    /// Named and anonymous constraints.
    pub constraints: BTreeMap<QName, Arc<ConstraintDef>>,
}

impl CompiledModel {
    pub fn name(&self) -> &QName {
        &self.model_def.name
    }

    /// Named constraints only.
    pub fn named_constraints(&self) -> impl Iterator<Item = &Arc<ConstraintDef>> {
        self.constraints.values().filter(|c| !c.anonymous)
    }
}
