//! Raw model descriptor.
//!
//! The in-memory tree an external parser hands to the compiler. Names are
//! kept in their short `prefix:local` text form; the compiler resolves them
//! against the model's own namespace scope. The descriptor is treated as an
//! immutable input value once compilation starts.

use serde::{Deserialize, Serialize};

/// A namespace declaration or import (`uri` + `prefix`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNamespace {
    pub uri: String,
    pub prefix: String,
}

impl RawNamespace {
    pub fn new(uri: impl Into<String>, prefix: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            prefix: prefix.into(),
        }
    }
}

/// A complete model descriptor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawModel {
    /// Model name (`prefix:local`).
    pub name: String,
    pub description: Option<String>,
    pub author: Option<String>,
    pub published: Option<String>,
    pub version: Option<String>,
    /// Namespaces this model defines.
    pub namespaces: Vec<RawNamespace>,
    /// Namespaces this model uses but another model defines.
    pub imports: Vec<RawNamespace>,
    pub data_types: Vec<RawDataType>,
    pub types: Vec<RawClass>,
    pub aspects: Vec<RawClass>,
    /// Named, model-level constraints.
    pub constraints: Vec<RawConstraint>,
}

impl RawModel {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// Declare a namespace owned by this model.
    pub fn create_namespace(&mut self, uri: impl Into<String>, prefix: impl Into<String>) {
        self.namespaces.push(RawNamespace::new(uri, prefix));
    }

    /// Import a namespace defined by another model.
    pub fn create_import(&mut self, uri: impl Into<String>, prefix: impl Into<String>) {
        self.imports.push(RawNamespace::new(uri, prefix));
    }

    pub fn create_data_type(
        &mut self,
        name: impl Into<String>,
        native_type: impl Into<String>,
    ) -> &mut RawDataType {
        self.data_types.push(RawDataType::new(name, native_type));
        let last = self.data_types.len() - 1;
        &mut self.data_types[last]
    }

    pub fn create_type(&mut self, name: impl Into<String>) -> &mut RawClass {
        self.types.push(RawClass::new(name));
        let last = self.types.len() - 1;
        &mut self.types[last]
    }

    pub fn create_aspect(&mut self, name: impl Into<String>) -> &mut RawClass {
        self.aspects.push(RawClass::new(name));
        let last = self.aspects.len() - 1;
        &mut self.aspects[last]
    }

    /// Add a named model-level constraint.
    pub fn create_constraint(
        &mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> &mut RawConstraint {
        self.constraints
            .push(RawConstraint::typed(type_name).with_name(name));
        let last = self.constraints.len() - 1;
        &mut self.constraints[last]
    }

    pub fn find_type_mut(&mut self, name: &str) -> Option<&mut RawClass> {
        self.types.iter_mut().find(|c| c.name == name)
    }

    pub fn find_aspect_mut(&mut self, name: &str) -> Option<&mut RawClass> {
        self.aspects.iter_mut().find(|c| c.name == name)
    }

    pub fn remove_type(&mut self, name: &str) {
        self.types.retain(|c| c.name != name);
    }

    pub fn remove_aspect(&mut self, name: &str) {
        self.aspects.retain(|c| c.name != name);
    }

    /// Every namespace in the model's local scope: declared, then imported.
    pub fn scope_namespaces(&self) -> impl Iterator<Item = &RawNamespace> {
        self.namespaces.iter().chain(self.imports.iter())
    }
}

/// A data type declaration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawDataType {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Keyword naming the backing native representation (`text`, `int`, ...).
    pub native_type: String,
}

impl RawDataType {
    pub fn new(name: impl Into<String>, native_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            native_type: native_type.into(),
            ..Self::default()
        }
    }
}

/// A type or aspect declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawClass {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub parent_name: Option<String>,
    /// `None` inherits the parent's archive flag.
    pub archive: Option<bool>,
    pub properties: Vec<RawProperty>,
    pub associations: Vec<RawAssociation>,
    pub property_overrides: Vec<RawPropertyOverride>,
    pub mandatory_aspects: Vec<String>,
}

impl RawClass {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn set_parent(&mut self, parent_name: impl Into<String>) -> &mut Self {
        self.parent_name = Some(parent_name.into());
        self
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn set_archive(&mut self, archive: bool) -> &mut Self {
        self.archive = Some(archive);
        self
    }

    pub fn add_mandatory_aspect(&mut self, aspect_name: impl Into<String>) -> &mut Self {
        self.mandatory_aspects.push(aspect_name.into());
        self
    }

    pub fn create_property(
        &mut self,
        name: impl Into<String>,
        type_name: impl Into<String>,
    ) -> &mut RawProperty {
        self.properties.push(RawProperty::new(name, type_name));
        let last = self.properties.len() - 1;
        &mut self.properties[last]
    }

    pub fn remove_property(&mut self, name: &str) {
        self.properties.retain(|p| p.name != name);
    }

    pub fn create_association(
        &mut self,
        name: impl Into<String>,
        target_class: impl Into<String>,
    ) -> &mut RawAssociation {
        self.associations
            .push(RawAssociation::new(name, target_class));
        let last = self.associations.len() - 1;
        &mut self.associations[last]
    }

    pub fn create_child_association(
        &mut self,
        name: impl Into<String>,
        target_class: impl Into<String>,
    ) -> &mut RawAssociation {
        let mut association = RawAssociation::new(name, target_class);
        association.child = Some(RawChildAssociation::default());
        self.associations.push(association);
        let last = self.associations.len() - 1;
        &mut self.associations[last]
    }

    pub fn remove_association(&mut self, name: &str) {
        self.associations.retain(|a| a.name != name);
    }

    pub fn create_property_override(&mut self, name: impl Into<String>) -> &mut RawPropertyOverride {
        self.property_overrides
            .push(RawPropertyOverride::new(name));
        let last = self.property_overrides.len() - 1;
        &mut self.property_overrides[last]
    }
}

/// How a property's text is split for the index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Tokenise {
    #[default]
    True,
    False,
    Both,
}

/// Indexing flags of a property.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct RawIndex {
    pub enabled: bool,
    pub stored: bool,
    pub tokenised: Tokenise,
    pub facetable: Option<bool>,
}

impl Default for RawIndex {
    fn default() -> Self {
        Self {
            enabled: true,
            stored: false,
            tokenised: Tokenise::True,
            facetable: None,
        }
    }
}

/// A property declaration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawProperty {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    /// Data type name (`prefix:local`).
    #[serde(rename = "type")]
    pub type_name: String,
    pub protected: bool,
    pub mandatory: bool,
    pub mandatory_enforced: bool,
    pub multi_valued: bool,
    pub default_value: Option<String>,
    pub index: RawIndex,
    /// Inline constraints, anonymous unless named.
    pub constraints: Vec<RawConstraint>,
}

impl RawProperty {
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
            ..Self::default()
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    pub fn set_type(&mut self, type_name: impl Into<String>) -> &mut Self {
        self.type_name = type_name.into();
        self
    }

    pub fn set_mandatory(&mut self, mandatory: bool) -> &mut Self {
        self.mandatory = mandatory;
        self
    }

    pub fn set_mandatory_enforced(&mut self, enforced: bool) -> &mut Self {
        self.mandatory_enforced = enforced;
        self
    }

    pub fn set_multi_valued(&mut self, multi_valued: bool) -> &mut Self {
        self.multi_valued = multi_valued;
        self
    }

    pub fn set_protected(&mut self, protected: bool) -> &mut Self {
        self.protected = protected;
        self
    }

    pub fn set_default_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn set_index(&mut self, index: RawIndex) -> &mut Self {
        self.index = index;
        self
    }

    pub fn add_constraint(&mut self, constraint: RawConstraint) -> &mut Self {
        self.constraints.push(constraint);
        self
    }
}

/// A subclass's redeclaration of an inherited property.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawPropertyOverride {
    pub name: String,
    pub mandatory: Option<bool>,
    pub mandatory_enforced: Option<bool>,
    pub default_value: Option<String>,
    /// `Some` replaces the inherited constraint list wholesale.
    pub constraints: Option<Vec<RawConstraint>>,
}

impl RawPropertyOverride {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn set_mandatory(&mut self, mandatory: bool) -> &mut Self {
        self.mandatory = Some(mandatory);
        self
    }

    pub fn set_mandatory_enforced(&mut self, enforced: bool) -> &mut Self {
        self.mandatory_enforced = Some(enforced);
        self
    }

    pub fn set_default_value(&mut self, value: impl Into<String>) -> &mut Self {
        self.default_value = Some(value.into());
        self
    }

    pub fn add_constraint(&mut self, constraint: RawConstraint) -> &mut Self {
        self.constraints.get_or_insert_with(Vec::new).push(constraint);
        self
    }
}

/// One end of an association.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAssociationEnd {
    pub role: Option<String>,
    pub mandatory: bool,
    pub mandatory_enforced: bool,
    pub many: bool,
}

/// Extra attributes of a child (parent-child) association.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawChildAssociation {
    pub required_child_name: Option<String>,
    pub duplicate_child_names_allowed: bool,
    pub propagate_timestamps: bool,
}

impl Default for RawChildAssociation {
    fn default() -> Self {
        Self {
            required_child_name: None,
            duplicate_child_names_allowed: true,
            propagate_timestamps: false,
        }
    }
}

/// An association declaration (peer or child).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawAssociation {
    pub name: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub protected: bool,
    pub source: RawAssociationEnd,
    /// Target class name (`prefix:local`).
    pub target_class: String,
    pub target: RawAssociationEnd,
    /// `Some` marks a child association.
    pub child: Option<RawChildAssociation>,
}

impl RawAssociation {
    pub fn new(name: impl Into<String>, target_class: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            target_class: target_class.into(),
            ..Self::default()
        }
    }

    pub fn set_title(&mut self, title: impl Into<String>) -> &mut Self {
        self.title = Some(title.into());
        self
    }

    pub fn set_target_mandatory(&mut self, mandatory: bool) -> &mut Self {
        self.target.mandatory = mandatory;
        self
    }

    pub fn set_target_many(&mut self, many: bool) -> &mut Self {
        self.target.many = many;
        self
    }

    pub fn set_source_many(&mut self, many: bool) -> &mut Self {
        self.source.many = many;
        self
    }

    pub fn set_target_class(&mut self, target_class: impl Into<String>) -> &mut Self {
        self.target_class = target_class.into();
        self
    }

    pub fn is_child(&self) -> bool {
        self.child.is_some()
    }
}

/// A constraint parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
    Scalar(String),
    List(Vec<String>),
}

impl Default for ParamValue {
    fn default() -> Self {
        ParamValue::Scalar(String::new())
    }
}

impl ParamValue {
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            ParamValue::Scalar(s) => Some(s),
            ParamValue::List(_) => None,
        }
    }

    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            ParamValue::Scalar(_) => None,
            ParamValue::List(items) => Some(items),
        }
    }
}

/// A named constraint parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawNamedValue {
    pub name: String,
    pub value: ParamValue,
}

/// A constraint declaration: exactly one of `type_name` or `reference`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RawConstraint {
    pub name: Option<String>,
    #[serde(rename = "type")]
    pub type_name: Option<String>,
    #[serde(rename = "ref")]
    pub reference: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub parameters: Vec<RawNamedValue>,
}

impl RawConstraint {
    /// A constraint built from a type keyword (`REGEX`, `LIST`, ...).
    pub fn typed(type_name: impl Into<String>) -> Self {
        Self {
            type_name: Some(type_name.into()),
            ..Self::default()
        }
    }

    /// A constraint that reuses another named constraint.
    pub fn reference(reference: impl Into<String>) -> Self {
        Self {
            reference: Some(reference.into()),
            ..Self::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_parameter(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parameters.push(RawNamedValue {
            name: name.into(),
            value: ParamValue::Scalar(value.into()),
        });
        self
    }

    pub fn with_list_parameter<I, S>(mut self, name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parameters.push(RawNamedValue {
            name: name.into(),
            value: ParamValue::List(values.into_iter().map(Into::into).collect()),
        });
        self
    }

    pub fn set_parameter(&mut self, name: impl Into<String>, value: impl Into<String>) -> &mut Self {
        self.parameters.push(RawNamedValue {
            name: name.into(),
            value: ParamValue::Scalar(value.into()),
        });
        self
    }
}
