//! Compiler error types.

use dictum_constraint::ConstraintError;
use dictum_core::{CoreError, QName};
use thiserror::Error;

/// Result type for compilation.
pub type CompileResult<T> = Result<T, CompileError>;

/// Broad classification of a compilation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Duplicate or malformed definitions.
    Structural,
    /// A named element could not be found.
    UnresolvedReference,
    /// A constraint `ref` chain or class hierarchy loops.
    CyclicReference,
    /// A constraint could not be built or configured.
    ConstraintConstruction,
    /// An override tries to relax an inherited flag.
    IncompatibleOverride,
}

/// Errors that can occur during compilation.
#[derive(Debug, Error)]
pub enum CompileError {
    /// A short name could not be turned into a QName.
    #[error("Invalid name '{text}': {source}")]
    Name {
        text: String,
        #[source]
        source: CoreError,
    },

    /// Two elements of the same kind share a name.
    #[error("Duplicate {kind} '{name}'")]
    Duplicate { kind: &'static str, name: QName },

    /// An element that needs a name has none.
    #[error("Missing name for {what}")]
    MissingName { what: String },

    /// An element is defined in a namespace the model does not declare.
    #[error("{kind} '{name}' is not in a namespace declared by model '{model}'")]
    UndeclaredNamespace {
        kind: &'static str,
        name: QName,
        model: QName,
    },

    /// An imported namespace is unknown.
    #[error("Model '{model}' imports unknown namespace '{uri}'")]
    UnknownImport { model: QName, uri: String },

    /// A data type names an unknown native representation.
    #[error("Data type '{name}' has unknown native type '{native}'")]
    UnknownNativeType { name: QName, native: String },

    /// A referenced element does not exist.
    #[error("{kind} '{name}' referenced by '{from}' does not exist")]
    Unresolved {
        kind: &'static str,
        name: QName,
        from: QName,
    },

    /// A class's parent is of the other class kind.
    #[error("Class '{class}' cannot extend '{parent}': types extend types and aspects extend aspects")]
    ParentKind { class: QName, parent: QName },

    /// A member name is already defined further up the hierarchy.
    #[error("{kind} '{name}' of class '{class}' is already defined in its hierarchy")]
    DuplicateInHierarchy {
        kind: &'static str,
        name: QName,
        class: QName,
    },

    /// A class is its own ancestor.
    #[error("Class hierarchy cycle at '{class}'")]
    HierarchyCycle { class: QName },

    /// A constraint `ref` chain reaches a constraint still being resolved.
    #[error("Constraint reference cycle at '{name}'")]
    ConstraintCycle { name: QName },

    /// A constraint declares both `ref` and `type`.
    #[error("Constraint '{name}' declares both a type and a reference")]
    AmbiguousConstraint { name: QName },

    /// A constraint declares neither `ref` nor `type`.
    #[error("Constraint '{name}' declares neither a type nor a reference")]
    IncompleteConstraint { name: QName },

    /// A constraint implementation could not be built.
    #[error("Constraint '{name}' could not be built: {source}")]
    ConstraintConstruction {
        name: QName,
        #[source]
        source: ConstraintError,
    },

    /// An override relaxes an inherited mandatory flag.
    #[error("Override of '{property}' on '{class}' cannot relax '{flag}'")]
    IncompatibleOverride {
        class: QName,
        property: QName,
        flag: &'static str,
    },
}

impl CompileError {
    pub fn name(text: impl Into<String>, source: CoreError) -> Self {
        Self::Name {
            text: text.into(),
            source,
        }
    }

    pub fn duplicate(kind: &'static str, name: QName) -> Self {
        Self::Duplicate { kind, name }
    }

    pub fn missing_name(what: impl Into<String>) -> Self {
        Self::MissingName { what: what.into() }
    }

    pub fn undeclared_namespace(kind: &'static str, name: QName, model: QName) -> Self {
        Self::UndeclaredNamespace { kind, name, model }
    }

    pub fn unknown_import(model: QName, uri: impl Into<String>) -> Self {
        Self::UnknownImport {
            model,
            uri: uri.into(),
        }
    }

    pub fn unknown_native_type(name: QName, native: impl Into<String>) -> Self {
        Self::UnknownNativeType {
            name,
            native: native.into(),
        }
    }

    pub fn unresolved(kind: &'static str, name: QName, from: QName) -> Self {
        Self::Unresolved { kind, name, from }
    }

    pub fn parent_kind(class: QName, parent: QName) -> Self {
        Self::ParentKind { class, parent }
    }

    pub fn duplicate_in_hierarchy(kind: &'static str, name: QName, class: QName) -> Self {
        Self::DuplicateInHierarchy { kind, name, class }
    }

    pub fn hierarchy_cycle(class: QName) -> Self {
        Self::HierarchyCycle { class }
    }

    pub fn constraint_cycle(name: QName) -> Self {
        Self::ConstraintCycle { name }
    }

    pub fn constraint_construction(name: QName, source: ConstraintError) -> Self {
        Self::ConstraintConstruction { name, source }
    }

    pub fn incompatible_override(class: QName, property: QName, flag: &'static str) -> Self {
        Self::IncompatibleOverride {
            class,
            property,
            flag,
        }
    }

    /// The error's place in the compilation error taxonomy.
    pub fn kind(&self) -> ErrorKind {
        match self {
            CompileError::Name {
                source: CoreError::UnknownPrefix { .. },
                ..
            } => ErrorKind::UnresolvedReference,
            CompileError::Name { .. }
            | CompileError::Duplicate { .. }
            | CompileError::MissingName { .. }
            | CompileError::UndeclaredNamespace { .. }
            | CompileError::ParentKind { .. }
            | CompileError::DuplicateInHierarchy { .. }
            | CompileError::AmbiguousConstraint { .. }
            | CompileError::IncompleteConstraint { .. } => ErrorKind::Structural,
            CompileError::UnknownImport { .. }
            | CompileError::UnknownNativeType { .. }
            | CompileError::Unresolved { .. } => ErrorKind::UnresolvedReference,
            CompileError::HierarchyCycle { .. } | CompileError::ConstraintCycle { .. } => {
                ErrorKind::CyclicReference
            }
            CompileError::ConstraintConstruction { .. } => ErrorKind::ConstraintConstruction,
            CompileError::IncompatibleOverride { .. } => ErrorKind::IncompatibleOverride,
        }
    }
}
