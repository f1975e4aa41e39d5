//! Cross-model lookups.
//!
//! A model under compilation may reference classes, data types, properties
//! and constraints that other models define. The compiler reaches those
//! through a [`ModelQuery`], normally backed by the registry.

use crate::model::{
    AssociationDef, ClassDef, ClassKind, CompiledModel, ConstraintDef, DataTypeDef, PropertyDef,
};
use dictum_core::QName;
use std::sync::Arc;

/// Lookup of compiled definitions by QName.
pub trait ModelQuery {
    fn get_data_type(&self, name: &QName) -> Option<Arc<DataTypeDef>>;

    fn get_class(&self, name: &QName) -> Option<Arc<ClassDef>>;

    fn get_property(&self, name: &QName) -> Option<Arc<PropertyDef>>;

    fn get_association(&self, name: &QName) -> Option<Arc<AssociationDef>>;

    fn get_constraint(&self, name: &QName) -> Option<Arc<ConstraintDef>>;

    fn get_type(&self, name: &QName) -> Option<Arc<ClassDef>> {
        self.get_class(name)
            .filter(|class| class.kind == ClassKind::Type)
    }

    fn get_aspect(&self, name: &QName) -> Option<Arc<ClassDef>> {
        self.get_class(name)
            .filter(|class| class.kind == ClassKind::Aspect)
    }
}

/// A query that knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyQuery;

impl ModelQuery for EmptyQuery {
    fn get_data_type(&self, _name: &QName) -> Option<Arc<DataTypeDef>> {
        None
    }

    fn get_class(&self, _name: &QName) -> Option<Arc<ClassDef>> {
        None
    }

    fn get_property(&self, _name: &QName) -> Option<Arc<PropertyDef>> {
        None
    }

    fn get_association(&self, _name: &QName) -> Option<Arc<AssociationDef>> {
        None
    }

    fn get_constraint(&self, _name: &QName) -> Option<Arc<ConstraintDef>> {
        None
    }
}

impl ModelQuery for CompiledModel {
    fn get_data_type(&self, name: &QName) -> Option<Arc<DataTypeDef>> {
        self.data_types.get(name).cloned()
    }

    fn get_class(&self, name: &QName) -> Option<Arc<ClassDef>> {
        self.classes.get(name).cloned()
    }

    fn get_property(&self, name: &QName) -> Option<Arc<PropertyDef>> {
        self.properties.get(name).cloned()
    }

    fn get_association(&self, name: &QName) -> Option<Arc<AssociationDef>> {
        self.associations.get(name).cloned()
    }

    fn get_constraint(&self, name: &QName) -> Option<Arc<ConstraintDef>> {
        self.constraints.get(name).cloned()
    }
}

/// Asks `local` first and falls back to `delegate`.
pub struct DelegatingQuery<'a> {
    local: &'a dyn ModelQuery,
    delegate: &'a dyn ModelQuery,
}

impl<'a> DelegatingQuery<'a> {
    pub fn new(local: &'a dyn ModelQuery, delegate: &'a dyn ModelQuery) -> Self {
        Self { local, delegate }
    }
}

impl ModelQuery for DelegatingQuery<'_> {
    fn get_data_type(&self, name: &QName) -> Option<Arc<DataTypeDef>> {
        self.local
            .get_data_type(name)
            .or_else(|| self.delegate.get_data_type(name))
    }

    fn get_class(&self, name: &QName) -> Option<Arc<ClassDef>> {
        self.local
            .get_class(name)
            .or_else(|| self.delegate.get_class(name))
    }

    fn get_property(&self, name: &QName) -> Option<Arc<PropertyDef>> {
        self.local
            .get_property(name)
            .or_else(|| self.delegate.get_property(name))
    }

    fn get_association(&self, name: &QName) -> Option<Arc<AssociationDef>> {
        self.local
            .get_association(name)
            .or_else(|| self.delegate.get_association(name))
    }

    fn get_constraint(&self, name: &QName) -> Option<Arc<ConstraintDef>> {
        self.local
            .get_constraint(name)
            .or_else(|| self.delegate.get_constraint(name))
    }
}
