//! Diff result types.

use dictum_core::QName;
use std::fmt;

/// Kind of schema element a diff is about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ElementType {
    Type,
    Aspect,
    Property,
    Association,
    Constraint,
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            ElementType::Type => "TYPE",
            ElementType::Aspect => "ASPECT",
            ElementType::Property => "PROPERTY",
            ElementType::Association => "ASSOCIATION",
            ElementType::Constraint => "CONSTRAINT",
        };
        f.write_str(label)
    }
}

/// Classification of one element's change.
///
/// Variants are ordered from least to most disruptive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DiffType {
    Unchanged,
    UpdatedIncrementally,
    Created,
    Updated,
    Deleted,
}

impl DiffType {
    /// Whether this change may be applied to a model in use.
    pub fn is_incremental(self) -> bool {
        matches!(
            self,
            DiffType::Unchanged | DiffType::UpdatedIncrementally | DiffType::Created
        )
    }
}

impl fmt::Display for DiffType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            DiffType::Unchanged => "UNCHANGED",
            DiffType::UpdatedIncrementally => "UPDATED_INC",
            DiffType::Created => "CREATED",
            DiffType::Updated => "UPDATED",
            DiffType::Deleted => "DELETED",
        };
        f.write_str(label)
    }
}

/// The classification of one element.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ElementDiff {
    pub name: QName,
    pub element_type: ElementType,
    pub diff_type: DiffType,
    /// Owning class of a property or association.
    pub owner: Option<QName>,
}

impl ElementDiff {
    pub fn new(name: QName, element_type: ElementType, diff_type: DiffType) -> Self {
        Self {
            name,
            element_type,
            diff_type,
            owner: None,
        }
    }

    pub fn with_owner(mut self, owner: QName) -> Self {
        self.owner = Some(owner);
        self
    }
}

impl fmt::Display for ElementDiff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.element_type, self.name, self.diff_type)
    }
}
