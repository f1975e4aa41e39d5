//! Constraint violation types.

use std::fmt;

/// A value rejected by a constraint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// Type keyword of the constraint that rejected the value.
    pub constraint_type: String,
    /// Human-readable message describing the violation.
    pub message: String,
    /// The offending value.
    pub value: String,
}

impl Violation {
    /// Create a new violation.
    pub fn new(
        constraint_type: impl Into<String>,
        message: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            constraint_type: constraint_type.into(),
            message: message.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} constraint rejected '{}': {}",
            self.constraint_type, self.value, self.message
        )
    }
}

/// Violations collected while evaluating one value.
#[derive(Debug, Clone, Default)]
pub struct Violations {
    violations: Vec<Violation>,
}

impl Violations {
    /// Create a new empty violations collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of one evaluation.
    pub fn record(&mut self, outcome: Result<(), Violation>) {
        if let Err(violation) = outcome {
            self.violations.push(violation);
        }
    }

    /// Check if there are any violations.
    pub fn is_empty(&self) -> bool {
        self.violations.is_empty()
    }

    /// Get all violations.
    pub fn all(&self) -> &[Violation] {
        &self.violations
    }

    /// Get the number of violations.
    pub fn len(&self) -> usize {
        self.violations.len()
    }
}

impl IntoIterator for Violations {
    type Item = Violation;
    type IntoIter = std::vec::IntoIter<Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.into_iter()
    }
}

impl<'a> IntoIterator for &'a Violations {
    type Item = &'a Violation;
    type IntoIter = std::slice::Iter<'a, Violation>;

    fn into_iter(self) -> Self::IntoIter {
        self.violations.iter()
    }
}
