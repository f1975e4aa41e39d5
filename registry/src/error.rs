//! Registry error types.

use dictum_compiler::CompileError;
use dictum_core::{CoreError, QName};
use dictum_diff::{DiffError, ElementDiff};
use thiserror::Error;

/// Result type for registry operations.
pub type RegistryResult<T> = Result<T, RegistryError>;

/// Errors that can occur in the registry.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// The model failed to compile.
    #[error("Compile error: {0}")]
    Compile(#[from] CompileError),

    /// The models could not be compared.
    #[error("Diff error: {0}")]
    Diff(#[from] DiffError),

    /// A descriptor could not be read.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// No such model or element.
    #[error("{kind} '{name}' not found")]
    NotFound { kind: &'static str, name: String },

    /// The cache stayed empty after a reset.
    #[error("Model cache for domain '{domain}' could not be initialized")]
    Concurrency { domain: String },

    /// An update to a model in use is not incremental.
    #[error("Update of model '{model}' rejected: {} non-incremental change(s)", .diffs.len())]
    ValidationRejected {
        model: QName,
        diffs: Vec<ElementDiff>,
    },

    /// A namespace prefix or URI is already taken.
    #[error("Namespace conflict in model '{model}': {reason}")]
    Namespace { model: QName, reason: String },

    /// The persistent store failed.
    #[error("Model store error: {message}")]
    Store { message: String },

    /// Stored models import each other's namespaces in a loop.
    #[error("Import cycle between models: {}", .models.join(", "))]
    ImportCycle { models: Vec<String> },

    /// The cache changed between snapshot and publish.
    #[error("Model cache for domain '{domain}' changed during compilation")]
    StaleSnapshot { domain: String },
}

impl RegistryError {
    pub fn not_found(kind: &'static str, name: impl ToString) -> Self {
        Self::NotFound {
            kind,
            name: name.to_string(),
        }
    }

    pub fn concurrency(domain: impl Into<String>) -> Self {
        Self::Concurrency {
            domain: domain.into(),
        }
    }

    pub fn namespace(model: QName, reason: impl Into<String>) -> Self {
        Self::Namespace {
            model,
            reason: reason.into(),
        }
    }

    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    pub fn stale_snapshot(domain: impl Into<String>) -> Self {
        Self::StaleSnapshot {
            domain: domain.into(),
        }
    }

    /// Whether retrying the operation may succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RegistryError::StaleSnapshot { .. } | RegistryError::Concurrency { .. }
        )
    }
}
