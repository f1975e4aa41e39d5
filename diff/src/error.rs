//! Diff error types.

use crate::ElementDiff;
use dictum_core::QName;
use thiserror::Error;

/// Result type for diff operations.
pub type DiffResult<T> = Result<T, DiffError>;

#[derive(Debug, Error)]
pub enum DiffError {
    /// Neither a previous nor a candidate model was supplied.
    #[error("Nothing to compare: both models are absent")]
    NothingToCompare,

    /// The two models are not versions of the same schema.
    #[error("Cannot compare model '{previous}' with model '{candidate}'")]
    ModelMismatch { previous: QName, candidate: QName },

    /// The candidate contains deletions or non-incremental updates.
    #[error("{} change(s) are not incremental: {}", .diffs.len(), summary(.diffs))]
    NotIncremental { diffs: Vec<ElementDiff> },
}

fn summary(diffs: &[ElementDiff]) -> String {
    diffs
        .iter()
        .map(ElementDiff::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl DiffError {
    pub fn model_mismatch(previous: QName, candidate: QName) -> Self {
        Self::ModelMismatch {
            previous,
            candidate,
        }
    }

    /// The offending diffs of a rejected update; empty for other errors.
    pub fn diffs(&self) -> &[ElementDiff] {
        match self {
            DiffError::NotIncremental { diffs } => diffs,
            _ => &[],
        }
    }
}
