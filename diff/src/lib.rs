//! Dictum Diff
//!
//! Compare two compiled versions of one model and classify every type,
//! aspect, property, association and named constraint as created, updated,
//! updated incrementally, deleted or unchanged.
//!
//! Only creations and incremental updates may be applied to a model that
//! is already in use; [`validate_incremental`] enforces that rule.

mod element;
mod engine;
mod error;

pub use element::{DiffType, ElementDiff, ElementType};
pub use engine::{diff, non_incremental, validate_incremental};
pub use error::{DiffError, DiffResult};
