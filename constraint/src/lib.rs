//! Dictum Constraint
//!
//! Concrete validators behind compiled constraint definitions.
//!
//! Responsibilities:
//! - The closed set of well-known kinds (REGEX, MINMAX, LENGTH, LIST)
//! - Custom kinds built through registered factories
//! - Applying named parameters and initializing a validator
//! - Evaluating candidate values and reporting violations

mod error;
mod factory;
mod kinds;
mod violation;

pub use error::{ConstraintError, ConstraintResult};
pub use factory::{ConstraintFactories, ConstraintFactory, ConstraintImpl, CustomConstraint};
pub use kinds::{LengthConstraint, ListOfValuesConstraint, MinMaxConstraint, RegexConstraint};
pub use violation::{Violation, Violations};
