//! Dictum integration test framework.
//!
//! Scenarios register JSON model fixtures into a fresh registry one step
//! at a time and check each step's diff or error.
//!
//! ```ignore
//! Scenario::new("add_property")
//!     .put("content/v1.json")
//!     .step("content/v2_add_property.json", |a| {
//!         a.accepted()
//!             .diff("test:base", DiffType::UpdatedIncrementally)
//!             .diff("test:prop2", DiffType::Created)
//!     })
//!     .run()
//!     .unwrap();
//! ```

mod assertion;
mod error;
mod fixture;
mod scenario;

pub use assertion::Assertion;
pub use error::{ExampleError, ExampleResult};
pub use fixture::{fixture_path, load_fixture, registry_with_dictionary, resolve_name};
pub use scenario::{Scenario, Step};

pub mod prelude {
    pub use crate::{
        load_fixture, registry_with_dictionary, resolve_name, Assertion, ExampleError,
        ExampleResult, Scenario,
    };
    pub use dictum_compiler::ErrorKind;
    pub use dictum_diff::{DiffType, ElementType};
}
