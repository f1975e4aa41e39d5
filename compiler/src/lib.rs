//! Dictum Compiler
//!
//! Transform a raw model descriptor into a compiled model.
//!
//! Responsibilities:
//! - Resolve short names against the model's namespace scope
//! - Validate every cross-element and cross-model reference
//! - Flatten class hierarchies (properties, associations, default aspects, archive)
//! - Resolve named and anonymous constraints, including `ref` chains
//!
//! Compilation is a pure function of its inputs: it performs no I/O and
//! never touches shared state.

pub mod builtin;
mod compiler;
mod config;
mod constraints;
mod error;
mod inheritance;
mod model;
mod query;

pub use compiler::Compiler;
pub use config::CompilerConfig;
pub use error::{CompileError, CompileResult, ErrorKind};
pub use model::{
    AssociationDef, AssociationEnd, ChildAssociationDetails, ClassDef, ClassKind, CompiledModel,
    ConstraintDef, DataTypeDef, ModelDef, NativeType, PropertyDef,
};
pub use query::{DelegatingQuery, EmptyQuery, ModelQuery};
