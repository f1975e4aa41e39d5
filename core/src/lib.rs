//! Dictum Core Types
//!
//! This crate provides the foundational types shared by the compiler, the
//! registry and the diff engine:
//! - Qualified names (QName) and their prefixed text form
//! - Namespace scopes and the prefix resolver seam
//! - The raw model descriptor handed over by an external parser
//! - The raw model source boundary (with a JSON implementation)
//! - Common error types

mod error;
mod namespace;
mod qname;
mod raw;
mod source;

pub use error::*;
pub use namespace::*;
pub use qname::*;
pub use raw::*;
pub use source::*;
