//! Fixture loading.

use std::fs;
use std::path::PathBuf;
use std::sync::Arc;

use dictum_compiler::builtin::dictionary_model;
use dictum_core::{JsonModelSource, NamespaceScope, QName, RawModel, RawModelSource};
use dictum_registry::{InMemoryModelStore, ModelRegistry};

use crate::error::{ExampleError, ExampleResult};

/// Path of a file under the `fixtures` directory.
pub fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join(relative)
}

/// Read and parse a JSON model fixture.
pub fn load_fixture(relative: &str) -> ExampleResult<RawModel> {
    let path = fixture_path(relative);
    let bytes = fs::read(&path).map_err(|e| ExampleError::file_read(&path, e))?;
    JsonModelSource::new()
        .parse(&bytes)
        .map_err(|e| ExampleError::fixture_parse(&path, e.to_string()))
}

/// A registry whose store holds only the dictionary model.
pub fn registry_with_dictionary() -> (ModelRegistry, Arc<InMemoryModelStore>) {
    let store = Arc::new(InMemoryModelStore::new());
    store.save("", dictionary_model());
    (ModelRegistry::new(store.clone()), store)
}

/// Resolve `prefix:local` against the namespaces `model` declares or imports.
pub fn resolve_name(model: &RawModel, text: &str) -> ExampleResult<QName> {
    let mut scope = NamespaceScope::new();
    for ns in model.scope_namespaces() {
        scope
            .bind(ns.prefix.as_str(), ns.uri.as_str())
            .map_err(|e| ExampleError::step_execution(&model.name, e.to_string()))?;
    }
    QName::resolve(text, &scope).map_err(|e| ExampleError::step_execution(&model.name, e.to_string()))
}
