//! Compiler configuration.

/// Options that change how strictly a model is compiled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Every element a model defines must live in a namespace the model
    /// itself declares.
    pub enforce_declared_namespaces: bool,
}

impl Default for CompilerConfig {
    fn default() -> Self {
        Self {
            enforce_declared_namespaces: true,
        }
    }
}

impl CompilerConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_enforce_declared_namespaces(mut self, enforce: bool) -> Self {
        self.enforce_declared_namespaces = enforce;
        self
    }
}
