//! Assertion types and builders for verifying step results.

use dictum_compiler::ErrorKind;
use dictum_core::{QName, RawModel};
use dictum_diff::{DiffType, ElementDiff};
use dictum_registry::RegistryError;

use crate::error::{ExampleError, ExampleResult};
use crate::fixture::resolve_name;

/// What a step is expected to produce.
#[derive(Debug, Default)]
pub struct Assertion {
    /// The update must pass incremental validation and is then published.
    pub accepted: Option<bool>,
    /// Expected classification per element, as `prefix:local`.
    pub diffs: Vec<(String, DiffType)>,
    /// The step must fail to compile with this kind.
    pub error_kind: Option<ErrorKind>,
    /// The step must fail with an error whose message contains this text.
    pub error_contains: Option<String>,
}

impl Assertion {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn accepted(mut self) -> Self {
        self.accepted = Some(true);
        self
    }

    pub fn rejected(mut self) -> Self {
        self.accepted = Some(false);
        self
    }

    pub fn diff(mut self, name: &str, diff_type: DiffType) -> Self {
        self.diffs.push((name.to_string(), diff_type));
        self
    }

    pub fn fails_with(mut self, kind: ErrorKind) -> Self {
        self.error_kind = Some(kind);
        self
    }

    pub fn error_contains(mut self, text: &str) -> Self {
        self.error_contains = Some(text.to_string());
        self
    }

    pub fn expects_error(&self) -> bool {
        self.error_kind.is_some() || self.error_contains.is_some()
    }

    /// Check the diffs computed for `model`.
    pub fn verify_diffs(
        &self,
        step: &str,
        model: &RawModel,
        diffs: &[ElementDiff],
    ) -> ExampleResult<()> {
        for (text, expected) in &self.diffs {
            let name: QName = resolve_name(model, text)?;
            let found = diffs.iter().find(|d| d.name == name).ok_or_else(|| {
                ExampleError::assertion_failed(step, format!("no diff for '{}'", text))
            })?;
            if found.diff_type != *expected {
                return Err(ExampleError::assertion_failed(
                    step,
                    format!(
                        "'{}' classified {}, expected {}",
                        text, found.diff_type, expected
                    ),
                ));
            }
        }
        Ok(())
    }

    /// Check an error raised by the step.
    pub fn verify_error(&self, step: &str, error: &RegistryError) -> ExampleResult<()> {
        if let Some(kind) = self.error_kind {
            match error {
                RegistryError::Compile(e) if e.kind() == kind => {}
                other => {
                    return Err(ExampleError::assertion_failed(
                        step,
                        format!("expected {:?} error, got: {}", kind, other),
                    ))
                }
            }
        }
        if let Some(text) = &self.error_contains {
            let message = error.to_string();
            if !message.contains(text.as_str()) {
                return Err(ExampleError::assertion_failed(
                    step,
                    format!("error '{}' does not contain '{}'", message, text),
                ));
            }
        }
        Ok(())
    }
}
