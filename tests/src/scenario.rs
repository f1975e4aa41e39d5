//! Scenario definition and runner.

use dictum_registry::{ModelRegistry, RegistryError};

use crate::assertion::Assertion;
use crate::error::{ExampleError, ExampleResult};
use crate::fixture::{load_fixture, registry_with_dictionary};

/// One fixture applied to the registry.
#[derive(Debug)]
pub struct Step {
    pub fixture: String,
    pub assertion: Assertion,
}

/// A sequence of model versions registered into one fresh registry.
#[derive(Debug)]
pub struct Scenario {
    name: String,
    steps: Vec<Step>,
}

impl Scenario {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    /// Register a fixture that must compile.
    pub fn put(self, fixture: &str) -> Self {
        self.step(fixture, |a| a)
    }

    /// Apply a fixture and check the outcome.
    ///
    /// A fixture is published unless an error is expected or the
    /// assertion marks it rejected.
    pub fn step<F>(mut self, fixture: &str, f: F) -> Self
    where
        F: FnOnce(Assertion) -> Assertion,
    {
        self.steps.push(Step {
            fixture: fixture.to_string(),
            assertion: f(Assertion::new()),
        });
        self
    }

    pub fn steps(&self) -> &[Step] {
        &self.steps
    }

    /// Run every step against a fresh registry and return it.
    pub fn run(&self) -> ExampleResult<ModelRegistry> {
        let (registry, _store) = registry_with_dictionary();
        for step in &self.steps {
            let label = format!("{}:{}", self.name, step.fixture);
            let model = load_fixture(&step.fixture)?;
            let assertion = &step.assertion;

            if assertion.expects_error() {
                match registry.validate_update(&model) {
                    Ok(_) => {
                        return Err(ExampleError::assertion_failed(
                            &label,
                            "expected an error, but the model compiled",
                        ))
                    }
                    Err(e) => assertion.verify_error(&label, &e)?,
                }
                continue;
            }

            let diffs = registry
                .diff_model(&model)
                .map_err(|e| ExampleError::step_execution(&label, e.to_string()))?;
            assertion.verify_diffs(&label, &model, &diffs)?;

            match (registry.validate_update(&model), assertion.accepted) {
                (Ok(_), Some(false)) => {
                    return Err(ExampleError::assertion_failed(
                        &label,
                        "expected the update to be rejected",
                    ))
                }
                (Err(RegistryError::ValidationRejected { .. }), Some(false)) => continue,
                (Err(e), _) => {
                    return Err(ExampleError::step_execution(&label, e.to_string()));
                }
                (Ok(_), _) => {}
            }

            registry
                .put(&model)
                .map_err(|e| ExampleError::step_execution(&label, e.to_string()))?;
        }
        Ok(registry)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scenario_records_steps_in_order() {
        let scenario = Scenario::new("test")
            .put("content/v1.json")
            .step("content/v2_add_property.json", |a| a.accepted());

        assert_eq!(scenario.steps().len(), 2);
        assert_eq!(scenario.steps()[1].fixture, "content/v2_add_property.json");
        assert_eq!(scenario.steps()[1].assertion.accepted, Some(true));
    }
}
