//! Constraint implementations and the table of factories that builds them.

use crate::kinds::{LengthConstraint, ListOfValuesConstraint, MinMaxConstraint, RegexConstraint};
use crate::{ConstraintError, ConstraintResult, Violation};
use dictum_core::{ParamValue, RawNamedValue};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// A validator supplied from outside the built-in kinds.
pub trait CustomConstraint: fmt::Debug + Send + Sync {
    fn set_parameter(&mut self, name: &str, value: &ParamValue) -> ConstraintResult<()>;

    fn initialize(&mut self) -> ConstraintResult<()> {
        Ok(())
    }

    fn parameters(&self) -> BTreeMap<String, ParamValue>;

    fn evaluate(&self, value: &str) -> Result<(), Violation>;
}

/// Creates fresh, unconfigured custom validators.
pub trait ConstraintFactory: Send + Sync {
    fn create(&self) -> Box<dyn CustomConstraint>;
}

impl<F> ConstraintFactory for F
where
    F: Fn() -> Box<dyn CustomConstraint> + Send + Sync,
{
    fn create(&self) -> Box<dyn CustomConstraint> {
        self()
    }
}

/// A concrete constraint validator.
#[derive(Debug)]
pub enum ConstraintImpl {
    Regex(RegexConstraint),
    MinMax(MinMaxConstraint),
    Length(LengthConstraint),
    List(ListOfValuesConstraint),
    Custom {
        key: String,
        inner: Box<dyn CustomConstraint>,
    },
}

impl ConstraintImpl {
    /// The type keyword this implementation was built from.
    pub fn type_name(&self) -> &str {
        match self {
            ConstraintImpl::Regex(_) => RegexConstraint::TYPE,
            ConstraintImpl::MinMax(_) => MinMaxConstraint::TYPE,
            ConstraintImpl::Length(_) => LengthConstraint::TYPE,
            ConstraintImpl::List(_) => ListOfValuesConstraint::TYPE,
            ConstraintImpl::Custom { key, .. } => key,
        }
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) -> ConstraintResult<()> {
        match self {
            ConstraintImpl::Regex(c) => c.set_parameter(name, value),
            ConstraintImpl::MinMax(c) => c.set_parameter(name, value),
            ConstraintImpl::Length(c) => c.set_parameter(name, value),
            ConstraintImpl::List(c) => c.set_parameter(name, value),
            ConstraintImpl::Custom { inner, .. } => inner.set_parameter(name, value),
        }
    }

    pub fn initialize(&mut self) -> ConstraintResult<()> {
        match self {
            ConstraintImpl::Regex(c) => c.initialize(),
            ConstraintImpl::MinMax(c) => c.initialize(),
            ConstraintImpl::Length(c) => c.initialize(),
            ConstraintImpl::List(c) => c.initialize(),
            ConstraintImpl::Custom { inner, .. } => inner.initialize(),
        }
    }

    /// The effective parameters, defaults included.
    pub fn parameters(&self) -> BTreeMap<String, ParamValue> {
        match self {
            ConstraintImpl::Regex(c) => c.parameters(),
            ConstraintImpl::MinMax(c) => c.parameters(),
            ConstraintImpl::Length(c) => c.parameters(),
            ConstraintImpl::List(c) => c.parameters(),
            ConstraintImpl::Custom { inner, .. } => inner.parameters(),
        }
    }

    pub fn evaluate(&self, value: &str) -> Result<(), Violation> {
        match self {
            ConstraintImpl::Regex(c) => c.evaluate(value),
            ConstraintImpl::MinMax(c) => c.evaluate(value),
            ConstraintImpl::Length(c) => c.evaluate(value),
            ConstraintImpl::List(c) => c.evaluate(value),
            ConstraintImpl::Custom { inner, .. } => inner.evaluate(value),
        }
    }
}

impl PartialEq for ConstraintImpl {
    fn eq(&self, other: &Self) -> bool {
        self.type_name() == other.type_name() && self.parameters() == other.parameters()
    }
}

/// Table from constraint type keyword to the factory that builds it.
///
/// The built-in kinds are always available and cannot be replaced.
#[derive(Clone, Default)]
pub struct ConstraintFactories {
    custom: HashMap<String, Arc<dyn ConstraintFactory>>,
}

impl ConstraintFactories {
    const BUILTIN: [&'static str; 4] = [
        RegexConstraint::TYPE,
        MinMaxConstraint::TYPE,
        LengthConstraint::TYPE,
        ListOfValuesConstraint::TYPE,
    ];

    pub fn new() -> Self {
        Self::default()
    }

    /// Register a custom kind under `key`.
    pub fn register(
        &mut self,
        key: impl Into<String>,
        factory: impl ConstraintFactory + 'static,
    ) -> ConstraintResult<()> {
        let key = key.into();
        if Self::BUILTIN.contains(&key.as_str()) {
            return Err(ConstraintError::reserved_type(key));
        }
        self.custom.insert(key, Arc::new(factory));
        Ok(())
    }

    /// Consuming form of [`register`](Self::register).
    pub fn with_factory(
        mut self,
        key: impl Into<String>,
        factory: impl ConstraintFactory + 'static,
    ) -> ConstraintResult<Self> {
        self.register(key, factory)?;
        Ok(self)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        Self::BUILTIN.contains(&type_name) || self.custom.contains_key(type_name)
    }

    /// Create an unconfigured implementation for `type_name`.
    pub fn create(&self, type_name: &str) -> ConstraintResult<ConstraintImpl> {
        let created = match type_name {
            RegexConstraint::TYPE => ConstraintImpl::Regex(RegexConstraint::new()),
            MinMaxConstraint::TYPE => ConstraintImpl::MinMax(MinMaxConstraint::new()),
            LengthConstraint::TYPE => ConstraintImpl::Length(LengthConstraint::new()),
            ListOfValuesConstraint::TYPE => ConstraintImpl::List(ListOfValuesConstraint::new()),
            other => {
                let factory = self
                    .custom
                    .get(other)
                    .ok_or_else(|| ConstraintError::unknown_type(other))?;
                ConstraintImpl::Custom {
                    key: other.to_string(),
                    inner: factory.create(),
                }
            }
        };
        Ok(created)
    }

    /// Create, configure and initialize an implementation.
    pub fn build(
        &self,
        type_name: &str,
        parameters: &[RawNamedValue],
    ) -> ConstraintResult<ConstraintImpl> {
        let mut constraint = self.create(type_name)?;
        for parameter in parameters {
            constraint.set_parameter(&parameter.name, &parameter.value)?;
        }
        constraint.initialize()?;
        Ok(constraint)
    }
}

impl fmt::Debug for ConstraintFactories {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.custom.keys().collect();
        keys.sort();
        f.debug_struct("ConstraintFactories")
            .field("custom", &keys)
            .finish()
    }
}
