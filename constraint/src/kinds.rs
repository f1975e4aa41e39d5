//! The well-known constraint kinds.
//!
//! Each kind follows the same lifecycle: created empty, parameters applied
//! by name, then `initialize` checks the combination before first use.

use crate::{ConstraintError, ConstraintResult, Violation};
use dictum_core::ParamValue;
use regex_lite::Regex;
use std::collections::BTreeMap;

fn scalar<'a>(type_name: &str, parameter: &str, value: &'a ParamValue) -> ConstraintResult<&'a str> {
    value
        .as_scalar()
        .map(str::trim)
        .ok_or_else(|| ConstraintError::invalid_parameter(type_name, parameter, "expected a single value"))
}

fn parse_bool(type_name: &str, parameter: &str, value: &ParamValue) -> ConstraintResult<bool> {
    match scalar(type_name, parameter, value)?.to_ascii_lowercase().as_str() {
        "true" => Ok(true),
        "false" => Ok(false),
        other => Err(ConstraintError::invalid_parameter(
            type_name,
            parameter,
            format!("'{}' is not a boolean", other),
        )),
    }
}

fn parse_f64(type_name: &str, parameter: &str, value: &ParamValue) -> ConstraintResult<f64> {
    let text = scalar(type_name, parameter, value)?;
    text.parse::<f64>()
        .ok()
        .filter(|v| !v.is_nan())
        .ok_or_else(|| {
            ConstraintError::invalid_parameter(type_name, parameter, format!("'{}' is not a number", text))
        })
}

fn parse_usize(type_name: &str, parameter: &str, value: &ParamValue) -> ConstraintResult<usize> {
    let text = scalar(type_name, parameter, value)?;
    text.parse::<usize>().map_err(|_| {
        ConstraintError::invalid_parameter(
            type_name,
            parameter,
            format!("'{}' is not a non-negative integer", text),
        )
    })
}

fn number_text(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        value.to_string()
    }
}

/// Matches values against a regular expression.
#[derive(Debug, Clone)]
pub struct RegexConstraint {
    expression: Option<String>,
    requires_match: bool,
    pattern: Option<Regex>,
}

impl RegexConstraint {
    pub const TYPE: &'static str = "REGEX";

    pub fn new() -> Self {
        Self {
            expression: None,
            requires_match: true,
            pattern: None,
        }
    }

    pub fn expression(&self) -> Option<&str> {
        self.expression.as_deref()
    }

    pub fn requires_match(&self) -> bool {
        self.requires_match
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) -> ConstraintResult<()> {
        match name {
            "expression" => {
                let text = value.as_scalar().ok_or_else(|| {
                    ConstraintError::invalid_parameter(Self::TYPE, name, "expected a single value")
                })?;
                self.expression = Some(text.to_string());
            }
            "requiresMatch" => self.requires_match = parse_bool(Self::TYPE, name, value)?,
            _ => return Err(ConstraintError::unknown_parameter(Self::TYPE, name)),
        }
        Ok(())
    }

    pub fn initialize(&mut self) -> ConstraintResult<()> {
        let expression = self
            .expression
            .as_ref()
            .ok_or_else(|| ConstraintError::initialization(Self::TYPE, "'expression' is required"))?;
        // Validate the bare expression before anchoring it
        Regex::new(expression)
            .map_err(|e| ConstraintError::initialization(Self::TYPE, e.to_string()))?;
        // The whole value must match, not just a substring
        let anchored = format!("^(?:{})$", expression);
        let pattern = Regex::new(&anchored)
            .map_err(|e| ConstraintError::initialization(Self::TYPE, e.to_string()))?;
        self.pattern = Some(pattern);
        Ok(())
    }

    pub fn parameters(&self) -> BTreeMap<String, ParamValue> {
        let mut params = BTreeMap::new();
        if let Some(expression) = &self.expression {
            params.insert("expression".to_string(), ParamValue::Scalar(expression.clone()));
        }
        params.insert(
            "requiresMatch".to_string(),
            ParamValue::Scalar(self.requires_match.to_string()),
        );
        params
    }

    pub fn evaluate(&self, value: &str) -> Result<(), Violation> {
        let Some(pattern) = &self.pattern else {
            return Err(Violation::new(Self::TYPE, "constraint is not initialized", value));
        };
        if pattern.is_match(value) == self.requires_match {
            return Ok(());
        }
        let expression = self.expression.as_deref().unwrap_or_default();
        let message = if self.requires_match {
            format!("value does not match '{}'", expression)
        } else {
            format!("value must not match '{}'", expression)
        };
        Err(Violation::new(Self::TYPE, message, value))
    }
}

impl Default for RegexConstraint {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounds a numeric value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MinMaxConstraint {
    min_value: Option<f64>,
    max_value: Option<f64>,
}

impl MinMaxConstraint {
    pub const TYPE: &'static str = "MINMAX";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn min_value(&self) -> Option<f64> {
        self.min_value
    }

    pub fn max_value(&self) -> Option<f64> {
        self.max_value
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) -> ConstraintResult<()> {
        match name {
            "minValue" => self.min_value = Some(parse_f64(Self::TYPE, name, value)?),
            "maxValue" => self.max_value = Some(parse_f64(Self::TYPE, name, value)?),
            _ => return Err(ConstraintError::unknown_parameter(Self::TYPE, name)),
        }
        Ok(())
    }

    pub fn initialize(&mut self) -> ConstraintResult<()> {
        match (self.min_value, self.max_value) {
            (None, None) => Err(ConstraintError::initialization(
                Self::TYPE,
                "at least one of 'minValue' or 'maxValue' is required",
            )),
            (Some(min), Some(max)) if min > max => Err(ConstraintError::initialization(
                Self::TYPE,
                format!("minValue {} is greater than maxValue {}", min, max),
            )),
            _ => Ok(()),
        }
    }

    pub fn parameters(&self) -> BTreeMap<String, ParamValue> {
        let mut params = BTreeMap::new();
        if let Some(min) = self.min_value {
            params.insert("minValue".to_string(), ParamValue::Scalar(number_text(min)));
        }
        if let Some(max) = self.max_value {
            params.insert("maxValue".to_string(), ParamValue::Scalar(number_text(max)));
        }
        params
    }

    pub fn evaluate(&self, value: &str) -> Result<(), Violation> {
        let number: f64 = value
            .trim()
            .parse()
            .map_err(|_| Violation::new(Self::TYPE, "value is not numeric", value))?;
        if let Some(min) = self.min_value {
            if number < min {
                return Err(Violation::new(
                    Self::TYPE,
                    format!("value is less than {}", number_text(min)),
                    value,
                ));
            }
        }
        if let Some(max) = self.max_value {
            if number > max {
                return Err(Violation::new(
                    Self::TYPE,
                    format!("value is greater than {}", number_text(max)),
                    value,
                ));
            }
        }
        Ok(())
    }
}

/// Bounds the length of a text value, in characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LengthConstraint {
    min_length: usize,
    max_length: usize,
}

impl LengthConstraint {
    pub const TYPE: &'static str = "LENGTH";

    pub fn new() -> Self {
        Self {
            min_length: 0,
            max_length: i32::MAX as usize,
        }
    }

    pub fn min_length(&self) -> usize {
        self.min_length
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) -> ConstraintResult<()> {
        match name {
            "minLength" => self.min_length = parse_usize(Self::TYPE, name, value)?,
            "maxLength" => self.max_length = parse_usize(Self::TYPE, name, value)?,
            _ => return Err(ConstraintError::unknown_parameter(Self::TYPE, name)),
        }
        Ok(())
    }

    pub fn initialize(&mut self) -> ConstraintResult<()> {
        if self.min_length > self.max_length {
            return Err(ConstraintError::initialization(
                Self::TYPE,
                format!(
                    "minLength {} is greater than maxLength {}",
                    self.min_length, self.max_length
                ),
            ));
        }
        Ok(())
    }

    pub fn parameters(&self) -> BTreeMap<String, ParamValue> {
        let mut params = BTreeMap::new();
        params.insert(
            "minLength".to_string(),
            ParamValue::Scalar(self.min_length.to_string()),
        );
        params.insert(
            "maxLength".to_string(),
            ParamValue::Scalar(self.max_length.to_string()),
        );
        params
    }

    pub fn evaluate(&self, value: &str) -> Result<(), Violation> {
        let length = value.chars().count();
        if length < self.min_length || length > self.max_length {
            return Err(Violation::new(
                Self::TYPE,
                format!(
                    "length {} is outside {}..={}",
                    length, self.min_length, self.max_length
                ),
                value,
            ));
        }
        Ok(())
    }
}

impl Default for LengthConstraint {
    fn default() -> Self {
        Self::new()
    }
}

/// Restricts a value to an enumerated list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListOfValuesConstraint {
    allowed_values: Vec<String>,
    case_sensitive: bool,
    sorted: bool,
}

impl ListOfValuesConstraint {
    pub const TYPE: &'static str = "LIST";

    pub fn new() -> Self {
        Self {
            allowed_values: Vec::new(),
            case_sensitive: true,
            sorted: false,
        }
    }

    pub fn allowed_values(&self) -> &[String] {
        &self.allowed_values
    }

    pub fn is_case_sensitive(&self) -> bool {
        self.case_sensitive
    }

    pub fn set_parameter(&mut self, name: &str, value: &ParamValue) -> ConstraintResult<()> {
        match name {
            "allowedValues" => {
                self.allowed_values = match value {
                    ParamValue::List(items) => items.clone(),
                    ParamValue::Scalar(item) => vec![item.clone()],
                };
            }
            "caseSensitive" => self.case_sensitive = parse_bool(Self::TYPE, name, value)?,
            "sorted" => self.sorted = parse_bool(Self::TYPE, name, value)?,
            _ => return Err(ConstraintError::unknown_parameter(Self::TYPE, name)),
        }
        Ok(())
    }

    pub fn initialize(&mut self) -> ConstraintResult<()> {
        if self.allowed_values.is_empty() {
            return Err(ConstraintError::initialization(
                Self::TYPE,
                "'allowedValues' must not be empty",
            ));
        }
        if self.sorted {
            self.allowed_values.sort();
        }
        Ok(())
    }

    pub fn parameters(&self) -> BTreeMap<String, ParamValue> {
        let mut params = BTreeMap::new();
        params.insert(
            "allowedValues".to_string(),
            ParamValue::List(self.allowed_values.clone()),
        );
        params.insert(
            "caseSensitive".to_string(),
            ParamValue::Scalar(self.case_sensitive.to_string()),
        );
        params.insert("sorted".to_string(), ParamValue::Scalar(self.sorted.to_string()));
        params
    }

    pub fn evaluate(&self, value: &str) -> Result<(), Violation> {
        let allowed = if self.case_sensitive {
            self.allowed_values.iter().any(|v| v == value)
        } else {
            self.allowed_values
                .iter()
                .any(|v| v.to_lowercase() == value.to_lowercase())
        };
        if allowed {
            Ok(())
        } else {
            Err(Violation::new(Self::TYPE, "value is not in the allowed list", value))
        }
    }
}

impl Default for ListOfValuesConstraint {
    fn default() -> Self {
        Self::new()
    }
}
