//! Constraint error types.

use thiserror::Error;

/// Result type for constraint operations.
pub type ConstraintResult<T> = Result<T, ConstraintError>;

/// Errors that can occur while building a constraint implementation.
#[derive(Debug, Error)]
pub enum ConstraintError {
    #[error("Unknown constraint type: {type_name}")]
    UnknownType { type_name: String },

    #[error("Constraint type '{type_name}' is built in and cannot be re-registered")]
    ReservedType { type_name: String },

    #[error("Constraint type '{type_name}' has no parameter '{parameter}'")]
    UnknownParameter {
        type_name: String,
        parameter: String,
    },

    #[error("Invalid value for parameter '{parameter}' of '{type_name}': {message}")]
    InvalidParameter {
        type_name: String,
        parameter: String,
        message: String,
    },

    #[error("Constraint '{type_name}' failed to initialize: {message}")]
    Initialization { type_name: String, message: String },
}

impl ConstraintError {
    pub fn unknown_type(type_name: impl Into<String>) -> Self {
        Self::UnknownType {
            type_name: type_name.into(),
        }
    }

    pub fn reserved_type(type_name: impl Into<String>) -> Self {
        Self::ReservedType {
            type_name: type_name.into(),
        }
    }

    pub fn unknown_parameter(type_name: impl Into<String>, parameter: impl Into<String>) -> Self {
        Self::UnknownParameter {
            type_name: type_name.into(),
            parameter: parameter.into(),
        }
    }

    pub fn invalid_parameter(
        type_name: impl Into<String>,
        parameter: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::InvalidParameter {
            type_name: type_name.into(),
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn initialization(type_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Initialization {
            type_name: type_name.into(),
            message: message.into(),
        }
    }
}
