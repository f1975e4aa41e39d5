//! Common error types for Dictum.

use thiserror::Error;

/// Errors raised while resolving names and reading raw descriptors.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Text that is neither `prefix:local`, `{uri}local` nor a bare local name.
    #[error("Invalid qualified name: '{0}'")]
    InvalidQName(String),

    /// A prefix that no namespace in scope binds.
    #[error("Namespace prefix '{prefix}' is not bound (in '{text}')")]
    UnknownPrefix { prefix: String, text: String },

    /// A prefix bound to two different URIs.
    #[error("Namespace prefix '{prefix}' is already bound to '{existing}', cannot bind it to '{uri}'")]
    PrefixClash {
        prefix: String,
        existing: String,
        uri: String,
    },

    /// A raw model source could not produce a descriptor.
    #[error("Failed to parse model descriptor: {message}")]
    ModelParse { message: String },
}

impl CoreError {
    pub fn invalid_qname(text: impl Into<String>) -> Self {
        Self::InvalidQName(text.into())
    }

    pub fn unknown_prefix(prefix: impl Into<String>, text: impl Into<String>) -> Self {
        Self::UnknownPrefix {
            prefix: prefix.into(),
            text: text.into(),
        }
    }

    pub fn prefix_clash(
        prefix: impl Into<String>,
        existing: impl Into<String>,
        uri: impl Into<String>,
    ) -> Self {
        Self::PrefixClash {
            prefix: prefix.into(),
            existing: existing.into(),
            uri: uri.into(),
        }
    }

    pub fn model_parse(message: impl Into<String>) -> Self {
        Self::ModelParse {
            message: message.into(),
        }
    }
}

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;
