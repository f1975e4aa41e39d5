//! Errors raised while running a scenario.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub type ExampleResult<T> = Result<T, ExampleError>;

#[derive(Debug, Error)]
pub enum ExampleError {
    #[error("Failed to read fixture {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse fixture {path}: {message}")]
    FixtureParse { path: PathBuf, message: String },

    #[error("Step '{step}' failed: {message}")]
    StepExecution { step: String, message: String },

    #[error("Assertion failed in step '{step}': {message}")]
    AssertionFailed { step: String, message: String },
}

impl ExampleError {
    pub fn file_read(path: &Path, source: std::io::Error) -> Self {
        Self::FileRead {
            path: path.to_path_buf(),
            source,
        }
    }

    pub fn fixture_parse(path: &Path, message: impl Into<String>) -> Self {
        Self::FixtureParse {
            path: path.to_path_buf(),
            message: message.into(),
        }
    }

    pub fn step_execution(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::StepExecution {
            step: step.into(),
            message: message.into(),
        }
    }

    pub fn assertion_failed(step: impl Into<String>, message: impl Into<String>) -> Self {
        Self::AssertionFailed {
            step: step.into(),
            message: message.into(),
        }
    }
}
