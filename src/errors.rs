//! Error types for annotation_pipeline
//!
//! Every fallible operation in the crate returns [`Result`]. The variants map
//! onto the pipeline lifecycle: loading the configuration, building the
//! pipeline, and running its components.

use std::path::PathBuf;

use thiserror::Error;

use crate::pipeline::errors::{PipelineRuntimeError, PipelineSpecError};
use crate::pipeline::validation::ValidationReport;

/// Result type alias for convenience
pub type Result<T> = std::result::Result<T, PipelineError>;

/// Main error type for annotation_pipeline
#[derive(Error, Debug)]
pub enum PipelineError {
    /// The configuration document could not be read or parsed
    #[error("Failed to load configuration from {path}: {message}")]
    Load { path: PathBuf, message: String },

    /// A configuration or output-conflict problem found while building
    #[error(transparent)]
    Spec(#[from] PipelineSpecError),

    /// Validation collected one or more error diagnostics
    #[error("Configuration is invalid ({} error(s)): {}", .0.error_count(), .0.summary())]
    Invalid(ValidationReport),

    /// A component failed while running
    #[error(transparent)]
    Runtime(#[from] PipelineRuntimeError),
}

impl PipelineError {
    /// Create a load error
    pub fn load(path: impl Into<PathBuf>, message: impl Into<String>) -> Self {
        Self::Load {
            path: path.into(),
            message: message.into(),
        }
    }

    /// Check if this error was raised before any component ran
    pub fn is_build_time(&self) -> bool {
        !matches!(self, Self::Runtime(_))
    }

    /// The spec error carried by this error, if any
    pub fn as_spec(&self) -> Option<&PipelineSpecError> {
        match self {
            Self::Spec(err) => Some(err),
            _ => None,
        }
    }

    /// The runtime error carried by this error, if any
    pub fn as_runtime(&self) -> Option<&PipelineRuntimeError> {
        match self {
            Self::Runtime(err) => Some(err),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::error_code::ErrorCode;

    #[test]
    fn test_error_display() {
        let err = PipelineError::load("/tmp/config.yaml", "missing field `chosen_components`");
        assert!(err.to_string().contains("/tmp/config.yaml"));
        assert!(err.to_string().contains("chosen_components"));

        let err: PipelineError =
            PipelineSpecError::new(ErrorCode::OutputExists, "/a/output_file", "exists").into();
        assert_eq!(err.to_string(), "[output_exists] /a/output_file: exists");
    }

    #[test]
    fn test_is_build_time() {
        let err: PipelineError =
            PipelineSpecError::new(ErrorCode::MissingKey, "/a/input_file", "missing").into();
        assert!(err.is_build_time());
        assert!(err.as_spec().is_some());

        let err: PipelineError =
            PipelineRuntimeError::new(ErrorCode::Io, "/a/input_file", "a", "gone").into();
        assert!(!err.is_build_time());
        assert!(err.as_runtime().is_some());
    }
}
