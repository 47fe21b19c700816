//! Pipeline error types for configuration and runtime failures.
//!
//! Two error types cover the full pipeline lifecycle:
//!
//! - [`PipelineSpecError`]: build-time problems found while resolving the
//!   configuration and instantiating components (unknown component index,
//!   missing option, pre-existing output file, ...)
//! - [`PipelineRuntimeError`]: failures that occur while a component runs
//!   (I/O, malformed tables, missing columns, inference failures)
//!
//! Both types carry a stable [`ErrorCode`] for programmatic matching, a JSON
//! pointer `path` locating the offending option in the configuration, a
//! human-readable `message`, and an optional `hint` suggesting a fix.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::error_code::ErrorCode;

// ─── Spec (build-time) errors ───────────────────────────────────────────────

/// A configuration problem found before any component runs.
///
/// # Display format
///
/// ```text
/// [missing_key] /0_culture_relevance_classifier/batch_size: Required option 'batch_size' is missing
/// ```
///
/// # JSON format
///
/// ```json
/// {
///   "code": "missing_key",
///   "path": "/0_culture_relevance_classifier/batch_size",
///   "message": "Required option 'batch_size' is missing",
///   "hint": "Add 'batch_size' to the '0_culture_relevance_classifier' section"
/// }
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] {path}: {message}")]
pub struct PipelineSpecError {
    /// Stable error code for programmatic matching.
    pub code: ErrorCode,

    /// JSON pointer into the configuration identifying the problematic location.
    ///
    /// Examples: `"/chosen_components/2"`, `"/3_clustering/output_file"`, `""` (root).
    pub path: String,

    /// Human-readable description of the problem.
    pub message: String,

    /// Optional suggestion for how to fix the problem.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl PipelineSpecError {
    /// Create a new spec error.
    pub fn new(code: ErrorCode, path: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code,
            path: path.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a hint suggesting how to fix the problem.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

// ─── Runtime (execution-time) errors ────────────────────────────────────────

/// A failure that occurred while running a pipeline component.
///
/// # Display format
///
/// ```text
/// [missing_column] /0_culture_relevance_classifier/field_name_with_comments (stage: 0_culture_relevance_classifier): Column 'comment' not found
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[error("[{code}] {path} (stage: {stage}): {message}")]
pub struct PipelineRuntimeError {
    /// Stable error code for programmatic matching.
    pub code: ErrorCode,

    /// JSON pointer into the configuration identifying the option involved.
    pub path: String,

    /// Layer name of the component that failed.
    pub stage: String,

    /// Human-readable description of the failure.
    pub message: String,

    /// Optional suggestion for how to fix or work around the failure.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl PipelineRuntimeError {
    /// Create a new runtime error.
    pub fn new(
        code: ErrorCode,
        path: impl Into<String>,
        stage: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            code,
            path: path.into(),
            stage: stage.into(),
            message: message.into(),
            hint: None,
        }
    }

    /// Attach a hint suggesting how to fix or work around the failure.
    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Build the JSON pointer for an option of a component layer.
pub fn option_path(layer: &str, key: &str) -> String {
    format!("/{layer}/{key}")
}

#[cfg(test)]
mod tests {
    use super::*;

    // ─── PipelineSpecError ──────────────────────────────────────────────

    #[test]
    fn test_spec_error_display() {
        let err = PipelineSpecError::new(
            ErrorCode::MissingLayer,
            "/3_clustering",
            "No configuration section for component '3_clustering'",
        );
        assert_eq!(
            err.to_string(),
            "[missing_layer] /3_clustering: No configuration section for component '3_clustering'"
        );
    }

    #[test]
    fn test_spec_error_with_hint() {
        let err = PipelineSpecError::new(ErrorCode::OutputExists, "/x/output_file", "exists")
            .with_hint("Remove the file or choose another output_file");
        assert_eq!(
            err.hint.as_deref(),
            Some("Remove the file or choose another output_file")
        );
    }

    #[test]
    fn test_spec_error_json_format() {
        let err = PipelineSpecError::new(
            ErrorCode::UnknownComponent,
            "/chosen_components/0",
            "index 12 is out of range",
        );

        let value: serde_json::Value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["code"], "unknown_component");
        assert_eq!(value["path"], "/chosen_components/0");
        assert!(value.get("hint").is_none());
    }

    // ─── PipelineRuntimeError ───────────────────────────────────────────

    #[test]
    fn test_runtime_error_display() {
        let err = PipelineRuntimeError::new(
            ErrorCode::MissingColumn,
            "/0_culture_relevance_classifier/field_name_with_comments",
            "0_culture_relevance_classifier",
            "Column 'comment' not found",
        );
        assert_eq!(
            err.to_string(),
            "[missing_column] /0_culture_relevance_classifier/field_name_with_comments \
             (stage: 0_culture_relevance_classifier): Column 'comment' not found"
        );
    }

    #[test]
    fn test_runtime_error_json_with_hint() {
        let err = PipelineRuntimeError::new(ErrorCode::Io, "/a/input_file", "a", "not found")
            .with_hint("Run the upstream component first");

        let value: serde_json::Value = serde_json::to_value(&err).unwrap();
        assert_eq!(value["stage"], "a");
        assert_eq!(value["hint"], "Run the upstream component first");
    }

    #[test]
    fn test_errors_are_std_errors() {
        let spec = PipelineSpecError::new(ErrorCode::MissingLayer, "/a", "failed");
        let runtime = PipelineRuntimeError::new(ErrorCode::StageFailed, "", "s", "failed");
        let _: &dyn std::error::Error = &spec;
        let _: &dyn std::error::Error = &runtime;
    }

    #[test]
    fn test_option_path() {
        assert_eq!(option_path("3_clustering", "input_file"), "/3_clustering/input_file");
    }
}
