//! Stable error codes shared by configuration and runtime errors.
//!
//! Codes serialize as snake_case strings (e.g. `"output_exists"`) and are
//! meant for programmatic matching; the human-readable text lives in the
//! error's `message`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Machine-readable classification of a pipeline failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    // ─── Configuration (build-time) ────────────────────────────────────
    /// A `chosen_components` index has no registered component.
    UnknownComponent,
    /// A chosen component has no configuration sub-mapping.
    MissingLayer,
    /// A required option is absent from a component's sub-mapping.
    MissingKey,
    /// An option is present but has the wrong type or an illegal value.
    InvalidValue,
    /// A top-level key is neither a known field nor a component sub-mapping.
    UnknownField,
    /// No collaborator was supplied for a component that needs one.
    MissingCollaborator,
    /// A declared output file already exists.
    OutputExists,

    // ─── Runtime (execution-time) ──────────────────────────────────────
    /// A file could not be read, written, or created.
    Io,
    /// A tabular file could not be parsed or serialized.
    MalformedTable,
    /// A column expected by a stage is absent from its input table.
    MissingColumn,
    /// The inference collaborator failed or returned an unusable result.
    InferenceFailed,
    /// A delegated stage's transform rejected its input or options.
    StageFailed,
}

impl ErrorCode {
    /// Returns the snake_case wire name of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::UnknownComponent => "unknown_component",
            Self::MissingLayer => "missing_layer",
            Self::MissingKey => "missing_key",
            Self::InvalidValue => "invalid_value",
            Self::UnknownField => "unknown_field",
            Self::MissingCollaborator => "missing_collaborator",
            Self::OutputExists => "output_exists",
            Self::Io => "io",
            Self::MalformedTable => "malformed_table",
            Self::MissingColumn => "missing_column",
            Self::InferenceFailed => "inference_failed",
            Self::StageFailed => "stage_failed",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
