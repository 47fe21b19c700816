//! Validation engine for pipeline configurations.
//!
//! The engine runs all registered [`ValidationRule`]s against a resolved
//! [`PipelineConfig`] and its [`ComponentRegistry`], collecting every
//! diagnostic into a [`ValidationReport`]. It never short-circuits on the
//! first error, so users see all problems at once.
//!
//! Validation only looks at the configuration document. Checks that touch
//! the file system (e.g. an already existing `output_file`) happen when the
//! component is constructed.
//!
//! # Quick start
//!
//! ```rust,ignore
//! use annotation_pipeline::pipeline::validation::ValidationEngine;
//!
//! let engine = ValidationEngine::with_defaults();
//! let report = engine.validate(&config, &registry);
//! for err in report.errors() {
//!     eprintln!("{err}");
//! }
//! ```

use serde::Serialize;
use serde_json::Value;

use super::error_code::ErrorCode;
use super::errors::{option_path, PipelineSpecError};
use super::paths::PATH_OPTIONS;
use super::registry::ComponentRegistry;
use super::spec::{value_kind, PipelineConfig};

// ─── Severity ───────────────────────────────────────────────────────────────

/// Whether a diagnostic is a hard error or a soft warning.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Error,
    Warning,
}

// ─── Diagnostic ─────────────────────────────────────────────────────────────

/// A single validation finding: an error or warning attached to a
/// [`PipelineSpecError`] that carries the code, path, message, and hint.
#[derive(Debug, Clone, Serialize)]
pub struct ValidationDiagnostic {
    pub severity: Severity,
    #[serde(flatten)]
    pub error: PipelineSpecError,
}

impl ValidationDiagnostic {
    pub fn error(err: PipelineSpecError) -> Self {
        Self {
            severity: Severity::Error,
            error: err,
        }
    }

    pub fn warning(err: PipelineSpecError) -> Self {
        Self {
            severity: Severity::Warning,
            error: err,
        }
    }
}

// ─── Report ─────────────────────────────────────────────────────────────────

/// Collected diagnostics from running all validation rules.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    pub diagnostics: Vec<ValidationDiagnostic>,
}

impl ValidationReport {
    /// Iterate over error-severity diagnostics.
    pub fn errors(&self) -> impl Iterator<Item = &PipelineSpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .map(|d| &d.error)
    }

    /// Iterate over warning-severity diagnostics.
    pub fn warnings(&self) -> impl Iterator<Item = &PipelineSpecError> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Warning)
            .map(|d| &d.error)
    }

    /// Returns `true` if any diagnostic is an error.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Returns `true` if there are no errors (warnings are acceptable).
    pub fn is_valid(&self) -> bool {
        !self.has_errors()
    }

    pub fn error_count(&self) -> usize {
        self.errors().count()
    }

    /// All error messages joined with `"; "`.
    pub fn summary(&self) -> String {
        self.errors()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ")
    }

    /// Total number of diagnostics (errors + warnings).
    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    /// Returns `true` if there are no diagnostics at all.
    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

// ─── Rule trait ─────────────────────────────────────────────────────────────

/// A single validation rule that inspects a configuration against the
/// registry and returns zero or more diagnostics.
///
/// Rules are stateless and must be `Send + Sync` so they can be shared
/// across threads (e.g., in a long-lived validation engine).
pub trait ValidationRule: Send + Sync {
    /// Short, stable identifier for this rule (e.g., `"component_index"`).
    fn name(&self) -> &str;

    /// Inspect `config` and return any findings.
    fn validate(
        &self,
        config: &PipelineConfig,
        registry: &ComponentRegistry,
    ) -> Vec<ValidationDiagnostic>;
}

// ─── Engine ─────────────────────────────────────────────────────────────────

/// Runs a set of [`ValidationRule`]s and collects all diagnostics into a
/// [`ValidationReport`].
pub struct ValidationEngine {
    rules: Vec<Box<dyn ValidationRule>>,
}

impl ValidationEngine {
    /// Create an empty engine with no rules.
    pub fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Create an engine pre-loaded with the default rule set.
    pub fn with_defaults() -> Self {
        let mut engine = Self::new();
        engine.add_rule(Box::new(ComponentIndexRule));
        engine.add_rule(Box::new(LayerPresenceRule));
        engine.add_rule(Box::new(PathOptionsRule));
        engine.add_rule(Box::new(DryRunRule));
        engine.add_rule(Box::new(EmptySelectionRule));
        engine.add_rule(Box::new(UnknownFieldsRule));
        engine
    }

    /// Register an additional rule.
    pub fn add_rule(&mut self, rule: Box<dyn ValidationRule>) {
        self.rules.push(rule);
    }

    /// Names of the registered rules, in execution order.
    pub fn rule_names(&self) -> Vec<&str> {
        self.rules.iter().map(|r| r.name()).collect()
    }

    /// Run all rules and return the collected report.
    pub fn validate(
        &self,
        config: &PipelineConfig,
        registry: &ComponentRegistry,
    ) -> ValidationReport {
        let mut report = ValidationReport::default();
        for rule in &self.rules {
            report.diagnostics.extend(rule.validate(config, registry));
        }
        report
    }
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::with_defaults()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Concrete rules
// ═══════════════════════════════════════════════════════════════════════════

// ─── 1. Every chosen index must be registered ───────────────────────────────

struct ComponentIndexRule;

impl ValidationRule for ComponentIndexRule {
    fn name(&self) -> &str {
        "component_index"
    }

    fn validate(
        &self,
        config: &PipelineConfig,
        registry: &ComponentRegistry,
    ) -> Vec<ValidationDiagnostic> {
        config
            .chosen_components
            .iter()
            .enumerate()
            .filter(|&(_, &index)| index >= registry.len())
            .map(|(pos, &index)| {
                let mut err = registry.out_of_range(index);
                err.path = format!("/chosen_components/{pos}");
                ValidationDiagnostic::error(err)
            })
            .collect()
    }
}

// ─── 2. Every chosen component needs a mapping section ──────────────────────

struct LayerPresenceRule;

impl ValidationRule for LayerPresenceRule {
    fn name(&self) -> &str {
        "layer_presence"
    }

    fn validate(
        &self,
        config: &PipelineConfig,
        registry: &ComponentRegistry,
    ) -> Vec<ValidationDiagnostic> {
        let mut seen = Vec::new();
        let mut out = Vec::new();

        for &index in &config.chosen_components {
            let Ok(descriptor) = registry.get(index) else {
                continue;
            };
            if seen.contains(&descriptor.layer) {
                continue;
            }
            seen.push(descriptor.layer);

            if let Err(err) = config.layer(descriptor.layer) {
                out.push(ValidationDiagnostic::error(err));
            }
        }
        out
    }
}

// ─── 3. File options must be strings ────────────────────────────────────────

struct PathOptionsRule;

impl ValidationRule for PathOptionsRule {
    fn name(&self) -> &str {
        "path_options"
    }

    fn validate(
        &self,
        config: &PipelineConfig,
        registry: &ComponentRegistry,
    ) -> Vec<ValidationDiagnostic> {
        let mut out = Vec::new();
        for layer in registry.layers() {
            let Some(Value::Object(options)) = config.layers.get(layer) else {
                continue;
            };
            for &key in PATH_OPTIONS {
                match options.get(key) {
                    None | Some(Value::String(_)) => {}
                    Some(other) => out.push(ValidationDiagnostic::error(PipelineSpecError::new(
                        ErrorCode::InvalidValue,
                        option_path(layer, key),
                        format!("File option '{key}' must be a string, found {}", value_kind(other)),
                    ))),
                }
            }
        }
        out
    }
}

// ─── 4. A zero dry-run limit processes nothing ──────────────────────────────

struct DryRunRule;

impl ValidationRule for DryRunRule {
    fn name(&self) -> &str {
        "dry_run"
    }

    fn validate(
        &self,
        config: &PipelineConfig,
        _registry: &ComponentRegistry,
    ) -> Vec<ValidationDiagnostic> {
        if config.dry_run == Some(0) {
            vec![ValidationDiagnostic::warning(
                PipelineSpecError::new(
                    ErrorCode::InvalidValue,
                    "/dry_run",
                    "dry_run is 0, so every component reads an empty table",
                )
                .with_hint("Set dry_run to null to process all rows"),
            )]
        } else {
            vec![]
        }
    }
}

// ─── 5. Nothing selected ────────────────────────────────────────────────────

struct EmptySelectionRule;

impl ValidationRule for EmptySelectionRule {
    fn name(&self) -> &str {
        "empty_selection"
    }

    fn validate(
        &self,
        config: &PipelineConfig,
        registry: &ComponentRegistry,
    ) -> Vec<ValidationDiagnostic> {
        if config.chosen_components.is_empty() {
            vec![ValidationDiagnostic::warning(
                PipelineSpecError::new(
                    ErrorCode::InvalidValue,
                    "/chosen_components",
                    "No components selected; the pipeline will do nothing",
                )
                .with_hint(format!(
                    "Pick indices from {}",
                    registry.possible_components()
                )),
            )]
        } else {
            vec![]
        }
    }
}

// ─── 6. Top-level keys that are not registered sections ────────────────────

struct UnknownFieldsRule;

impl ValidationRule for UnknownFieldsRule {
    fn name(&self) -> &str {
        "unknown_fields"
    }

    fn validate(
        &self,
        config: &PipelineConfig,
        registry: &ComponentRegistry,
    ) -> Vec<ValidationDiagnostic> {
        let known: Vec<&str> = registry.layers().collect();
        config
            .layers
            .keys()
            .filter(|key| !known.contains(&key.as_str()))
            .map(|key| {
                ValidationDiagnostic::warning(
                    PipelineSpecError::new(
                        ErrorCode::UnknownField,
                        format!("/{key}"),
                        format!("unrecognized field \"{key}\""),
                    )
                    .with_hint("Check spelling or remove this field"),
                )
            })
            .collect()
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  Tests
// ═══════════════════════════════════════════════════════════════════════════
