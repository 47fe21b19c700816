//! Pipeline configuration types.
//!
//! A [`PipelineConfig`] names the project and result directories, an optional
//! dry-run row limit, the ordered list of component indices to run, and one
//! option section per component layer. These types are the input to
//! [`super::paths::resolve_paths`], the
//! [`super::validation::ValidationEngine`] and [`super::runner::Pipeline`].
//!
//! # YAML shape
//!
//! ```yaml
//! project_base_dir: /data/culture
//! result_base_dir: /data/culture/results
//! dry_run: 100
//! chosen_components: [0, 1]
//! 0_culture_relevance_classifier:
//!   input_file: data/comments.csv
//!   output_file: results/0_culture_relevance_classifier/output.csv
//!   model_name: culture-relevance
//!   classifier_path: models/relevance.txt
//!   device: -1
//!   batch_size: 64
//!   field_name_with_comments: comment_utterance
//! ```
//!
//! JSON documents with the same shape are accepted as well.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::error_code::ErrorCode;
use super::errors::{option_path, PipelineSpecError};
use crate::errors::{PipelineError, Result};

/// Top-level pipeline configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Directory that relative file options are resolved against.
    pub project_base_dir: PathBuf,

    /// Directory under which each component gets a `<layer>` subdirectory.
    pub result_base_dir: PathBuf,

    /// If set, components only consider the first `dry_run` input rows.
    #[serde(default)]
    pub dry_run: Option<usize>,

    /// Registry indices of the components to run, in execution order.
    /// Repeats are allowed.
    pub chosen_components: Vec<usize>,

    /// Per-component option sections keyed by layer name, plus any other
    /// top-level keys (flagged by validation when they are not sections).
    #[serde(flatten)]
    pub layers: BTreeMap<String, Value>,
}

impl PipelineConfig {
    /// Create a config with no component sections.
    pub fn new(project_base_dir: impl Into<PathBuf>, result_base_dir: impl Into<PathBuf>) -> Self {
        Self {
            project_base_dir: project_base_dir.into(),
            result_base_dir: result_base_dir.into(),
            dry_run: None,
            chosen_components: Vec::new(),
            layers: BTreeMap::new(),
        }
    }

    /// Load a configuration document, picking YAML for `.yaml`/`.yml`
    /// extensions and JSON otherwise.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| PipelineError::load(path, e.to_string()))?;

        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        let parsed = if is_yaml {
            Self::from_yaml_str(&text)
        } else {
            Self::from_json_str(&text)
        };
        parsed.map_err(|message| PipelineError::load(path, message))
    }

    /// Parse a JSON document.
    pub fn from_json_str(text: &str) -> std::result::Result<Self, String> {
        serde_json::from_str(text).map_err(|e| e.to_string())
    }

    /// Parse a YAML document.
    pub fn from_yaml_str(text: &str) -> std::result::Result<Self, String> {
        serde_yaml::from_str(text).map_err(|e| e.to_string())
    }

    /// Set the dry-run row limit
    pub fn with_dry_run(mut self, dry_run: Option<usize>) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Set the ordered component selection
    pub fn with_chosen_components(mut self, indices: Vec<usize>) -> Self {
        self.chosen_components = indices;
        self
    }

    /// Add or replace the option section of a layer
    pub fn with_layer(mut self, layer: impl Into<String>, options: Value) -> Self {
        self.layers.insert(layer.into(), options);
        self
    }

    /// Returns `true` if a section exists for `layer`.
    pub fn has_layer(&self, layer: &str) -> bool {
        self.layers.contains_key(layer)
    }

    /// Extract a component's option section.
    pub fn layer(&self, layer: &str) -> std::result::Result<LayerConfig, PipelineSpecError> {
        match self.layers.get(layer) {
            Some(Value::Object(options)) => Ok(LayerConfig {
                layer: layer.to_string(),
                options: options.clone(),
            }),
            Some(other) => Err(PipelineSpecError::new(
                ErrorCode::InvalidValue,
                format!("/{layer}"),
                format!(
                    "Section '{layer}' must be a mapping of options, found {}",
                    value_kind(other)
                ),
            )),
            None => Err(PipelineSpecError::new(
                ErrorCode::MissingLayer,
                format!("/{layer}"),
                format!("No configuration section for component '{layer}'"),
            )
            .with_hint(format!("Add a '{layer}' section to the configuration"))),
        }
    }
}

/// The option section of one component, with typed accessors.
///
/// Accessors report missing or mistyped options as [`PipelineSpecError`]s
/// pointing at `/<layer>/<key>`.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerConfig {
    layer: String,
    options: Map<String, Value>,
}

impl LayerConfig {
    /// Build a section directly (mostly useful in tests).
    pub fn new(layer: impl Into<String>, options: Map<String, Value>) -> Self {
        Self {
            layer: layer.into(),
            options,
        }
    }

    pub fn layer(&self) -> &str {
        &self.layer
    }

    pub fn options(&self) -> &Map<String, Value> {
        &self.options
    }

    pub fn contains(&self, key: &str) -> bool {
        self.options.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.options.get(key)
    }

    /// A required option of any type.
    pub fn value(&self, key: &str) -> std::result::Result<&Value, PipelineSpecError> {
        self.options.get(key).ok_or_else(|| self.missing(key))
    }

    /// A required string option.
    pub fn str(&self, key: &str) -> std::result::Result<&str, PipelineSpecError> {
        self.opt_str(key)?.ok_or_else(|| self.missing(key))
    }

    /// An optional string option; `null` counts as absent.
    pub fn opt_str(&self, key: &str) -> std::result::Result<Option<&str>, PipelineSpecError> {
        match self.options.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(self.mistyped(key, "a string", other)),
        }
    }

    /// A required non-negative integer option.
    pub fn usize(&self, key: &str) -> std::result::Result<usize, PipelineSpecError> {
        self.opt_usize(key)?.ok_or_else(|| self.missing(key))
    }

    /// An optional non-negative integer option; `null` counts as absent.
    pub fn opt_usize(&self, key: &str) -> std::result::Result<Option<usize>, PipelineSpecError> {
        match self.options.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(v) => v
                .as_u64()
                .and_then(|n| usize::try_from(n).ok())
                .map(Some)
                .ok_or_else(|| self.mistyped(key, "a non-negative integer", v)),
        }
    }

    /// A required file path option.
    pub fn path(&self, key: &str) -> std::result::Result<PathBuf, PipelineSpecError> {
        self.str(key).map(PathBuf::from)
    }

    /// An optional file path option.
    pub fn opt_path(&self, key: &str) -> std::result::Result<Option<PathBuf>, PipelineSpecError> {
        Ok(self.opt_str(key)?.map(PathBuf::from))
    }

    fn missing(&self, key: &str) -> PipelineSpecError {
        PipelineSpecError::new(
            ErrorCode::MissingKey,
            option_path(&self.layer, key),
            format!("Required option '{key}' is missing"),
        )
        .with_hint(format!("Add '{key}' to the '{}' section", self.layer))
    }

    fn mistyped(&self, key: &str, expected: &str, found: &Value) -> PipelineSpecError {
        PipelineSpecError::new(
            ErrorCode::InvalidValue,
            option_path(&self.layer, key),
            format!(
                "Option '{key}' must be {expected}, found {}",
                value_kind(found)
            ),
        )
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const YAML: &str = r#"
project_base_dir: /root
result_base_dir: /root/results
dry_run: 3
chosen_components: [0, 0, 3]
0_culture_relevance_classifier:
  input_file: data/in.csv
  batch_size: 8
  device: -1
"#;

    #[test]
    fn test_parse_yaml() {
        let cfg = PipelineConfig::from_yaml_str(YAML).unwrap();
        assert_eq!(cfg.project_base_dir, PathBuf::from("/root"));
        assert_eq!(cfg.dry_run, Some(3));
        assert_eq!(cfg.chosen_components, vec![0, 0, 3]);
        assert!(cfg.has_layer("0_culture_relevance_classifier"));
    }

    #[test]
    fn test_parse_json_null_dry_run() {
        let cfg = PipelineConfig::from_json_str(
            r#"{"project_base_dir": "/p", "result_base_dir": "/r",
                "dry_run": null, "chosen_components": [1]}"#,
        )
        .unwrap();
        assert_eq!(cfg.dry_run, None);
        assert!(cfg.layers.is_empty());
    }

    #[test]
    fn test_missing_chosen_components_is_rejected() {
        let err = PipelineConfig::from_json_str(r#"{"project_base_dir": "/p", "result_base_dir": "/r"}"#)
            .unwrap_err();
        assert!(err.contains("chosen_components"));
    }

    #[test]
    fn test_layer_accessors() {
        let cfg = PipelineConfig::from_yaml_str(YAML).unwrap();
        let layer = cfg.layer("0_culture_relevance_classifier").unwrap();

        assert_eq!(layer.str("input_file").unwrap(), "data/in.csv");
        assert_eq!(layer.usize("batch_size").unwrap(), 8);
        assert_eq!(layer.opt_str("output_file").unwrap(), None);

        let err = layer.str("model_name").unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingKey);
        assert_eq!(err.path, "/0_culture_relevance_classifier/model_name");

        let err = layer.usize("input_file").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidValue);

        // -1 is a valid device id but not a usize
        assert!(layer.opt_usize("device").is_err());
    }

    #[test]
    fn test_missing_layer() {
        let cfg = PipelineConfig::new("/p", "/r");
        let err = cfg.layer("3_clustering").unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingLayer);
        assert_eq!(err.path, "/3_clustering");
    }

    #[test]
    fn test_non_mapping_layer() {
        let cfg = PipelineConfig::new("/p", "/r").with_layer("3_clustering", json!(42));
        let err = cfg.layer("3_clustering").unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidValue);
    }

    #[test]
    fn test_from_path_picks_format_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let yaml = dir.path().join("config.yaml");
        std::fs::write(&yaml, YAML).unwrap();
        assert_eq!(PipelineConfig::from_path(&yaml).unwrap().dry_run, Some(3));

        let json = dir.path().join("config.json");
        std::fs::write(&json, YAML).unwrap();
        let err = PipelineConfig::from_path(&json).unwrap_err();
        assert!(matches!(err, PipelineError::Load { .. }));
    }
}
