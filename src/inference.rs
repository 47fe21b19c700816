//! Text-classification collaborator interface.
//!
//! The classification component never depends on a particular model. It
//! asks a [`ClassifierLoader`] for a [`TextClassifier`] once, at construction
//! time, and then calls [`TextClassifier::classify`] once per batch. Each
//! call is blocking; a classifier may parallelize internally, but that is
//! invisible to the pipeline.
//!
//! [`KeywordClassifier`] is a small built-in implementation used by the
//! `annotate` binary: it matches texts against a list of regular
//! expressions.

use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use serde_json::Value;
use thiserror::Error;

/// Failures reported by a classifier or its loader.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum InferenceError {
    #[error("Failed to load classifier from {path}: {message}")]
    Load { path: PathBuf, message: String },

    #[error("Prediction failed: {0}")]
    Predict(String),
}

// ─── Device ─────────────────────────────────────────────────────────────────

/// Where a classifier should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Device {
    #[default]
    Cpu,
    /// GPU ordinal.
    Gpu(usize),
}

impl Device {
    /// Parse a `device` option.
    ///
    /// Accepts `-1` or `"cpu"` for the CPU, and a non-negative ordinal,
    /// `"cuda"` or `"cuda:<n>"` for a GPU. A missing or `null` value means CPU.
    pub fn from_value(value: Option<&Value>) -> Option<Self> {
        match value {
            None | Some(Value::Null) => Some(Self::Cpu),
            Some(Value::Number(n)) => match n.as_i64()? {
                -1 => Some(Self::Cpu),
                ordinal if ordinal >= 0 => Some(Self::Gpu(ordinal as usize)),
                _ => None,
            },
            Some(Value::String(s)) => Self::parse(s),
            Some(_) => None,
        }
    }

    fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" | "-1" => Some(Self::Cpu),
            "cuda" | "gpu" => Some(Self::Gpu(0)),
            other => {
                let ordinal = other
                    .strip_prefix("cuda:")
                    .or_else(|| other.strip_prefix("gpu:"))
                    .unwrap_or(other);
                ordinal.parse().ok().map(Self::Gpu)
            }
        }
    }
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cpu => f.write_str("cpu"),
            Self::Gpu(n) => write!(f, "cuda:{n}"),
        }
    }
}

// ─── Requests and results ───────────────────────────────────────────────────

/// What to load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSpec {
    pub model_name: String,
    pub classifier_path: PathBuf,
    pub device: Device,
}

/// Per-call inference settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InferenceOptions {
    /// Number of texts per call.
    pub batch_size: usize,
    /// Whether inputs longer than `max_length` are cut down.
    pub truncation: bool,
    /// Length bound applied when `truncation` is set.
    pub max_length: usize,
}

/// One classifier output: a label identifier such as `"LABEL_1"` and the
/// confidence of that label in `[0, 1]`.
#[derive(Debug, Clone, PartialEq)]
pub struct Prediction {
    pub label: String,
    pub score: f64,
}

impl Prediction {
    pub fn new(label: impl Into<String>, score: f64) -> Self {
        Self {
            label: label.into(),
            score,
        }
    }

    /// Numeric class encoded by the last character of the label
    /// (`"LABEL_1"` → `1`).
    pub fn class_id(&self) -> Option<u32> {
        self.label.chars().last()?.to_digit(10)
    }
}

// ─── Collaborator traits ────────────────────────────────────────────────────

/// A batch text classifier.
///
/// # Contract
///
/// - Returns exactly one [`Prediction`] per input text, in input order.
/// - Blocking; called once per batch of at most `options.batch_size` texts.
pub trait TextClassifier: Send + Sync {
    fn classify(
        &self,
        texts: &[String],
        options: &InferenceOptions,
    ) -> Result<Vec<Prediction>, InferenceError>;
}

/// Loads a [`TextClassifier`] from a [`ModelSpec`].
pub trait ClassifierLoader: Send + Sync {
    fn load(&self, spec: &ModelSpec) -> Result<Box<dyn TextClassifier>, InferenceError>;
}

// ─── Keyword classifier ─────────────────────────────────────────────────────

/// Label of texts that match at least one pattern.
pub const KEYWORD_MATCH_LABEL: &str = "LABEL_1";
/// Label of texts that match no pattern.
pub const KEYWORD_MISS_LABEL: &str = "LABEL_0";

/// Regex-based relevance classifier.
///
/// A text is `LABEL_1` when any pattern matches. The score of a match grows
/// with the share of patterns that hit, from `0.5` (one hit) up to `1.0`
/// (all hit); a miss is `LABEL_0` with score `1.0`.
#[derive(Debug, Clone)]
pub struct KeywordClassifier {
    patterns: Vec<Regex>,
}

impl KeywordClassifier {
    pub fn new(patterns: Vec<Regex>) -> Self {
        Self { patterns }
    }

    /// Compile one pattern per non-empty line; lines starting with `#` are
    /// comments. Patterns are case-insensitive.
    pub fn from_lines(text: &str) -> Result<Self, regex::Error> {
        let patterns = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(|line| Regex::new(&format!("(?i){line}")))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::new(patterns))
    }

    /// Load patterns from a file (see [`KeywordClassifier::from_lines`]).
    pub fn from_file(path: &Path) -> Result<Self, InferenceError> {
        let load_err = |message: String| InferenceError::Load {
            path: path.to_path_buf(),
            message,
        };
        let text = std::fs::read_to_string(path).map_err(|e| load_err(e.to_string()))?;
        let classifier = Self::from_lines(&text).map_err(|e| load_err(e.to_string()))?;
        if classifier.patterns.is_empty() {
            return Err(load_err("no patterns found".to_string()));
        }
        Ok(classifier)
    }

    fn predict(&self, text: &str, options: &InferenceOptions) -> Prediction {
        let text = if options.truncation {
            truncate_words(text, options.max_length)
        } else {
            text
        };

        let hits = self.patterns.iter().filter(|p| p.is_match(text)).count();
        if hits == 0 {
            return Prediction::new(KEYWORD_MISS_LABEL, 1.0);
        }
        let extra = (hits - 1) as f64 / self.patterns.len().max(2).saturating_sub(1) as f64;
        Prediction::new(KEYWORD_MATCH_LABEL, 0.5 + 0.5 * extra.min(1.0))
    }
}

impl TextClassifier for KeywordClassifier {
    fn classify(
        &self,
        texts: &[String],
        options: &InferenceOptions,
    ) -> Result<Vec<Prediction>, InferenceError> {
        Ok(texts.iter().map(|t| self.predict(t, options)).collect())
    }
}

/// Loads a [`KeywordClassifier`] from `classifier_path`.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeywordClassifierLoader;

impl ClassifierLoader for KeywordClassifierLoader {
    fn load(&self, spec: &ModelSpec) -> Result<Box<dyn TextClassifier>, InferenceError> {
        if spec.device != Device::Cpu {
            tracing::warn!(
                device = %spec.device,
                "keyword classifier only runs on the CPU, ignoring device"
            );
        }
        Ok(Box::new(KeywordClassifier::from_file(&spec.classifier_path)?))
    }
}

/// Keep at most `max_words` whitespace-separated words of `text`.
fn truncate_words(text: &str, max_words: usize) -> &str {
    match text.split_whitespace().nth(max_words) {
        Some(first_dropped) => {
            let offset = first_dropped.as_ptr() as usize - text.as_ptr() as usize;
            text[..offset].trim_end()
        }
        None => text,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn options(max_length: usize) -> InferenceOptions {
        InferenceOptions {
            batch_size: 8,
            truncation: true,
            max_length,
        }
    }

    #[test]
    fn test_device_parsing() {
        assert_eq!(Device::from_value(None), Some(Device::Cpu));
        assert_eq!(Device::from_value(Some(&json!(-1))), Some(Device::Cpu));
        assert_eq!(Device::from_value(Some(&json!(0))), Some(Device::Gpu(0)));
        assert_eq!(Device::from_value(Some(&json!("cuda:2"))), Some(Device::Gpu(2)));
        assert_eq!(Device::from_value(Some(&json!("CPU"))), Some(Device::Cpu));
        assert_eq!(Device::from_value(Some(&json!("tpu"))), None);
        assert_eq!(Device::from_value(Some(&json!(-3))), None);
        assert_eq!(Device::from_value(Some(&json!(true))), None);
    }

    #[test]
    fn test_class_id_from_label() {
        assert_eq!(Prediction::new("LABEL_1", 0.9).class_id(), Some(1));
        assert_eq!(Prediction::new("LABEL_0", 0.9).class_id(), Some(0));
        assert_eq!(Prediction::new("relevant", 0.9).class_id(), None);
        assert_eq!(Prediction::new("", 0.9).class_id(), None);
    }

    #[test]
    fn test_keyword_classifier_labels() {
        let clf = KeywordClassifier::from_lines("# food words\ntea\\b\nchopsticks\n").unwrap();
        let texts = vec![
            "We drink Tea every afternoon".to_string(),
            "Nothing to see here".to_string(),
            "tea with chopsticks?".to_string(),
        ];
        let preds = clf.classify(&texts, &options(64)).unwrap();

        assert_eq!(preds.len(), 3);
        assert_eq!(preds[0].label, KEYWORD_MATCH_LABEL);
        assert_eq!(preds[0].score, 0.5);
        assert_eq!(preds[1].label, KEYWORD_MISS_LABEL);
        assert_eq!(preds[2].score, 1.0);
    }

    #[test]
    fn test_keyword_classifier_truncates() {
        let clf = KeywordClassifier::from_lines("festival").unwrap();
        let texts = vec!["one two three festival".to_string()];

        let preds = clf.classify(&texts, &options(3)).unwrap();
        assert_eq!(preds[0].label, KEYWORD_MISS_LABEL);

        let preds = clf.classify(&texts, &options(4)).unwrap();
        assert_eq!(preds[0].label, KEYWORD_MATCH_LABEL);
    }

    #[test]
    fn test_truncate_words() {
        assert_eq!(truncate_words("a  b c", 2), "a  b");
        assert_eq!(truncate_words("a b", 5), "a b");
        assert_eq!(truncate_words("a b", 0), "");
    }

    #[test]
    fn test_loader_rejects_empty_pattern_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("patterns.txt");
        std::fs::write(&path, "# only a comment\n").unwrap();

        let spec = ModelSpec {
            model_name: "kw".into(),
            classifier_path: path,
            device: Device::Cpu,
        };
        assert!(matches!(
            KeywordClassifierLoader.load(&spec),
            Err(InferenceError::Load { .. })
        ));
    }
}
