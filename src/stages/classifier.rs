//! Culture-relevance classification component.
//!
//! Reads the input table (first `dry_run` rows when a dry-run limit is set),
//! classifies the configured text column in batches, appends `pred_label`
//! (`"Yes"`/`"No"`) and `pred_score` (rounded to two decimals), keeps only
//! the `"Yes"` rows, and writes them to `output_file`.
//!
//! # Options
//!
//! | Key | Meaning |
//! |-----|---------|
//! | `input_file` | CSV to classify |
//! | `output_file` | CSV of relevant rows |
//! | `field_name_with_comments` | column holding the text |
//! | `model_name` | label of the model, for logs |
//! | `classifier_path` | what the classifier loader loads |
//! | `device` | `-1`/`"cpu"` or a GPU ordinal / `"cuda:<n>"` |
//! | `batch_size` | texts per classifier call |
//! | `max_length` | optional truncation bound; defaults to `batch_size` |

use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::errors::Result;
use crate::inference::{Device, InferenceOptions, ModelSpec, Prediction, TextClassifier};
use crate::pipeline::error_code::ErrorCode;
use crate::pipeline::errors::{option_path, PipelineSpecError};
use crate::pipeline::traits::{Collaborators, Component, ComponentContext};
use crate::table::Table;

/// Column holding the predicted label.
pub const PRED_LABEL: &str = "pred_label";
/// Column holding the rounded confidence of the predicted label.
pub const PRED_SCORE: &str = "pred_score";
/// Label of the rows that are kept.
pub const RELEVANT: &str = "Yes";

/// Class id → output label.
const ID2LABEL: [&str; 2] = ["No", RELEVANT];

/// Keeps the rows of a comment table that a text classifier deems
/// culturally relevant.
pub struct CultureRelevanceClassifier {
    ctx: ComponentContext,
    input_file: PathBuf,
    output_file: PathBuf,
    text_field: String,
    inference: InferenceOptions,
    classifier: Box<dyn TextClassifier>,
}

impl CultureRelevanceClassifier {
    /// Registry constructor.
    pub fn build(ctx: ComponentContext, collaborators: &Collaborators) -> Result<Box<dyn Component>> {
        Ok(Box::new(Self::new(ctx, collaborators)?))
    }

    /// Read the options and load the classifier.
    pub fn new(ctx: ComponentContext, collaborators: &Collaborators) -> Result<Self> {
        let layer = ctx.layer();
        let opts = ctx.options();

        let input_file = opts.path("input_file")?;
        let output_file = opts.path("output_file")?;
        let text_field = opts.str("field_name_with_comments")?.to_string();

        let batch_size = opts.usize("batch_size")?;
        if batch_size == 0 {
            return Err(PipelineSpecError::new(
                ErrorCode::InvalidValue,
                option_path(layer, "batch_size"),
                "batch_size must be greater than 0",
            )
            .into());
        }
        // The truncation bound has historically been the batch size.
        let max_length = match opts.opt_usize("max_length")? {
            Some(n) => n,
            None => {
                warn!(
                    layer,
                    batch_size, "max_length not set, truncating inputs to batch_size"
                );
                batch_size
            }
        };

        let device = Device::from_value(Some(opts.value("device")?)).ok_or_else(|| {
            PipelineSpecError::new(
                ErrorCode::InvalidValue,
                option_path(layer, "device"),
                "device must be -1, \"cpu\", a GPU ordinal or \"cuda:<n>\"",
            )
        })?;

        let model = ModelSpec {
            model_name: opts.str("model_name")?.to_string(),
            classifier_path: opts.path("classifier_path")?,
            device,
        };

        let loader = collaborators.classifier_loader().ok_or_else(|| {
            PipelineSpecError::new(
                ErrorCode::MissingCollaborator,
                format!("/{layer}"),
                "No classifier loader was provided",
            )
            .with_hint("Register one with Collaborators::with_classifier_loader")
        })?;

        info!(
            model = %model.model_name,
            device = %model.device,
            path = %model.classifier_path.display(),
            "loading classifier"
        );
        let classifier = loader.load(&model).map_err(|e| {
            PipelineSpecError::new(
                ErrorCode::InferenceFailed,
                option_path(layer, "classifier_path"),
                e.to_string(),
            )
        })?;

        Ok(Self {
            ctx,
            input_file,
            output_file,
            text_field,
            inference: InferenceOptions {
                batch_size,
                truncation: true,
                max_length,
            },
            classifier,
        })
    }

    pub fn read_input(&self) -> Result<Table> {
        self.ctx.read_table("input_file", &self.input_file)
    }

    pub fn save_output(&self, table: &Table) -> Result<()> {
        info!("save to {}", self.output_file.display());
        self.ctx.write_table("output_file", &self.output_file, table)
    }

    /// Classify `texts` one batch at a time.
    fn predict(&self, texts: &[String]) -> Result<Vec<Prediction>> {
        let mut predictions = Vec::with_capacity(texts.len());
        for (i, batch) in texts.chunks(self.inference.batch_size).enumerate() {
            debug!(batch = i, size = batch.len(), "classifying batch");
            let out = self
                .classifier
                .classify(batch, &self.inference)
                .map_err(|e| self.inference_error(e.to_string()))?;
            if out.len() != batch.len() {
                return Err(self
                    .inference_error(format!(
                        "classifier returned {} predictions for {} texts",
                        out.len(),
                        batch.len()
                    ))
                    .into());
            }
            predictions.extend(out);
        }
        Ok(predictions)
    }

    fn label_of(&self, prediction: &Prediction) -> Result<&'static str> {
        prediction
            .class_id()
            .and_then(|id| ID2LABEL.get(id as usize).copied())
            .ok_or_else(|| {
                self.inference_error(format!("unexpected label '{}'", prediction.label))
                    .into()
            })
    }

    fn inference_error(&self, message: String) -> crate::pipeline::errors::PipelineRuntimeError {
        self.ctx
            .runtime_error(ErrorCode::InferenceFailed, "classifier_path", message)
    }
}

impl Component for CultureRelevanceClassifier {
    fn run(&mut self) -> Result<()> {
        let mut table = self.read_input()?;
        info!("total number of samples: {}", table.len());

        let texts: Vec<String> = table
            .column(&self.text_field)
            .map_err(|e| self.ctx.table_error("field_name_with_comments", e))?
            .into_iter()
            .map(str::to_string)
            .collect();

        let predictions = self.predict(&texts)?;
        let labels = predictions
            .iter()
            .map(|p| self.label_of(p).map(str::to_string))
            .collect::<Result<Vec<_>>>()?;
        let scores = predictions
            .iter()
            .map(|p| format_score(round2(p.score)))
            .collect();

        let set_err = |e| self.ctx.table_error("output_file", e);
        table.set_column(PRED_LABEL, labels).map_err(set_err)?;
        table.set_column(PRED_SCORE, scores).map_err(set_err)?;
        table
            .retain_where(PRED_LABEL, |label| label == RELEVANT)
            .map_err(set_err)?;

        info!("{} of {} samples kept", table.len(), texts.len());
        self.save_output(&table)?;
        info!("prediction done");
        Ok(())
    }
}

/// Round to two decimal places, ties to even (`0.125` -> `0.12`).
fn round2(score: f64) -> f64 {
    (score * 100.0).round_ties_even() / 100.0
}

/// Shortest decimal form, keeping one fractional digit for whole numbers
/// (`1.0`, not `1`).
fn format_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{score:.1}")
    } else {
        score.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round2() {
        assert_eq!(round2(0.904), 0.9);
        assert_eq!(round2(0.456), 0.46);
        assert_eq!(round2(0.999), 1.0);
    }

    #[test]
    fn test_round2_ties_to_even() {
        assert_eq!(format_score(round2(0.125)), "0.12");
        assert_eq!(format_score(round2(0.375)), "0.38");
        assert_eq!(format_score(round2(0.625)), "0.62");
        assert_eq!(format_score(round2(0.875)), "0.88");
    }

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(0.9), "0.9");
        assert_eq!(format_score(0.46), "0.46");
        assert_eq!(format_score(1.0), "1.0");
        assert_eq!(format_score(0.0), "0.0");
    }
}
