//! Component that delegates its transformation to an injected collaborator.
//!
//! Knowledge extraction, clustering, summarization and the other domain
//! stages share one shape: load `input_file`, transform, save `output_file`.
//! [`DelegatedStage`] implements that shape once and looks up the
//! [`TableTransform`] registered for its layer in [`Collaborators`].

use std::path::PathBuf;
use std::sync::Arc;

use tracing::info;

use crate::errors::{PipelineError, Result};
use crate::pipeline::error_code::ErrorCode;
use crate::pipeline::errors::{PipelineRuntimeError, PipelineSpecError};
use crate::pipeline::traits::{Collaborators, Component, ComponentContext, TableTransform};
use crate::table::Table;

pub struct DelegatedStage {
    ctx: ComponentContext,
    input_file: PathBuf,
    output_file: PathBuf,
    transform: Arc<dyn TableTransform>,
}

impl DelegatedStage {
    /// Registry constructor.
    pub fn build(ctx: ComponentContext, collaborators: &Collaborators) -> Result<Box<dyn Component>> {
        Ok(Box::new(Self::new(ctx, collaborators)?))
    }

    pub fn new(ctx: ComponentContext, collaborators: &Collaborators) -> Result<Self> {
        let layer = ctx.layer();
        let transform = collaborators.transform(layer).ok_or_else(|| {
            PipelineSpecError::new(
                ErrorCode::MissingCollaborator,
                format!("/{layer}"),
                format!("No transform registered for component '{layer}'"),
            )
            .with_hint("Register one with Collaborators::with_transform")
        })?;

        let input_file = ctx.options().path("input_file")?;
        let output_file = ctx.options().path("output_file")?;

        Ok(Self {
            ctx,
            input_file,
            output_file,
            transform,
        })
    }

    pub fn read_input(&self) -> Result<Table> {
        self.ctx.read_table("input_file", &self.input_file)
    }

    pub fn save_output(&self, table: &Table) -> Result<()> {
        info!("save to {}", self.output_file.display());
        self.ctx.write_table("output_file", &self.output_file, table)
    }

    /// Option errors raised by the transform are runtime errors of this stage.
    fn stage_failed(&self, err: PipelineError) -> PipelineError {
        match err {
            PipelineError::Spec(spec) => {
                let mut runtime = PipelineRuntimeError::new(
                    ErrorCode::StageFailed,
                    spec.path,
                    self.ctx.layer(),
                    spec.message,
                );
                runtime.hint = spec.hint;
                runtime.into()
            }
            other => other,
        }
    }
}

impl Component for DelegatedStage {
    fn run(&mut self) -> Result<()> {
        let table = self.read_input()?;
        let rows_in = table.len();

        let output = self
            .transform
            .transform(table, self.ctx.options())
            .map_err(|err| self.stage_failed(err))?;
        info!("{}: {rows_in} rows in, {} rows out", self.ctx.layer(), output.len());

        self.save_output(&output)
    }
}
