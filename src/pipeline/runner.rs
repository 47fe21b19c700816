//! Pipeline runner: builds the selected components and runs them in order.
//!
//! [`Pipeline::new`] turns a loaded configuration into a ready-to-run list of
//! components:
//!
//! 1. create `result_base_dir` and one `<layer>` directory per registered
//!    component,
//! 2. resolve project-relative file options ([`resolve_paths`]),
//! 3. validate the resolved configuration,
//! 4. construct each index of `chosen_components`, in the order given.
//!
//! Any failure aborts construction, so no component runs unless every
//! selected component could be built. [`Pipeline::run`] then executes the
//! components one after another and stops at the first failure.

use std::fs;

use tracing::{debug, info, warn};

use super::error_code::ErrorCode;
use super::errors::PipelineSpecError;
use super::observer::{NoopObserver, PipelineObserver, StageClock, StageInfo, StageReport};
use super::paths::resolve_paths;
use super::registry::ComponentRegistry;
use super::spec::PipelineConfig;
use super::traits::{Collaborators, Component};
use super::validation::ValidationEngine;
use crate::errors::{PipelineError, Result};

/// Enter a tracing span for a pipeline stage.
macro_rules! trace_stage {
    ($stage:expr) => {
        let _span = tracing::info_span!(
            "pipeline_stage",
            position = $stage.position,
            layer = $stage.layer
        )
        .entered();
    };
}

/// A constructed component together with where it came from.
struct ScheduledStage {
    info: StageInfo,
    component: Box<dyn Component>,
}

/// Summary of a completed run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    /// Number of components that ran to completion.
    pub completed: usize,
}

/// An ordered, single-use list of constructed components.
pub struct Pipeline {
    name: String,
    registry: ComponentRegistry,
    stages: Vec<ScheduledStage>,
}

impl Pipeline {
    /// Build the standard pipeline from [`ComponentRegistry::culture_bank`].
    pub fn culture_bank(config: &PipelineConfig, collaborators: &Collaborators) -> Result<Self> {
        Self::new("CultureBankPipeline", config, ComponentRegistry::culture_bank(), collaborators)
    }

    /// Build a pipeline over an arbitrary registry.
    ///
    /// `config` is the configuration as loaded; file options are resolved
    /// here and must not have been resolved before.
    pub fn new(
        name: impl Into<String>,
        config: &PipelineConfig,
        registry: ComponentRegistry,
        collaborators: &Collaborators,
    ) -> Result<Self> {
        let name = name.into();
        info!(pipeline = %name, "initializing pipeline");

        init_result_dirs(config, &registry)?;
        let resolved = resolve_paths(config, registry.layers());

        let report = ValidationEngine::with_defaults().validate(&resolved, &registry);
        for warning in report.warnings() {
            warn!("{warning}");
        }
        if report.has_errors() {
            return Err(PipelineError::Invalid(report));
        }

        info!("possible pipeline components of {name}:");
        for (i, d) in registry.iter() {
            info!("  ({i}) {} - {}", d.name, d.description);
        }

        let mut stages = Vec::with_capacity(resolved.chosen_components.len());
        for (position, &index) in resolved.chosen_components.iter().enumerate() {
            let descriptor = *registry.get(index).map_err(|mut err| {
                err.path = format!("/chosen_components/{position}");
                err
            })?;
            debug!(position, index, layer = descriptor.layer, "constructing component");
            let component = registry.instantiate(index, &resolved, collaborators)?;
            stages.push(ScheduledStage {
                info: StageInfo {
                    position,
                    index,
                    name: descriptor.name,
                    layer: descriptor.layer,
                },
                component,
            });
        }

        let pipeline = Self {
            name,
            registry,
            stages,
        };
        info!("run the following components: {}", pipeline.running_components());
        Ok(pipeline)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn registry(&self) -> &ComponentRegistry {
        &self.registry
    }

    /// Number of scheduled components (repeats counted).
    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// The scheduled components, in run order.
    pub fn stages(&self) -> Vec<StageInfo> {
        self.stages.iter().map(|s| s.info.clone()).collect()
    }

    /// `[(0, CultureRelevanceClassifier), (3, ClusteringComponent)]`
    pub fn running_components(&self) -> String {
        let pairs: Vec<String> = self
            .stages
            .iter()
            .map(|s| format!("({}, {})", s.info.index, s.info.name))
            .collect();
        format!("[{}]", pairs.join(", "))
    }

    /// Run every component in order.
    pub fn run(self) -> Result<RunSummary> {
        self.run_with_observer(&mut NoopObserver)
    }

    /// Run every component in order, reporting stage boundaries to
    /// `observer`. The first failing component stops the run.
    pub fn run_with_observer(mut self, observer: &mut dyn PipelineObserver) -> Result<RunSummary> {
        info!(
            "running pipeline {} with {} components...",
            self.name,
            self.stages.len()
        );
        let infos = self.stages();
        observer.on_pipeline_start(&infos);

        for stage in &mut self.stages {
            trace_stage!(stage.info);
            info!("running {} ({})", stage.info.name, stage.info.layer);
            observer.on_stage_start(&stage.info);

            let clock = StageClock::start();
            let outcome = stage.component.run();
            let report = StageReport {
                stage: stage.info.clone(),
                elapsed: clock.elapsed(),
                succeeded: outcome.is_ok(),
            };
            observer.on_stage_end(&report);

            if let Err(err) = outcome {
                warn!(elapsed = ?report.elapsed, "component {} failed: {err}", stage.info.name);
                return Err(err);
            }
            debug!(elapsed = ?report.elapsed, "component {} finished", stage.info.name);
        }

        let completed = self.stages.len();
        observer.on_pipeline_end(completed);
        info!("pipeline {} finished, {completed} components run", self.name);
        Ok(RunSummary { completed })
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stages())
            .finish()
    }
}

/// Create `result_base_dir` and one subdirectory per registered layer.
fn init_result_dirs(config: &PipelineConfig, registry: &ComponentRegistry) -> Result<()> {
    for dir in std::iter::once(config.result_base_dir.clone())
        .chain(registry.layers().map(|l| config.result_base_dir.join(l)))
    {
        fs::create_dir_all(&dir).map_err(|e| {
            PipelineSpecError::new(
                ErrorCode::Io,
                "/result_base_dir",
                format!("Cannot create {}: {e}", dir.display()),
            )
        })?;
    }
    Ok(())
}
