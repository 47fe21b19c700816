//! Component contract.
//!
//! Every pipeline stage is a [`Component`]: a value built from the pipeline
//! configuration whose only externally invoked operation is
//! [`Component::run`]. Construction is where a component claims its
//! configuration section, prepares its result directory, refuses to clobber
//! an existing output file, and loads any collaborator it needs. The shared
//! part of that work lives in [`ComponentContext::prepare`].
//!
//! Components never hand data to each other in memory. A component's
//! `output_file` is read back from disk by whichever component is configured
//! to consume it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use rustc_hash::FxHashMap;

use super::error_code::ErrorCode;
use super::errors::{option_path, PipelineRuntimeError, PipelineSpecError};
use super::registry::ComponentDescriptor;
use super::spec::{LayerConfig, PipelineConfig};
use crate::errors::Result;
use crate::inference::ClassifierLoader;
use crate::table::{Table, TableError};

// ============================================================================
// Component: the polymorphic stage contract
// ============================================================================

/// A runnable pipeline stage.
///
/// # Contract
///
/// - Built once per pipeline run, from the resolved configuration.
/// - `run` is called at most once; all effects are side effects (files
///   written, log lines emitted).
/// - A failure is returned, never swallowed; the pipeline stops at the
///   first failing component.
pub trait Component {
    fn run(&mut self) -> Result<()>;
}

// ============================================================================
// TableTransform: domain collaborator of delegated stages
// ============================================================================

/// The domain transformation behind a delegated stage.
///
/// Receives the (possibly dry-run truncated) input table and the stage's
/// option section; returns the table to write to the stage's output file.
pub trait TableTransform: Send + Sync {
    fn transform(&self, table: Table, options: &LayerConfig) -> Result<Table>;
}

impl<F> TableTransform for F
where
    F: Fn(Table, &LayerConfig) -> Result<Table> + Send + Sync,
{
    fn transform(&self, table: Table, options: &LayerConfig) -> Result<Table> {
        self(table, options)
    }
}

// ============================================================================
// Collaborators: external dependencies handed to component constructors
// ============================================================================

/// External collaborators available to component constructors.
#[derive(Clone, Default)]
pub struct Collaborators {
    classifier_loader: Option<Arc<dyn ClassifierLoader>>,
    transforms: FxHashMap<String, Arc<dyn TableTransform>>,
}

impl Collaborators {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the loader used by the classification component.
    pub fn with_classifier_loader(mut self, loader: impl ClassifierLoader + 'static) -> Self {
        self.classifier_loader = Some(Arc::new(loader));
        self
    }

    /// Register the transform run by the delegated stage of `layer`.
    pub fn with_transform(
        mut self,
        layer: impl Into<String>,
        transform: impl TableTransform + 'static,
    ) -> Self {
        self.transforms.insert(layer.into(), Arc::new(transform));
        self
    }

    pub fn classifier_loader(&self) -> Option<Arc<dyn ClassifierLoader>> {
        self.classifier_loader.clone()
    }

    pub fn transform(&self, layer: &str) -> Option<Arc<dyn TableTransform>> {
        self.transforms.get(layer).cloned()
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut layers: Vec<&str> = self.transforms.keys().map(String::as_str).collect();
        layers.sort_unstable();
        f.debug_struct("Collaborators")
            .field("classifier_loader", &self.classifier_loader.is_some())
            .field("transforms", &layers)
            .finish()
    }
}

// ============================================================================
// ComponentContext: shared construction and I/O helpers
// ============================================================================

/// What every component gets at construction: its own option section plus
/// the pipeline-wide settings it needs.
#[derive(Debug, Clone)]
pub struct ComponentContext {
    layer: &'static str,
    options: LayerConfig,
    dry_run: Option<usize>,
    output_dir: PathBuf,
}

impl ComponentContext {
    /// Perform the construction steps common to all components:
    ///
    /// 1. extract the section keyed by the descriptor's layer,
    /// 2. create `<result_base_dir>/<layer>`,
    /// 3. fail if a declared `output_file` already exists.
    pub fn prepare(
        descriptor: &ComponentDescriptor,
        config: &PipelineConfig,
    ) -> std::result::Result<Self, PipelineSpecError> {
        let options = config.layer(descriptor.layer)?;
        let output_dir = config.result_base_dir.join(descriptor.layer);
        std::fs::create_dir_all(&output_dir).map_err(|e| {
            PipelineSpecError::new(
                ErrorCode::Io,
                "/result_base_dir",
                format!("Cannot create {}: {e}", output_dir.display()),
            )
        })?;

        let ctx = Self {
            layer: descriptor.layer,
            options,
            dry_run: config.dry_run,
            output_dir,
        };
        if let Some(output) = ctx.options.opt_path("output_file")? {
            ctx.check_output_exists(&output)?;
        }
        Ok(ctx)
    }

    pub fn layer(&self) -> &'static str {
        self.layer
    }

    pub fn options(&self) -> &LayerConfig {
        &self.options
    }

    pub fn dry_run(&self) -> Option<usize> {
        self.dry_run
    }

    /// `<result_base_dir>/<layer>`, created during [`prepare`](Self::prepare).
    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Fail with an `output_exists` error if `path` is already a file.
    ///
    /// Has no side effects, so it can be called any number of times.
    pub fn check_output_exists(&self, path: &Path) -> std::result::Result<(), PipelineSpecError> {
        if path.exists() {
            return Err(PipelineSpecError::new(
                ErrorCode::OutputExists,
                option_path(self.layer, "output_file"),
                format!(
                    "Output file {} already exists for component '{}'",
                    path.display(),
                    self.layer
                ),
            )
            .with_hint("Delete or move the existing file, or configure another output_file"));
        }
        Ok(())
    }

    /// Load the table named by option `key`, keeping only the first
    /// `dry_run` rows when a dry-run limit is set.
    pub fn read_table(&self, key: &str, path: &Path) -> Result<Table> {
        let table = Table::read_csv(path).map_err(|e| self.table_error(key, e))?;
        Ok(match self.dry_run {
            Some(limit) => table.head(limit),
            None => table,
        })
    }

    /// Write `table` to the file named by option `key`.
    pub fn write_table(&self, key: &str, path: &Path, table: &Table) -> Result<()> {
        table
            .write_csv(path)
            .map_err(|e| self.table_error(key, e).into())
    }

    /// Wrap a table failure as a runtime error of this component.
    pub fn table_error(&self, key: &str, err: TableError) -> PipelineRuntimeError {
        PipelineRuntimeError::new(err.code(), option_path(self.layer, key), self.layer, err.to_string())
    }

    /// Build a runtime error attributed to this component.
    pub fn runtime_error(
        &self,
        code: ErrorCode,
        key: &str,
        message: impl Into<String>,
    ) -> PipelineRuntimeError {
        PipelineRuntimeError::new(code, option_path(self.layer, key), self.layer, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::registry::ComponentDescriptor;
    use serde_json::json;

    fn noop(_: ComponentContext, _: &Collaborators) -> Result<Box<dyn Component>> {
        struct Noop;
        impl Component for Noop {
            fn run(&mut self) -> Result<()> {
                Ok(())
            }
        }
        Ok(Box::new(Noop))
    }

    const DESCRIPTOR: ComponentDescriptor = ComponentDescriptor {
        name: "Noop",
        layer: "9_noop",
        description: "Does nothing",
        build: noop,
    };

    #[test]
    fn test_prepare_creates_layer_dir() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PipelineConfig::new(dir.path(), dir.path().join("results"))
            .with_layer("9_noop", json!({}));

        let ctx = ComponentContext::prepare(&DESCRIPTOR, &cfg).unwrap();
        assert!(ctx.output_dir().is_dir());
        assert!(ctx.output_dir().ends_with("results/9_noop"));
    }

    #[test]
    fn test_prepare_rejects_existing_output() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("out.csv");
        std::fs::write(&out, "a\n1\n").unwrap();
        let cfg = PipelineConfig::new(dir.path(), dir.path().join("results"))
            .with_layer("9_noop", json!({ "output_file": out.to_str().unwrap() }));

        let err = ComponentContext::prepare(&DESCRIPTOR, &cfg).unwrap_err();
        assert_eq!(err.code, ErrorCode::OutputExists);
        assert_eq!(err.path, "/9_noop/output_file");
    }

    #[test]
    fn test_check_output_exists_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PipelineConfig::new(dir.path(), dir.path().join("results"))
            .with_layer("9_noop", json!({}));
        let ctx = ComponentContext::prepare(&DESCRIPTOR, &cfg).unwrap();

        let missing = dir.path().join("missing.csv");
        assert!(ctx.check_output_exists(&missing).is_ok());
        assert!(ctx.check_output_exists(&missing).is_ok());
        assert!(!missing.exists());
    }

    #[test]
    fn test_prepare_requires_section() {
        let dir = tempfile::tempdir().unwrap();
        let cfg = PipelineConfig::new(dir.path(), dir.path().join("results"));
        let err = ComponentContext::prepare(&DESCRIPTOR, &cfg).unwrap_err();
        assert_eq!(err.code, ErrorCode::MissingLayer);
    }

    #[test]
    fn test_read_table_applies_dry_run() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        std::fs::write(&input, "id\n1\n2\n3\n4\n").unwrap();
        let cfg = PipelineConfig::new(dir.path(), dir.path().join("results"))
            .with_dry_run(Some(2))
            .with_layer("9_noop", json!({}));
        let ctx = ComponentContext::prepare(&DESCRIPTOR, &cfg).unwrap();

        let table = ctx.read_table("input_file", &input).unwrap();
        assert_eq!(table.column("id").unwrap(), vec!["1", "2"]);
    }

    #[test]
    fn test_closure_transform() {
        let collaborators = Collaborators::new().with_transform(
            "9_noop",
            |table: Table, _: &LayerConfig| -> Result<Table> { Ok(table.head(0)) },
        );
        let transform = collaborators.transform("9_noop").unwrap();
        let options = LayerConfig::new("9_noop", Default::default());
        let out = transform
            .transform(Table::new(["a"]), &options)
            .unwrap();
        assert!(out.is_empty());
        assert!(collaborators.transform("other").is_none());
    }
}
