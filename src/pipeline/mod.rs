//! Pipeline configuration, validation, and execution.
//!
//! ## Submodules
//!
//! - [`spec`]: the configuration document and per-layer option sections
//! - [`paths`]: resolution of project-relative file options
//! - [`validation`]: rule-based checks run before any component is built
//! - [`traits`]: the [`Component`] contract and its construction context
//! - [`registry`]: the ordered component catalog
//! - [`runner`]: building the selection and running it in order
//! - [`observer`]: stage-boundary hooks

pub mod error_code;
pub mod errors;
pub mod observer;
pub mod paths;
pub mod registry;
pub mod runner;
pub mod spec;
pub mod traits;
pub mod validation;

pub use observer::{NoopObserver, PipelineObserver, StageInfo, StageReport, TimingObserver};
pub use paths::{resolve_paths, PATH_OPTIONS};
pub use registry::{ComponentDescriptor, ComponentRegistry, CULTURE_BANK_COMPONENTS};
pub use runner::{Pipeline, RunSummary};
pub use spec::{LayerConfig, PipelineConfig};
pub use traits::{Collaborators, Component, ComponentContext, TableTransform};
pub use validation::{ValidationEngine, ValidationReport};
