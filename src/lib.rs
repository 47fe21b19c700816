//! # annotation_pipeline
//!
//! A configuration-driven, sequential data-annotation pipeline.
//!
//! A single configuration document selects an ordered list of components
//! from a fixed catalog (culture-relevance classification, knowledge
//! extraction, clustering, summarization, ...). The pipeline resolves the
//! configured file paths, validates the document, builds every selected
//! component, and runs them one after another.
//!
//! Components do not pass data in memory. Each one reads the CSV file named
//! by its `input_file` option and writes the CSV named by its `output_file`
//! option; chaining two components means pointing the second one's input at
//! the first one's output.
//!
//! ```no_run
//! use annotation_pipeline::{Collaborators, KeywordClassifierLoader, Pipeline, PipelineConfig};
//!
//! let config = PipelineConfig::from_path("configs/culture.yaml")?;
//! let collaborators = Collaborators::new().with_classifier_loader(KeywordClassifierLoader);
//! let summary = Pipeline::culture_bank(&config, &collaborators)?.run()?;
//! println!("{} components run", summary.completed);
//! # Ok::<(), annotation_pipeline::PipelineError>(())
//! ```

pub mod errors;
pub mod inference;
pub mod pipeline;
pub mod stages;
pub mod table;

// Re-export commonly used types
pub use errors::{PipelineError, Result};
pub use inference::{
    ClassifierLoader, Device, KeywordClassifier, KeywordClassifierLoader, Prediction,
    TextClassifier,
};
pub use pipeline::error_code::ErrorCode;
pub use pipeline::errors::{PipelineRuntimeError, PipelineSpecError};
pub use pipeline::{
    resolve_paths, Collaborators, Component, ComponentRegistry, LayerConfig, Pipeline,
    PipelineConfig, PipelineObserver, RunSummary, TableTransform, ValidationEngine,
    ValidationReport,
};
pub use table::{Table, TableError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
