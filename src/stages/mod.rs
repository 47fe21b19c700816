//! Concrete pipeline components.
//!
//! - [`classifier`]: the culture-relevance classifier, which filters the
//!   input table down to the rows an external text classifier marks relevant.
//! - [`delegated`]: the generic component behind every other registered
//!   stage: it loads its input, hands the table to an injected
//!   [`TableTransform`](crate::pipeline::TableTransform), and saves the result.

pub mod classifier;
pub mod delegated;

pub use classifier::CultureRelevanceClassifier;
pub use delegated::DelegatedStage;
