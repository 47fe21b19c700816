//! Component registry.
//!
//! The registry is an ordered, immutable catalog of [`ComponentDescriptor`]s.
//! A descriptor's position in the catalog is its *selection index*: the
//! number used in `chosen_components`. The index is unrelated to the numeric
//! prefix of a layer name.
//!
//! The standard catalog is the single table [`CULTURE_BANK_COMPONENTS`].

use std::fmt;

use comfy_table::{presets::UTF8_FULL, Table as DisplayTable};

use super::error_code::ErrorCode;
use super::errors::PipelineSpecError;
use super::spec::PipelineConfig;
use super::traits::{Collaborators, Component, ComponentContext};
use crate::errors::Result;
use crate::stages::{CultureRelevanceClassifier, DelegatedStage};

/// Constructor of a component from its prepared context.
pub type BuildFn = fn(ComponentContext, &Collaborators) -> Result<Box<dyn Component>>;

/// Static description of a registered component.
#[derive(Clone, Copy)]
pub struct ComponentDescriptor {
    /// Type-style name shown in listings (e.g. `"ClusteringComponent"`).
    pub name: &'static str,
    /// Configuration section key (e.g. `"3_clustering"`).
    pub layer: &'static str,
    /// One-line human-readable description.
    pub description: &'static str,
    pub build: BuildFn,
}

impl fmt::Debug for ComponentDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ComponentDescriptor")
            .field("name", &self.name)
            .field("layer", &self.layer)
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// The standard annotation pipeline, in selection-index order.
pub const CULTURE_BANK_COMPONENTS: &[ComponentDescriptor] = &[
    ComponentDescriptor {
        name: "CultureRelevanceClassifier",
        layer: "0_culture_relevance_classifier",
        description: "Classify sentences/comments and pick out the culturally-relevant ones",
        build: CultureRelevanceClassifier::build,
    },
    ComponentDescriptor {
        name: "KnowledgeExtractor",
        layer: "1_knowledge_extractor",
        description: "Extract structured cultural knowledge from relevant comments",
        build: DelegatedStage::build,
    },
    ComponentDescriptor {
        name: "NegationConverter",
        layer: "2_negation_converter",
        description: "Rewrite negated knowledge statements into affirmative form",
        build: DelegatedStage::build,
    },
    ComponentDescriptor {
        name: "ClusteringComponent",
        layer: "3_clustering",
        description: "Group similar knowledge statements into clusters",
        build: DelegatedStage::build,
    },
    ComponentDescriptor {
        name: "ClusterSummarizer",
        layer: "4_cluster_summarizer",
        description: "Summarize each cluster into a single representative statement",
        build: DelegatedStage::build,
    },
    ComponentDescriptor {
        name: "TopicNormalizer",
        layer: "5_topic_normalization",
        description: "Normalize cluster topics onto a shared vocabulary",
        build: DelegatedStage::build,
    },
    ComponentDescriptor {
        name: "AgreementCalculator",
        layer: "6_agreement_calculator",
        description: "Score how much the underlying comments agree with each summary",
        build: DelegatedStage::build,
    },
    ComponentDescriptor {
        name: "ContentModeration",
        layer: "7_content_moderation",
        description: "Flag or remove summaries with harmful or controversial content",
        build: DelegatedStage::build,
    },
    ComponentDescriptor {
        name: "FinalFormatter",
        layer: "8_final_formatter",
        description: "Format the annotated knowledge base for release",
        build: DelegatedStage::build,
    },
];

/// Ordered catalog of components, indexed by selection index.
#[derive(Debug, Clone)]
pub struct ComponentRegistry {
    descriptors: Vec<ComponentDescriptor>,
}

impl ComponentRegistry {
    /// Build a registry from an explicit descriptor table.
    pub fn new(descriptors: Vec<ComponentDescriptor>) -> Self {
        Self { descriptors }
    }

    /// The standard catalog ([`CULTURE_BANK_COMPONENTS`]).
    pub fn culture_bank() -> Self {
        Self::new(CULTURE_BANK_COMPONENTS.to_vec())
    }

    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }

    /// Iterate `(selection index, descriptor)` pairs in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &ComponentDescriptor)> {
        self.descriptors.iter().enumerate()
    }

    /// Layer names of every registered component, in catalog order.
    pub fn layers(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.descriptors.iter().map(|d| d.layer)
    }

    /// Look up a descriptor by selection index.
    ///
    /// An out-of-range index yields an `unknown_component` error whose
    /// message lists every valid `(index, name)` pair.
    pub fn get(&self, index: usize) -> std::result::Result<&ComponentDescriptor, PipelineSpecError> {
        self.descriptors
            .get(index)
            .ok_or_else(|| self.out_of_range(index))
    }

    /// Look up and construct the component at `index`.
    pub fn instantiate(
        &self,
        index: usize,
        config: &PipelineConfig,
        collaborators: &Collaborators,
    ) -> Result<Box<dyn Component>> {
        let descriptor = self.get(index)?;
        let ctx = ComponentContext::prepare(descriptor, config)?;
        (descriptor.build)(ctx, collaborators)
    }

    /// `[(0, Name), (1, Name), ...]`, as used in error messages.
    pub fn possible_components(&self) -> String {
        let pairs: Vec<String> = self
            .iter()
            .map(|(i, d)| format!("({i}, {})", d.name))
            .collect();
        format!("[{}]", pairs.join(", "))
    }

    pub(crate) fn out_of_range(&self, index: usize) -> PipelineSpecError {
        PipelineSpecError::new(
            ErrorCode::UnknownComponent,
            "/chosen_components",
            format!(
                "The chosen component index {index} is out of range. Possible components: {}",
                self.possible_components()
            ),
        )
        .with_hint(format!(
            "Use an index between 0 and {}",
            self.len().saturating_sub(1)
        ))
    }

    /// Render the catalog as a table of index, name, layer and description.
    pub fn render_catalog(&self) -> String {
        let mut table = DisplayTable::new();
        table.load_preset(UTF8_FULL);
        table.set_header(vec!["Index", "Component", "Layer", "Description"]);
        for (i, d) in self.iter() {
            table.add_row(vec![i.to_string(), d.name.into(), d.layer.into(), d.description.into()]);
        }
        table.to_string()
    }
}

impl Default for ComponentRegistry {
    fn default() -> Self {
        Self::culture_bank()
    }
}
