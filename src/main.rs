//! `annotate` -- CLI binary for the annotation pipeline.
//!
//! Provides the following subcommands:
//!
//! - `annotate run` -- Build the configured components and run them in order.
//! - `annotate list` -- Print the component catalog.
//! - `annotate check` -- Resolve and validate a configuration without running it.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};

use annotation_pipeline::pipeline::TimingObserver;
use annotation_pipeline::{
    resolve_paths, Collaborators, ComponentRegistry, KeywordClassifierLoader, Pipeline,
    PipelineConfig, ValidationEngine,
};

/// Configuration-driven data annotation pipeline.
#[derive(Parser)]
#[command(name = "annotate", about = "Configuration-driven data annotation pipeline", version)]
struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Build the selected components and run them in order.
    Run {
        /// Configuration file (.yaml/.yml or .json).
        config: PathBuf,

        /// Only process the first N input rows (overrides `dry_run`).
        #[arg(long, value_name = "N")]
        dry_run: Option<usize>,

        /// Component indices to run, comma-separated (overrides `chosen_components`).
        #[arg(long, value_delimiter = ',', value_name = "INDICES")]
        components: Option<Vec<usize>>,
    },

    /// Print the component catalog.
    List {
        /// Also show which components this configuration selects.
        config: Option<PathBuf>,
    },

    /// Resolve and validate a configuration without running anything.
    Check {
        /// Configuration file (.yaml/.yml or .json).
        config: PathBuf,

        /// Print the diagnostics as JSON.
        #[arg(long)]
        json: bool,
    },
}

fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    let default_filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .init();

    match cli.command {
        Commands::Run {
            config,
            dry_run,
            components,
        } => run(config, dry_run, components),
        Commands::List { config } => list(config),
        Commands::Check { config, json } => check(config, json),
    }
}

fn load(path: &Path) -> anyhow::Result<PipelineConfig> {
    PipelineConfig::from_path(path).with_context(|| format!("loading {}", path.display()))
}

fn run(
    path: PathBuf,
    dry_run: Option<usize>,
    components: Option<Vec<usize>>,
) -> anyhow::Result<ExitCode> {
    let mut config = load(&path)?;
    if dry_run.is_some() {
        config = config.with_dry_run(dry_run);
    }
    if let Some(indices) = components {
        config = config.with_chosen_components(indices);
    }

    let collaborators = Collaborators::new().with_classifier_loader(KeywordClassifierLoader);
    let pipeline = Pipeline::culture_bank(&config, &collaborators)?;
    println!("{}", pipeline.registry().render_catalog());
    println!("Running: {}", pipeline.running_components());

    let mut timing = TimingObserver::new();
    let summary = pipeline.run_with_observer(&mut timing)?;
    for report in timing.reports() {
        println!(
            "  ({}) {:<28} {:>10.2?}",
            report.stage.index, report.stage.name, report.elapsed
        );
    }
    println!(
        "{} components completed in {:.2?}",
        summary.completed,
        timing.total()
    );
    Ok(ExitCode::SUCCESS)
}

fn list(path: Option<PathBuf>) -> anyhow::Result<ExitCode> {
    let registry = ComponentRegistry::culture_bank();
    println!("{}", registry.render_catalog());

    if let Some(path) = path {
        let config = load(&path)?;
        let selected: Vec<String> = config
            .chosen_components
            .iter()
            .map(|&i| match registry.get(i) {
                Ok(d) => format!("({i}, {})", d.name),
                Err(_) => format!("({i}, ?)"),
            })
            .collect();
        println!("Selected: [{}]", selected.join(", "));
    }
    Ok(ExitCode::SUCCESS)
}

fn check(path: PathBuf, json: bool) -> anyhow::Result<ExitCode> {
    let config = load(&path)?;
    let registry = ComponentRegistry::culture_bank();
    let resolved = resolve_paths(&config, registry.layers());
    let report = ValidationEngine::with_defaults().validate(&resolved, &registry);

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for err in report.errors() {
            println!("error: {err}");
            if let Some(hint) = &err.hint {
                println!("  hint: {hint}");
            }
        }
        for warning in report.warnings() {
            println!("warning: {warning}");
        }
        println!(
            "{}: {} error(s), {} warning(s)",
            path.display(),
            report.error_count(),
            report.warnings().count()
        );
    }

    Ok(if report.is_valid() {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
