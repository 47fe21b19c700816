//! Property-based tests using proptest

use std::path::Path;

use annotation_pipeline::pipeline::{ComponentDescriptor, ComponentContext};
use annotation_pipeline::*;
use proptest::prelude::*;
use serde_json::json;

fn write_ids(path: &Path, rows: usize) {
    let mut table = Table::new(["id"]);
    for i in 0..rows {
        table.push_row(vec![i.to_string()]).unwrap();
    }
    table.write_csv(path).unwrap();
}

fn noop(_: ComponentContext, _: &Collaborators) -> Result<Box<dyn Component>> {
    struct Noop;
    impl Component for Noop {
        fn run(&mut self) -> Result<()> {
            Ok(())
        }
    }
    Ok(Box::new(Noop))
}

/// A registry of `n` no-op components with layers `l0`, `l1`, ...
fn noop_registry(n: usize) -> ComponentRegistry {
    const LAYERS: [&str; 4] = ["l0", "l1", "l2", "l3"];
    const NAMES: [&str; 4] = ["Zero", "One", "Two", "Three"];
    ComponentRegistry::new(
        (0..n)
            .map(|i| ComponentDescriptor {
                name: NAMES[i],
                layer: LAYERS[i],
                description: "does nothing",
                build: noop,
            })
            .collect(),
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn test_dry_run_reads_exact_prefix(rows in 0usize..40, limit in 1usize..50) {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("in.csv");
        write_ids(&input, rows);

        let registry = noop_registry(1);
        let cfg = PipelineConfig::new(dir.path(), dir.path().join("results"))
            .with_dry_run(Some(limit))
            .with_layer("l0", json!({}));
        let descriptor = *registry.get(0).unwrap();
        let ctx = ComponentContext::prepare(&descriptor, &cfg).unwrap();

        let table = ctx.read_table("input_file", &input).unwrap();
        let expected: Vec<String> = (0..rows.min(limit)).map(|i| i.to_string()).collect();
        prop_assert_eq!(table.column("id").unwrap(), expected);
    }

    #[test]
    fn test_resolve_joins_relative_paths(
        base in "/[a-z]{1,8}(/[a-z]{1,8}){0,2}",
        rel in "[a-z]{1,8}(/[a-z]{1,8}){0,2}\\.csv",
    ) {
        let cfg = PipelineConfig::new(&base, "/results")
            .with_layer("l0", json!({ "input_file": rel.as_str(), "batch_size": 4 }))
            .with_layer("other", json!({ "input_file": rel.as_str() }));

        let resolved = resolve_paths(&cfg, ["l0"]);
        let options = resolved.layer("l0").unwrap();

        prop_assert_eq!(options.path("input_file").unwrap(), Path::new(&base).join(&rel));
        prop_assert_eq!(options.usize("batch_size").unwrap(), 4);
        // unregistered sections and the input are untouched
        prop_assert_eq!(&resolved.layers["other"], &cfg.layers["other"]);
        let original = cfg.layer("l0").unwrap();
        prop_assert_eq!(original.str("input_file").unwrap(), rel.as_str());
    }

    #[test]
    fn test_stages_follow_selection_order(chosen in prop::collection::vec(0usize..4, 0..10)) {
        let dir = tempfile::tempdir().unwrap();
        let mut cfg = PipelineConfig::new(dir.path(), dir.path().join("results"))
            .with_chosen_components(chosen.clone());
        for layer in ["l0", "l1", "l2", "l3"] {
            cfg = cfg.with_layer(layer, json!({}));
        }

        let pipeline = Pipeline::new("prop", &cfg, noop_registry(4), &Collaborators::new()).unwrap();
        let indices: Vec<usize> = pipeline.stages().iter().map(|s| s.index).collect();
        let positions: Vec<usize> = pipeline.stages().iter().map(|s| s.position).collect();

        prop_assert_eq!(&indices, &chosen);
        prop_assert_eq!(positions, (0..chosen.len()).collect::<Vec<_>>());
        prop_assert_eq!(pipeline.run().unwrap().completed, chosen.len());
    }

    #[test]
    fn test_any_out_of_range_index_fails_build(
        mut chosen in prop::collection::vec(0usize..2, 0..6),
        bad in 2usize..100,
        at in 0usize..6,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let at = at.min(chosen.len());
        chosen.insert(at, bad);
        let cfg = PipelineConfig::new(dir.path(), dir.path().join("results"))
            .with_chosen_components(chosen)
            .with_layer("l0", json!({}))
            .with_layer("l1", json!({}));

        let err = Pipeline::new("prop", &cfg, noop_registry(2), &Collaborators::new()).unwrap_err();
        let PipelineError::Invalid(report) = err else {
            return Err(TestCaseError::fail("expected validation failure"));
        };
        let diag = report.errors().next().unwrap();
        prop_assert_eq!(diag.code, ErrorCode::UnknownComponent);
        prop_assert_eq!(diag.path.clone(), format!("/chosen_components/{at}"));
        prop_assert!(diag.message.contains("[(0, Zero), (1, One)]"));
    }
}
