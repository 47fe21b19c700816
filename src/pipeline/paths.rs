//! Project-relative path resolution.
//!
//! Component sections name their files relative to `project_base_dir`.
//! [`resolve_paths`] returns a copy of the configuration in which every
//! recognised file option of every registered layer has been joined onto
//! that directory. It must run before components are instantiated, because
//! the output-conflict check compares absolute paths.
//!
//! Resolution is meant to be applied once to a freshly loaded configuration.
//! Joining uses [`Path::join`], so a value that is already absolute replaces
//! the base instead of being prefixed again.

use std::path::Path;

use serde_json::Value;

use super::spec::PipelineConfig;

/// Option names holding project-relative file paths.
pub const PATH_OPTIONS: &[&str] = &[
    "input_file",
    "output_file",
    "output_raw",
    "output_score_file",
    "output_filtered_file",
    "original_before_cluster_file",
    "output_file_for_manual_annotation",
    "controversial_annotation_file",
];

/// Join every recognised file option of `layers` onto `project_base_dir`.
///
/// Layers without a section, and options that are absent or not strings,
/// are left untouched. The input configuration is not modified.
pub fn resolve_paths<'a>(
    config: &PipelineConfig,
    layers: impl IntoIterator<Item = &'a str>,
) -> PipelineConfig {
    let mut resolved = config.clone();
    let base = config.project_base_dir.as_path();

    for layer in layers {
        let Some(Value::Object(options)) = resolved.layers.get_mut(layer) else {
            continue;
        };
        for &key in PATH_OPTIONS {
            if let Some(Value::String(relative)) = options.get_mut(key) {
                *relative = join(base, relative);
            }
        }
    }

    resolved
}

fn join(base: &Path, relative: &str) -> String {
    base.join(relative).to_string_lossy().into_owned()
}
