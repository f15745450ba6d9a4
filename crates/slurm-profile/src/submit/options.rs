use std::path::Path;

use serde::Deserialize;

use crate::Map;
use crate::common::utils::fs::ensure_parent_dir;

/// sbatch options, `None` marks a flag without a value (e.g. `--requeue`).
pub type OptionMap = Map<String, Option<String>>;

/// Options written in the cluster config or in the job properties.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl OptionValue {
    pub fn into_string(self) -> String {
        match self {
            OptionValue::Bool(value) => value.to_string(),
            OptionValue::Integer(value) => value.to_string(),
            OptionValue::Float(value) => value.to_string(),
            OptionValue::Text(value) => value,
        }
    }
}

pub type OptionValueMap = Map<String, Option<OptionValue>>;

pub fn into_option_map(values: OptionValueMap) -> OptionMap {
    values
        .into_iter()
        .map(|(key, value)| (key, value.map(OptionValue::into_string)))
        .collect()
}

/// Named set of options, see [`merge_layers`].
#[derive(Debug, Clone)]
pub struct OptionLayer {
    name: String,
    options: OptionMap,
}

impl OptionLayer {
    pub fn new(name: impl Into<String>, options: OptionMap) -> Self {
        Self {
            name: name.into(),
            options,
        }
    }
}

/// Merges option layers from the lowest to the highest precedence.
/// An option set by a later layer replaces the same option of all previous layers, regardless
/// of whether it is written with dashes or underscores.
pub fn merge_layers(layers: impl IntoIterator<Item = OptionLayer>) -> OptionMap {
    layers
        .into_iter()
        .fold(OptionMap::new(), |mut merged, layer| {
            if !layer.options.is_empty() {
                log::debug!("Applying {} options: {:?}", layer.name, layer.options);
            }
            merged.extend(
                layer
                    .options
                    .into_iter()
                    .map(|(key, value)| (canonical_key(&key), value)),
            );
            merged
        })
}

/// Parses default sbatch options written as `--key=value --flag key2=value2`.
pub fn parse_sbatch_defaults(defaults: &str) -> OptionMap {
    defaults
        .split_whitespace()
        .map(|item| match item.split_once('=') {
            Some((key, value)) => (
                key.trim().trim_matches('-').to_string(),
                Some(value.trim().to_string()),
            ),
            None => (item.trim().trim_matches('-').to_string(), None),
        })
        .filter(|(key, _)| !key.is_empty())
        .collect()
}

/// Options are written with dashes on the command line, the configuration may use underscores.
pub fn canonical_key(key: &str) -> String {
    key.replace('_', "-")
}

/// Looks up an option, regardless of whether it was written with dashes or underscores.
pub fn get_option<'a>(options: &'a OptionMap, key: &str) -> Option<&'a Option<String>> {
    options
        .get(key)
        .or_else(|| options.get(&key.replace('-', "_")))
}

/// Sets an option and drops its spelling variant with underscores.
pub fn set_option(options: &mut OptionMap, key: &str, value: String) {
    let alias = key.replace('-', "_");
    if alias != key {
        options.remove(&alias);
    }
    options.insert(key.to_string(), Some(value));
}

pub const LOG_OPTIONS: [&str; 2] = ["output", "error"];

/// Creates the directories of the `output` and `error` log files, if they do not exist yet.
pub fn ensure_log_dirs(options: &OptionMap) -> crate::Result<()> {
    for key in LOG_OPTIONS {
        let Some(Some(path)) = get_option(options, key) else {
            continue;
        };
        if let Some(dir) = ensure_parent_dir(Path::new(path))? {
            log::debug!("Created log directory {}", dir.display());
        }
    }
    Ok(())
}

/// Renders options as sbatch arguments, `--key=value` or `--key` for flags.
pub fn format_sbatch_options(options: &OptionMap) -> Vec<String> {
    options
        .iter()
        .map(|(key, value)| match value {
            Some(value) => format!("--{}={value}", canonical_key(key)),
            None => format!("--{}", canonical_key(key)),
        })
        .collect()
}
