use std::path::Path;

use serde::Deserialize;
use serde_json::Value;

use crate::Map;
use crate::common::error::ProfileError;
use crate::resources::parse_time;
use crate::submit::options::{OptionMap, OptionValueMap, into_option_map};

const PROPERTIES_PREFIX: &str = "# properties = ";

/// Resource names of the workflow engine that map onto a single sbatch option.
/// When a job declares several of them, the last one wins.
const RESOURCE_MAPPING: &[(&str, &[&str])] = &[
    ("time", &["time", "runtime", "walltime"]),
    ("mem", &["mem", "mem_mb", "ram", "memory"]),
    ("mem-per-cpu", &["mem-per-cpu", "mem_per_cpu", "mem_per_thread"]),
    ("nodes", &["nodes", "nnodes"]),
    ("partition", &["partition", "queue"]),
];

/// Description of a job, embedded by the workflow engine in the job script.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct JobProperties {
    #[serde(default)]
    pub rule: Option<String>,
    #[serde(default)]
    pub jobid: Option<Value>,
    #[serde(default)]
    pub groupid: Option<String>,
    #[serde(default, rename = "type")]
    pub job_type: Option<String>,
    #[serde(default)]
    pub threads: Option<u32>,
    #[serde(default)]
    pub resources: Map<String, Value>,
    #[serde(default)]
    pub cluster: OptionValueMap,
    #[serde(default)]
    pub wildcards: Map<String, Value>,
    #[serde(default)]
    pub params: Map<String, Value>,
}

impl JobProperties {
    /// Name used to refer to the job in messages.
    pub fn name(&self) -> &str {
        self.rule
            .as_deref()
            .or(self.groupid.as_deref())
            .unwrap_or("<unknown>")
    }

    /// Options the job requests through its resources and threads.
    pub fn resource_options(&self) -> crate::Result<OptionMap> {
        let mut options = OptionMap::new();
        for (option, names) in RESOURCE_MAPPING {
            for name in names.iter() {
                let Some(value) = self.resources.get(*name) else {
                    continue;
                };
                let value = value_to_text(value);
                let value = if *option == "time" {
                    match parse_time(&value)? {
                        Some(time) => time,
                        None => {
                            log::warn!("Ignoring time resource `{name}={value}` without a unit");
                            continue;
                        }
                    }
                } else {
                    value
                };
                options.insert(option.to_string(), Some(value));
            }
        }
        if let Some(threads) = self.threads {
            options.insert("cpus-per-task".to_string(), Some(threads.to_string()));
        }
        Ok(options)
    }

    /// Options from the `cluster` mapping of the job.
    pub fn cluster_options(&self) -> OptionMap {
        into_option_map(self.cluster.clone())
    }
}

/// Textual form of a JSON value, lists are joined with spaces.
pub fn value_to_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        Value::Array(items) => items.iter().map(value_to_text).collect::<Vec<_>>().join(" "),
        value => value.to_string(),
    }
}

pub fn parse_job_properties(content: &str) -> Result<JobProperties, String> {
    let line = content
        .lines()
        .find_map(|line| line.strip_prefix(PROPERTIES_PREFIX))
        .ok_or_else(|| format!("missing `{}` line", PROPERTIES_PREFIX.trim()))?;
    serde_json::from_str(line).map_err(|error| error.to_string())
}

/// Reads the job properties from the `# properties = {...}` line of a job script.
pub fn read_job_properties(path: &Path) -> crate::Result<JobProperties> {
    let content = std::fs::read_to_string(path).map_err(|error| ProfileError::JobProperties {
        path: path.to_path_buf(),
        reason: error.to_string(),
    })?;
    parse_job_properties(&content).map_err(|reason| ProfileError::JobProperties {
        path: path.to_path_buf(),
        reason,
    })
}
