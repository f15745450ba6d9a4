use std::path::Path;

use crate::Map;
use crate::common::error::ProfileError;
use crate::common::utils::fs::path_has_extension;
use crate::submit::options::{OptionMap, OptionValueMap, into_option_map};

pub const DEFAULT_ENTRY: &str = "__default__";

/// sbatch options of individual rules, read from a YAML or JSON file:
///
/// ```yaml
/// __default__:
///   output: "logs/{rule}/{jobid}.out"
/// assemble:
///   mem: 64G
///   partition: bigmem
/// ```
#[derive(Debug, Default, Clone, PartialEq)]
pub struct ClusterConfig {
    entries: Map<String, OptionMap>,
}

type RawConfig = Map<String, Option<OptionValueMap>>;

impl ClusterConfig {
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|error| ProfileError::ClusterConfig {
            path: path.to_path_buf(),
            reason: error.to_string(),
        })?;
        let raw: Result<RawConfig, String> = if path_has_extension(path, "json") {
            serde_json::from_str(&content).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&content).map_err(|e| e.to_string())
        };
        let raw = raw.map_err(|reason| ProfileError::ClusterConfig {
            path: path.to_path_buf(),
            reason,
        })?;
        log::debug!("Loaded cluster config {}", path.display());
        Ok(Self::from_raw(raw))
    }

    fn from_raw(raw: RawConfig) -> Self {
        let mut entries: Map<String, OptionMap> = raw
            .into_iter()
            .map(|(rule, options)| (rule, options.map(into_option_map).unwrap_or_default()))
            .collect();
        entries.entry(DEFAULT_ENTRY.to_string()).or_default();
        Self { entries }
    }

    pub fn default_options(&self) -> OptionMap {
        self.entries.get(DEFAULT_ENTRY).cloned().unwrap_or_default()
    }

    pub fn rule_options(&self, rule: &str) -> OptionMap {
        self.entries.get(rule).cloned().unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::ClusterConfig;
    use crate::common::error::ProfileError;
    use crate::tests::utils::options;

    fn write(dir: &Path, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_yaml() {
        let dir = tempfile::TempDir::with_prefix("slurm-profile").unwrap();
        let path = write(
            dir.path(),
            "cluster.yaml",
            r#"
__default__:
  output: "logs/{rule}.out"
  requeue:
assemble:
  mem: 64G
  cpus_per_task: 16
empty:
"#,
        );
        let config = ClusterConfig::load(&path).unwrap();
        assert_eq!(
            config.default_options(),
            options(&[("output", Some("logs/{rule}.out")), ("requeue", None)])
        );
        assert_eq!(
            config.rule_options("assemble"),
            options(&[("cpus_per_task", Some("16")), ("mem", Some("64G"))])
        );
        assert!(config.rule_options("empty").is_empty());
        assert!(config.rule_options("missing").is_empty());
    }

    #[test]
    fn test_load_json() {
        let dir = tempfile::TempDir::with_prefix("slurm-profile").unwrap();
        let path = write(
            dir.path(),
            "cluster.json",
            r#"{"map": {"time": "01:00:00", "nodes": 2}}"#,
        );
        let config = ClusterConfig::load(&path).unwrap();
        assert!(config.default_options().is_empty());
        assert_eq!(
            config.rule_options("map"),
            options(&[("nodes", Some("2")), ("time", Some("01:00:00"))])
        );
    }

    #[test]
    fn test_load_invalid() {
        let dir = tempfile::TempDir::with_prefix("slurm-profile").unwrap();
        let path = write(dir.path(), "cluster.yaml", "- a\n- b\n");
        assert!(matches!(
            ClusterConfig::load(&path),
            Err(ProfileError::ClusterConfig { .. })
        ));
        assert!(matches!(
            ClusterConfig::load(&dir.path().join("missing.yaml")),
            Err(ProfileError::ClusterConfig { .. })
        ));
    }
}
