use std::path::{Path, PathBuf};

use clap::Parser;
use clap::builder::BoolishValueParser;
use serde::Deserialize;

use crate::common::error::ProfileError;
use crate::common::utils::fs::{executable_dir, normalize_path};
use crate::submit::options::{OptionMap, parse_sbatch_defaults};

/// Name of the settings file looked up next to the executable.
pub const SETTINGS_FILE: &str = "settings.toml";

/// Settings of the profile, shared by all submitted jobs.
///
/// ```toml
/// sbatch_defaults = "--account=proj --qos=normal"
/// cluster_config = "cluster.yaml"
/// advanced_argument_conversion = true
/// ```
#[derive(Debug, Default, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProfileSettings {
    /// Options passed to every `sbatch` call, written as `--key=value` pairs.
    pub sbatch_defaults: String,
    pub cluster_name: Option<String>,
    /// Per-rule options (YAML or JSON).
    pub cluster_config: Option<PathBuf>,
    pub partition: Option<String>,
    pub account: Option<String>,
    /// Fit the requested resources into the partition before submitting.
    pub advanced_argument_conversion: bool,
}

#[derive(Parser, Debug, Default, Clone)]
pub struct SettingsOpts {
    /// Path to the settings file (TOML)
    #[arg(long, value_hint = clap::ValueHint::FilePath, env = "SLURM_PROFILE_SETTINGS")]
    pub settings: Option<PathBuf>,

    /// Default sbatch options, e.g. "--account=proj --qos=normal"
    #[arg(long, allow_hyphen_values = true, env = "SLURM_PROFILE_SBATCH_DEFAULTS")]
    pub sbatch_defaults: Option<String>,

    /// Path to the cluster config with per-rule options
    #[arg(long, value_hint = clap::ValueHint::FilePath, env = "SLURM_PROFILE_CLUSTER_CONFIG")]
    pub cluster_config: Option<PathBuf>,

    /// Slurm cluster the jobs are submitted to
    #[arg(long, env = "SLURM_PROFILE_CLUSTER_NAME")]
    pub cluster_name: Option<String>,

    /// Default partition
    #[arg(long, env = "SLURM_PROFILE_PARTITION")]
    pub partition: Option<String>,

    /// Account charged for the jobs
    #[arg(long, env = "SLURM_PROFILE_ACCOUNT")]
    pub account: Option<String>,

    /// Adjust CPUs, memory and time to the limits of the partition
    #[arg(
        long,
        num_args = 0..=1,
        default_missing_value = "true",
        value_parser = BoolishValueParser::new(),
        env = "SLURM_PROFILE_ADVANCED_ARGUMENT_CONVERSION"
    )]
    pub advanced_argument_conversion: Option<bool>,
}

fn default_settings_path() -> Option<PathBuf> {
    let path = executable_dir()?.join(SETTINGS_FILE);
    path.is_file().then_some(path)
}

impl ProfileSettings {
    /// Reads settings from a TOML file. A relative cluster config path is resolved against the
    /// directory of the settings file.
    pub fn from_file(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|error| {
            ProfileError::GenericError(format!(
                "Cannot read settings file {}: {error}",
                path.display()
            ))
        })?;
        let mut settings: ProfileSettings = toml::from_str(&content).map_err(|error| {
            ProfileError::DeserializationError(format!("{}: {error}", path.display()))
        })?;
        if let Some(cluster_config) = settings.cluster_config.take() {
            let directory = path.parent().unwrap_or(Path::new(""));
            settings.cluster_config = Some(normalize_path(&cluster_config, directory));
        }
        Ok(settings)
    }

    /// Settings from the settings file (if there is one), overridden by command line options
    /// and environment variables.
    pub fn load(opts: SettingsOpts) -> crate::Result<Self> {
        let SettingsOpts {
            settings,
            sbatch_defaults,
            cluster_config,
            cluster_name,
            partition,
            account,
            advanced_argument_conversion,
        } = opts;

        let mut loaded = match settings.or_else(default_settings_path) {
            Some(path) => {
                log::debug!("Loading settings from {}", path.display());
                Self::from_file(&path)?
            }
            None => Self::default(),
        };

        if let Some(sbatch_defaults) = sbatch_defaults {
            loaded.sbatch_defaults = sbatch_defaults;
        }
        if cluster_config.is_some() {
            loaded.cluster_config = cluster_config;
        }
        if cluster_name.is_some() {
            loaded.cluster_name = cluster_name;
        }
        if partition.is_some() {
            loaded.partition = partition;
        }
        if account.is_some() {
            loaded.account = account;
        }
        if let Some(advanced) = advanced_argument_conversion {
            loaded.advanced_argument_conversion = advanced;
        }
        Ok(loaded)
    }

    /// Options passed to every submitted job.
    pub fn default_options(&self) -> OptionMap {
        let mut options = parse_sbatch_defaults(&self.sbatch_defaults);
        for (key, value) in [
            ("cluster", &self.cluster_name),
            ("partition", &self.partition),
            ("account", &self.account),
        ] {
            if let Some(value) = value {
                options.insert(key.to_string(), Some(value.clone()));
            }
        }
        options
    }
}
