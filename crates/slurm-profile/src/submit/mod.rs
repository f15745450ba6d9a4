use std::path::Path;

use crate::config::ProfileSettings;
use crate::slurm::command::CommandRunner;
use crate::slurm::sinfo::SinfoInspector;
use crate::submit::clusterconfig::ClusterConfig;
use crate::submit::driver::submit_job;
use crate::submit::jobscript::{JobProperties, read_job_properties};
use crate::submit::options::{OptionLayer, OptionMap, ensure_log_dirs, merge_layers};
use crate::submit::placeholders::format_options;
use crate::submit::reconcile::adjust_for_cluster;

pub mod clusterconfig;
pub mod driver;
pub mod jobscript;
pub mod options;
pub mod placeholders;
pub mod reconcile;
pub mod request;

/// Assembles the sbatch options of a job.
///
/// Options are taken from (in ascending precedence) the sbatch defaults of the settings, the
/// `__default__` entry of the cluster config, the resources of the job, the cluster config
/// entry of its rule and the `cluster` mapping of the job. Placeholders are then filled in and
/// the directories of the log files are created.
pub fn build_options(
    settings: &ProfileSettings,
    cluster_config: &ClusterConfig,
    job: &JobProperties,
) -> crate::Result<OptionMap> {
    let rule_options = job
        .rule
        .as_deref()
        .map(|rule| cluster_config.rule_options(rule))
        .unwrap_or_default();
    let layers = [
        OptionLayer::new("sbatch default", settings.default_options()),
        OptionLayer::new("cluster config default", cluster_config.default_options()),
        OptionLayer::new("job resource", job.resource_options()?),
        OptionLayer::new("cluster config rule", rule_options),
        OptionLayer::new("job cluster", job.cluster_options()),
    ];
    let options = format_options(&merge_layers(layers), job)?;
    ensure_log_dirs(&options)?;
    Ok(options)
}

/// Submits a job script generated by the workflow engine and returns the Slurm job id.
pub fn submit_jobscript(
    settings: &ProfileSettings,
    runner: &impl CommandRunner,
    jobscript: &Path,
) -> crate::Result<String> {
    let job = read_job_properties(jobscript)?;
    log::debug!("Submitting job {} from {}", job.name(), jobscript.display());

    let cluster_config = match &settings.cluster_config {
        Some(path) => ClusterConfig::load(path)?,
        None => ClusterConfig::default(),
    };
    let mut options = build_options(settings, &cluster_config, &job)?;
    if settings.advanced_argument_conversion {
        options = adjust_for_cluster(&options, &SinfoInspector::new(runner))?;
    }
    submit_job(runner, Some(jobscript), &options)
}
