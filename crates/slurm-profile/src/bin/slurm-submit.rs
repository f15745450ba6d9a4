use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;

use slurm_profile::common::setup::setup_logging;
use slurm_profile::config::{ProfileSettings, SettingsOpts};
use slurm_profile::slurm::SystemRunner;
use slurm_profile::submit::submit_jobscript;

/// Submits a job script generated by the workflow engine to Slurm and prints the job id.
#[derive(Parser)]
#[command(version, about)]
struct SubmitOpts {
    /// Job script with a `# properties = {...}` line
    #[arg(value_hint = clap::ValueHint::FilePath)]
    jobscript: PathBuf,

    #[clap(flatten)]
    settings: SettingsOpts,

    /// Enables more detailed log output
    #[arg(long, env = "SLURM_PROFILE_DEBUG")]
    debug: bool,
}

fn command_submit(opts: SubmitOpts) -> anyhow::Result<()> {
    let settings = ProfileSettings::load(opts.settings).context("Cannot load settings")?;
    let job_id = submit_jobscript(&settings, &SystemRunner, &opts.jobscript)
        .with_context(|| format!("Cannot submit {}", opts.jobscript.display()))?;
    // The workflow engine reads the job id from stdout
    println!("{job_id}");
    Ok(())
}

fn main() {
    let opts = SubmitOpts::parse();
    setup_logging(opts.debug);

    if let Err(error) = command_submit(opts) {
        log::error!("{error:?}");
        std::process::exit(1);
    }
}
