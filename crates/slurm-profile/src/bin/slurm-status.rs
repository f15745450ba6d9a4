use clap::Parser;

use slurm_profile::common::setup::setup_logging;
use slurm_profile::slurm::SystemRunner;
use slurm_profile::slurm::status::get_job_status;

/// Prints the status of a Slurm job: `running`, `success` or `failed`.
#[derive(Parser)]
#[command(version, about)]
struct StatusOpts {
    /// Slurm job id
    job_id: String,

    /// Enables more detailed log output
    #[arg(long, env = "SLURM_PROFILE_DEBUG")]
    debug: bool,
}

fn main() {
    let opts = StatusOpts::parse();
    setup_logging(opts.debug);

    match get_job_status(&SystemRunner, &opts.job_id) {
        Ok(status) => println!("{status}"),
        Err(error) => {
            log::error!("{:?}", anyhow::Error::new(error));
            std::process::exit(1);
        }
    }
}
