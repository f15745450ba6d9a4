use std::fmt::{Display, Formatter};

use crate::Map;
use crate::common::error::ProfileError;
use crate::slurm::command::{CommandRunner, format_command};

/// Job state as reported to the workflow engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobStatus {
    Running,
    Success,
    Failed,
}

impl Display for JobStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            JobStatus::Running => f.write_str("running"),
            JobStatus::Success => f.write_str("success"),
            JobStatus::Failed => f.write_str("failed"),
        }
    }
}

/// Maps a Slurm job state (e.g. `RUNNING` or `CANCELLED by 1000`) to a [`JobStatus`].
pub fn job_status_from_state(state: &str) -> JobStatus {
    let state = state.split_whitespace().next().unwrap_or_default();
    match state.trim_end_matches('+') {
        "COMPLETED" => JobStatus::Success,
        "PENDING" | "CONFIGURING" | "COMPLETING" | "RUNNING" | "SUSPENDED" | "PREEMPTED"
        | "REQUEUED" | "REQUEUE_FED" | "REQUEUE_HOLD" | "RESIZING" | "SIGNALING"
        | "STAGE_OUT" => JobStatus::Running,
        _ => JobStatus::Failed,
    }
}

/// Finds the state of `job_id` in the output of `sacct -P -n -b -j <job-id>`.
///
/// Rows of job steps (`<job-id>.batch`, ...) are skipped.
pub fn parse_sacct_state<'a>(job_id: &str, output: &'a str) -> Option<&'a str> {
    output.lines().find_map(|line| {
        let mut fields = line.trim().split('|');
        let id = fields.next()?;
        let state = fields.next()?;
        (id == job_id).then_some(state)
    })
}

/// Parse <key>=<value> pairs from the output of `scontrol show job <job-id>`.
pub fn get_scontrol_items(output: &str) -> Map<&str, &str> {
    let mut map = Map::new();
    for line in output.lines() {
        for item in line.split_whitespace() {
            if let Some((key, value)) = item.split_once('=') {
                map.insert(key, value);
            }
        }
    }
    map
}

fn query_sacct(runner: &impl CommandRunner, job_id: &str) -> crate::Result<Option<JobStatus>> {
    let output = runner.run("sacct", &["-P", "-n", "-b", "-j", job_id])?;
    Ok(parse_sacct_state(job_id, &output).map(job_status_from_state))
}

fn query_scontrol(runner: &impl CommandRunner, job_id: &str) -> crate::Result<JobStatus> {
    let args = ["show", "job", job_id];
    let output = runner.run("scontrol", &args)?;
    let items = get_scontrol_items(&output);
    let state = items
        .get("JobState")
        .ok_or_else(|| ProfileError::MalformedOutput {
            command: format_command("scontrol", &args),
            reason: "missing JobState".to_string(),
            output: output.clone(),
        })?;
    Ok(job_status_from_state(state))
}

/// Asks Slurm about the state of a submitted job.
///
/// The accounting database is queried first. Jobs it does not know about (yet) are looked up
/// with `scontrol`.
pub fn get_job_status(runner: &impl CommandRunner, job_id: &str) -> crate::Result<JobStatus> {
    match query_sacct(runner, job_id) {
        Ok(Some(status)) => return Ok(status),
        Ok(None) => log::debug!("sacct does not know job {job_id}"),
        Err(error) => log::warn!("sacct failed for job {job_id}: {error}"),
    }
    query_scontrol(runner, job_id)
}
