use std::path::Path;

use nom::character::complete::{char, digit1};
use nom::combinator::{opt, rest};
use nom::sequence::{pair, preceded};

use crate::common::error::ProfileError;
use crate::common::parser::{NomResult, consume_all};
use crate::slurm::command::{CommandRunner, format_command};
use crate::submit::options::{OptionMap, format_sbatch_options, get_option};

/// `<job-id>[;<cluster>]`
fn p_parsable_output(input: &str) -> NomResult<(&str, Option<&str>)> {
    pair(digit1, opt(preceded(char(';'), rest)))(input)
}

/// Extracts the job id from the output of `sbatch --parsable`.
///
/// Output of `sbatch` without `--parsable` (`Submitted batch job <id>`) is accepted as well.
pub fn parse_job_id(output: &str) -> Option<String> {
    let output = output.trim();
    if let Ok((job_id, _cluster)) = consume_all(p_parsable_output, output) {
        return Some(job_id.to_string());
    }
    output
        .split(|c: char| !c.is_ascii_digit())
        .find(|part| !part.is_empty())
        .map(|job_id| job_id.to_string())
}

/// Submits `jobscript` with the given options and returns the id of the new job.
///
/// Without a job script, the command to run has to be passed in the `wrap` option.
pub fn submit_job(
    runner: &impl CommandRunner,
    jobscript: Option<&Path>,
    options: &OptionMap,
) -> crate::Result<String> {
    let mut args = vec!["--parsable".to_string()];
    args.extend(format_sbatch_options(options));
    match jobscript {
        Some(jobscript) => args.push(jobscript.to_string_lossy().into_owned()),
        None => {
            if !matches!(get_option(options, "wrap"), Some(Some(_))) {
                return Err(ProfileError::InvalidOption {
                    key: "wrap".to_string(),
                    value: String::new(),
                    reason: "a command has to be given when there is no job script".to_string(),
                });
            }
        }
    }

    let arg_refs: Vec<&str> = args.iter().map(|arg| arg.as_str()).collect();
    let output = runner.run("sbatch", &arg_refs)?;
    let job_id = parse_job_id(&output).ok_or_else(|| ProfileError::MalformedOutput {
        command: format_command("sbatch", &arg_refs),
        reason: "no job id found".to_string(),
        output: output.clone(),
    })?;
    log::debug!("Submitted job {job_id}");
    Ok(job_id)
}
