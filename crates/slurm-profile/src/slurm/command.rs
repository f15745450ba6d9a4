use bstr::ByteSlice;
use std::process::{Command, Output};

use crate::common::error::ProfileError;

/// Executes Slurm commands.
///
/// Every call blocks until the command finishes. A non-zero exit status is an error that keeps
/// the output of the command.
pub trait CommandRunner {
    /// Runs `program` with `args` and returns its standard output.
    fn run(&self, program: &str, args: &[&str]) -> crate::Result<String>;
}

impl<R: CommandRunner + ?Sized> CommandRunner for &R {
    fn run(&self, program: &str, args: &[&str]) -> crate::Result<String> {
        (**self).run(program, args)
    }
}

/// Runs commands as subprocesses of the current process.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemRunner;

impl CommandRunner for SystemRunner {
    fn run(&self, program: &str, args: &[&str]) -> crate::Result<String> {
        let command_line = format_command(program, args);
        log::debug!("Running command `{command_line}`");

        let output = create_command(program, args)
            .output()
            .map_err(|source| ProfileError::CommandStart {
                command: command_line.clone(),
                source,
            })?;
        let output = check_command_output(&command_line, output)?;
        let stdout = output.stdout.to_str_lossy().into_owned();
        log::debug!("`{program}` output: {}", stdout.trim());
        Ok(stdout)
    }
}

pub fn format_command(program: &str, args: &[&str]) -> String {
    let mut command = program.to_string();
    for arg in args {
        command.push(' ');
        command.push_str(arg);
    }
    command
}

fn create_command(program: &str, args: &[&str]) -> Command {
    let mut command = Command::new(program);
    command.args(args);
    command
}

pub fn check_command_output(command: &str, output: Output) -> crate::Result<Output> {
    let status = output.status;
    if !status.success() {
        return Err(ProfileError::CommandFailed {
            command: command.to_string(),
            code: status.code().unwrap_or(-1),
            stderr: output.stderr.to_str_lossy().trim().to_string(),
            stdout: output.stdout.to_str_lossy().trim().to_string(),
        });
    }
    Ok(output)
}

#[cfg(test)]
mod tests {
    use super::{CommandRunner, SystemRunner, format_command};
    use crate::common::error::ProfileError;

    #[test]
    fn test_format_command() {
        assert_eq!(
            format_command("sinfo", &["-h", "-O", "partition"]),
            "sinfo -h -O partition"
        );
        assert_eq!(format_command("sinfo", &[]), "sinfo");
    }

    #[test]
    fn test_run_captures_stdout() {
        let output = SystemRunner.run("sh", &["-c", "echo 42"]).unwrap();
        assert_eq!(output, "42\n");
    }

    #[test]
    fn test_run_failure_keeps_output() {
        match SystemRunner.run("sh", &["-c", "echo out; echo err >&2; exit 3"]) {
            Err(ProfileError::CommandFailed {
                code,
                stderr,
                stdout,
                ..
            }) => {
                assert_eq!(code, 3);
                assert_eq!(stderr, "err");
                assert_eq!(stdout, "out");
            }
            result => panic!("Unexpected result {result:?}"),
        }
    }

    #[test]
    fn test_run_missing_program() {
        assert!(matches!(
            SystemRunner.run("/nonexistent/sinfo", &[]),
            Err(ProfileError::CommandStart { .. })
        ));
    }
}
