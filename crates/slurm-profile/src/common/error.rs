use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProfileError {
    #[error(transparent)]
    IoError(#[from] std::io::Error),
    #[error("Invalid time unit `{unit}` in `{input}`, expected one of w, d, h, m, s")]
    InvalidTimeUnit { input: String, unit: String },
    #[error("Unsupported memory unit `{unit}` in `{input}`, expected one of K, M, G, T")]
    InvalidMemoryUnit { input: String, unit: String },
    #[error("Cannot start `{command}`")]
    CommandStart {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{command}` failed\nExit code: {code}\nStderr: {stderr}\nStdout: {stdout}")]
    CommandFailed {
        command: String,
        code: i32,
        stderr: String,
        stdout: String,
    },
    #[error("Unexpected output of `{command}`: {reason}\n{output}")]
    MalformedOutput {
        command: String,
        reason: String,
        output: String,
    },
    #[error("Cannot inspect partition `{partition}`")]
    Inspection {
        partition: String,
        #[source]
        source: Box<ProfileError>,
    },
    #[error("Constraint `{constraint}` does not match any node group of partition `{partition}`")]
    NoMatchingNodeGroup {
        partition: String,
        constraint: String,
    },
    #[error("Invalid value `{value}` of option `{key}`: {reason}")]
    InvalidOption {
        key: String,
        value: String,
        reason: String,
    },
    #[error("Cannot read job properties from {}: {reason}", path.display())]
    JobProperties { path: PathBuf, reason: String },
    #[error("Failed to format cluster config entry `{key}` for job `{job}`: {reason}")]
    Format {
        job: String,
        key: String,
        reason: String,
    },
    #[error("Invalid cluster config {}: {reason}", path.display())]
    ClusterConfig { path: PathBuf, reason: String },
    #[error("Deserialization error: {0}")]
    DeserializationError(String),
    #[error("Error: {0}")]
    GenericError(String),
}

impl ProfileError {
    pub fn inspection(partition: &str, error: ProfileError) -> Self {
        Self::Inspection {
            partition: partition.to_string(),
            source: Box::new(error),
        }
    }
}
