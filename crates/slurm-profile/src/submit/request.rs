use nom::character::complete::char;
use nom::combinator::opt;
use nom::sequence::{pair, preceded};

use crate::common::error::ProfileError;
use crate::common::parser::{NomResult, consume_all, p_u32};
use crate::resources::convert_to_mb;
use crate::submit::options::{OptionMap, get_option, set_option};

pub const PARTITION: &str = "partition";
pub const CONSTRAINT: &str = "constraint";
pub const CPUS_PER_TASK: &str = "cpus-per-task";
pub const NODES: &str = "nodes";
pub const MEM: &str = "mem";
pub const TIME: &str = "time";

/// Resources requested by a job, extracted from its sbatch options.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceRequest {
    pub partition: Option<String>,
    pub constraint: Option<String>,
    pub cpus_per_task: Option<u32>,
    pub nodes: Option<u32>,
    /// Memory in MB.
    pub mem: Option<u64>,
    /// Time as written in the options.
    pub time: Option<String>,
}

fn value<'a>(options: &'a OptionMap, key: &str) -> Option<&'a str> {
    get_option(options, key)
        .and_then(|value| value.as_deref())
        .map(str::trim)
        .filter(|value| !value.is_empty())
}

fn invalid(key: &str, value: &str, reason: &str) -> ProfileError {
    ProfileError::InvalidOption {
        key: key.to_string(),
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

/// `<min>[-<max>]`
fn p_node_count(input: &str) -> NomResult<(u32, Option<u32>)> {
    pair(p_u32, opt(preceded(char('-'), p_u32)))(input)
}

impl ResourceRequest {
    pub fn from_options(options: &OptionMap) -> crate::Result<Self> {
        let cpus_per_task = value(options, CPUS_PER_TASK)
            .map(|cpus| {
                consume_all(p_u32, cpus)
                    .map_err(|_| invalid(CPUS_PER_TASK, cpus, "expected a number of CPUs"))
            })
            .transpose()?;
        // A node range asks for at least its lower bound
        let nodes = value(options, NODES)
            .map(|nodes| {
                consume_all(p_node_count, nodes)
                    .map(|(min, _)| min)
                    .map_err(|_| invalid(NODES, nodes, "expected <min>[-<max>]"))
            })
            .transpose()?;
        let mem = value(options, MEM).map(convert_to_mb).transpose()?;

        Ok(Self {
            partition: value(options, PARTITION).map(|p| p.to_string()),
            constraint: value(options, CONSTRAINT).map(|c| c.to_string()),
            cpus_per_task,
            nodes,
            mem,
            time: value(options, TIME).map(|t| t.to_string()),
        })
    }

    /// Writes the reconciled resources into `options`. Only partition, CPUs, memory and time
    /// are ever adjusted, the remaining options are kept as they are.
    pub fn merge_into(&self, options: &mut OptionMap) {
        if let Some(partition) = &self.partition {
            set_option(options, PARTITION, partition.clone());
        }
        if let Some(cpus) = self.cpus_per_task {
            set_option(options, CPUS_PER_TASK, cpus.to_string());
        }
        if let Some(mem) = self.mem {
            set_option(options, MEM, mem.to_string());
        }
        if let Some(time) = &self.time {
            set_option(options, TIME, time.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ResourceRequest;
    use crate::common::error::ProfileError;
    use crate::tests::utils::options;

    #[test]
    fn test_request_from_options() {
        let request = ResourceRequest::from_options(&options(&[
            ("partition", Some("normal")),
            ("constraint", Some("mem500MB")),
            ("cpus_per_task", Some("4")),
            ("nodes", Some("2-4")),
            ("mem", Some("2G")),
            ("time", Some("1-00:00:00")),
            ("account", Some("proj")),
        ]))
        .unwrap();
        assert_eq!(
            request,
            ResourceRequest {
                partition: Some("normal".to_string()),
                constraint: Some("mem500MB".to_string()),
                cpus_per_task: Some(4),
                nodes: Some(2),
                mem: Some(2000),
                time: Some("1-00:00:00".to_string()),
            }
        );
    }

    #[test]
    fn test_request_empty_values() {
        let request =
            ResourceRequest::from_options(&options(&[("mem", None), ("partition", Some(""))]))
                .unwrap();
        assert_eq!(request, ResourceRequest::default());
    }

    #[test]
    fn test_request_invalid_values() {
        assert!(matches!(
            ResourceRequest::from_options(&options(&[("cpus-per-task", Some("many"))])),
            Err(ProfileError::InvalidOption { .. })
        ));
        assert!(matches!(
            ResourceRequest::from_options(&options(&[("nodes", Some("2-"))])),
            Err(ProfileError::InvalidOption { .. })
        ));
        assert!(matches!(
            ResourceRequest::from_options(&options(&[("mem", Some("1000E"))])),
            Err(ProfileError::InvalidMemoryUnit { .. })
        ));
    }

    #[test]
    fn test_merge_into_keeps_other_options() {
        let mut opts = options(&[
            ("cpus_per_task", Some("8")),
            ("mem", Some("2G")),
            ("job-name", Some("foo")),
            ("nodes", Some("1")),
        ]);
        ResourceRequest {
            partition: Some("normal".to_string()),
            constraint: Some("ssd".to_string()),
            cpus_per_task: Some(2),
            nodes: Some(1),
            mem: Some(500),
            time: None,
        }
        .merge_into(&mut opts);
        assert_eq!(
            opts,
            options(&[
                ("cpus-per-task", Some("2")),
                ("job-name", Some("foo")),
                ("mem", Some("500")),
                ("nodes", Some("1")),
                ("partition", Some("normal")),
            ])
        );
    }
}
