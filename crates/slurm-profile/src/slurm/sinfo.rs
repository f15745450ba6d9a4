use std::time::Duration;

use itertools::Itertools;

use crate::Set;
use crate::common::error::ProfileError;
use crate::common::parser::{NomResult, consume_all, p_u32, p_u64};
use crate::resources::time::parse_slurm_duration;
use crate::slurm::command::{CommandRunner, format_command};

/// `sinfo` columns describing the capacity of a partition, in this order.
pub const CAPACITY_FORMAT: &str = "partition,cpus,memory,time,size,maxcpuspernode";
/// `sinfo` columns describing the node groups of a partition, in this order.
pub const NODE_GROUP_FORMAT: &str = "memory,features_act";

const NO_FEATURES: &str = "(null)";

/// Homogeneous set of nodes within a partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeGroup {
    /// Memory of a single node in MB.
    pub memory: u64,
    pub features: Set<String>,
}

impl NodeGroup {
    pub fn new<S: Into<String>>(memory: u64, features: impl IntoIterator<Item = S>) -> Self {
        Self {
            memory,
            features: features.into_iter().map(|f| f.into()).collect(),
        }
    }

    /// The constraint matches when intersecting it with the features of the group yields the
    /// constraint itself.
    fn matches(&self, constraint: &Set<&str>) -> bool {
        let intersection: Set<&str> = constraint
            .iter()
            .filter(|feature| self.features.contains(**feature))
            .copied()
            .collect();
        intersection == *constraint
    }
}

/// Snapshot of the capacity of a single partition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionProfile {
    pub name: String,
    /// CPUs of the largest node.
    pub cpus: u32,
    /// CPUs of the smallest node, memory per CPU is derived from it.
    pub min_cpus: u32,
    /// Memory of a single node in MB.
    pub memory: u64,
    /// Time limit in minutes, `None` if the partition has no limit.
    pub time_limit: Option<u64>,
    pub nodes: u32,
    /// `None` if the partition does not limit CPUs per node.
    pub max_cpus_per_node: Option<u32>,
    pub node_groups: Vec<NodeGroup>,
}

impl PartitionProfile {
    /// Returns the memory (MB) that a job can count on in this partition.
    ///
    /// Without a constraint the job may land on any node, so the smallest node group is used.
    /// With a comma-separated constraint only the node groups whose features match it are
    /// considered.
    pub fn available_memory(&self, constraint: Option<&str>) -> crate::Result<u64> {
        let constraint = constraint.map(str::trim).filter(|c| !c.is_empty());
        let memory = match constraint {
            None => self.node_groups.iter().map(|group| group.memory).min(),
            Some(constraint) => {
                let constraint_set: Set<&str> = constraint.split(',').map(str::trim).collect();
                self.node_groups
                    .iter()
                    .filter(|group| group.matches(&constraint_set))
                    .map(|group| group.memory)
                    .min()
            }
        };
        memory.ok_or_else(|| ProfileError::NoMatchingNodeGroup {
            partition: self.name.clone(),
            constraint: constraint.unwrap_or_default().to_string(),
        })
    }
}

/// Provides information about the partitions of a cluster.
pub trait ClusterInspector {
    /// Partition marked as the default one by the cluster administrator.
    fn default_partition(&self) -> crate::Result<String>;

    /// Queries the current capacity of `partition`.
    fn partition_profile(&self, partition: &str) -> crate::Result<PartitionProfile>;
}

/// Inspects partitions with `sinfo`.
pub struct SinfoInspector<R> {
    runner: R,
}

impl<R: CommandRunner> SinfoInspector<R> {
    pub fn new(runner: R) -> Self {
        Self { runner }
    }

    fn sinfo(&self, args: &[&str]) -> crate::Result<(String, String)> {
        let output = self.runner.run("sinfo", args)?;
        Ok((format_command("sinfo", args), output))
    }
}

impl<R: CommandRunner> ClusterInspector for SinfoInspector<R> {
    fn default_partition(&self) -> crate::Result<String> {
        let (command, output) = self.sinfo(&["-h", "-O", "partition"])?;
        parse_default_partition(&output).ok_or_else(|| ProfileError::MalformedOutput {
            command,
            reason: "no partition is marked as default".to_string(),
            output,
        })
    }

    fn partition_profile(&self, partition: &str) -> crate::Result<PartitionProfile> {
        let query = || -> crate::Result<PartitionProfile> {
            let (command, output) =
                self.sinfo(&["-e", "-h", "-O", CAPACITY_FORMAT, "-p", partition])?;
            let capacity = parse_capacity(&output).map_err(|reason| {
                ProfileError::MalformedOutput {
                    command,
                    reason,
                    output: output.clone(),
                }
            })?;

            let (command, output) =
                self.sinfo(&["-e", "-h", "-O", NODE_GROUP_FORMAT, "-p", partition])?;
            let node_groups = parse_node_groups(&output).map_err(|reason| {
                ProfileError::MalformedOutput {
                    command,
                    reason,
                    output: output.clone(),
                }
            })?;

            Ok(PartitionProfile {
                name: capacity.name,
                cpus: capacity.cpus,
                min_cpus: capacity.min_cpus,
                memory: capacity.memory,
                time_limit: capacity.time_limit,
                nodes: capacity.nodes,
                max_cpus_per_node: capacity.max_cpus_per_node,
                node_groups,
            })
        };
        let profile = query().map_err(|error| ProfileError::inspection(partition, error))?;
        log::debug!("Partition {partition}: {profile:?}");
        Ok(profile)
    }
}

/// Finds the partition with a trailing `*` in the output of `sinfo -O partition`.
pub fn parse_default_partition(output: &str) -> Option<String> {
    output
        .split_whitespace()
        .find_map(|token| token.strip_suffix('*'))
        .filter(|partition| !partition.is_empty())
        .map(|partition| partition.to_string())
}

#[derive(Debug, PartialEq, Eq)]
struct CapacityRow {
    name: String,
    cpus: u32,
    min_cpus: u32,
    memory: u64,
    time_limit: Option<u64>,
    nodes: u32,
    max_cpus_per_node: Option<u32>,
}

fn parse_number<T>(
    field: &str,
    value: &str,
    parser: impl FnMut(&str) -> NomResult<T>,
) -> Result<T, String> {
    consume_all(parser, value).map_err(|_| format!("invalid {field} `{value}`"))
}

fn parse_unlimited_u32(field: &str, value: &str) -> Result<Option<u32>, String> {
    if value.eq_ignore_ascii_case("unlimited") {
        Ok(None)
    } else {
        parse_number(field, value, p_u32).map(Some)
    }
}

fn parse_capacity_row(line: &str) -> Result<CapacityRow, String> {
    let fields: Vec<&str> = line.split_whitespace().collect();
    let &[name, cpus, memory, time, size, max_cpus] = fields.as_slice() else {
        return Err(format!(
            "expected 6 columns ({CAPACITY_FORMAT}), found {}",
            fields.len()
        ));
    };

    let cpus = parse_number("cpu count", cpus, p_u32)?;
    let memory = parse_number("memory", memory, p_u64)?;
    if cpus == 0 || memory == 0 {
        return Err("partition reports no CPUs or no memory".to_string());
    }
    let time_limit = parse_slurm_duration(time)
        .map_err(|_| format!("invalid time limit `{time}`"))?
        .map(|duration: Duration| duration.as_secs().div_ceil(60));

    Ok(CapacityRow {
        name: name.trim_end_matches('*').to_string(),
        cpus,
        min_cpus: cpus,
        memory,
        time_limit,
        nodes: parse_number("node count", size, p_u32)?,
        max_cpus_per_node: parse_unlimited_u32("max CPUs per node", max_cpus)?,
    })
}

/// Parses the capacity of a partition. A partition with differently sized nodes is reported on
/// several rows, which are folded into a single profile.
fn parse_capacity(output: &str) -> Result<CapacityRow, String> {
    let rows: Vec<CapacityRow> = output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(parse_capacity_row)
        .collect::<Result<_, _>>()?;

    rows.into_iter()
        .reduce(|acc, row| CapacityRow {
            name: acc.name,
            cpus: acc.cpus.max(row.cpus),
            min_cpus: acc.min_cpus.min(row.min_cpus),
            memory: acc.memory.max(row.memory),
            time_limit: match (acc.time_limit, row.time_limit) {
                (Some(a), Some(b)) => Some(a.min(b)),
                (a, b) => a.or(b),
            },
            nodes: acc.nodes + row.nodes,
            max_cpus_per_node: acc
                .max_cpus_per_node
                .zip(row.max_cpus_per_node)
                .map(|(a, b)| a.max(b)),
        })
        .ok_or_else(|| "no partition found".to_string())
}

fn parse_node_groups(output: &str) -> Result<Vec<NodeGroup>, String> {
    let groups: Vec<NodeGroup> = output
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let fields: Vec<&str> = line.split_whitespace().collect();
            let &[memory, features] = fields.as_slice() else {
                return Err(format!(
                    "expected 2 columns ({NODE_GROUP_FORMAT}), found {}",
                    fields.len()
                ));
            };
            let memory = parse_number("memory", memory, p_u64)?;
            let features = if features == NO_FEATURES {
                vec![]
            } else {
                features.split(',').filter(|f| !f.is_empty()).collect_vec()
            };
            Ok(NodeGroup::new(memory, features))
        })
        .collect::<Result<_, _>>()?;

    if groups.is_empty() {
        return Err("no node groups found".to_string());
    }
    Ok(groups)
}
