use std::cell::RefCell;

use crate::Map;
use crate::common::error::ProfileError;
use crate::slurm::command::{CommandRunner, format_command};
use crate::slurm::sinfo::{NodeGroup, PartitionProfile};
use crate::submit::options::OptionMap;

type Response = Result<String, (i32, String)>;

/// Command runner that answers with prepared outputs and records every command it was asked
/// to run.
#[derive(Default)]
pub struct FakeRunner {
    responses: Map<String, Response>,
    calls: RefCell<Vec<String>>,
}

impl FakeRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(mut self, command: &str, stdout: &str) -> Self {
        self.responses
            .insert(command.to_string(), Ok(stdout.to_string()));
        self
    }

    pub fn fail(mut self, command: &str, code: i32, stderr: &str) -> Self {
        self.responses
            .insert(command.to_string(), Err((code, stderr.to_string())));
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl CommandRunner for FakeRunner {
    fn run(&self, program: &str, args: &[&str]) -> crate::Result<String> {
        let command = format_command(program, args);
        self.calls.borrow_mut().push(command.clone());
        match self.responses.get(&command) {
            Some(Ok(stdout)) => Ok(stdout.clone()),
            Some(Err((code, stderr))) => Err(ProfileError::CommandFailed {
                command,
                code: *code,
                stderr: stderr.clone(),
                stdout: String::new(),
            }),
            None => panic!("Unexpected command `{command}`"),
        }
    }
}

/// Creates a one-day partition called `normal` with the given node groups.
/// Features of a node group are separated by commas.
pub fn partition_profile(cpus: u32, groups: &[(u64, &str)]) -> PartitionProfile {
    let node_groups: Vec<NodeGroup> = groups
        .iter()
        .map(|(memory, features)| {
            NodeGroup::new(*memory, features.split(',').filter(|f| !f.is_empty()))
        })
        .collect();
    PartitionProfile {
        name: "normal".to_string(),
        cpus,
        min_cpus: cpus,
        memory: node_groups.iter().map(|g| g.memory).max().unwrap_or(0),
        time_limit: Some(24 * 60),
        nodes: node_groups.len() as u32,
        max_cpus_per_node: None,
        node_groups,
    }
}

pub fn options(items: &[(&str, Option<&str>)]) -> OptionMap {
    items
        .iter()
        .map(|(key, value)| (key.to_string(), value.map(|v| v.to_string())))
        .collect()
}
