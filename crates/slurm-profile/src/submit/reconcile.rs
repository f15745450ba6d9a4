use crate::resources::{parse_time, time_to_minutes};
use crate::slurm::sinfo::{ClusterInspector, PartitionProfile};
use crate::submit::options::OptionMap;
use crate::submit::request::ResourceRequest;

fn requested_minutes(time: &str) -> Option<u64> {
    time_to_minutes(time).or_else(|| {
        parse_time(time)
            .ok()
            .flatten()
            .and_then(|normalized| time_to_minutes(&normalized))
    })
}

/// Adjusts `request` so that it fits into the given partition.
///
/// - memory is capped at the memory of the (constraint matching) nodes, CPUs are added when
///   the memory would not be available with the requested CPU count
/// - jobs spanning several nodes get at least one CPU per node, their memory is kept
/// - CPUs are capped at the CPUs of a node
/// - time is capped at the time limit of the partition
///
/// Reconciling an already reconciled request does not change it.
pub fn reconcile(
    request: &ResourceRequest,
    profile: &PartitionProfile,
) -> crate::Result<ResourceRequest> {
    let mut adjusted = request.clone();
    adjusted.partition = Some(
        request
            .partition
            .clone()
            .unwrap_or_else(|| profile.name.clone()),
    );

    // Fails for a constraint that no node of the partition satisfies
    let node_memory = profile.available_memory(request.constraint.as_deref())?;
    let partition_cpus = u128::from(profile.cpus);
    let mut cpus = u128::from(request.cpus_per_task.unwrap_or(1).max(1));

    match request.nodes {
        Some(nodes) if nodes > 1 => {
            cpus = cpus.max(u128::from(nodes));
        }
        _ => {
            if let Some(mem) = request.mem {
                let mem = mem.min(node_memory);
                // Memory per CPU is node_memory / min_cpus, compare without dividing
                let needed = u128::from(mem) * u128::from(profile.min_cpus.max(1));
                if needed > cpus * u128::from(node_memory) {
                    cpus = needed.div_ceil(u128::from(node_memory));
                }
                adjusted.mem = Some(mem);
            }
        }
    }
    adjusted.cpus_per_task = Some(cpus.min(partition_cpus) as u32);

    if let Some(time) = &request.time {
        match requested_minutes(time) {
            Some(minutes) => {
                let minutes = match profile.time_limit {
                    Some(limit) if minutes == 0 || minutes > limit => limit,
                    _ => minutes,
                };
                adjusted.time = Some(minutes.to_string());
            }
            None => log::warn!("Cannot interpret time `{time}`, keeping it as it is"),
        }
    }

    Ok(adjusted)
}

/// Fits the resources of `options` into the requested (or the default) partition.
pub fn adjust_for_cluster(
    options: &OptionMap,
    inspector: &impl ClusterInspector,
) -> crate::Result<OptionMap> {
    let request = ResourceRequest::from_options(options)?;
    let partition = match &request.partition {
        Some(partition) => partition.clone(),
        None => {
            let partition = inspector.default_partition()?;
            log::debug!("Using default partition {partition}");
            partition
        }
    };
    let profile = inspector.partition_profile(&partition)?;

    let mut adjusted = reconcile(&request, &profile)?;
    adjusted.partition = Some(partition);
    if adjusted != request {
        log::info!("Resources adjusted to partition {}: {adjusted:?}", profile.name);
    }

    let mut options = options.clone();
    adjusted.merge_into(&mut options);
    Ok(options)
}
