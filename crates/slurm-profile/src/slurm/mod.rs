pub mod command;
pub mod sinfo;
pub mod status;

pub use command::{CommandRunner, SystemRunner};
pub use sinfo::{ClusterInspector, PartitionProfile, SinfoInspector};
