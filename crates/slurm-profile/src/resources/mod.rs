pub mod memory;
pub mod time;

pub use memory::convert_to_mb;
pub use time::{parse_time, time_to_minutes};
