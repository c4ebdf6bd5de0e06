mod device;
mod node;
mod schedule;
mod status;

pub use device::*;
pub use node::*;
pub use schedule::*;
pub use status::*;

/// Device slots available on one node
pub const MAX_DEVICES: usize = 10;

/// Schedule entries held by each device
pub const DEVICE_SCHEDULE_CNT: usize = 10;

/// Minutes in one day; valid `time_of_day` values are below this
pub const MINUTES_PER_DAY: u16 = 1440;
