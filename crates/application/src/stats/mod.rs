mod reporter;
mod scheduler;

pub use reporter::StatsReporter;
pub(crate) use scheduler::{StatsHandle, StatsScheduler};
