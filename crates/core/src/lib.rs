pub mod catalog;
pub mod config;
pub mod record;
pub mod workdays;

pub use catalog::ServerId;
pub use config::Config;
pub use record::{IssueRef, OccupancyRecord, OccupancyTable};
pub use workdays::business_days;
