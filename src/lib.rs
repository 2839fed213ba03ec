mod client;
mod clock;
mod config;
mod errors;
mod status;
mod store;
mod types;

pub use client::TimeMachineClient;
pub use clock::VirtualClock;
pub use config::Config;
pub use errors::Error;
pub use status::{
    ActivityStatus, activity_status, default_activity_window, notification_time,
    wait_for_notification,
};
pub use store::{OffsetStore, StoredOffset};
pub use types::{ServerTimeResponse, SetClockRequest};
