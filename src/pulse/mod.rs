pub mod events;
pub mod error;
pub mod pactl;
pub mod monitor;

pub use events::{ChangeEvent, ChangeKind, Enumerated, Facility, Notification, SinkInfo, SinkInputInfo, SinkState};
pub use error::MonitorError;
pub use monitor::{Pactl, PactlMonitor, QueryRunner};
