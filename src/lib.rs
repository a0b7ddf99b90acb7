pub mod registry;
pub mod projector;
pub mod pulse;
pub mod report;
pub mod config;

pub use registry::{Node, NodeId, NodeKind, OutputContext, Record, Registry, RegistryError, LogSink};
pub use projector::{Bootstrap, EventProjector, ProjectorError, StartupQuery};
pub use pulse::{Enumerated, Facility, MonitorError, Notification, PactlMonitor, SinkInfo, SinkInputInfo, SinkState};
pub use report::{Period, ReportError};
pub use config::{Config, LoggingConfig, PulseConfig};
