pub mod types;
pub mod error;
pub mod log_sink;
pub mod registry;

pub use types::{NodeId, NodeKind, Node, OutputContext, Record, REMOVED_VOLUME};
pub use error::RegistryError;
pub use log_sink::LogSink;
pub use registry::Registry;
