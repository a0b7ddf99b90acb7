use std::path::PathBuf;

use crate::registry::types::NodeId;

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("Node not found: {0}")]
    LookupMiss(NodeId),
    #[error("Log file {path:?}: {source}")]
    Resource {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl RegistryError {
    pub fn resource(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Resource { path: path.into(), source }
    }

    /// Losing a log file ends the run; a miss only means a spurious notification.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Resource { .. })
    }
}
