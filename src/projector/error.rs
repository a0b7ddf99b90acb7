use crate::registry::RegistryError;

#[derive(Debug, thiserror::Error)]
pub enum ProjectorError {
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error("Upstream query failed: {0}")]
    UpstreamQueryFailure(String),
    #[error("Startup incomplete: {completed} of {required} queries finished")]
    BootstrapIncomplete { completed: usize, required: usize },
}

impl ProjectorError {
    pub fn is_fatal(&self) -> bool {
        match self {
            Self::Registry(e) => e.is_fatal(),
            Self::UpstreamQueryFailure(_) => false,
            Self::BootstrapIncomplete { .. } => true,
        }
    }
}
