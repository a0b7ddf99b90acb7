pub mod bootstrap;
pub mod error;
pub mod projector;

pub use bootstrap::{Bootstrap, StartupQuery};
pub use error::ProjectorError;
pub use projector::{sanitize_name, EventProjector};
