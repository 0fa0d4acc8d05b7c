/// Context Model Feature
///
/// Registry of execution contexts (the main line plus every interrupt
/// handler) and their priorities. Contexts are registered once, before any
/// other stage runs, and frozen into an immutable [`ContextTable`].
pub mod error;
pub mod models;
pub mod registry;

pub use error::*;
pub use models::*;
pub use registry::*;
