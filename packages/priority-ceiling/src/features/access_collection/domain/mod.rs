pub mod models;
pub mod resources;

pub use models::*;
pub use resources::*;
