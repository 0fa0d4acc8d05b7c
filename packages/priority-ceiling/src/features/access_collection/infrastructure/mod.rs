pub mod access_collector;
pub mod footprint;

pub use access_collector::*;
pub use footprint::*;
