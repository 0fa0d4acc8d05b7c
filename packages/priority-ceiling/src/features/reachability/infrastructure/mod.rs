pub mod reachability_builder;

pub use reachability_builder::*;
