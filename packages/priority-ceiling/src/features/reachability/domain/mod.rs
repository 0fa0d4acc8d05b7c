pub mod call_graph;
pub mod reachability;

pub use call_graph::*;
pub use reachability::*;
