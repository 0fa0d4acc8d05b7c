/// Call-Graph Reachability Feature
///
/// Computes, per function, the set of execution contexts that can statically
/// reach it.
///
/// ## Algorithm
/// 1. Build the call graph arena (petgraph) from `Call` statements plus the
///    front-end's extra edges
/// 2. Seed each context's entry function with that context
/// 3. Propagate along call edges with a worklist until no set grows
///
/// Sets only grow, so the fixed point terminates on recursive and mutually
/// recursive graphs without recursive traversal.
pub mod domain;
pub mod infrastructure;
pub mod ports;

pub use domain::*;
pub use infrastructure::*;
pub use ports::*;
