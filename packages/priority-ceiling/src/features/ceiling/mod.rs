/// Ceiling Calculator Feature
///
/// Stack/Priority Ceiling Protocol:
/// - `ceiling(resource) = max priority of the contexts that access it`
/// - a resource whose accessing contexts all share one priority is lock-free
///   (run-to-completion among equal priorities on one core)
/// - `ceiling(region) = max ceiling of its direct resources`, forced to the
///   highest interrupt priority when the region contains an opaque call, and
///   never below the priority of the region's enclosing context
pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;
