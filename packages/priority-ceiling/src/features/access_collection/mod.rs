/// Access Collection Feature
///
/// Walks every function body once and records:
/// - one [`AccessSite`] per reference to a declared resource, attributed to
///   every context that reaches the owning function
/// - one [`CriticalRegion`] per lexical critical block with its direct
///   resource set and opaque calls
/// - every direct call site with its innermost enclosing region, used later
///   for nesting through helpers and inherited protection levels
///
/// Transitive resource footprints decide whether a call inside a region is
/// proven free of resource access.
pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;
