/// Region Validation Feature
///
/// Structural checks on critical regions, run after ceilings are known:
/// - single exit point: no `return`/`break`/`continue` leaves a region early
/// - nesting: lexical parent, or the region around a call path into the
///   region's function (through unprotected intermediate functions)
/// - protection: every mutation of shared state runs at a masking level at
///   least the resource's ceiling, or uses an atomic single-variable form
/// - advisory redundant/nested region warnings
pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;
