/// Debug Guard Feature
///
/// Optional pass for instrumented builds. Each non-`none` region enter
/// fragment gets a runtime check that the code is not running in a context
/// above the region's ceiling, which would mean an indirect call reached it
/// from a context the static analysis did not assume.
pub mod guard_injector;

pub use guard_injector::*;
