/// Emission Strategy Feature
///
/// Turns computed ceilings plus the target capability descriptor into
/// enter/exit synchronization fragments for the statement emitter.
///
/// ## Strategy order
/// 1. `LockFreeRetry` - pure read-modify-write on an operand the exclusive
///    load/store primitive supports
/// 2. `SelectiveMask` - save the threshold, raise to the ceiling only if it
///    is higher, restore exactly the saved value
/// 3. `GlobalDisable` - save the interrupt-enable state, disable all,
///    restore the saved state
/// 4. `None` - lock-free resource, redundant region, or already protected
pub mod domain;
pub mod infrastructure;

pub use domain::*;
pub use infrastructure::*;
