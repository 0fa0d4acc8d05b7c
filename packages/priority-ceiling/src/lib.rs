/*
 * Priority Ceiling - interrupt-priority concurrency verifier
 *
 * Feature-First Hexagonal Architecture:
 * - shared/    : Front-end program model, spans, diagnostics
 * - features/  : Vertical slices (contexts → reachability → accesses → ceilings → validation → emission → debug guards)
 * - config/    : Target capabilities and analysis policies (YAML schema v1)
 * - pipeline/  : Orchestration
 *
 * Single core, single pass: every shared access gets the minimum masking
 * its ceiling requires, and nothing more.
 */

#![allow(clippy::new_without_default)] // Borrowing constructors take their inputs
#![allow(clippy::module_inception)] // Module naming intentional

pub mod config;
pub mod errors;
pub mod features;
pub mod pipeline;
pub mod shared;

pub use config::{AnalysisConfig, IndirectCallPolicy, OpaqueCallPolicy, TargetCapabilities, TargetPreset};
pub use errors::{CeilingError, Result};
pub use features::context_model::{ContextDecl, ContextId, ContextKind, Priority};
pub use features::emission::{SyncFragment, SyncStrategy};
pub use pipeline::{ConcurrencyVerifier, VerificationFailure, VerifiedProgram};
pub use shared::models::{
    Diagnostic, DiagnosticKind, Diagnostics, FunctionDecl, Program, ResourceDecl, Statement,
};
