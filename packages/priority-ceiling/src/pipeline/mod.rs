//! Pipeline orchestration
//!
//! Runs every analysis stage in order over one immutable configuration:
//!
//! ```text
//! contexts ──► reachability ──► access collection ──► ceilings ──► validation ──► emission
//!                                                                   │
//!                                              structural errors ───┴──► VerificationFailure
//! ```

pub mod verifier;

pub use verifier::{ConcurrencyVerifier, VerificationFailure, VerifiedProgram};
