//! Common test utilities for priority-ceiling
//!
//! Builders for small multi-context programs and assertions over
//! verification results.

#![allow(dead_code)]

mod assertions;
mod builders;

pub use assertions::*;
pub use builders::*;
