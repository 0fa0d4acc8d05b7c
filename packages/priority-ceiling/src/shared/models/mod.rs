//! Shared models

mod diagnostic;
mod program;
mod span;

pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics, Severity};
pub use program::{
    AccessWidth, CallEdge, Callee, FunctionDecl, Program, ResourceClass, ResourceDecl, Statement,
};
pub use span::{SourceLocation, Span};
