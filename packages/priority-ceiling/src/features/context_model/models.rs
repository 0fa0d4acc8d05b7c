/// Execution context models
use crate::shared::models::Span;
use serde::{Deserialize, Serialize};

/// Default entry function of the main-line context
pub const MAIN_ENTRY: &str = "main";

/// Preemption priority; higher values preempt lower ones
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Priority(pub u32);

impl Priority {
    pub const ZERO: Priority = Priority(0);

    pub fn value(&self) -> u32 {
        self.0
    }
}

impl From<u32> for Priority {
    fn from(value: u32) -> Self {
        Priority(value)
    }
}

impl std::fmt::Display for Priority {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Index of a context in registration order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ContextId(pub usize);

/// Context kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContextKind {
    Main,
    Interrupt,
}

/// Context declaration as produced by the declaration-processing stage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContextDecl {
    pub name: String,
    pub kind: ContextKind,
    #[serde(default)]
    pub priority: Option<u32>,
    /// Entry function; defaults to `main` or to the context name for handlers
    #[serde(default)]
    pub entry: Option<String>,
    #[serde(default)]
    pub span: Span,
}

impl ContextDecl {
    pub fn main() -> Self {
        Self {
            name: MAIN_ENTRY.to_string(),
            kind: ContextKind::Main,
            priority: None,
            entry: None,
            span: Span::zero(),
        }
    }

    pub fn interrupt(name: impl Into<String>, priority: u32) -> Self {
        Self {
            name: name.into(),
            kind: ContextKind::Interrupt,
            priority: Some(priority),
            entry: None,
            span: Span::zero(),
        }
    }

    pub fn with_entry(mut self, entry: impl Into<String>) -> Self {
        self.entry = Some(entry.into());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = span;
        self
    }
}

/// A registered execution context
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    pub id: ContextId,
    pub name: String,
    pub kind: ContextKind,
    pub priority: Priority,
    pub entry: String,
    pub span: Span,
}

impl ExecutionContext {
    pub fn is_interrupt(&self) -> bool {
        self.kind == ContextKind::Interrupt
    }
}
