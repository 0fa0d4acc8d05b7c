/// Context registration errors
use crate::shared::models::Span;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ContextError {
    #[error("Execution context '{name}' is already registered (first declared at {first})")]
    DuplicateContext { name: String, first: Span },

    #[error("Unknown execution context: {0}")]
    UnknownContext(String),
}

pub type Result<T> = std::result::Result<T, ContextError>;
