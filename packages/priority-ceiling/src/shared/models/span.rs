//! Source location types
//!
//! Spans are carried on every declaration and statement handed over by the
//! front-end so diagnostics can point back at the source.

use serde::{Deserialize, Serialize};

/// Span in source code (1-based lines, 0-based columns)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub struct Span {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
}

impl Span {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        Self {
            start_line,
            start_col,
            end_line,
            end_col,
        }
    }

    /// Single-line span starting at column 0
    pub fn line(line: u32) -> Self {
        Self::new(line, 0, line, 0)
    }

    /// Create a zero span (0:0-0:0)
    pub fn zero() -> Self {
        Self::new(0, 0, 0, 0)
    }

}

impl std::fmt::Display for Span {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// A span anchored to a file
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SourceLocation {
    pub file_path: String,
    pub span: Span,
}

impl SourceLocation {
    pub fn new(file_path: impl Into<String>, span: Span) -> Self {
        Self {
            file_path: file_path.into(),
            span,
        }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.file_path, self.span)
    }
}
