//! Context registry
//!
//! Registration happens once, up front. [`ContextRegistry::freeze`] turns the
//! registry into a [`ContextTable`] that every later stage borrows; there is
//! no way to add contexts after that point.

use super::error::{ContextError, Result};
use super::models::*;
use crate::shared::models::{Diagnostic, DiagnosticKind, Diagnostics, SourceLocation, Span};
use rustc_hash::FxHashMap;

/// Mutable registration phase
#[derive(Debug, Default)]
pub struct ContextRegistry {
    contexts: Vec<ExecutionContext>,
    by_name: FxHashMap<String, ContextId>,
}

impl ContextRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a context; `priority` defaults to 0
    pub fn register_context(
        &mut self,
        name: impl Into<String>,
        kind: ContextKind,
        priority: Option<u32>,
    ) -> Result<ContextId> {
        let name = name.into();
        let decl = ContextDecl {
            entry: None,
            span: Span::zero(),
            priority,
            kind,
            name,
        };
        self.register(decl)
    }

    /// Register a full declaration
    pub fn register(&mut self, decl: ContextDecl) -> Result<ContextId> {
        if let Some(existing) = self.by_name.get(&decl.name) {
            return Err(ContextError::DuplicateContext {
                name: decl.name,
                first: self.contexts[existing.0].span,
            });
        }

        let id = ContextId(self.contexts.len());
        let entry = decl.entry.unwrap_or_else(|| match decl.kind {
            ContextKind::Main => MAIN_ENTRY.to_string(),
            ContextKind::Interrupt => decl.name.clone(),
        });
        let context = ExecutionContext {
            id,
            priority: Priority(decl.priority.unwrap_or(0)),
            name: decl.name,
            kind: decl.kind,
            entry,
            span: decl.span,
        };

        tracing::debug!(
            "registered context {} ({:?}, priority {}, entry {})",
            context.name,
            context.kind,
            context.priority,
            context.entry
        );
        self.by_name.insert(context.name.clone(), id);
        self.contexts.push(context);
        Ok(id)
    }

    pub fn freeze(self) -> ContextTable {
        ContextTable {
            contexts: self.contexts,
            by_name: self.by_name,
        }
    }
}

/// Immutable context table shared by every analysis stage
#[derive(Debug, Clone, Default)]
pub struct ContextTable {
    contexts: Vec<ExecutionContext>,
    by_name: FxHashMap<String, ContextId>,
}

impl ContextTable {
    /// Build from the declaration table, collecting every duplicate as a diagnostic
    pub fn from_declarations(
        decls: impl IntoIterator<Item = ContextDecl>,
        file_path: &str,
    ) -> (Self, Diagnostics) {
        let mut registry = ContextRegistry::new();
        let mut diagnostics = Diagnostics::new();

        for decl in decls {
            let span = decl.span;
            if let Err(err) = registry.register(decl) {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::DuplicateContextError,
                    err.to_string(),
                    SourceLocation::new(file_path, span),
                ));
            }
        }

        (registry.freeze(), diagnostics)
    }

    /// Pure priority lookup
    pub fn get_priority(&self, id: ContextId) -> Priority {
        self.contexts[id.0].priority
    }

    pub fn get(&self, id: ContextId) -> &ExecutionContext {
        &self.contexts[id.0]
    }

    pub fn lookup(&self, name: &str) -> Result<&ExecutionContext> {
        self.by_name
            .get(name)
            .map(|id| &self.contexts[id.0])
            .ok_or_else(|| ContextError::UnknownContext(name.to_string()))
    }

    pub fn iter(&self) -> impl Iterator<Item = &ExecutionContext> {
        self.contexts.iter()
    }

    pub fn ids(&self) -> impl Iterator<Item = ContextId> + '_ {
        self.contexts.iter().map(|c| c.id)
    }

    /// Highest priority of any registered interrupt context (0 if there are none)
    pub fn highest_interrupt_priority(&self) -> Priority {
        self.contexts
            .iter()
            .filter(|c| c.is_interrupt())
            .map(|c| c.priority)
            .max()
            .unwrap_or(Priority::ZERO)
    }

    /// Lowest-priority context of a set, ties broken by registration order
    pub fn lowest_priority_of<'a>(
        &self,
        ids: impl IntoIterator<Item = &'a ContextId>,
    ) -> Option<ContextId> {
        ids.into_iter()
            .copied()
            .min_by_key(|id| (self.get_priority(*id), *id))
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }
}
