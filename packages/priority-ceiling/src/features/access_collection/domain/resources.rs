//! Declared resource table
//!
//! Resources are declared once. Re-declaring a name is reported and the
//! first declaration wins, so analysis can continue and report everything
//! else in the same pass.

use crate::shared::models::{
    Diagnostic, DiagnosticKind, Diagnostics, ResourceClass, ResourceDecl, SourceLocation,
};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Default)]
pub struct ResourceTable {
    resources: BTreeMap<String, ResourceDecl>,
}

impl ResourceTable {
    pub fn from_declarations<'a>(
        decls: impl IntoIterator<Item = &'a ResourceDecl>,
        file_path: &str,
    ) -> (Self, Diagnostics) {
        let mut resources: BTreeMap<String, ResourceDecl> = BTreeMap::new();
        let mut diagnostics = Diagnostics::new();

        for decl in decls {
            if let Some(first) = resources.get(&decl.name) {
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::DuplicateResourceError,
                        format!(
                            "resource '{}' is already declared at line {}",
                            decl.name, first.span.start_line
                        ),
                        SourceLocation::new(file_path, decl.span),
                    )
                    .with_suggestion("rename one of the declarations"),
                );
                continue;
            }
            resources.insert(decl.name.clone(), decl.clone());
        }

        (Self { resources }, diagnostics)
    }

    pub fn get(&self, name: &str) -> Option<&ResourceDecl> {
        self.resources.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    pub fn class_of(&self, name: &str) -> Option<ResourceClass> {
        self.resources.get(name).map(|r| r.class)
    }

    /// Declarations in name order
    pub fn iter(&self) -> impl Iterator<Item = &ResourceDecl> {
        self.resources.values()
    }

    pub fn len(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
