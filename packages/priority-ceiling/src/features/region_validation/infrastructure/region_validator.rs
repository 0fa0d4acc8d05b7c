//! RegionValidator - structural checks and advisory warnings
//!
//! Errors: early exits, unprotected mutations.
//! Warnings: redundant regions, nested regions.

use crate::features::access_collection::{AccessCollection, CriticalRegion, ResourceTable};
use crate::features::ceiling::CeilingTable;
use crate::features::context_model::ContextTable;
use crate::features::region_validation::domain::InheritedLevels;
use crate::features::region_validation::infrastructure::{
    assign_nesting_parents, compute_inherited_levels, EarlyExitChecker, ProtectionChecker,
};
use crate::shared::models::{Diagnostic, DiagnosticKind, Diagnostics, Program, SourceLocation};
use std::collections::BTreeSet;
use tracing::info;

/// Validation output
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    pub inherited: InheritedLevels,
    pub diagnostics: Diagnostics,
}

pub struct RegionValidator<'a> {
    contexts: &'a ContextTable,
    resources: &'a ResourceTable,
    file_path: String,
}

impl<'a> RegionValidator<'a> {
    pub fn new(contexts: &'a ContextTable, resources: &'a ResourceTable, file_path: impl Into<String>) -> Self {
        Self {
            contexts,
            resources,
            file_path: file_path.into(),
        }
    }

    /// Validate every region; fills `nesting_parent` in `collection`
    pub fn validate(
        &self,
        program: &Program,
        collection: &mut AccessCollection,
        ceilings: &CeilingTable,
    ) -> ValidationReport {
        let mut diagnostics = EarlyExitChecker::new(&self.file_path).check_program(program);

        let nested = assign_nesting_parents(collection);

        for region in &collection.regions {
            if let Some(diag) = self.redundant_warning(region, ceilings) {
                diagnostics.push(diag);
            }
            if let Some(parent) = region.nesting_parent {
                diagnostics.push(Diagnostic::new(
                    DiagnosticKind::NestedRegionWarning,
                    format!(
                        "critical region {} runs inside critical region {}; it raises the mask \
                         only if its ceiling exceeds the level already held",
                        region.label(),
                        parent
                    ),
                    SourceLocation::new(&self.file_path, region.span),
                ));
            }
        }

        let roots: BTreeSet<String> = self
            .contexts
            .iter()
            .map(|c| c.entry.clone())
            .chain(
                program
                    .functions
                    .iter()
                    .filter(|f| f.address_taken)
                    .map(|f| f.name.clone()),
            )
            .collect();
        let inherited = compute_inherited_levels(collection, ceilings, &roots);

        let protection = ProtectionChecker::new(
            collection,
            ceilings,
            self.resources,
            self.contexts,
            &inherited,
            &self.file_path,
        )
        .check();
        diagnostics.extend(protection);

        info!(
            "validated {} regions ({} nested): {} errors, {} warnings",
            collection.regions.len(),
            nested,
            diagnostics.errors().count(),
            diagnostics.warnings().count()
        );

        ValidationReport {
            inherited,
            diagnostics,
        }
    }

    fn redundant_warning(&self, region: &CriticalRegion, ceilings: &CeilingTable) -> Option<Diagnostic> {
        let context = self.contexts.get(region.enclosing_context?);
        let ceiling = ceilings.region(region.id)?;
        if !ceiling.is_redundant() {
            return None;
        }
        Some(
            Diagnostic::new(
                DiagnosticKind::RedundantRegionWarning,
                format!(
                    "critical region {} adds no protection: its ceiling {} does not exceed \
                     the priority {} of context '{}'",
                    region.label(),
                    ceiling.ceiling,
                    context.priority,
                    context.name
                ),
                SourceLocation::new(&self.file_path, region.span),
            )
            .with_suggestion("remove the critical block"),
        )
    }
}
