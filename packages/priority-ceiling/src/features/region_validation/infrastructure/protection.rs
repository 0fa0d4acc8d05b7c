//! Protection verification
//!
//! Every mutation of a declared resource must run either inside a region
//! whose level reaches the resource's ceiling, or through an atomic
//! single-variable form. The level at a site, for a reaching context `c`:
//!
//! `max(priority(c), lexical level, inherited level of the owning function)`
//!
//! The lexical level is the max computed ceiling over the site's lexically
//! enclosing regions (nested raises are monotonic). The inherited level is a
//! greatest fixed point taken as a minimum over call sites.

use crate::features::access_collection::{AccessCollection, AccessSite, RegionId, ResourceTable};
use crate::features::ceiling::CeilingTable;
use crate::features::context_model::{ContextTable, Priority};
use crate::features::region_validation::domain::InheritedLevels;
use crate::shared::models::{
    Diagnostic, DiagnosticKind, Diagnostics, ResourceClass, SourceLocation,
};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

/// Level held by the lexical region chain starting at `region`
pub fn lexical_level(
    collection: &AccessCollection,
    ceilings: &CeilingTable,
    region: Option<RegionId>,
) -> Priority {
    region
        .map(|id| {
            collection
                .lexical_chain(id)
                .into_iter()
                .map(|r| ceilings.region_ceiling(r))
                .max()
                .unwrap_or(Priority::ZERO)
        })
        .unwrap_or(Priority::ZERO)
}

/// Minimum masking level on entry to each function
///
/// `roots` are entered with nothing masked (context entries, address-taken
/// functions).
pub fn compute_inherited_levels(
    collection: &AccessCollection,
    ceilings: &CeilingTable,
    roots: &BTreeSet<String>,
) -> InheritedLevels {
    let mut levels: BTreeMap<String, Priority> = BTreeMap::new();
    let mut worklist: VecDeque<String> = VecDeque::new();

    for root in roots {
        levels.insert(root.clone(), Priority::ZERO);
        worklist.push_back(root.clone());
    }

    while let Some(function) = worklist.pop_front() {
        let entry = levels.get(&function).copied().unwrap_or(Priority::ZERO);
        for call in collection.calls_from(&function) {
            let at_call = entry.max(lexical_level(collection, ceilings, call.enclosing_region));
            let lowered = match levels.get(&call.callee) {
                Some(current) => at_call < *current,
                None => true,
            };
            if lowered {
                levels.insert(call.callee.clone(), at_call);
                worklist.push_back(call.callee.clone());
            }
        }
    }

    for (function, level) in &levels {
        if *level > Priority::ZERO {
            debug!("{} always entered at mask level {}", function, level);
        }
    }
    InheritedLevels::new(levels)
}

pub struct ProtectionChecker<'a> {
    collection: &'a AccessCollection,
    ceilings: &'a CeilingTable,
    resources: &'a ResourceTable,
    contexts: &'a ContextTable,
    inherited: &'a InheritedLevels,
    file_path: String,
}

impl<'a> ProtectionChecker<'a> {
    pub fn new(
        collection: &'a AccessCollection,
        ceilings: &'a CeilingTable,
        resources: &'a ResourceTable,
        contexts: &'a ContextTable,
        inherited: &'a InheritedLevels,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            collection,
            ceilings,
            resources,
            contexts,
            inherited,
            file_path: file_path.into(),
        }
    }

    /// Site needs a level check at all
    fn needs_check(&self, site: &AccessSite) -> bool {
        if site.is_unprotected_multi_step() {
            // already an UnprotectedAtomicMultiStepError
            return false;
        }
        match self.resources.class_of(&site.resource) {
            Some(ResourceClass::RegionScoped) => site.operation.is_write(),
            Some(ResourceClass::Atomic) => site.is_multi_step(),
            None => false,
        }
    }

    fn held_level(&self, site: &AccessSite) -> Priority {
        lexical_level(self.collection, self.ceilings, site.enclosing_region)
            .max(self.inherited.level_of(&site.owning_function))
    }

    /// Effective level at the site for its worst reaching context
    pub fn site_level(&self, site: &AccessSite) -> Option<Priority> {
        let held = self.held_level(site);
        site.contexts
            .iter()
            .map(|c| self.contexts.get_priority(*c).max(held))
            .min()
    }

    pub fn check(&self) -> Diagnostics {
        let mut diagnostics = Diagnostics::new();

        for site in self.collection.sites.iter().filter(|s| self.needs_check(s)) {
            let ceiling = self.ceilings.ceiling_of(&site.resource);
            match self.site_level(site) {
                Some(level) if level < ceiling => {}
                _ => continue,
            }
            let held = self.held_level(site);

            let exposed = site
                .contexts
                .iter()
                .copied()
                .find(|c| self.contexts.get_priority(*c).max(held) < ceiling);

            if let Some(context) = exposed {
                let ctx = self.contexts.get(context);
                diagnostics.push(
                    Diagnostic::new(
                        DiagnosticKind::UnprotectedMutationError,
                        format!(
                            "'{}' is modified in '{}' at mask level {} when reached from '{}' \
                             (priority {}), but its ceiling is {}",
                            site.resource,
                            site.owning_function,
                            held.max(ctx.priority),
                            ctx.name,
                            ctx.priority,
                            ceiling
                        ),
                        SourceLocation::new(&self.file_path, site.span),
                    )
                    .with_suggestion(
                        "wrap the access in a critical block, or declare the variable atomic \
                         and use a single-step atomic operation",
                    ),
                );
            }
        }

        diagnostics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access_collection::{AccessOperation, CallSite, CriticalRegion};
    use crate::features::ceiling::RegionCeiling;
    use crate::features::context_model::{ContextDecl, ContextId};
    use crate::shared::models::{ResourceDecl, Span};

    fn region_ceiling(id: usize, ceiling: u32) -> (RegionId, RegionCeiling) {
        (
            RegionId(id),
            RegionCeiling {
                region: RegionId(id),
                resource_ceiling: Priority(ceiling),
                forced_by_opaque: false,
                floor: Priority::ZERO,
                ceiling: Priority(ceiling),
            },
        )
    }

    #[test]
    fn test_inherited_level_is_minimum_over_call_sites() {
        let collection = AccessCollection {
            regions: vec![
                CriticalRegion::new(RegionId(0), "main", Span::line(1)),
                CriticalRegion::new(RegionId(1), "main", Span::line(5)),
            ],
            call_sites: vec![
                CallSite {
                    caller: "main".to_string(),
                    callee: "push".to_string(),
                    enclosing_region: Some(RegionId(0)),
                    span: Span::line(2),
                },
                CallSite {
                    caller: "main".to_string(),
                    callee: "push".to_string(),
                    enclosing_region: Some(RegionId(1)),
                    span: Span::line(6),
                },
                CallSite {
                    caller: "push".to_string(),
                    callee: "store".to_string(),
                    enclosing_region: None,
                    span: Span::line(10),
                },
            ],
            ..Default::default()
        };
        let ceilings = CeilingTable {
            regions: [region_ceiling(0, 4), region_ceiling(1, 2)].into_iter().collect(),
            ..Default::default()
        };
        let roots: BTreeSet<String> = ["main".to_string()].into_iter().collect();
        let levels = compute_inherited_levels(&collection, &ceilings, &roots);

        assert_eq!(levels.level_of("main"), Priority::ZERO);
        assert_eq!(levels.level_of("push"), Priority(2));
        assert_eq!(levels.level_of("store"), Priority(2));
    }

    #[test]
    fn test_unprotected_region_scoped_write_rejected() {
        let (contexts, _) = ContextTable::from_declarations(
            vec![ContextDecl::main(), ContextDecl::interrupt("UART_RX", 3)],
            "main.cnx",
        );
        let (resources, _) = ResourceTable::from_declarations(
            &[ResourceDecl::region_scoped("buffer"), ResourceDecl::atomic("flag")],
            "main.cnx",
        );
        let both: BTreeSet<ContextId> = [ContextId(0), ContextId(1)].into_iter().collect();
        let site = |resource: &str, operation, region: Option<RegionId>| AccessSite {
            resource: resource.to_string(),
            owning_function: "shared".to_string(),
            operation,
            atomic_form: false,
            enclosing_region: region,
            contexts: both.clone(),
            span: Span::line(7),
        };

        let collection = AccessCollection {
            sites: vec![
                site("buffer", AccessOperation::Write, None),
                site("buffer", AccessOperation::Read, None),
                site("flag", AccessOperation::Write, None),
                site("buffer", AccessOperation::Write, Some(RegionId(0))),
            ],
            regions: vec![CriticalRegion::new(RegionId(0), "shared", Span::line(6))],
            ..Default::default()
        };
        let mut ceilings = CeilingTable {
            regions: [region_ceiling(0, 3)].into_iter().collect(),
            ..Default::default()
        };
        ceilings.resources.insert(
            "buffer".to_string(),
            crate::features::ceiling::ResourceCeiling {
                resource: "buffer".to_string(),
                ceiling: Priority(3),
                lock_free: false,
                contexts: both.clone(),
            },
        );
        let inherited = InheritedLevels::default();

        let checker = ProtectionChecker::new(&collection, &ceilings, &resources, &contexts, &inherited, "main.cnx");
        let diags = checker.check();

        assert_eq!(diags.count_of(DiagnosticKind::UnprotectedMutationError), 1);
        assert!(diags.iter().next().unwrap().message.contains("'main'"));
        assert_eq!(checker.site_level(&collection.sites[3]), Some(Priority(3)));
    }
}
