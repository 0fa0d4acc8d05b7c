//! CeilingCalculator - single pass over the collected accesses
//!
//! Pure: same collection and context table in, same table out. There is no
//! incremental update; any program edit means a full re-analysis.

use crate::features::access_collection::{AccessCollection, CriticalRegion, ResourceTable};
use crate::features::ceiling::domain::*;
use crate::features::context_model::{ContextId, ContextTable, Priority};
use crate::shared::models::{Diagnostic, DiagnosticKind, Diagnostics, SourceLocation};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

pub struct CeilingCalculator<'a> {
    contexts: &'a ContextTable,
    file_path: String,
}

impl<'a> CeilingCalculator<'a> {
    pub fn new(contexts: &'a ContextTable, file_path: impl Into<String>) -> Self {
        Self {
            contexts,
            file_path: file_path.into(),
        }
    }

    pub fn compute(
        &self,
        resources: &ResourceTable,
        collection: &AccessCollection,
    ) -> (CeilingTable, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut table = CeilingTable::default();

        let mut accessors: BTreeMap<&str, BTreeSet<ContextId>> = resources
            .iter()
            .map(|r| (r.name.as_str(), BTreeSet::new()))
            .collect();
        for site in &collection.sites {
            if let Some(set) = accessors.get_mut(site.resource.as_str()) {
                set.extend(site.contexts.iter().copied());
            }
        }

        for (name, contexts) in accessors {
            let priorities: BTreeSet<Priority> =
                contexts.iter().map(|c| self.contexts.get_priority(*c)).collect();
            let ceiling = priorities.iter().next_back().copied().unwrap_or(Priority::ZERO);
            let lock_free = priorities.len() <= 1;
            debug!(
                "resource {}: ceiling {} ({} contexts{})",
                name,
                ceiling,
                contexts.len(),
                if lock_free { ", lock-free" } else { "" }
            );
            table.resources.insert(
                name.to_string(),
                ResourceCeiling {
                    resource: name.to_string(),
                    ceiling,
                    lock_free,
                    contexts,
                },
            );
        }

        let highest = self.contexts.highest_interrupt_priority();
        for region in &collection.regions {
            let resource_ceiling = region
                .direct_resources
                .iter()
                .chain(region.footprint_resources.iter())
                .map(|r| table.ceiling_of(r))
                .max()
                .unwrap_or(Priority::ZERO);

            let floor = region
                .enclosing_context
                .map(|c| self.contexts.get_priority(c))
                .unwrap_or(Priority::ZERO);

            let mut ceiling = resource_ceiling;
            if region.contains_opaque_call {
                ceiling = ceiling.max(highest);
                diagnostics.push(self.opaque_warning(region, highest));
            }
            let ceiling = ceiling.max(floor);

            table.regions.insert(
                region.id,
                RegionCeiling {
                    region: region.id,
                    resource_ceiling,
                    forced_by_opaque: region.contains_opaque_call,
                    floor,
                    ceiling,
                },
            );
        }

        info!(
            "computed ceilings for {} resources and {} regions",
            table.resources.len(),
            table.regions.len()
        );
        (table, diagnostics)
    }

    fn opaque_warning(&self, region: &CriticalRegion, highest: Priority) -> Diagnostic {
        let calls: Vec<&str> = region.opaque_calls.iter().map(|c| c.callee.as_str()).collect();
        let location = region
            .opaque_calls
            .first()
            .map(|c| c.span)
            .unwrap_or(region.span);
        Diagnostic::new(
            DiagnosticKind::OpaqueCallConservativeCeilingWarning,
            format!(
                "critical region {} calls {} whose resource accesses are unknown; \
                 ceiling raised to the highest interrupt priority {}",
                region.label(),
                calls.join(", "),
                highest
            ),
            SourceLocation::new(&self.file_path, location),
        )
        .with_suggestion(
            "inline the call into the region, or analyse it separately \
             (opaque_calls: transitive_footprint, or list it in trusted_functions)",
        )
    }
}

/// Write computed ceilings back into the regions
pub fn assign_region_ceilings(collection: &mut AccessCollection, table: &CeilingTable) {
    for region in &mut collection.regions {
        region.computed_ceiling = table.region(region.id).map(|r| r.ceiling);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::access_collection::{
        AccessOperation, AccessSite, OpaqueCall, RegionId,
    };
    use crate::features::context_model::ContextDecl;
    use crate::shared::models::{ResourceDecl, Span};

    fn contexts() -> ContextTable {
        ContextTable::from_declarations(
            vec![
                ContextDecl::main(),
                ContextDecl::interrupt("SPI_RX", 2),
                ContextDecl::interrupt("TIM_RX", 2),
                ContextDecl::interrupt("CAN_RX", 5),
            ],
            "main.cnx",
        )
        .0
    }

    fn site(resource: &str, contexts: &[usize]) -> AccessSite {
        AccessSite {
            resource: resource.to_string(),
            owning_function: "f".to_string(),
            operation: AccessOperation::Write,
            atomic_form: false,
            enclosing_region: None,
            contexts: contexts.iter().map(|c| ContextId(*c)).collect(),
            span: Span::zero(),
        }
    }

    fn resources() -> ResourceTable {
        ResourceTable::from_declarations(
            &[
                ResourceDecl::region_scoped("shared"),
                ResourceDecl::region_scoped("log"),
                ResourceDecl::atomic("unused"),
            ],
            "main.cnx",
        )
        .0
    }

    #[test]
    fn test_resource_ceiling_is_max_priority() {
        let table = contexts();
        let collection = AccessCollection {
            sites: vec![site("shared", &[0, 1]), site("shared", &[3]), site("log", &[1, 2])],
            ..Default::default()
        };
        let (ceilings, diags) = CeilingCalculator::new(&table, "main.cnx").compute(&resources(), &collection);

        assert!(diags.is_empty());
        let shared = ceilings.resource("shared").unwrap();
        assert_eq!(shared.ceiling, Priority(5));
        assert!(!shared.lock_free);

        let log = ceilings.resource("log").unwrap();
        assert_eq!(log.ceiling, Priority(2));
        assert!(log.lock_free);

        let unused = ceilings.resource("unused").unwrap();
        assert_eq!(unused.ceiling, Priority::ZERO);
        assert!(unused.contexts.is_empty());
    }

    #[test]
    fn test_region_ceiling_floor_and_opaque() {
        let table = contexts();
        let mut plain = CriticalRegion::new(RegionId(0), "SPI_RX", Span::line(4));
        plain.enclosing_context = Some(ContextId(1));
        plain.direct_resources.insert("log".to_string());

        let mut floored = CriticalRegion::new(RegionId(1), "CAN_RX", Span::line(9));
        floored.enclosing_context = Some(ContextId(3));
        floored.direct_resources.insert("log".to_string());

        let mut opaque = CriticalRegion::new(RegionId(2), "main", Span::line(12));
        opaque.enclosing_context = Some(ContextId(0));
        opaque.contains_opaque_call = true;
        opaque.opaque_calls.push(OpaqueCall {
            callee: "hal_flush".to_string(),
            indirect: false,
            span: Span::line(13),
        });

        let mut collection = AccessCollection {
            sites: vec![site("log", &[1, 2, 3])],
            regions: vec![plain, floored, opaque],
            ..Default::default()
        };
        let (ceilings, diags) = CeilingCalculator::new(&table, "main.cnx").compute(&resources(), &collection);

        assert_eq!(ceilings.region_ceiling(RegionId(0)), Priority(5));
        let floored = ceilings.region(RegionId(1)).unwrap();
        assert_eq!(floored.ceiling, Priority(5));
        assert!(floored.is_redundant());

        let opaque = ceilings.region(RegionId(2)).unwrap();
        assert!(opaque.forced_by_opaque);
        assert_eq!(opaque.ceiling, Priority(5));
        assert_eq!(diags.count_of(DiagnosticKind::OpaqueCallConservativeCeilingWarning), 1);
        assert_eq!(diags.iter().next().unwrap().location.span.start_line, 13);

        assign_region_ceilings(&mut collection, &ceilings);
        assert_eq!(collection.regions[2].computed_ceiling, Some(Priority(5)));
    }
}
