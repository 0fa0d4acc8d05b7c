//! AccessCollector - single whole-program pass over function bodies
//!
//! ## Algorithm
//! 1. For each function (program order), look up its reaching contexts
//! 2. Walk the body keeping a stack of open critical regions
//! 3. Emit one site per declared-resource reference, one region per
//!    `critical` block, one call site per direct call
//! 4. Classify calls inside regions through the footprint table
//!
//! Region ids are assigned in pre-order, so a lexical parent always has a
//! smaller id than its children.

use crate::config::OpaqueCallPolicy;
use crate::features::access_collection::domain::*;
use crate::features::access_collection::infrastructure::footprint::{CallClass, FootprintTable};
use crate::features::context_model::{ContextId, ContextTable};
use crate::features::reachability::Reachability;
use crate::shared::models::{
    Callee, Diagnostic, DiagnosticKind, Diagnostics, Program, SourceLocation, Span, Statement,
};
use std::collections::BTreeSet;
use tracing::{debug, info};

pub struct AccessCollector<'a> {
    resources: &'a ResourceTable,
    footprints: &'a FootprintTable,
    reachability: &'a Reachability,
    contexts: &'a ContextTable,
    opaque_policy: OpaqueCallPolicy,
    file_path: String,
}

/// Mutable state of one function walk
struct Walk<'w> {
    function: &'w str,
    contexts: BTreeSet<ContextId>,
    open_regions: Vec<RegionId>,
}

impl<'a> AccessCollector<'a> {
    pub fn new(
        resources: &'a ResourceTable,
        footprints: &'a FootprintTable,
        reachability: &'a Reachability,
        contexts: &'a ContextTable,
        opaque_policy: OpaqueCallPolicy,
        file_path: impl Into<String>,
    ) -> Self {
        Self {
            resources,
            footprints,
            reachability,
            contexts,
            opaque_policy,
            file_path: file_path.into(),
        }
    }

    pub fn collect(&self, program: &Program) -> (AccessCollection, Diagnostics) {
        let mut collection = AccessCollection::default();
        let mut diagnostics = Diagnostics::new();

        for function in &program.functions {
            let mut walk = Walk {
                function: &function.name,
                contexts: self
                    .reachability
                    .contexts_of(&function.name)
                    .collect(),
                open_regions: Vec::new(),
            };
            self.walk_block(&function.body, &mut walk, &mut collection, &mut diagnostics);
        }

        // Front-end edges with no matching call statement have no known
        // position, so they count as calls outside any region
        for edge in &program.extra_call_edges {
            let known = collection
                .calls_from(&edge.caller)
                .any(|c| c.callee == edge.callee);
            if !known {
                collection.call_sites.push(CallSite {
                    caller: edge.caller.clone(),
                    callee: edge.callee.clone(),
                    enclosing_region: None,
                    span: program.function(&edge.caller).map(|f| f.span).unwrap_or_default(),
                });
            }
        }

        info!(
            "collected {} access sites, {} critical regions, {} call sites",
            collection.sites.len(),
            collection.regions.len(),
            collection.call_sites.len()
        );
        (collection, diagnostics)
    }

    fn walk_block(
        &self,
        block: &[Statement],
        walk: &mut Walk<'_>,
        out: &mut AccessCollection,
        diags: &mut Diagnostics,
    ) {
        for stmt in block {
            match stmt {
                Statement::Read { resource, span } => {
                    self.record(resource, AccessOperation::Read, false, *span, walk, out);
                }
                Statement::Write {
                    resource,
                    depends_on,
                    span,
                } => {
                    let mut seen = BTreeSet::new();
                    for dep in depends_on.iter().filter(|d| *d != resource) {
                        if seen.insert(dep.as_str()) {
                            self.record(dep, AccessOperation::Read, false, *span, walk, out);
                        }
                    }
                    let operation = if depends_on.contains(resource) {
                        AccessOperation::ReadModifyWrite
                    } else {
                        AccessOperation::Write
                    };
                    let recorded = self.record(resource, operation, false, *span, walk, out);
                    if recorded && operation == AccessOperation::ReadModifyWrite && walk.open_regions.is_empty() {
                        diags.push(self.multi_step_error(resource, walk.function, *span));
                    }
                }
                Statement::AtomicRmw { resource, span } => {
                    self.record(resource, AccessOperation::ReadModifyWrite, true, *span, walk, out);
                }
                Statement::Call { callee, span } => self.record_call(callee, *span, walk, out),
                Statement::Critical { body, span } => {
                    let id = RegionId(out.regions.len());
                    let mut region = CriticalRegion::new(id, walk.function, *span);
                    region.reaching_contexts = walk.contexts.clone();
                    region.enclosing_context = self.contexts.lowest_priority_of(&walk.contexts);
                    region.lexical_parent = walk.open_regions.last().copied();
                    debug!(
                        "region {} in {} (lexical parent {:?})",
                        id, walk.function, region.lexical_parent
                    );
                    out.regions.push(region);

                    walk.open_regions.push(id);
                    self.walk_block(body, walk, out, diags);
                    walk.open_regions.pop();
                }
                Statement::If {
                    then_branch,
                    else_branch,
                    ..
                } => {
                    self.walk_block(then_branch, walk, out, diags);
                    self.walk_block(else_branch, walk, out, diags);
                }
                Statement::Loop { body, .. } | Statement::Block { body, .. } => {
                    self.walk_block(body, walk, out, diags);
                }
                Statement::Return { .. }
                | Statement::Break { .. }
                | Statement::Continue { .. }
                | Statement::Other { .. } => {}
            }
        }
    }

    /// Record a site on a declared resource; undeclared names are locals
    fn record(
        &self,
        resource: &str,
        operation: AccessOperation,
        atomic_form: bool,
        span: Span,
        walk: &Walk<'_>,
        out: &mut AccessCollection,
    ) -> bool {
        if !self.resources.contains(resource) {
            return false;
        }
        let enclosing_region = walk.open_regions.last().copied();
        if let Some(region) = enclosing_region.and_then(|id| out.region_mut(id)) {
            region.direct_resources.insert(resource.to_string());
        }
        out.sites.push(AccessSite {
            resource: resource.to_string(),
            owning_function: walk.function.to_string(),
            operation,
            atomic_form,
            enclosing_region,
            contexts: walk.contexts.clone(),
            span,
        });
        true
    }

    fn record_call(&self, callee: &Callee, span: Span, walk: &Walk<'_>, out: &mut AccessCollection) {
        let enclosing_region = walk.open_regions.last().copied();

        let opaque = match callee {
            Callee::Direct(target) => {
                out.call_sites.push(CallSite {
                    caller: walk.function.to_string(),
                    callee: target.clone(),
                    enclosing_region,
                    span,
                });
                let Some(id) = enclosing_region else {
                    return;
                };
                match (self.footprints.classify(target), self.opaque_policy) {
                    (CallClass::Free, _) => None,
                    (CallClass::Analysable(resources), OpaqueCallPolicy::TransitiveFootprint) => {
                        if let Some(region) = out.region_mut(id) {
                            region.footprint_resources.extend(resources.iter().cloned());
                        }
                        None
                    }
                    (CallClass::Analysable(_), OpaqueCallPolicy::Conservative) | (CallClass::Opaque, _) => {
                        Some((id, target.clone(), false))
                    }
                }
            }
            Callee::Indirect(expression) => enclosing_region.map(|id| (id, expression.clone(), true)),
        };

        if let Some((id, callee, indirect)) = opaque {
            if let Some(region) = out.region_mut(id) {
                region.contains_opaque_call = true;
                region.opaque_calls.push(OpaqueCall {
                    callee,
                    indirect,
                    span,
                });
            }
        }
    }

    fn multi_step_error(&self, resource: &str, function: &str, span: Span) -> Diagnostic {
        Diagnostic::new(
            DiagnosticKind::UnprotectedAtomicMultiStepError,
            format!(
                "'{}' is read and written back in '{}' as two dependent steps outside a critical region",
                resource, function
            ),
            SourceLocation::new(&self.file_path, span),
        )
        .with_suggestion(format!(
            "use the atomic compound form ('{} +<- ...') or wrap the update in a critical block",
            resource
        ))
    }
}

/// Convenience wrapper
pub fn collect_accesses(
    program: &Program,
    resources: &ResourceTable,
    footprints: &FootprintTable,
    reachability: &Reachability,
    contexts: &ContextTable,
    opaque_policy: OpaqueCallPolicy,
) -> (AccessCollection, Diagnostics) {
    AccessCollector::new(
        resources,
        footprints,
        reachability,
        contexts,
        opaque_policy,
        program.file_path.clone(),
    )
    .collect(program)
}
