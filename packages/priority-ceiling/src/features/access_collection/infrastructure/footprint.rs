/// Transitive resource footprints
///
/// Algorithm:
/// 1. Local pass: resources each defined function references directly, and
///    whether it calls through a pointer
/// 2. Callees come from the merged call graph, so front-end edges count the
///    same as `Call` statements; an undefined, untrusted callee is opaque
/// 3. Worklist fixed point: a function's footprint absorbs its callees';
///    when it grows, its callers are re-queued
///
/// Performance:
/// - Local: O(S) over all statements
/// - Propagation: O(R × (F + C)) where R = resources, F = functions, C = call edges
use crate::features::access_collection::domain::ResourceTable;
use crate::features::reachability::ports::CallGraphProvider;
use crate::shared::models::{Callee, Program, Statement};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

/// Resources a function may touch, directly or through calls
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Footprint {
    pub resources: BTreeSet<String>,
    /// An indirect or unanalysable call is reachable from this function
    pub opaque: bool,
}

impl Footprint {
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty() && !self.opaque
    }
}

/// How a call inside a critical region is treated
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallClass<'a> {
    /// Proven free of resource access
    Free,
    /// Defined, analysable, touches these resources
    Analysable(&'a BTreeSet<String>),
    Opaque,
}

#[derive(Debug, Clone, Default)]
pub struct FootprintTable {
    footprints: BTreeMap<String, Footprint>,
    trusted: BTreeSet<String>,
}

impl FootprintTable {
    pub fn compute(
        program: &Program,
        graph: &dyn CallGraphProvider,
        resources: &ResourceTable,
        trusted: &BTreeSet<String>,
    ) -> Self {
        let defined: BTreeSet<&str> = program.functions.iter().map(|f| f.name.as_str()).collect();

        let mut footprints: BTreeMap<String, Footprint> = BTreeMap::new();
        let mut callees: BTreeMap<&str, Vec<String>> = BTreeMap::new();

        for function in &program.functions {
            let mut local = Footprint::default();
            let mut pending: Vec<&[Statement]> = vec![function.body.as_slice()];

            while let Some(block) = pending.pop() {
                for stmt in block {
                    match stmt {
                        Statement::Read { resource, .. } | Statement::AtomicRmw { resource, .. } => {
                            if resources.contains(resource) {
                                local.resources.insert(resource.clone());
                            }
                        }
                        Statement::Write {
                            resource,
                            depends_on,
                            ..
                        } => {
                            for name in std::iter::once(resource).chain(depends_on.iter()) {
                                if resources.contains(name) {
                                    local.resources.insert(name.clone());
                                }
                            }
                        }
                        Statement::Call {
                            callee: Callee::Indirect(_),
                            ..
                        } => local.opaque = true,
                        _ => {}
                    }
                    pending.extend(stmt.child_blocks());
                }
            }

            let mut out = Vec::new();
            for callee in graph.get_callees(&function.name) {
                if trusted.contains(&callee) {
                    continue;
                }
                if defined.contains(callee.as_str()) {
                    out.push(callee);
                } else {
                    local.opaque = true;
                }
            }
            callees.insert(function.name.as_str(), out);
            footprints.insert(function.name.clone(), local);
        }

        let mut worklist: VecDeque<String> = defined.iter().map(|f| f.to_string()).collect();
        let mut queued: BTreeSet<String> = worklist.iter().cloned().collect();
        let mut iterations = 0usize;

        while let Some(function) = worklist.pop_front() {
            iterations += 1;
            queued.remove(&function);

            let mut merged = footprints.get(&function).cloned().unwrap_or_default();
            for callee in callees.get(function.as_str()).into_iter().flatten() {
                if let Some(fp) = footprints.get(callee) {
                    merged.resources.extend(fp.resources.iter().cloned());
                    merged.opaque |= fp.opaque;
                }
            }

            if footprints.get(&function) != Some(&merged) {
                footprints.insert(function.clone(), merged);
                for caller in graph.get_callers(&function) {
                    if defined.contains(caller.as_str()) && queued.insert(caller.clone()) {
                        worklist.push_back(caller);
                    }
                }
            }
        }

        debug!("footprints converged after {} iterations", iterations);

        Self {
            footprints,
            trusted: trusted.clone(),
        }
    }

    pub fn get(&self, function: &str) -> Option<&Footprint> {
        self.footprints.get(function)
    }

    /// Classify a direct call for region analysis
    pub fn classify(&self, callee: &str) -> CallClass<'_> {
        if self.trusted.contains(callee) {
            return CallClass::Free;
        }
        match self.footprints.get(callee) {
            Some(fp) if fp.is_empty() => CallClass::Free,
            Some(fp) if !fp.opaque => CallClass::Analysable(&fp.resources),
            _ => CallClass::Opaque,
        }
    }
}
