//! ReachabilityBuilder - worklist fixed point over the call graph arena
//!
//! ## Algorithm
//! 1. `sets[n] = {}` for every node
//! 2. Seed entry functions (and, under `AssumeAllContexts`, address-taken
//!    functions) and push them on the worklist
//! 3. Pop `n`; for every callee `s`, `sets[s] |= sets[n]`; re-queue `s` if it grew
//!
//! ## Performance
//! - Each node re-enters the worklist at most `|contexts|` times
//! - Time: O(C × (N + E)), no recursion

use crate::config::IndirectCallPolicy;
use crate::features::context_model::{ContextId, ContextTable};
use crate::features::reachability::domain::{CallGraph, Reachability};
use crate::shared::models::{Diagnostic, DiagnosticKind, Diagnostics, SourceLocation};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::{debug, info};

/// Reachability builder
pub struct ReachabilityBuilder<'a> {
    graph: &'a CallGraph,
    contexts: &'a ContextTable,
    policy: IndirectCallPolicy,
}

impl<'a> ReachabilityBuilder<'a> {
    pub fn new(graph: &'a CallGraph, contexts: &'a ContextTable, policy: IndirectCallPolicy) -> Self {
        Self {
            graph,
            contexts,
            policy,
        }
    }

    /// Compute the reachable-context set of every function
    ///
    /// Unresolvable calls are reported (not fail-fast) under `Reject`.
    pub fn compute(&self, file_path: &str) -> (Reachability, Diagnostics) {
        let mut diagnostics = Diagnostics::new();
        let mut graph = self.graph.clone();

        let mut seeds: Vec<(String, ContextId)> = self
            .contexts
            .iter()
            .map(|c| (c.entry.clone(), c.id))
            .collect();

        match self.policy {
            IndirectCallPolicy::Reject => {
                for site in graph.indirect_sites() {
                    diagnostics.push(
                        Diagnostic::new(
                            DiagnosticKind::UnresolvableCallError,
                            format!(
                                "call through '{}' in '{}' cannot be resolved statically; \
                                 the contexts reaching its target are unknown",
                                site.expression, site.caller
                            ),
                            SourceLocation::new(file_path, site.span),
                        )
                        .with_suggestion(
                            "call the target function directly, or configure \
                             indirect_calls: assume_all_contexts",
                        ),
                    );
                }
            }
            IndirectCallPolicy::AssumeAllContexts => {
                for function in graph.address_taken().iter() {
                    for id in self.contexts.ids() {
                        seeds.push((function.clone(), id));
                    }
                }
            }
        }

        // Entries may be declared without a body in this program
        for (function, _) in &seeds {
            graph.add_function(function);
        }

        let mut sets: Vec<BTreeSet<ContextId>> = vec![BTreeSet::new(); graph.node_count()];
        let mut queued = vec![false; graph.node_count()];
        let mut worklist = VecDeque::new();

        for (function, id) in seeds {
            if let Some(idx) = graph.node(&function) {
                sets[idx.index()].insert(id);
                if !queued[idx.index()] {
                    queued[idx.index()] = true;
                    worklist.push_back(idx);
                }
            }
        }

        let mut iterations = 0;
        while let Some(idx) = worklist.pop_front() {
            iterations += 1;
            queued[idx.index()] = false;
            let current = sets[idx.index()].clone();

            for succ in graph.successors(idx) {
                let target = &mut sets[succ.index()];
                let before = target.len();
                target.extend(current.iter().copied());
                if target.len() > before && !queued[succ.index()] {
                    queued[succ.index()] = true;
                    worklist.push_back(succ);
                }
            }
        }

        let by_function: BTreeMap<String, BTreeSet<ContextId>> = graph
            .node_indices()
            .map(|idx| (graph.name(idx).to_string(), std::mem::take(&mut sets[idx.index()])))
            .collect();

        let reachable = by_function.values().filter(|s| !s.is_empty()).count();
        info!(
            "reachability converged after {} iterations ({} of {} functions reachable)",
            iterations,
            reachable,
            by_function.len()
        );
        for (function, set) in &by_function {
            debug!("  {} <- {:?}", function, set);
        }

        (Reachability::new(by_function, iterations), diagnostics)
    }
}

/// Convenience wrapper
pub fn compute_reachability(
    graph: &CallGraph,
    contexts: &ContextTable,
    policy: IndirectCallPolicy,
    file_path: &str,
) -> (Reachability, Diagnostics) {
    ReachabilityBuilder::new(graph, contexts, policy).compute(file_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::context_model::ContextDecl;
    use crate::shared::models::{CallEdge, FunctionDecl, Program, Statement};

    fn contexts() -> ContextTable {
        ContextTable::from_declarations(
            vec![
                ContextDecl::main(),
                ContextDecl::interrupt("UART_RX", 2),
                ContextDecl::interrupt("CAN_RX", 4),
            ],
            "main.cnx",
        )
        .0
    }

    #[test]
    fn test_entries_seed_themselves() {
        let graph = CallGraph::from_edges(&[CallEdge::new("main", "init")]);
        let table = contexts();
        let (reach, diags) = compute_reachability(&graph, &table, IndirectCallPolicy::Reject, "m");

        assert!(diags.is_empty());
        assert_eq!(reach.contexts_of("main").collect::<Vec<_>>(), vec![ContextId(0)]);
        assert_eq!(reach.contexts_of("init").collect::<Vec<_>>(), vec![ContextId(0)]);
        assert_eq!(reach.contexts_of("UART_RX").collect::<Vec<_>>(), vec![ContextId(1)]);
    }

    #[test]
    fn test_shared_helper_reached_by_all() {
        let graph = CallGraph::from_edges(&[
            CallEdge::new("main", "push"),
            CallEdge::new("UART_RX", "push"),
            CallEdge::new("CAN_RX", "log"),
            CallEdge::new("log", "push"),
        ]);
        let table = contexts();
        let (reach, _) = compute_reachability(&graph, &table, IndirectCallPolicy::Reject, "m");

        let push: Vec<ContextId> = reach.contexts_of("push").collect();
        assert_eq!(push, vec![ContextId(0), ContextId(1), ContextId(2)]);
        assert!(!reach.reaches("log", ContextId(0)));
    }

    #[test]
    fn test_mutual_recursion_terminates() {
        let graph = CallGraph::from_edges(&[
            CallEdge::new("main", "even"),
            CallEdge::new("even", "odd"),
            CallEdge::new("odd", "even"),
            CallEdge::new("odd", "odd"),
            CallEdge::new("CAN_RX", "odd"),
        ]);
        let table = contexts();
        let (reach, _) = compute_reachability(&graph, &table, IndirectCallPolicy::Reject, "m");

        assert!(reach.reaches("even", ContextId(2)));
        assert!(reach.reaches("odd", ContextId(0)));
        assert!(reach.iterations() < 20);
    }

    #[test]
    fn test_unreachable_function() {
        let graph = CallGraph::from_edges(&[CallEdge::new("dead", "deader")]);
        let table = contexts();
        let (reach, _) = compute_reachability(&graph, &table, IndirectCallPolicy::Reject, "m");
        assert!(!reach.is_reachable("dead"));
        assert_eq!(reach.contexts_of("deader").count(), 0);
        assert_eq!(reach.contexts_of("not_in_graph").count(), 0);
    }

    fn indirect_program() -> Program {
        Program::new("main.cnx")
            .with_function(
                FunctionDecl::new("main").with_body(vec![Statement::call_indirect("callbacks[0]")]),
            )
            .with_function(FunctionDecl::new("on_event").with_address_taken())
            .with_call_edge(CallEdge::new("on_event", "record"))
    }

    #[test]
    fn test_indirect_call_rejected() {
        let graph = CallGraph::from_program(&indirect_program());
        let table = contexts();
        let (reach, diags) = compute_reachability(&graph, &table, IndirectCallPolicy::Reject, "main.cnx");

        assert_eq!(diags.count_of(DiagnosticKind::UnresolvableCallError), 1);
        assert!(!reach.is_reachable("on_event"));
    }

    #[test]
    fn test_indirect_call_assume_all_contexts() {
        let graph = CallGraph::from_program(&indirect_program());
        let table = contexts();
        let (reach, diags) =
            compute_reachability(&graph, &table, IndirectCallPolicy::AssumeAllContexts, "main.cnx");

        assert!(diags.is_empty());
        assert_eq!(reach.contexts_of("on_event").count(), 3);
        assert_eq!(reach.contexts_of("record").count(), 3);
    }

    #[test]
    fn test_deterministic() {
        let graph = CallGraph::from_edges(&[
            CallEdge::new("main", "a"),
            CallEdge::new("UART_RX", "b"),
            CallEdge::new("b", "a"),
        ]);
        let table = contexts();
        let first = compute_reachability(&graph, &table, IndirectCallPolicy::Reject, "m").0;
        let second = compute_reachability(&graph, &table, IndirectCallPolicy::Reject, "m").0;
        assert_eq!(first, second);
    }
}
