//! Static call graph on a petgraph arena
//!
//! Nodes are function names, edges are `caller -> callee`. Parallel edges are
//! collapsed. Calls that cannot be resolved statically are kept aside as
//! [`IndirectCallSite`]s.

use crate::features::reachability::ports::CallGraphProvider;
use crate::shared::models::{CallEdge, Callee, Program, Span, Statement};
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Call through a function pointer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndirectCallSite {
    pub caller: String,
    pub expression: String,
    pub span: Span,
}

/// Whole-program call graph
#[derive(Debug, Clone, Default)]
pub struct CallGraph {
    graph: DiGraph<String, ()>,
    index: FxHashMap<String, NodeIndex>,
    defined: FxHashSet<String>,
    address_taken: BTreeSet<String>,
    indirect_sites: Vec<IndirectCallSite>,
}

impl CallGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from the program's statement streams and extra edges
    pub fn from_program(program: &Program) -> Self {
        let mut cg = Self::new();

        for function in &program.functions {
            cg.add_function(&function.name);
            cg.defined.insert(function.name.clone());
            if function.address_taken {
                cg.address_taken.insert(function.name.clone());
            }
        }

        for function in &program.functions {
            let mut pending: Vec<&[Statement]> = vec![function.body.as_slice()];
            while let Some(block) = pending.pop() {
                for stmt in block {
                    if let Statement::Call { callee, span } = stmt {
                        match callee {
                            Callee::Direct(target) => cg.add_call(&function.name, target),
                            Callee::Indirect(expression) => {
                                cg.indirect_sites.push(IndirectCallSite {
                                    caller: function.name.clone(),
                                    expression: expression.clone(),
                                    span: *span,
                                })
                            }
                        }
                    }
                    pending.extend(stmt.child_blocks());
                }
            }
        }

        for edge in &program.extra_call_edges {
            cg.add_call(&edge.caller, &edge.callee);
        }

        cg
    }

    /// Build from a bare edge table (no bodies, nothing address-taken)
    pub fn from_edges<'a>(edges: impl IntoIterator<Item = &'a CallEdge>) -> Self {
        let mut cg = Self::new();
        for edge in edges {
            cg.add_call(&edge.caller, &edge.callee);
        }
        cg
    }

    /// Add function node (idempotent)
    pub fn add_function(&mut self, name: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(name) {
            return idx;
        }
        let idx = self.graph.add_node(name.to_string());
        self.index.insert(name.to_string(), idx);
        idx
    }

    /// Add a call edge; parallel edges are collapsed
    pub fn add_call(&mut self, caller: &str, callee: &str) {
        let from = self.add_function(caller);
        let to = self.add_function(callee);
        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }
    }

    pub fn node(&self, name: &str) -> Option<NodeIndex> {
        self.index.get(name).copied()
    }

    pub fn name(&self, idx: NodeIndex) -> &str {
        &self.graph[idx]
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Callee node indices, sorted for deterministic iteration
    pub fn successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Outgoing)
            .map(|e| e.target())
            .collect();
        out.sort_unstable();
        out
    }

    pub fn predecessors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut out: Vec<NodeIndex> = self
            .graph
            .edges_directed(idx, Direction::Incoming)
            .map(|e| e.source())
            .collect();
        out.sort_unstable();
        out
    }

    pub fn node_indices(&self) -> impl Iterator<Item = NodeIndex> {
        self.graph.node_indices()
    }

    /// Function has a body in this program
    pub fn is_defined(&self, name: &str) -> bool {
        self.defined.contains(name)
    }

    pub fn address_taken(&self) -> &BTreeSet<String> {
        &self.address_taken
    }

    pub fn indirect_sites(&self) -> &[IndirectCallSite] {
        &self.indirect_sites
    }

    /// Function contains at least one unresolved call
    pub fn has_indirect_call(&self, name: &str) -> bool {
        self.indirect_sites.iter().any(|s| s.caller == name)
    }
}

impl CallGraphProvider for CallGraph {
    fn get_callees(&self, func_name: &str) -> Vec<String> {
        self.node(func_name)
            .map(|idx| {
                self.successors(idx)
                    .into_iter()
                    .map(|s| self.graph[s].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn get_functions(&self) -> Vec<String> {
        self.graph.node_weights().cloned().collect()
    }

    fn get_callers(&self, func_name: &str) -> Vec<String> {
        self.node(func_name)
            .map(|idx| {
                self.predecessors(idx)
                    .into_iter()
                    .map(|p| self.graph[p].clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    fn contains_function(&self, func_name: &str) -> bool {
        self.index.contains_key(func_name)
    }

    fn num_functions(&self) -> usize {
        self.graph.node_count()
    }
}
