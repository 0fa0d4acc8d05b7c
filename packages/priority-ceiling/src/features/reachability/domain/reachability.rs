/// Reachability result model
use crate::features::context_model::ContextId;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Immutable map from function to the contexts that can reach it
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reachability {
    by_function: BTreeMap<String, BTreeSet<ContextId>>,
    /// Worklist pops until the fixed point was reached
    iterations: usize,
}

impl Reachability {
    pub(crate) fn new(by_function: BTreeMap<String, BTreeSet<ContextId>>, iterations: usize) -> Self {
        Self {
            by_function,
            iterations,
        }
    }

    /// Contexts reaching `function`; empty for unreachable or unknown functions
    pub fn contexts_of(&self, function: &str) -> impl Iterator<Item = ContextId> + '_ {
        self.by_function
            .get(function)
            .into_iter()
            .flat_map(|set| set.iter().copied())
    }

    pub fn context_set(&self, function: &str) -> Option<&BTreeSet<ContextId>> {
        self.by_function.get(function).filter(|s| !s.is_empty())
    }

    pub fn reaches(&self, function: &str, context: ContextId) -> bool {
        self.by_function
            .get(function)
            .map(|s| s.contains(&context))
            .unwrap_or(false)
    }

    pub fn is_reachable(&self, function: &str) -> bool {
        self.context_set(function).is_some()
    }

    pub fn functions(&self) -> impl Iterator<Item = (&str, &BTreeSet<ContextId>)> {
        self.by_function.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn iterations(&self) -> usize {
        self.iterations
    }
}
