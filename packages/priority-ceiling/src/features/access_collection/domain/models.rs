/// Access collection models
use crate::features::context_model::{ContextId, Priority};
use crate::shared::models::Span;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Resource access operation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum AccessOperation {
    /// Load (e.g., `y <- x`)
    Read,
    /// Store of a value not derived from the target (e.g., `x <- 1`)
    Write,
    /// Store of a value derived from the target (e.g., `x <- x + 1`, `x +<- 1`)
    ReadModifyWrite,
}

impl AccessOperation {
    /// Check if this is a write (includes ReadModifyWrite)
    pub fn is_write(&self) -> bool {
        matches!(self, Self::Write | Self::ReadModifyWrite)
    }

    /// Check if this is a read (includes ReadModifyWrite)
    pub fn is_read(&self) -> bool {
        matches!(self, Self::Read | Self::ReadModifyWrite)
    }
}

/// Identifier of a critical region, assigned in program order
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct RegionId(pub usize);

impl std::fmt::Display for RegionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "R{}", self.0)
    }
}

/// One reference to a declared resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessSite {
    pub resource: String,
    pub owning_function: String,
    pub operation: AccessOperation,
    /// Written with the explicit atomic compound operator
    pub atomic_form: bool,
    /// Innermost lexically enclosing region
    pub enclosing_region: Option<RegionId>,
    /// Every context that reaches `owning_function`
    pub contexts: BTreeSet<ContextId>,
    pub span: Span,
}

impl AccessSite {
    /// Dependent read-then-write outside the atomic form
    pub fn is_multi_step(&self) -> bool {
        self.operation == AccessOperation::ReadModifyWrite && !self.atomic_form
    }

    /// Multi-step update with no lexical region around it
    pub fn is_unprotected_multi_step(&self) -> bool {
        self.is_multi_step() && self.enclosing_region.is_none()
    }
}

/// Call inside a region whose footprint is unknown
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpaqueCall {
    /// Callee name, or the pointer expression for indirect calls
    pub callee: String,
    pub indirect: bool,
    pub span: Span,
}

/// Direct call site
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CallSite {
    pub caller: String,
    pub callee: String,
    pub enclosing_region: Option<RegionId>,
    pub span: Span,
}

/// Lexical critical block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CriticalRegion {
    pub id: RegionId,
    pub function: String,
    /// Lowest-priority reaching context; `None` when the function is unreachable
    pub enclosing_context: Option<ContextId>,
    pub reaching_contexts: BTreeSet<ContextId>,
    /// Resources referenced in the body itself, not through calls
    pub direct_resources: BTreeSet<String>,
    /// Resources reached through analysable calls (transitive footprint policy)
    pub footprint_resources: BTreeSet<String>,
    pub contains_opaque_call: bool,
    pub opaque_calls: Vec<OpaqueCall>,
    /// Enclosing region in the same function body
    pub lexical_parent: Option<RegionId>,
    /// Lexical parent, or the region around a call path into this function
    pub nesting_parent: Option<RegionId>,
    pub computed_ceiling: Option<Priority>,
    pub span: Span,
}

impl CriticalRegion {
    pub fn new(id: RegionId, function: impl Into<String>, span: Span) -> Self {
        Self {
            id,
            function: function.into(),
            enclosing_context: None,
            reaching_contexts: BTreeSet::new(),
            direct_resources: BTreeSet::new(),
            footprint_resources: BTreeSet::new(),
            contains_opaque_call: false,
            opaque_calls: Vec::new(),
            lexical_parent: None,
            nesting_parent: None,
            computed_ceiling: None,
            span,
        }
    }

    /// Human-readable label used in diagnostics and debug guards
    pub fn label(&self) -> String {
        format!("{} in {} at line {}", self.id, self.function, self.span.start_line)
    }
}

/// Everything the collector produced
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessCollection {
    pub sites: Vec<AccessSite>,
    pub regions: Vec<CriticalRegion>,
    pub call_sites: Vec<CallSite>,
}

impl AccessCollection {
    pub fn region(&self, id: RegionId) -> Option<&CriticalRegion> {
        self.regions.get(id.0)
    }

    pub fn region_mut(&mut self, id: RegionId) -> Option<&mut CriticalRegion> {
        self.regions.get_mut(id.0)
    }

    pub fn sites_of<'a>(&'a self, resource: &'a str) -> impl Iterator<Item = &'a AccessSite> {
        self.sites.iter().filter(move |s| s.resource == resource)
    }

    pub fn regions_in<'a>(&'a self, function: &'a str) -> impl Iterator<Item = &'a CriticalRegion> {
        self.regions.iter().filter(move |r| r.function == function)
    }

    pub fn calls_from<'a>(&'a self, caller: &'a str) -> impl Iterator<Item = &'a CallSite> {
        self.call_sites.iter().filter(move |c| c.caller == caller)
    }

    /// Lexical chain from `id` outwards, starting with `id` itself
    pub fn lexical_chain(&self, id: RegionId) -> Vec<RegionId> {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            chain.push(current);
            cursor = self.region(current).and_then(|r| r.lexical_parent);
        }
        chain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_operation_kinds() {
        assert!(AccessOperation::ReadModifyWrite.is_write());
        assert!(AccessOperation::ReadModifyWrite.is_read());
        assert!(!AccessOperation::Read.is_write());
        assert!(!AccessOperation::Write.is_read());
    }

    #[test]
    fn test_multi_step_classification() {
        let mut site = AccessSite {
            resource: "counter".to_string(),
            owning_function: "main".to_string(),
            operation: AccessOperation::ReadModifyWrite,
            atomic_form: false,
            enclosing_region: None,
            contexts: BTreeSet::new(),
            span: Span::zero(),
        };
        assert!(site.is_unprotected_multi_step());

        site.enclosing_region = Some(RegionId(0));
        assert!(site.is_multi_step());
        assert!(!site.is_unprotected_multi_step());

        site.atomic_form = true;
        assert!(!site.is_multi_step());
    }

    #[test]
    fn test_lexical_chain() {
        let mut outer = CriticalRegion::new(RegionId(0), "main", Span::line(3));
        outer.lexical_parent = None;
        let mut inner = CriticalRegion::new(RegionId(1), "main", Span::line(5));
        inner.lexical_parent = Some(RegionId(0));
        let collection = AccessCollection {
            regions: vec![outer, inner],
            ..Default::default()
        };

        assert_eq!(collection.lexical_chain(RegionId(1)), vec![RegionId(1), RegionId(0)]);
        assert_eq!(collection.region(RegionId(1)).map(|r| r.label()).as_deref(), Some("R1 in main at line 5"));
    }
}
