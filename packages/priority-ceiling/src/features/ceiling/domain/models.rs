/// Ceiling models
use crate::features::access_collection::RegionId;
use crate::features::context_model::{ContextId, Priority};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Computed ceiling of one declared resource
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceCeiling {
    pub resource: String,
    pub ceiling: Priority,
    /// All accessing contexts share one priority
    pub lock_free: bool,
    /// Union of the contexts of every access site
    pub contexts: BTreeSet<ContextId>,
}

/// Computed ceiling of one critical region
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionCeiling {
    pub region: RegionId,
    /// Max ceiling over the region's resources
    pub resource_ceiling: Priority,
    /// Raised to the highest interrupt priority by an opaque call
    pub forced_by_opaque: bool,
    /// Priority of the enclosing context
    pub floor: Priority,
    pub ceiling: Priority,
}

impl RegionCeiling {
    /// Masking adds nothing over the enclosing context's own priority
    pub fn is_redundant(&self) -> bool {
        self.ceiling <= self.floor
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CeilingTable {
    pub resources: BTreeMap<String, ResourceCeiling>,
    pub regions: BTreeMap<RegionId, RegionCeiling>,
}

impl CeilingTable {
    pub fn resource(&self, name: &str) -> Option<&ResourceCeiling> {
        self.resources.get(name)
    }

    pub fn region(&self, id: RegionId) -> Option<&RegionCeiling> {
        self.regions.get(&id)
    }

    /// Ceiling of a resource; 0 for names without accesses
    pub fn ceiling_of(&self, name: &str) -> Priority {
        self.resources
            .get(name)
            .map(|r| r.ceiling)
            .unwrap_or(Priority::ZERO)
    }

    pub fn region_ceiling(&self, id: RegionId) -> Priority {
        self.regions
            .get(&id)
            .map(|r| r.ceiling)
            .unwrap_or(Priority::ZERO)
    }
}
