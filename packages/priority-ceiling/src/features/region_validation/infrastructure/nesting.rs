//! Region nesting through helper calls
//!
//! `outer(f)` is the set of regions that can be open when `f` is entered:
//! - a call site inside region `q` contributes `{q}` to its callee
//! - a call site outside any region forwards the caller's own `outer` set
//!
//! Sets only grow, so the worklist terminates on recursive call graphs.

use crate::features::access_collection::{AccessCollection, RegionId};
use std::collections::{BTreeMap, BTreeSet, VecDeque};
use tracing::debug;

/// Regions that may be open on entry to each function
pub fn open_regions_on_entry(collection: &AccessCollection) -> BTreeMap<String, BTreeSet<RegionId>> {
    let mut outer: BTreeMap<String, BTreeSet<RegionId>> = BTreeMap::new();
    let mut worklist: VecDeque<String> = VecDeque::new();

    for call in &collection.call_sites {
        if let Some(region) = call.enclosing_region {
            if outer.entry(call.callee.clone()).or_default().insert(region) {
                worklist.push_back(call.callee.clone());
            }
        }
    }

    while let Some(function) = worklist.pop_front() {
        let inherited = outer.get(&function).cloned().unwrap_or_default();
        for call in collection
            .calls_from(&function)
            .filter(|c| c.enclosing_region.is_none())
        {
            let target = outer.entry(call.callee.clone()).or_default();
            let before = target.len();
            target.extend(inherited.iter().copied());
            if target.len() > before {
                worklist.push_back(call.callee.clone());
            }
        }
    }

    outer
}

/// Fill `nesting_parent` on every region; returns the number of nested regions
pub fn assign_nesting_parents(collection: &mut AccessCollection) -> usize {
    let outer = open_regions_on_entry(collection);
    let mut nested = 0;

    for region in &mut collection.regions {
        let through_call = || {
            outer
                .get(&region.function)
                .and_then(|set| set.iter().copied().find(|q| *q != region.id))
        };
        region.nesting_parent = region.lexical_parent.or_else(through_call);
        if let Some(parent) = region.nesting_parent {
            nested += 1;
            debug!("region {} nested in {}", region.id, parent);
        }
    }

    nested
}
