//! StrategySelector - ceiling + target capabilities -> enter/exit fragment
//!
//! Deterministic and total: every input yields a fragment, there are no
//! error paths of its own.

use crate::config::TargetCapabilities;
use crate::features::access_collection::{AccessOperation, AccessSite, CriticalRegion};
use crate::features::ceiling::{RegionCeiling, ResourceCeiling};
use crate::features::context_model::{ContextTable, Priority};
use crate::features::emission::domain::*;
use crate::features::emission::infrastructure::CRenderer;
use crate::shared::models::{AccessWidth, ResourceClass, ResourceDecl};
use tracing::debug;

/// Pick a strategy for protecting at `level`
///
/// `rmw_width` is set for a pure single-variable read-modify-write, the only
/// shape the exclusive retry loop can replace.
pub fn choose_strategy(
    target: &TargetCapabilities,
    level: Priority,
    rmw_width: Option<AccessWidth>,
) -> SyncStrategy {
    if rmw_width.map(|w| target.retry_covers(w)).unwrap_or(false) {
        return SyncStrategy::LockFreeRetry;
    }
    if target.can_mask_selectively(level.value()) {
        SyncStrategy::SelectiveMask
    } else {
        SyncStrategy::GlobalDisable
    }
}

pub struct StrategySelector<'a> {
    target: &'a TargetCapabilities,
    renderer: CRenderer<'a>,
}

impl<'a> StrategySelector<'a> {
    pub fn new(target: &'a TargetCapabilities) -> Self {
        Self {
            target,
            renderer: CRenderer::new(target),
        }
    }

    /// Mask at `level`, selectively when the target can express it
    pub fn mask_at(&self, level: Priority, tag: &str) -> SyncFragment {
        if choose_strategy(self.target, level, None) == SyncStrategy::SelectiveMask {
            if let Some(fragment) = self.renderer.selective_mask(level, tag) {
                return fragment;
            }
        }
        self.renderer.global_disable(tag)
    }

    pub fn for_region(&self, region: &CriticalRegion, ceiling: &RegionCeiling) -> SyncFragment {
        if region.enclosing_context.is_none() || ceiling.is_redundant() {
            debug!("region {}: none", region.id);
            return SyncFragment::none();
        }
        let fragment = self.mask_at(ceiling.ceiling, &region.id.to_string());
        debug!("region {}: {} at {}", region.id, fragment.strategy, ceiling.ceiling);
        fragment
    }

    /// Strategy for one access site
    ///
    /// Sites inside a region report the region's strategy; the region
    /// carries the fragment.
    pub fn for_site(
        &self,
        index: usize,
        site: &AccessSite,
        resource: &ResourceDecl,
        ceiling: &ResourceCeiling,
        contexts: &ContextTable,
        region: Option<&RegionEmission>,
    ) -> SiteEmission {
        let mut emission = SiteEmission {
            site: index,
            resource: site.resource.clone(),
            function: site.owning_function.clone(),
            span: site.span,
            strategy: SyncStrategy::None,
            covered_by: site.enclosing_region,
            fragment: None,
            guarded: None,
        };

        if site.enclosing_region.is_some() {
            emission.strategy = region
                .map(|r| r.fragment.strategy)
                .unwrap_or(SyncStrategy::None);
            return emission;
        }

        let preemptible = site
            .contexts
            .iter()
            .any(|c| contexts.get_priority(*c) < ceiling.ceiling);
        if ceiling.lock_free || !preemptible || resource.class == ResourceClass::RegionScoped {
            return emission;
        }

        let tag = format!("S{}", index);
        let fragment = if site.operation == AccessOperation::ReadModifyWrite {
            match choose_strategy(self.target, ceiling.ceiling, Some(resource.width)) {
                SyncStrategy::LockFreeRetry => self
                    .renderer
                    .lock_free_retry(&resource.name, resource.width, &tag)
                    .unwrap_or_else(|| self.mask_at(ceiling.ceiling, &tag)),
                _ => self.mask_at(ceiling.ceiling, &tag),
            }
        } else if resource.width.bits() <= self.target.native_access_width.bits() {
            return emission;
        } else {
            // load/store wider than the bus cannot tear under a mask
            self.mask_at(ceiling.ceiling, &tag)
        };

        emission.strategy = fragment.strategy;
        emission.fragment = Some(fragment);
        emission
    }
}
