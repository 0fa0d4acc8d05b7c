//! ConcurrencyVerifier - whole-program entry point
//!
//! All structural errors are collected across every stage in one run and
//! returned together. There is no way to suppress them: a program with any
//! error never reaches emission.

use crate::config::AnalysisConfig;
use crate::errors::Result;
use crate::features::access_collection::{
    collect_accesses, AccessSite, CriticalRegion, FootprintTable, RegionId, ResourceTable,
};
use crate::features::ceiling::{assign_region_ceilings, CeilingCalculator, CeilingTable};
use crate::features::context_model::{ContextDecl, ContextTable, ExecutionContext, Priority};
use crate::features::debug_guard::GuardInjector;
use crate::features::emission::{RegionEmission, SiteEmission, StrategySelector, SyncStrategy};
use crate::features::reachability::{compute_reachability, CallGraph};
use crate::features::region_validation::RegionValidator;
use crate::shared::models::{Diagnostics, Program};
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{info, warn};

/// Terminal result of a rejected program
#[derive(Debug, Clone, Error, PartialEq, Eq, Serialize)]
#[error("concurrency verification failed with {} error(s)", .diagnostics.errors().count())]
pub struct VerificationFailure {
    /// Every error and warning, in emission order
    pub diagnostics: Diagnostics,
}

/// Verified program with its synchronization plan
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VerifiedProgram {
    pub contexts: Vec<ExecutionContext>,
    pub ceilings: CeilingTable,
    pub regions: Vec<CriticalRegion>,
    pub sites: Vec<AccessSite>,
    pub region_emissions: BTreeMap<RegionId, RegionEmission>,
    /// One entry per collected site, same order
    pub site_emissions: Vec<SiteEmission>,
    /// Advisory diagnostics only
    pub warnings: Diagnostics,
}

impl VerifiedProgram {
    pub fn ceiling_of(&self, resource: &str) -> Priority {
        self.ceilings.ceiling_of(resource)
    }

    pub fn region_emission(&self, id: RegionId) -> Option<&RegionEmission> {
        self.region_emissions.get(&id)
    }

    pub fn regions_in<'a>(&'a self, function: &'a str) -> impl Iterator<Item = &'a CriticalRegion> {
        self.regions.iter().filter(move |r| r.function == function)
    }

    pub fn site_emissions_for<'a>(&'a self, resource: &'a str) -> impl Iterator<Item = &'a SiteEmission> {
        self.site_emissions.iter().filter(move |s| s.resource == resource)
    }
}

pub struct ConcurrencyVerifier {
    config: AnalysisConfig,
}

impl ConcurrencyVerifier {
    pub fn new(config: AnalysisConfig) -> Self {
        Self { config }
    }

    /// Load the configuration from a YAML file
    pub fn from_config_file(path: &str) -> Result<Self> {
        Ok(Self::new(AnalysisConfig::from_yaml(path)?))
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Decode the front-end's JSON handoff, then verify
    pub fn verify_json(&self, program_json: &str, contexts_json: &str) -> Result<VerifiedProgram> {
        let program = Program::from_json_str(program_json)?;
        let contexts: Vec<ContextDecl> = serde_json::from_str(contexts_json)?;
        Ok(self.verify(&program, contexts)?)
    }

    pub fn verify(
        &self,
        program: &Program,
        context_decls: impl IntoIterator<Item = ContextDecl>,
    ) -> std::result::Result<VerifiedProgram, VerificationFailure> {
        let file_path = program.file_path.as_str();
        let mut diagnostics = Diagnostics::new();

        // ═══════════════════════════════════════════════════════════════════
        // Analysis
        // ═══════════════════════════════════════════════════════════════════

        let (contexts, diags) = ContextTable::from_declarations(context_decls, file_path);
        diagnostics.extend(diags);
        let (resources, diags) = ResourceTable::from_declarations(&program.resources, file_path);
        diagnostics.extend(diags);

        let graph = CallGraph::from_program(program);
        let (reachability, diags) =
            compute_reachability(&graph, &contexts, self.config.indirect_calls(), file_path);
        diagnostics.extend(diags);

        let footprints = FootprintTable::compute(program, &graph, &resources, self.config.trusted_functions());
        let (mut collection, diags) = collect_accesses(
            program,
            &resources,
            &footprints,
            &reachability,
            &contexts,
            self.config.opaque_calls(),
        );
        diagnostics.extend(diags);

        let (ceilings, diags) = CeilingCalculator::new(&contexts, file_path).compute(&resources, &collection);
        diagnostics.extend(diags);
        assign_region_ceilings(&mut collection, &ceilings);

        let report = RegionValidator::new(&contexts, &resources, file_path).validate(
            program,
            &mut collection,
            &ceilings,
        );
        diagnostics.extend(report.diagnostics);

        if diagnostics.has_errors() {
            warn!(
                "{}: {} error(s), {} warning(s); emission skipped",
                file_path,
                diagnostics.errors().count(),
                diagnostics.warnings().count()
            );
            return Err(VerificationFailure { diagnostics });
        }

        // ═══════════════════════════════════════════════════════════════════
        // Emission
        // ═══════════════════════════════════════════════════════════════════

        let selector = StrategySelector::new(self.config.target());
        let guards = GuardInjector::new(self.config.debug_guards());

        let mut region_emissions = BTreeMap::new();
        for region in &collection.regions {
            let Some(ceiling) = ceilings.region(region.id) else {
                continue;
            };
            let fragment = selector.for_region(region, ceiling);
            let guarded = guards.inject(&fragment, ceiling.ceiling, &region.label());
            region_emissions.insert(
                region.id,
                RegionEmission {
                    region: region.id,
                    function: region.function.clone(),
                    ceiling: ceiling.ceiling,
                    fragment,
                    guarded,
                },
            );
        }

        let mut site_emissions = Vec::with_capacity(collection.sites.len());
        for (index, site) in collection.sites.iter().enumerate() {
            let (Some(resource), Some(ceiling)) =
                (resources.get(&site.resource), ceilings.resource(&site.resource))
            else {
                continue;
            };
            let region = site.enclosing_region.and_then(|id| region_emissions.get(&id));
            let mut emission = selector.for_site(index, site, resource, ceiling, &contexts, region);
            if let Some(fragment) = &emission.fragment {
                emission.guarded = guards.inject(fragment, ceiling.ceiling, &emission.label());
            }
            site_emissions.push(emission);
        }

        let count = |strategy: SyncStrategy| {
            region_emissions
                .values()
                .filter(|e| e.fragment.strategy == strategy)
                .count()
        };
        info!(
            "{}: verified; regions: {} selective-mask, {} global-disable, {} none; {} warning(s)",
            file_path,
            count(SyncStrategy::SelectiveMask),
            count(SyncStrategy::GlobalDisable),
            count(SyncStrategy::None),
            diagnostics.warnings().count()
        );

        Ok(VerifiedProgram {
            contexts: contexts.iter().cloned().collect(),
            ceilings,
            regions: collection.regions,
            sites: collection.sites,
            region_emissions,
            site_emissions,
            warnings: diagnostics,
        })
    }
}
