//! Custom assertions for verification results

use priority_ceiling::features::context_model::Priority;
use priority_ceiling::features::emission::{SyncFragment, SyncStrategy};
use priority_ceiling::pipeline::VerifiedProgram;
use priority_ceiling::shared::models::{DiagnosticKind, Diagnostics};

/// Assert that at least one diagnostic of `kind` was reported
pub fn assert_has_diagnostic(diagnostics: &Diagnostics, kind: DiagnosticKind) {
    assert!(
        diagnostics.count_of(kind) > 0,
        "expected {:?}, got: {:#?}",
        kind,
        diagnostics.iter().map(|d| d.kind).collect::<Vec<_>>()
    );
}

/// Fragment of the only region in `function`
pub fn region_fragment<'a>(verified: &'a VerifiedProgram, function: &str) -> &'a SyncFragment {
    let regions: Vec<_> = verified.regions_in(function).collect();
    assert_eq!(regions.len(), 1, "expected one region in {}", function);
    &verified
        .region_emission(regions[0].id)
        .expect("region emission present")
        .fragment
}

/// Assert the strategy and logical level of the only region in `function`
pub fn assert_region_strategy(
    verified: &VerifiedProgram,
    function: &str,
    strategy: SyncStrategy,
    level: Option<u32>,
) {
    let fragment = region_fragment(verified, function);
    assert_eq!(fragment.strategy, strategy, "strategy of region in {}", function);
    assert_eq!(fragment.level, level.map(Priority), "level of region in {}", function);
}
