//! End-to-end scenarios over the full verifier

mod common;

use common::*;
use pretty_assertions::assert_eq;
use priority_ceiling::config::TargetPreset;
use priority_ceiling::features::context_model::Priority;
use priority_ceiling::features::emission::{MaskingSimulator, SyncStrategy};
use priority_ceiling::shared::models::{DiagnosticKind, Statement};

// ============================================================================
// Scenario A: ceiling is the max accessor priority
// ============================================================================

fn scenario_a() -> ScenarioBuilder {
    ScenarioBuilder::new()
        .interrupt("UART_RX", 2)
        .interrupt("CAN_RX", 4)
        .region_scoped("sharedBuffer")
        .function("main", vec![guarded_write("sharedBuffer")])
        .function(
            "UART_RX",
            vec![Statement::critical(vec![Statement::write_from("sharedBuffer", ["sharedBuffer"])])],
        )
        .function("CAN_RX", vec![guarded_write("sharedBuffer")])
}

#[test]
fn test_scenario_a_selective_mask_on_capable_target() {
    let verified = scenario_a().verify(TargetPreset::CortexM4).unwrap();

    assert_eq!(verified.ceiling_of("sharedBuffer"), Priority(4));
    assert!(!verified.ceilings.resource("sharedBuffer").unwrap().lock_free);
    assert_region_strategy(&verified, "UART_RX", SyncStrategy::SelectiveMask, Some(4));

    let fragment = region_fragment(&verified, "UART_RX");
    assert_eq!(fragment.hardware_level, Some(0xC0));
    assert!(fragment.enter.iter().any(|l| l == "__set_BASEPRI_MAX(0xC0u);"));
}

#[test]
fn test_scenario_a_global_disable_on_incapable_target() {
    let verified = scenario_a().verify(TargetPreset::CortexM0).unwrap();

    assert_region_strategy(&verified, "UART_RX", SyncStrategy::GlobalDisable, None);
    let fragment = region_fragment(&verified, "UART_RX");
    assert_eq!(fragment.enter[1], "__disable_irq();");
    assert_eq!(fragment.exit.len(), 1);
    assert!(fragment.exit[0].starts_with("__set_PRIMASK("));
}

#[test]
fn test_scenario_a_highest_context_region_is_redundant() {
    let verified = scenario_a().verify(TargetPreset::CortexM4).unwrap();

    assert_region_strategy(&verified, "CAN_RX", SyncStrategy::None, None);
    assert_eq!(verified.warnings.count_of(DiagnosticKind::RedundantRegionWarning), 1);
}

// ============================================================================
// Scenario B: equal priorities need nothing
// ============================================================================

#[test]
fn test_scenario_b_equal_priorities_lock_free() {
    let verified = ScenarioBuilder::new()
        .interrupt("SPI_RX", 2)
        .interrupt("TIM_RX", 2)
        .region_scoped("logBuffer")
        .atomic("logCount")
        .function("SPI_RX", vec![Statement::write("logBuffer"), Statement::atomic_rmw("logCount")])
        .function("TIM_RX", vec![guarded_write("logBuffer"), Statement::atomic_rmw("logCount")])
        .verify(TargetPreset::CortexM4)
        .unwrap();

    let log = verified.ceilings.resource("logBuffer").unwrap();
    assert_eq!(log.ceiling, Priority(2));
    assert!(log.lock_free);

    for resource in ["logBuffer", "logCount"] {
        for emission in verified.site_emissions_for(resource) {
            assert_eq!(emission.strategy, SyncStrategy::None, "{} at {}", resource, emission.function);
        }
    }
    assert_region_strategy(&verified, "TIM_RX", SyncStrategy::None, None);
}

// ============================================================================
// Scenario C: early exit from a region
// ============================================================================

#[test]
fn test_scenario_c_return_in_region_rejected() {
    let failure = ScenarioBuilder::new()
        .interrupt("UART_RX", 2)
        .region_scoped("x")
        .function("main", vec![Statement::critical(vec![Statement::ret()])])
        .function("UART_RX", vec![Statement::read("x")])
        .verify(TargetPreset::CortexM4)
        .unwrap_err();

    assert_has_diagnostic(&failure.diagnostics, DiagnosticKind::EarlyExitInCriticalRegionError);
    let diag = failure
        .diagnostics
        .of_kind(DiagnosticKind::EarlyExitInCriticalRegionError)
        .next()
        .unwrap();
    assert!(diag.suggestion.as_deref().unwrap().contains("after the block ends"));
}

#[test]
fn test_scenario_c_fall_through_accepted() {
    let verified = ScenarioBuilder::new()
        .interrupt("UART_RX", 2)
        .region_scoped("x")
        .function("main", vec![Statement::critical(vec![Statement::write("x")]), Statement::ret()])
        .function("UART_RX", vec![guarded_write("x")])
        .verify(TargetPreset::CortexM4);
    assert!(verified.is_ok());
}

// ============================================================================
// Scenario D: nested regions restore the outer level
// ============================================================================

fn scenario_d() -> ScenarioBuilder {
    ScenarioBuilder::new()
        .interrupt("UART_RX", 2)
        .interrupt("CAN_RX", 4)
        .region_scoped("frame")
        .region_scoped("stats")
        .function(
            "main",
            vec![Statement::critical(vec![
                Statement::write("frame"),
                Statement::critical(vec![Statement::write("stats")]),
            ])],
        )
        .function("UART_RX", vec![guarded_write("stats")])
        .function("CAN_RX", vec![guarded_write("frame")])
}

#[test]
fn test_scenario_d_inner_enter_is_noop_and_exit_restores_outer() {
    let verified = scenario_d().verify(TargetPreset::CortexM4).unwrap();
    let main_regions: Vec<_> = verified.regions_in("main").collect();
    let (outer, inner) = (main_regions[0], main_regions[1]);

    assert_eq!(inner.nesting_parent, Some(outer.id));
    assert_eq!(outer.computed_ceiling, Some(Priority(4)));
    assert_eq!(inner.computed_ceiling, Some(Priority(2)));
    assert_eq!(verified.warnings.count_of(DiagnosticKind::NestedRegionWarning), 1);

    let outer_fragment = &verified.region_emission(outer.id).unwrap().fragment;
    let inner_fragment = &verified.region_emission(inner.id).unwrap().fragment;

    let mut sim = MaskingSimulator::new();
    sim.run(&outer_fragment.enter_ops).unwrap();
    assert_eq!(sim.level(), Priority(4));
    sim.run(&inner_fragment.enter_ops).unwrap();
    assert_eq!(sim.level(), Priority(4));
    sim.run(&inner_fragment.exit_ops).unwrap();
    assert_eq!(sim.level(), Priority(4));
    sim.run(&outer_fragment.exit_ops).unwrap();
    assert_eq!(sim.level(), Priority::ZERO);

    // restore writes the saved slot, never an unmasked constant
    assert_eq!(inner_fragment.exit, vec![format!("__set_BASEPRI(__crit_mask_{});", inner.id)]);
}

// ============================================================================
// Errors and policies
// ============================================================================

#[test]
fn test_unprotected_shared_write_rejected() {
    let failure = ScenarioBuilder::new()
        .interrupt("CAN_RX", 4)
        .region_scoped("frame")
        .function("main", vec![Statement::write("frame")])
        .function("CAN_RX", vec![Statement::read("frame")])
        .verify(TargetPreset::CortexM4)
        .unwrap_err();

    assert_has_diagnostic(&failure.diagnostics, DiagnosticKind::UnprotectedMutationError);
}

#[test]
fn test_atomic_increment_uses_exclusive_retry() {
    let verified = ScenarioBuilder::new()
        .interrupt("CAN_RX", 4)
        .atomic("ticks")
        .function("main", vec![Statement::atomic_rmw("ticks")])
        .function("CAN_RX", vec![Statement::read("ticks")])
        .verify(TargetPreset::CortexM4)
        .unwrap();

    let emissions: Vec<_> = verified.site_emissions_for("ticks").collect();
    assert_eq!(emissions[0].strategy, SyncStrategy::LockFreeRetry);
    let fragment = emissions[0].fragment.as_ref().unwrap();
    assert!(fragment.enter.iter().any(|l| l.contains("__LDREXW(&ticks)")));
    assert_eq!(emissions[1].strategy, SyncStrategy::None);
}

#[test]
fn test_atomic_increment_on_avr_disables_interrupts() {
    let verified = ScenarioBuilder::new()
        .interrupt("TIMER0_OVF", 1)
        .atomic("ticks")
        .function("main", vec![Statement::atomic_rmw("ticks")])
        .function("TIMER0_OVF", vec![Statement::atomic_rmw("ticks")])
        .verify(TargetPreset::Avr)
        .unwrap();

    let main_site = verified
        .site_emissions_for("ticks")
        .find(|e| e.function == "main")
        .unwrap();
    assert_eq!(main_site.strategy, SyncStrategy::GlobalDisable);
    let fragment = main_site.fragment.as_ref().unwrap();
    assert_eq!(fragment.enter[1], "cli();");
}

#[test]
fn test_opaque_call_forces_highest_priority() {
    let verified = ScenarioBuilder::new()
        .interrupt("UART_RX", 2)
        .interrupt("CAN_RX", 6)
        .region_scoped("queue")
        .function("main", vec![Statement::critical(vec![Statement::write("queue"), Statement::call("hal_flush")])])
        .function("UART_RX", vec![guarded_write("queue")])
        .function("CAN_RX", vec![Statement::other()])
        .verify(TargetPreset::CortexM4)
        .unwrap();

    assert_region_strategy(&verified, "main", SyncStrategy::SelectiveMask, Some(6));
    assert_has_diagnostic(&verified.warnings, DiagnosticKind::OpaqueCallConservativeCeilingWarning);
}

// ============================================================================
// Front-end call edges
// ============================================================================

fn dispatch_through_edge(reader_body: Vec<Statement>) -> ScenarioBuilder {
    ScenarioBuilder::new()
        .interrupt("CAN_RX", 4)
        .region_scoped("frame")
        .function("main", vec![Statement::critical(vec![Statement::call("dispatch")])])
        .function("dispatch", vec![Statement::other()])
        .function("reader", reader_body)
        .function("CAN_RX", vec![guarded_write("frame")])
        .call_edge("dispatch", "reader")
}

#[test]
fn test_call_edge_reaching_resource_raises_region_ceiling() {
    let verified = dispatch_through_edge(vec![Statement::read("frame")])
        .verify(TargetPreset::CortexM4)
        .unwrap();

    let region = verified.regions_in("main").next().unwrap();
    assert!(region.contains_opaque_call);
    assert_eq!(region.computed_ceiling, Some(Priority(4)));
    assert_region_strategy(&verified, "main", SyncStrategy::SelectiveMask, Some(4));
    assert!(!verified.ceilings.region(region.id).unwrap().is_redundant());
}

#[test]
fn test_write_behind_call_edge_is_protected_by_caller_region() {
    let builder = dispatch_through_edge(vec![Statement::write("frame")]);
    let verified = builder.verify(TargetPreset::CortexM4).unwrap();

    assert_region_strategy(&verified, "main", SyncStrategy::SelectiveMask, Some(4));
    let site = verified
        .site_emissions_for("frame")
        .find(|e| e.function == "reader")
        .unwrap();
    assert_eq!(site.strategy, SyncStrategy::None);
}

#[test]
fn test_write_behind_call_edge_from_unprotected_caller_is_rejected() {
    let failure = ScenarioBuilder::new()
        .interrupt("CAN_RX", 4)
        .region_scoped("frame")
        .function("main", vec![Statement::call("dispatch")])
        .function("dispatch", vec![Statement::other()])
        .function("writer", vec![Statement::write("frame")])
        .function("CAN_RX", vec![guarded_write("frame")])
        .call_edge("dispatch", "writer")
        .verify(TargetPreset::CortexM4)
        .unwrap_err();

    assert_has_diagnostic(&failure.diagnostics, DiagnosticKind::UnprotectedMutationError);
}

#[test]
fn test_region_nested_through_call_edge() {
    let verified = ScenarioBuilder::new()
        .interrupt("CAN_RX", 4)
        .region_scoped("frame")
        .function("main", vec![Statement::critical(vec![Statement::call("dispatch")])])
        .function("dispatch", vec![Statement::other()])
        .function("store", vec![guarded_write("frame")])
        .function("CAN_RX", vec![guarded_write("frame")])
        .call_edge("dispatch", "store")
        .verify(TargetPreset::CortexM4)
        .unwrap();

    let outer = verified.regions_in("main").next().unwrap();
    let inner = verified.regions_in("store").next().unwrap();
    assert_eq!(inner.nesting_parent, Some(outer.id));
    assert_has_diagnostic(&verified.warnings, DiagnosticKind::NestedRegionWarning);
}
