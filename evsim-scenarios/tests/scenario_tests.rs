//! Integration tests: catalogue scenarios driven through the engine

use evsim_core::charging::charge_taper;
use evsim_core::engine::{MAX_DECEL_RATE, RPM_RATE, VOLTAGE_RATE};
use evsim_core::smoothing::within_rate;
use evsim_core::{PowerPath, Scenario, SimulationEngine};
use evsim_scenarios::{
    ChargingScenario, CityCommuteScenario, HvFaultScenario, MotorOverheatScenario, ScenarioKind,
};

const DT: f64 = 0.1;

fn engine_with(kind: ScenarioKind) -> SimulationEngine {
    let mut engine = SimulationEngine::default();
    engine.start_scenario(kind.build(None));
    engine
}

fn run_for(engine: &mut SimulationEngine, seconds: f64) {
    let ticks = (seconds / DT).round() as usize;
    for _ in 0..ticks {
        engine.tick(DT).expect("tick should succeed");
    }
}

#[test]
fn test_city_commute_numeric_contract() {
    let scenario = CityCommuteScenario::new();
    assert_eq!(scenario.target_speed(6.0), 0.0, "inside the 12 s stop window");
    assert_eq!(scenario.target_speed(20.0), 45.0, "end of the pull-away ramp");
}

#[test]
fn test_motor_overheat_latches_both_faults() {
    let mut engine = SimulationEngine::default();
    engine.start_scenario(Box::new(MotorOverheatScenario::new()));

    let mut ticks = 0;
    while engine.state().motor_temp <= 130.0 {
        assert!(!engine.state().hv_fault, "no fault before the trip temperature");
        engine.tick(DT).expect("tick should succeed");
        ticks += 1;
        assert!(ticks < 1800, "motor should overheat within the scenario duration");
    }
    assert!(engine.state().hv_fault);
    assert!(engine.state().motor_fault);

    engine.tick(DT).expect("tick should succeed");
    assert!(engine.state().hv_fault && engine.state().motor_fault, "faults stay latched");
    assert_eq!(engine.state().power, 0.0);
}

#[test]
fn test_empty_pack_overrides_regen() {
    let mut engine = engine_with(ScenarioKind::CityCommute);
    {
        let state = engine.state_mut();
        state.state_of_charge = 0.0;
        state.speed = 80.0;
        state.previous_speed = 80.0;
    }

    engine.tick(DT).expect("tick should succeed");

    assert_eq!(engine.last_power_path(), PowerPath::Regen, "deceleration selects regen");
    assert_eq!(engine.state().power, 0.0, "empty pack forces power to exactly zero");
    assert_eq!(engine.state().state_of_charge, 0.0);
}

#[test]
fn test_full_pack_charging_is_refused() {
    let mut engine = SimulationEngine::default();
    engine.start_scenario(Box::new(ChargingScenario::new(150.0)));
    engine.state_mut().state_of_charge = 100.0;

    engine.tick(DT).expect("tick should succeed");

    assert_eq!(engine.state().power, 0.0);
    assert_eq!(engine.state().state_of_charge, 100.0);
    assert!(engine.state().charging);
}

#[test]
fn test_dc_fast_charge_stops_when_pack_fills() {
    let mut engine = SimulationEngine::default();
    engine.start_scenario(Box::new(ChargingScenario::new(150.0)));
    engine.state_mut().state_of_charge = 99.0;

    let mut ticks = 0;
    while engine.state().state_of_charge < 100.0 {
        engine.tick(DT).expect("tick should succeed");
        assert!(
            !(engine.state().state_of_charge >= 100.0 && engine.state().power < 0.0),
            "full pack still charging at {} kW",
            engine.state().power
        );
        ticks += 1;
        assert!(ticks < 5000, "pack never filled");
    }
    assert_eq!(engine.state().power, 0.0);

    run_for(&mut engine, 5.0);
    assert_eq!(engine.state().state_of_charge, 100.0);
    assert_eq!(engine.state().power, 0.0);
}

#[test]
fn test_dc_fast_taper_at_ninety_percent() {
    let scenario = ChargingScenario::new(150.0);
    let base = scenario.charge_power().expect("charging scenario has a power");
    assert!((charge_taper(90.0, base) - 82.5).abs() < 1e-9);

    let mut engine = SimulationEngine::default();
    engine.start_scenario(Box::new(scenario));
    engine.state_mut().state_of_charge = 90.0;

    engine.tick(DT).expect("tick should succeed");
    assert!(
        (engine.state().power + 2.0).abs() < 1e-9,
        "first tick is limited by the 20 kW/s ramp, got {}",
        engine.state().power
    );

    run_for(&mut engine, 5.0);
    let draw = -engine.state().power;
    assert!(draw > 80.0 && draw <= 82.5 + 1e-9, "tapered charge power, got {}", draw);
    assert!(engine.state().state_of_charge > 90.0);
    assert!(engine.snapshot().time_to_full_min == 0, "already above the 80 % target");
}

#[test]
fn test_charging_session_reports_time_to_full() {
    let mut engine = engine_with(ScenarioKind::Charging);
    engine.state_mut().state_of_charge = 40.0;

    run_for(&mut engine, 10.0);

    let snap = engine.snapshot();
    assert!(snap.charging);
    assert_eq!(snap.scenario_name.as_deref(), Some("DC Fast Charge"));
    assert!(snap.energy_added.0 > 0.0);
    assert!(snap.time_to_full_min > 0, "40 % -> 80 % needs time");
    assert!(engine.charge_session().is_active());
}

#[test]
fn test_hv_fault_scenario_timeline() {
    let mut engine = SimulationEngine::default();
    engine.start_scenario(Box::new(HvFaultScenario::new()));

    run_for(&mut engine, 29.0);
    assert!(!engine.state().hv_isolation_fault);
    assert!(engine.state().speed > 60.0);

    run_for(&mut engine, 21.0);
    assert!(engine.state().hv_isolation_fault, "latched at 30 s");
    assert!(engine.state().speed <= 30.0 + 1e-6, "limited to 30 km/h");
    assert!(engine.state().speed > 20.0, "still driving in limp mode");

    run_for(&mut engine, 20.0);
    assert_eq!(engine.state().speed, 0.0, "stopped after 60 s");
    assert!(engine.state().hv_isolation_fault, "latch is permanent");
    assert!(engine.snapshot().hv_isolation_fault);
}

#[test]
fn test_hv_fault_scenario_raises_hv_warning() {
    let mut engine = SimulationEngine::default();
    engine.start_scenario(Box::new(HvFaultScenario::new()));

    run_for(&mut engine, 29.0);
    let snap = engine.snapshot();
    assert!(!snap.warnings.hv_warning);
    assert!(snap.ready);

    run_for(&mut engine, 2.0);
    let snap = engine.snapshot();
    assert!(snap.hv_isolation_fault);
    assert!(snap.warnings.hv_warning, "isolation fault should raise the hv warning");
    assert!(snap.warnings.reduced_power);
    assert!(!snap.ready);
    assert!(!snap.hv_fault, "isolation alone does not cut power");
}

#[test]
fn test_aggressive_driver_flags() {
    let mut engine = engine_with(ScenarioKind::AggressiveDriver);
    assert!(engine.snapshot().seatbelt, "seatbelt warning seeded at activation");

    let mut saw_abs = false;
    let mut saw_tc = false;
    for _ in 0..400 {
        engine.tick(DT).expect("tick should succeed");
        saw_abs |= engine.state().abs_active;
        saw_tc |= engine.state().tc_active;
    }
    assert!(saw_tc, "bursts should trigger traction control");
    assert!(saw_abs, "hard braking should trigger ABS");
    assert!(engine.snapshot().seatbelt);
}

#[test]
fn test_plain_scenarios_never_report_abs_tc() {
    let mut engine = engine_with(ScenarioKind::SpiritedDrive);
    for _ in 0..700 {
        engine.tick(DT).expect("tick should succeed");
        assert!(!engine.state().abs_active && !engine.state().tc_active);
    }
}

#[test]
fn test_degraded_battery_raises_bms_warning() {
    let mut engine = engine_with(ScenarioKind::DegradedBattery);
    run_for(&mut engine, 1.0);
    let snap = engine.snapshot();
    assert!(snap.warnings.bms_warning);
    assert!(snap.soh.0 < 75.0);
}

#[test]
fn test_critical_low_battery_reduces_power() {
    let mut engine = engine_with(ScenarioKind::CriticalLowBattery);
    run_for(&mut engine, 30.0);
    let snap = engine.snapshot();
    assert!(snap.soc.0 < 8.0, "driving drains the pack");
    assert!(snap.warnings.reduced_power);
    assert!(!snap.warnings.hv_warning);
}

#[test]
fn test_critical_low_battery_runs_until_depleted() {
    let mut engine = engine_with(ScenarioKind::CriticalLowBattery);
    engine.state_mut().state_of_charge = 1.0;

    let mut depleted_at = None;
    for tick in 0..20_000 {
        let before = engine.state().clone();
        engine.tick(DT).expect("tick should succeed");
        let s = engine.state();
        assert!((0.0..=100.0).contains(&s.state_of_charge));
        assert!(within_rate(before.speed, s.speed, MAX_DECEL_RATE, DT), "speed jumped");
        if s.state_of_charge == 0.0 {
            assert_eq!(s.power, 0.0, "empty pack must draw nothing");
            assert_eq!(s.target_speed, 0.0, "empty pack forces the target to zero");
            depleted_at.get_or_insert(tick);
        }
        if depleted_at.is_some() && s.speed == 0.0 {
            break;
        }
    }

    assert!(depleted_at.is_some(), "pack should deplete");
    assert_eq!(engine.state().speed, 0.0, "vehicle should coast to rest");
    assert!(engine.snapshot().warnings.bms_warning);
}

#[test]
fn test_battery_overheat_warns_before_tripping() {
    let mut engine = engine_with(ScenarioKind::BatteryOverheat);
    let mut warned_at = None;
    let mut tripped_at = None;
    for tick in 0..1800 {
        engine.tick(DT).expect("tick should succeed");
        let snap = engine.snapshot();
        if warned_at.is_none() && snap.warnings.temp_warning {
            warned_at = Some(tick);
        }
        if snap.hv_fault {
            tripped_at = Some(tick);
            break;
        }
    }
    let warned_at = warned_at.expect("temperature warning should fire");
    let tripped_at = tripped_at.expect("battery should trip within the scenario");
    assert!(warned_at < tripped_at, "warning must lead the trip");
    assert!(engine.state().battery_temp > 70.0);
}

#[test]
fn test_every_scenario_respects_bounds_and_rates() {
    for kind in ScenarioKind::ALL {
        let mut engine = engine_with(kind);
        for _ in 0..2000 {
            let before = engine.state().clone();
            engine.tick(DT).expect("tick should succeed");
            let after = engine.state();
            assert!(after.speed >= 0.0, "{}: negative speed", kind);
            assert!(
                (0.0..=100.0).contains(&after.state_of_charge),
                "{}: soc out of range",
                kind
            );
            assert!(
                within_rate(before.speed, after.speed, MAX_DECEL_RATE, DT),
                "{}: speed jumped {} -> {}",
                kind,
                before.speed,
                after.speed
            );
            assert!(within_rate(before.motor_rpm, after.motor_rpm, RPM_RATE, DT), "{}: rpm jumped", kind);
            assert!(
                within_rate(before.battery_voltage, after.battery_voltage, VOLTAGE_RATE, DT),
                "{}: voltage jumped",
                kind
            );
            if before.hv_fault {
                assert!(after.hv_fault, "{}: hv fault cleared mid-run", kind);
            }
        }
    }
}

#[test]
fn test_scenarios_complete_after_duration() {
    let mut engine = engine_with(ScenarioKind::HvFault);
    run_for(&mut engine, 89.0);
    assert!(!engine.is_scenario_complete());
    run_for(&mut engine, 1.5);
    assert!(engine.is_scenario_complete());

    engine.restart_scenario();
    assert!(!engine.is_scenario_complete());
    assert!(!engine.state().hv_isolation_fault, "restart clears latches");
    assert!(!engine.snapshot().warnings.hv_warning);
}
