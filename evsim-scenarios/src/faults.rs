//! Fault-injection scenarios
//!
//! These drive the vehicle into warning and enforcement territory: injected
//! heat, a worn or nearly empty pack, an HV isolation fault.

use crate::driving::commute_target;
use crate::ScenarioClock;
use evsim_core::scenario::{HeatInjection, HeatTarget, PowerRange, Scenario, ScenarioLatches};
use evsim_core::vehicle::{DriveMode, VehicleState};
use tracing::info;

/// Heat ramping linearly from `base` after `delay` seconds, capped at `cap` (°C/s)
fn ramped_heat(t: f64, delay: f64, base: f64, slope: f64, cap: f64) -> Option<f64> {
    if t < delay {
        None
    } else {
        Some((base + slope * (t - delay)).min(cap))
    }
}

// =============================================================================
// Battery Overheat
// =============================================================================

#[derive(Debug, Default)]
pub struct BatteryOverheatScenario {
    clock: ScenarioClock,
}

impl BatteryOverheatScenario {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scenario for BatteryOverheatScenario {
    fn key(&self) -> &str {
        "battery_overheat"
    }

    fn name(&self) -> &str {
        "Battery Overheat"
    }

    fn description(&self) -> &str {
        "Warm pack under sustained load heats until the thermal trip"
    }

    fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    fn reset(&mut self) {
        self.clock.reset();
    }

    fn update(&mut self, dt: f64) {
        self.clock.advance(dt);
    }

    fn target_speed(&self, t: f64) -> f64 {
        80.0 + 10.0 * (0.15 * t).sin()
    }

    fn power_range(&self) -> PowerRange {
        PowerRange::new(20.0, 70.0)
    }

    fn acceleration_rate(&self) -> f64 {
        2.5
    }

    fn drive_mode(&self) -> DriveMode {
        DriveMode::Normal
    }

    fn duration(&self) -> Option<f64> {
        Some(180.0)
    }

    fn apply_initial_state(&self, state: &mut VehicleState) {
        state.battery_temp = 38.0;
    }

    fn heat_injection(&self) -> Option<HeatInjection> {
        ramped_heat(self.elapsed(), 5.0, 0.3, 0.02, 0.8).map(|rate| HeatInjection {
            target: HeatTarget::Battery,
            rate,
        })
    }
}

// =============================================================================
// Motor Overheat
// =============================================================================

#[derive(Debug, Default)]
pub struct MotorOverheatScenario {
    clock: ScenarioClock,
}

impl MotorOverheatScenario {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scenario for MotorOverheatScenario {
    fn key(&self) -> &str {
        "motor_overheat"
    }

    fn name(&self) -> &str {
        "Motor Overheat"
    }

    fn description(&self) -> &str {
        "Sustained climb at high motor load until the motor trips"
    }

    fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    fn reset(&mut self) {
        self.clock.reset();
    }

    fn update(&mut self, dt: f64) {
        self.clock.advance(dt);
    }

    fn target_speed(&self, t: f64) -> f64 {
        60.0 + 5.0 * (0.2 * t).sin()
    }

    fn power_range(&self) -> PowerRange {
        PowerRange::new(40.0, 120.0)
    }

    fn acceleration_rate(&self) -> f64 {
        2.0
    }

    fn drive_mode(&self) -> DriveMode {
        DriveMode::Sport
    }

    fn duration(&self) -> Option<f64> {
        Some(180.0)
    }

    fn apply_initial_state(&self, state: &mut VehicleState) {
        state.motor_temp = 60.0;
    }

    fn heat_injection(&self) -> Option<HeatInjection> {
        ramped_heat(self.elapsed(), 3.0, 0.4, 0.015, 0.7).map(|rate| HeatInjection {
            target: HeatTarget::Motor,
            rate,
        })
    }
}

// =============================================================================
// Degraded Battery
// =============================================================================

const DEGRADED_SOH: f64 = 65.0;

#[derive(Debug, Default)]
pub struct DegradedBatteryScenario {
    clock: ScenarioClock,
}

impl DegradedBatteryScenario {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scenario for DegradedBatteryScenario {
    fn key(&self) -> &str {
        "degraded_battery"
    }

    fn name(&self) -> &str {
        "Degraded Battery"
    }

    fn description(&self) -> &str {
        "Ordinary city cycle on a pack at 65 % state of health"
    }

    fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    fn reset(&mut self) {
        self.clock.reset();
    }

    fn update(&mut self, dt: f64) {
        self.clock.advance(dt);
    }

    fn target_speed(&self, t: f64) -> f64 {
        commute_target(t)
    }

    fn power_range(&self) -> PowerRange {
        PowerRange::new(0.0, 60.0)
    }

    fn acceleration_rate(&self) -> f64 {
        2.5
    }

    fn drive_mode(&self) -> DriveMode {
        DriveMode::Normal
    }

    fn duration(&self) -> Option<f64> {
        Some(300.0)
    }

    fn apply_initial_state(&self, state: &mut VehicleState) {
        state.state_of_health = DEGRADED_SOH;
    }
}

// =============================================================================
// Critical Low Battery
// =============================================================================

#[derive(Debug, Default)]
pub struct CriticalLowBatteryScenario {
    clock: ScenarioClock,
}

impl CriticalLowBatteryScenario {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scenario for CriticalLowBatteryScenario {
    fn key(&self) -> &str {
        "critical_low_battery"
    }

    fn name(&self) -> &str {
        "Critical Low Battery"
    }

    fn description(&self) -> &str {
        "Starting at 8 % charge, the driver backs off from 100 to 70 to 40 km/h"
    }

    fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    fn reset(&mut self) {
        self.clock.reset();
    }

    fn update(&mut self, dt: f64) {
        self.clock.advance(dt);
    }

    fn target_speed(&self, t: f64) -> f64 {
        if t < 60.0 {
            100.0
        } else if t < 120.0 {
            70.0
        } else {
            40.0
        }
    }

    fn power_range(&self) -> PowerRange {
        PowerRange::new(0.0, 50.0)
    }

    fn acceleration_rate(&self) -> f64 {
        2.0
    }

    fn drive_mode(&self) -> DriveMode {
        DriveMode::Eco
    }

    fn duration(&self) -> Option<f64> {
        Some(180.0)
    }

    fn apply_initial_state(&self, state: &mut VehicleState) {
        state.state_of_charge = 8.0;
    }
}

// =============================================================================
// HV System Fault
// =============================================================================

const HV_FAULT_ONSET_S: f64 = 30.0;
const HV_STOP_S: f64 = 60.0;
const HV_LIMP_KMH: f64 = 30.0;

/// Normal cruise until the isolation fault latches at 30 s
#[derive(Debug, Default)]
pub struct HvFaultScenario {
    clock: ScenarioClock,
    latched: bool,
}

impl HvFaultScenario {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_latched(&self) -> bool {
        self.latched
    }
}

impl Scenario for HvFaultScenario {
    fn key(&self) -> &str {
        "hv_fault"
    }

    fn name(&self) -> &str {
        "HV System Fault"
    }

    fn description(&self) -> &str {
        "Isolation fault at 30 s limits the car to 30 km/h, then a stop at 60 s"
    }

    fn elapsed(&self) -> f64 {
        self.clock.elapsed()
    }

    fn reset(&mut self) {
        self.clock.reset();
        self.latched = false;
    }

    fn update(&mut self, dt: f64) {
        self.clock.advance(dt);
        if !self.latched && self.clock.elapsed() >= HV_FAULT_ONSET_S {
            info!(elapsed = self.clock.elapsed(), "HV isolation fault injected");
            self.latched = true;
        }
    }

    fn target_speed(&self, t: f64) -> f64 {
        let cruise = 70.0 + 3.0 * (0.2 * t).sin();
        if t >= HV_STOP_S {
            0.0
        } else if self.latched || t >= HV_FAULT_ONSET_S {
            cruise.min(HV_LIMP_KMH)
        } else {
            cruise
        }
    }

    fn power_range(&self) -> PowerRange {
        PowerRange::new(0.0, 60.0)
    }

    fn acceleration_rate(&self) -> f64 {
        2.5
    }

    fn drive_mode(&self) -> DriveMode {
        DriveMode::Normal
    }

    fn duration(&self) -> Option<f64> {
        Some(90.0)
    }

    fn latches(&self) -> ScenarioLatches {
        ScenarioLatches {
            hv_isolation: self.latched,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_battery_heat_ramps_after_delay() {
        let mut s = BatteryOverheatScenario::new();
        s.update(4.9);
        assert!(s.heat_injection().is_none());
        s.update(0.1);
        let heat = s.heat_injection().expect("heat should start at 5 s");
        assert_eq!(heat.target, HeatTarget::Battery);
        assert_relative_eq!(heat.rate, 0.3, epsilon = 1e-9);
        s.update(100.0);
        assert_relative_eq!(s.heat_injection().map(|h| h.rate).unwrap_or_default(), 0.8);
    }

    #[test]
    fn test_motor_heat_ramps_after_delay() {
        let mut s = MotorOverheatScenario::new();
        s.update(2.0);
        assert!(s.heat_injection().is_none());
        s.update(11.0);
        let heat = s.heat_injection().expect("heat should be active at 13 s");
        assert_eq!(heat.target, HeatTarget::Motor);
        assert_relative_eq!(heat.rate, 0.55, epsilon = 1e-9);
        s.update(100.0);
        assert_relative_eq!(s.heat_injection().map(|h| h.rate).unwrap_or_default(), 0.7);
    }

    #[test]
    fn test_seeded_initial_states() {
        let mut state = VehicleState::new(&Default::default());
        BatteryOverheatScenario::new().apply_initial_state(&mut state);
        MotorOverheatScenario::new().apply_initial_state(&mut state);
        DegradedBatteryScenario::new().apply_initial_state(&mut state);
        CriticalLowBatteryScenario::new().apply_initial_state(&mut state);
        assert_eq!(state.battery_temp, 38.0);
        assert_eq!(state.motor_temp, 60.0);
        assert_eq!(state.state_of_health, 65.0);
        assert_eq!(state.state_of_charge, 8.0);
    }

    #[test]
    fn test_critical_low_phases() {
        let s = CriticalLowBatteryScenario::new();
        assert_eq!(s.target_speed(10.0), 100.0);
        assert_eq!(s.target_speed(90.0), 70.0);
        assert_eq!(s.target_speed(150.0), 40.0);
    }

    #[test]
    fn test_hv_latch_is_permanent_until_reset() {
        let mut s = HvFaultScenario::new();
        for _ in 0..299 {
            s.update(0.1);
        }
        assert!(!s.latches().hv_isolation);
        assert!(s.target_speed(s.elapsed()) > 60.0);

        s.update(0.2);
        assert!(s.latches().hv_isolation);
        assert!(s.target_speed(45.0) <= 30.0);
        assert_eq!(s.target_speed(61.0), 0.0);

        s.update(100.0);
        assert!(s.is_latched());

        s.reset();
        assert!(!s.is_latched());
        assert_eq!(s.elapsed(), 0.0);
    }
}
