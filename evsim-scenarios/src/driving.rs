//! Everyday driving scenarios
//!
//! Each scenario is a pure function of elapsed time. Cycles repeat, so a
//! scenario left running past its duration keeps producing sensible targets.

use crate::ScenarioClock;
use evsim_core::scenario::{PowerRange, Scenario};
use evsim_core::vehicle::{DriveMode, VehicleState};

// =============================================================================
// City Commute: stop, gentle pull-away, cruise, roll to a stop
// =============================================================================

const COMMUTE_CYCLE_S: f64 = 50.0;
const COMMUTE_STOP_S: f64 = 12.0;
const COMMUTE_ACCEL_END_S: f64 = 20.0;
const COMMUTE_CRUISE_END_S: f64 = 45.0;
const COMMUTE_CRUISE_KMH: f64 = 45.0;

/// Target speed of the 50 s commute cycle
pub(crate) fn commute_target(t: f64) -> f64 {
    let p = t.max(0.0) % COMMUTE_CYCLE_S;
    if p < COMMUTE_STOP_S {
        0.0
    } else if p < COMMUTE_ACCEL_END_S {
        COMMUTE_CRUISE_KMH * (p - COMMUTE_STOP_S) / (COMMUTE_ACCEL_END_S - COMMUTE_STOP_S)
    } else if p < COMMUTE_CRUISE_END_S {
        COMMUTE_CRUISE_KMH
    } else {
        let decel = (p - COMMUTE_CRUISE_END_S) / (COMMUTE_CYCLE_S - COMMUTE_CRUISE_END_S);
        COMMUTE_CRUISE_KMH * (1.0 - decel)
    }
}

#[derive(Debug, Default)]
pub struct CityCommuteScenario {
    clock: ScenarioClock,
}

impl CityCommuteScenario {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scenario for CityCommuteScenario {
    fn key(&self) -> &str {
        "city_commute"
    }

    fn name(&self) -> &str {
        "City Commute"
    }

    fn description(&self) -> &str {
        "Stop-and-go city traffic: 12 s at a light, pull away to 45 km/h, cruise, stop"
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
}

// =============================================================================
// Highway Cruise
// =============================================================================

const HIGHWAY_RAMP_S: f64 = 20.0;
const HIGHWAY_CRUISE_KMH: f64 = 95.0;

#[derive(Debug, Default)]
pub struct HighwayCruiseScenario {
    clock: ScenarioClock,
}

impl HighwayCruiseScenario {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scenario for HighwayCruiseScenario {
    fn key(&self) -> &str {
        "highway_cruise"
    }

    fn name(&self) -> &str {
        "Highway Cruise"
    }

    fn description(&self) -> &str {
        "Merge onto the highway and hold 95 km/h with light speed variation"
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
        if t < HIGHWAY_RAMP_S {
            HIGHWAY_CRUISE_KMH * t.max(0.0) / HIGHWAY_RAMP_S
        } else {
            HIGHWAY_CRUISE_KMH + 0.8 * (0.2 * t).sin()
        }
    }

    fn power_range(&self) -> PowerRange {
        PowerRange::new(5.0, 80.0)
    }

    fn acceleration_rate(&self) -> f64 {
        3.0
    }

    fn drive_mode(&self) -> DriveMode {
        DriveMode::Normal
    }

    fn duration(&self) -> Option<f64> {
        Some(300.0)
    }
}

// =============================================================================
// Eco Mode
// =============================================================================

#[derive(Debug, Default)]
pub struct EcoModeScenario {
    clock: ScenarioClock,
}

impl EcoModeScenario {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scenario for EcoModeScenario {
    fn key(&self) -> &str {
        "eco_mode"
    }

    fn name(&self) -> &str {
        "Eco Mode"
    }

    fn description(&self) -> &str {
        "Gentle 25 s ramp to a steady 60 km/h"
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
        if t < 25.0 {
            60.0 * t.max(0.0) / 25.0
        } else {
            60.0
        }
    }

    fn power_range(&self) -> PowerRange {
        PowerRange::new(0.0, 40.0)
    }

    fn acceleration_rate(&self) -> f64 {
        1.5
    }

    fn drive_mode(&self) -> DriveMode {
        DriveMode::Eco
    }

    fn duration(&self) -> Option<f64> {
        Some(300.0)
    }
}

// =============================================================================
// Spirited Drive: repeated 35 s pull, hold, lift
// =============================================================================

const SPIRITED_PHASE_S: f64 = 35.0;
const SPIRITED_PEAK_KMH: f64 = 110.0;
const SPIRITED_FLOOR_KMH: f64 = SPIRITED_PEAK_KMH * 0.7;

#[derive(Debug, Default)]
pub struct SpiritedDriveScenario {
    clock: ScenarioClock,
}

impl SpiritedDriveScenario {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scenario for SpiritedDriveScenario {
    fn key(&self) -> &str {
        "spirited_drive"
    }

    fn name(&self) -> &str {
        "Spirited Drive"
    }

    fn description(&self) -> &str {
        "Hard pulls to 110 km/h, a short hold, then lifting to 77 km/h"
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
        let t = t.max(0.0);
        let p = t % SPIRITED_PHASE_S;
        // First pull starts from rest, later ones from the lift-off floor
        let start = if t < SPIRITED_PHASE_S { 0.0 } else { SPIRITED_FLOOR_KMH };
        if p < 10.0 {
            start + (SPIRITED_PEAK_KMH - start) * p / 10.0
        } else if p < 22.0 {
            SPIRITED_PEAK_KMH
        } else {
            SPIRITED_PEAK_KMH - (SPIRITED_PEAK_KMH - SPIRITED_FLOOR_KMH) * (p - 22.0) / 13.0
        }
    }

    fn power_range(&self) -> PowerRange {
        PowerRange::new(20.0, 150.0)
    }

    fn acceleration_rate(&self) -> f64 {
        4.5
    }

    fn drive_mode(&self) -> DriveMode {
        DriveMode::Sport
    }

    fn duration(&self) -> Option<f64> {
        Some(210.0)
    }
}

// =============================================================================
// Mixed Urban / Highway
// =============================================================================

const MIXED_SEGMENT_S: f64 = 50.0;
const MIXED_URBAN_S: f64 = 25.0;
const MIXED_TRANSITION_S: f64 = 8.0;
const MIXED_URBAN_KMH: f64 = 40.0;
const MIXED_HIGHWAY_KMH: f64 = 90.0;

#[derive(Debug, Default)]
pub struct MixedUrbanHighwayScenario {
    clock: ScenarioClock,
}

impl MixedUrbanHighwayScenario {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scenario for MixedUrbanHighwayScenario {
    fn key(&self) -> &str {
        "mixed_urban_highway"
    }

    fn name(&self) -> &str {
        "Mixed Urban/Highway"
    }

    fn description(&self) -> &str {
        "25 s of urban driving at 40 km/h, an on-ramp, then highway at 90 km/h"
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
        let p = t.max(0.0) % MIXED_SEGMENT_S;
        if p < MIXED_URBAN_S {
            MIXED_URBAN_KMH
        } else if p < MIXED_URBAN_S + MIXED_TRANSITION_S {
            let f = (p - MIXED_URBAN_S) / MIXED_TRANSITION_S;
            MIXED_URBAN_KMH + (MIXED_HIGHWAY_KMH - MIXED_URBAN_KMH) * f
        } else {
            MIXED_HIGHWAY_KMH
        }
    }

    fn power_range(&self) -> PowerRange {
        PowerRange::new(0.0, 90.0)
    }

    fn acceleration_rate(&self) -> f64 {
        3.0
    }

    fn drive_mode(&self) -> DriveMode {
        DriveMode::Normal
    }

    fn duration(&self) -> Option<f64> {
        Some(300.0)
    }
}

// =============================================================================
// Aggressive Driver: bursts, hard braking, erratic cruising
// =============================================================================

const AGGRESSIVE_CYCLE_S: f64 = 40.0;

#[derive(Debug, Default)]
pub struct AggressiveDriverScenario {
    clock: ScenarioClock,
}

impl AggressiveDriverScenario {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Scenario for AggressiveDriverScenario {
    fn key(&self) -> &str {
        "aggressive_driver"
    }

    fn name(&self) -> &str {
        "Aggressive Driver"
    }

    fn description(&self) -> &str {
        "160-180 km/h bursts, hard braking and erratic cruising; unbuckled driver"
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
        let p = t.max(0.0) % AGGRESSIVE_CYCLE_S;
        match p {
            p if p < 8.0 => 170.0 + 10.0 * (0.8 * t).sin(),
            p if p < 12.0 => 20.0,
            p if p < 20.0 => 80.0 + 25.0 * (0.6 * t).sin(),
            p if p < 28.0 => 175.0 + 5.0 * t.sin(),
            p if p < 32.0 => 5.0,
            _ => 60.0 + 30.0 * (0.9 * t).sin(),
        }
    }

    fn power_range(&self) -> PowerRange {
        PowerRange::new(0.0, 150.0)
    }

    fn acceleration_rate(&self) -> f64 {
        8.0
    }

    fn drive_mode(&self) -> DriveMode {
        DriveMode::Sport
    }

    fn duration(&self) -> Option<f64> {
        Some(240.0)
    }

    fn apply_initial_state(&self, state: &mut VehicleState) {
        state.seatbelt_warning = true;
    }

    fn reports_abs_tc(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_commute_cycle_shape() {
        assert_eq!(commute_target(0.0), 0.0);
        assert_eq!(commute_target(6.0), 0.0);
        assert_relative_eq!(commute_target(16.0), 22.5);
        assert_eq!(commute_target(20.0), 45.0);
        assert_eq!(commute_target(44.9), 45.0);
        assert_relative_eq!(commute_target(47.5), 22.5);
        // Next cycle starts stopped again
        assert_eq!(commute_target(56.0), 0.0);
    }

    #[test]
    fn test_highway_ramp_then_cruise() {
        let s = HighwayCruiseScenario::new();
        assert_relative_eq!(s.target_speed(10.0), 47.5);
        for t in [25.0, 60.0, 123.4] {
            let v = s.target_speed(t);
            assert!((94.2..=95.8).contains(&v), "cruise out of band at t={}: {}", t, v);
        }
    }

    #[test]
    fn test_spirited_phases() {
        let s = SpiritedDriveScenario::new();
        assert_relative_eq!(s.target_speed(5.0), 55.0);
        assert_eq!(s.target_speed(15.0), 110.0);
        assert_relative_eq!(s.target_speed(34.999_999), 77.0, epsilon = 1e-4);
        // Second pull starts from 77, not from rest
        assert_relative_eq!(s.target_speed(35.0), 77.0);
        assert_relative_eq!(s.target_speed(40.0), 93.5);
        assert_eq!(s.drive_mode(), DriveMode::Sport);
    }

    #[test]
    fn test_mixed_segments() {
        let s = MixedUrbanHighwayScenario::new();
        assert_eq!(s.target_speed(10.0), 40.0);
        assert_relative_eq!(s.target_speed(29.0), 65.0);
        assert_eq!(s.target_speed(40.0), 90.0);
        assert_eq!(s.target_speed(60.0), 40.0);
    }

    #[test]
    fn test_aggressive_seeds_seatbelt_and_reports_abs_tc() {
        let s = AggressiveDriverScenario::new();
        let mut state = VehicleState::new(&Default::default());
        s.apply_initial_state(&mut state);
        assert!(state.seatbelt_warning);
        assert!(s.reports_abs_tc());
        assert_eq!(s.target_speed(10.0), 20.0);
        assert_eq!(s.target_speed(30.0), 5.0);
        assert!(s.target_speed(4.0) >= 160.0);
    }

    #[test]
    fn test_clock_advances_and_resets() {
        let mut s = EcoModeScenario::new();
        s.update(1.5);
        s.update(1.0);
        assert_relative_eq!(s.elapsed(), 2.5);
        s.reset();
        assert_eq!(s.elapsed(), 0.0);
    }
}
