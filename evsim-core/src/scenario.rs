//! Scenario trait definition
//!
//! A scenario is a time function: given elapsed scenario time it yields a
//! target speed, a power envelope, an acceleration rate and a drive mode.
//! Behaviour beyond that is opt-in through capability methods with inert
//! defaults, so the engine never needs to know which concrete scenario it
//! is running.

use crate::vehicle::{DriveMode, VehicleState};
use serde::Serialize;

/// Power envelope a scenario expects the drivetrain to stay within (kW)
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PowerRange {
    pub min_kw: f64,
    pub max_kw: f64,
}

impl PowerRange {
    pub const fn new(min_kw: f64, max_kw: f64) -> Self {
        Self { min_kw, max_kw }
    }

    /// Clamp a drive-power demand into the envelope
    pub fn clamp(&self, power_kw: f64) -> f64 {
        let (lo, hi) = if self.min_kw <= self.max_kw {
            (self.min_kw, self.max_kw)
        } else {
            (self.max_kw, self.min_kw)
        };
        power_kw.clamp(lo, hi)
    }
}

/// Which thermal mass receives injected heat
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HeatTarget {
    Battery,
    Motor,
}

/// Extra heat a scenario injects independent of driving load
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeatInjection {
    pub target: HeatTarget,
    /// °C per second
    pub rate: f64,
}

/// Latches a scenario reports to the engine each tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ScenarioLatches {
    /// HV isolation fault: caps target speed for the rest of the activation
    pub hv_isolation: bool,
}

/// Trait for vehicle behaviour scenarios
///
/// Lifecycle: constructed once, [`reset`](Scenario::reset) before each
/// activation, [`update`](Scenario::update) once per engine tick while
/// active. The host checks [`is_complete`](Scenario::is_complete) to decide
/// whether to stop or loop.
pub trait Scenario: Send + Sync {
    /// Stable identifier (e.g. "city_commute")
    fn key(&self) -> &str;

    /// Display name (e.g. "City Commute")
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Seconds since the last reset
    fn elapsed(&self) -> f64;

    /// Zero elapsed time and clear any latch
    fn reset(&mut self);

    /// Advance elapsed time and latch logic by `dt` seconds
    fn update(&mut self, dt: f64);

    /// Target speed (km/h) at scenario time `t`
    fn target_speed(&self, t: f64) -> f64;

    fn power_range(&self) -> PowerRange;

    /// Preferred acceleration (km/h/s)
    fn acceleration_rate(&self) -> f64;

    fn drive_mode(&self) -> DriveMode;

    /// Scenario length in seconds; `None` runs forever
    fn duration(&self) -> Option<f64> {
        None
    }

    fn is_complete(&self) -> bool {
        self.duration().map(|d| self.elapsed() >= d).unwrap_or(false)
    }

    // === Capabilities ===

    /// Seed the vehicle state at activation
    fn apply_initial_state(&self, _state: &mut VehicleState) {}

    /// Heat injected at the current elapsed time
    fn heat_injection(&self) -> Option<HeatInjection> {
        None
    }

    fn latches(&self) -> ScenarioLatches {
        ScenarioLatches::default()
    }

    /// Whether the engine should derive ABS/TC activity for this scenario
    fn reports_abs_tc(&self) -> bool {
        false
    }

    /// Charger power (kW, positive) when this scenario is a charging session
    fn charge_power(&self) -> Option<f64> {
        None
    }
}
