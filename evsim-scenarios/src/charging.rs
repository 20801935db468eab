//! Charging session scenario

use crate::ScenarioClock;
use evsim_core::scenario::{PowerRange, Scenario};
use evsim_core::vehicle::{DriveMode, VehicleState};

/// Used when a charging scenario is requested without a power
pub const DEFAULT_CHARGE_POWER_KW: f64 = 50.0;

const AC_LEVEL_1_BELOW_KW: f64 = 2.0;
const AC_LEVEL_2_BELOW_KW: f64 = 20.0;

/// Charger class derived from delivered power
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChargerLevel {
    AcLevel1,
    AcLevel2,
    DcFast,
}

impl ChargerLevel {
    pub fn for_power(power_kw: f64) -> Self {
        if power_kw < AC_LEVEL_1_BELOW_KW {
            ChargerLevel::AcLevel1
        } else if power_kw < AC_LEVEL_2_BELOW_KW {
            ChargerLevel::AcLevel2
        } else {
            ChargerLevel::DcFast
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ChargerLevel::AcLevel1 => "AC Level 1",
            ChargerLevel::AcLevel2 => "AC Level 2",
            ChargerLevel::DcFast => "DC Fast Charge",
        }
    }
}

/// Parked at a charger delivering a fixed power
///
/// The engine applies the taper curve and the vehicle's charge limit; this
/// scenario only states the charger's rating.
#[derive(Debug)]
pub struct ChargingScenario {
    clock: ScenarioClock,
    power_kw: f64,
    level: ChargerLevel,
}

impl ChargingScenario {
    pub fn new(power_kw: f64) -> Self {
        let power_kw = if power_kw.is_finite() && power_kw > 0.0 {
            power_kw
        } else {
            DEFAULT_CHARGE_POWER_KW
        };
        Self {
            clock: ScenarioClock::default(),
            power_kw,
            level: ChargerLevel::for_power(power_kw),
        }
    }

    pub fn level(&self) -> ChargerLevel {
        self.level
    }
}

impl Default for ChargingScenario {
    fn default() -> Self {
        Self::new(DEFAULT_CHARGE_POWER_KW)
    }
}

impl Scenario for ChargingScenario {
    fn key(&self) -> &str {
        "charging"
    }

    fn name(&self) -> &str {
        self.level.name()
    }

    fn description(&self) -> &str {
        "Parked and plugged in; charge power tapers above 80 %"
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

    fn target_speed(&self, _t: f64) -> f64 {
        0.0
    }

    fn power_range(&self) -> PowerRange {
        PowerRange::new(-self.power_kw, -self.power_kw)
    }

    fn acceleration_rate(&self) -> f64 {
        2.0
    }

    fn drive_mode(&self) -> DriveMode {
        DriveMode::Park
    }

    fn duration(&self) -> Option<f64> {
        Some(600.0)
    }

    fn apply_initial_state(&self, state: &mut VehicleState) {
        state.charging = true;
    }

    fn charge_power(&self) -> Option<f64> {
        Some(self.power_kw)
    }
}
