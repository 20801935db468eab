//! Scenario catalogue for EVSim
//!
//! Driving, charging and fault-injection scenarios, plus [`ScenarioKind`]
//! for building them by key.

pub mod charging;
pub mod driving;
pub mod faults;

pub use charging::{ChargerLevel, ChargingScenario, DEFAULT_CHARGE_POWER_KW};
pub use driving::{
    AggressiveDriverScenario, CityCommuteScenario, EcoModeScenario, HighwayCruiseScenario,
    MixedUrbanHighwayScenario, SpiritedDriveScenario,
};
pub use faults::{
    BatteryOverheatScenario, CriticalLowBatteryScenario, DegradedBatteryScenario, HvFaultScenario,
    MotorOverheatScenario,
};

use evsim_core::scenario::Scenario;
use evsim_core::vehicle::DriveMode;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Elapsed scenario time
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct ScenarioClock {
    elapsed: f64,
}

impl ScenarioClock {
    pub(crate) fn elapsed(&self) -> f64 {
        self.elapsed
    }

    pub(crate) fn advance(&mut self, dt: f64) {
        if dt.is_finite() && dt > 0.0 {
            self.elapsed += dt;
        }
    }

    pub(crate) fn reset(&mut self) {
        self.elapsed = 0.0;
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
#[error("unknown scenario: {0}")]
pub struct UnknownScenario(pub String);

/// Every scenario the catalogue can build
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    CityCommute,
    HighwayCruise,
    EcoMode,
    SpiritedDrive,
    MixedUrbanHighway,
    Charging,
    AggressiveDriver,
    BatteryOverheat,
    MotorOverheat,
    DegradedBattery,
    CriticalLowBattery,
    HvFault,
}

impl ScenarioKind {
    pub const ALL: [ScenarioKind; 12] = [
        ScenarioKind::CityCommute,
        ScenarioKind::HighwayCruise,
        ScenarioKind::EcoMode,
        ScenarioKind::SpiritedDrive,
        ScenarioKind::MixedUrbanHighway,
        ScenarioKind::Charging,
        ScenarioKind::AggressiveDriver,
        ScenarioKind::BatteryOverheat,
        ScenarioKind::MotorOverheat,
        ScenarioKind::DegradedBattery,
        ScenarioKind::CriticalLowBattery,
        ScenarioKind::HvFault,
    ];

    pub fn key(&self) -> &'static str {
        match self {
            ScenarioKind::CityCommute => "city_commute",
            ScenarioKind::HighwayCruise => "highway_cruise",
            ScenarioKind::EcoMode => "eco_mode",
            ScenarioKind::SpiritedDrive => "spirited_drive",
            ScenarioKind::MixedUrbanHighway => "mixed_urban_highway",
            ScenarioKind::Charging => "charging",
            ScenarioKind::AggressiveDriver => "aggressive_driver",
            ScenarioKind::BatteryOverheat => "battery_overheat",
            ScenarioKind::MotorOverheat => "motor_overheat",
            ScenarioKind::DegradedBattery => "degraded_battery",
            ScenarioKind::CriticalLowBattery => "critical_low_battery",
            ScenarioKind::HvFault => "hv_fault",
        }
    }

    /// Build a fresh scenario. `charge_power_kw` only applies to charging.
    pub fn build(&self, charge_power_kw: Option<f64>) -> Box<dyn Scenario> {
        match self {
            ScenarioKind::CityCommute => Box::new(CityCommuteScenario::new()),
            ScenarioKind::HighwayCruise => Box::new(HighwayCruiseScenario::new()),
            ScenarioKind::EcoMode => Box::new(EcoModeScenario::new()),
            ScenarioKind::SpiritedDrive => Box::new(SpiritedDriveScenario::new()),
            ScenarioKind::MixedUrbanHighway => Box::new(MixedUrbanHighwayScenario::new()),
            ScenarioKind::Charging => Box::new(ChargingScenario::new(
                charge_power_kw.unwrap_or(DEFAULT_CHARGE_POWER_KW),
            )),
            ScenarioKind::AggressiveDriver => Box::new(AggressiveDriverScenario::new()),
            ScenarioKind::BatteryOverheat => Box::new(BatteryOverheatScenario::new()),
            ScenarioKind::MotorOverheat => Box::new(MotorOverheatScenario::new()),
            ScenarioKind::DegradedBattery => Box::new(DegradedBatteryScenario::new()),
            ScenarioKind::CriticalLowBattery => Box::new(CriticalLowBatteryScenario::new()),
            ScenarioKind::HvFault => Box::new(HvFaultScenario::new()),
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for ScenarioKind {
    type Err = UnknownScenario;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let key = s.trim().to_lowercase();
        ScenarioKind::ALL
            .into_iter()
            .find(|kind| kind.key() == key)
            .ok_or_else(|| UnknownScenario(s.to_string()))
    }
}

/// Catalogue entry
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScenarioInfo {
    pub key: String,
    pub name: String,
    pub description: String,
    pub drive_mode: DriveMode,
    pub duration_s: Option<f64>,
}

/// Describe every scenario, in catalogue order
pub fn catalogue() -> Vec<ScenarioInfo> {
    ScenarioKind::ALL
        .iter()
        .map(|kind| {
            let scenario = kind.build(None);
            ScenarioInfo {
                key: scenario.key().to_string(),
                name: scenario.name().to_string(),
                description: scenario.description().to_string(),
                drive_mode: scenario.drive_mode(),
                duration_s: scenario.duration(),
            }
        })
        .collect()
}
