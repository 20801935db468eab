//! Telemetry snapshot model
//!
//! A [`TelemetrySnapshot`] is a full copy of the vehicle state taken after a
//! tick, plus warning flags derived fresh from that state. Warning thresholds
//! sit below the engine's enforcement thresholds so the driver sees a warning
//! before a fault latches.

use crate::range::RangeEstimates;
use crate::units::*;
use crate::vehicle::{DriveMode, VehicleState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::str::FromStr;

/// Derived warning flags, recomputed for every snapshot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WarningFlags {
    pub bms_warning: bool,
    pub hv_warning: bool,
    pub temp_warning: bool,
    pub motor_fault: bool,
    pub reduced_power: bool,
}

impl WarningFlags {
    pub fn from_state(state: &VehicleState) -> Self {
        let soc = state.state_of_charge;
        let soh = state.state_of_health;
        let batt = state.battery_temp;
        let motor = state.motor_temp;
        let hv = state.hv_fault || state.hv_isolation_fault;
        Self {
            bms_warning: batt > 45.0 || soc < 5.0 || soh < 75.0,
            hv_warning: hv,
            temp_warning: batt > 42.0 || motor > 75.0,
            motor_fault: motor > 85.0 || state.motor_fault,
            reduced_power: batt > 45.0 || motor > 80.0 || soc < 10.0 || hv,
        }
    }
}

/// Values tracked outside [`VehicleState`] that travel with each snapshot
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SnapshotExtras {
    pub scenario_key: Option<String>,
    pub scenario_name: Option<String>,
    pub scenario_elapsed: f64,
    pub time_to_full_min: u32,
    pub energy_added_kwh: f64,
    pub trip_energy_kwh: f64,
    pub avg_consumption_kwh_100km: f64,
    pub range_estimates: RangeEstimates,
}

/// One tick's worth of telemetry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TelemetrySnapshot {
    pub timestamp: DateTime<Utc>,
    /// Engine tick counter
    pub sequence: u64,
    pub sim_time: Seconds,

    // === Scenario ===
    pub scenario: Option<String>,
    pub scenario_name: Option<String>,
    pub scenario_elapsed: Seconds,

    // === Motion ===
    pub speed: KilometersPerHour,
    pub target_speed: KilometersPerHour,
    pub motor_rpm: Rpm,
    pub drive_mode: DriveMode,

    // === Battery ===
    pub soc: Percent,
    pub soh: Percent,
    pub power: Kilowatts,
    pub battery_voltage: Volts,
    pub battery_current: Amperes,
    pub battery_temp: Celsius,
    pub motor_temp: Celsius,
    pub charging: bool,
    pub time_to_full_min: u32,
    pub energy_added: KilowattHours,

    // === Range / efficiency ===
    pub range: Kilometers,
    pub efficiency: WattHoursPerKm,
    pub range_optimistic: Kilometers,
    pub range_realistic: Kilometers,
    pub range_pessimistic: Kilometers,
    pub trip_energy: KilowattHours,
    pub avg_consumption_kwh_100km: f64,

    // === Odometry ===
    pub odometer: Kilometers,
    pub trip_distance: Kilometers,

    // === Position ===
    pub lat: Degrees,
    pub lon: Degrees,
    pub heading: Degrees,

    // === Indicators ===
    pub ready: bool,
    pub parking: bool,
    pub abs: bool,
    pub tc: bool,
    pub seatbelt: bool,
    pub hv_fault: bool,
    pub hv_isolation_fault: bool,
    pub warnings: WarningFlags,
}

impl TelemetrySnapshot {
    pub fn from_state(state: &VehicleState, sequence: u64, extras: &SnapshotExtras) -> Self {
        Self {
            timestamp: Utc::now(),
            sequence,
            sim_time: Seconds(state.sim_time),
            scenario: extras.scenario_key.clone(),
            scenario_name: extras.scenario_name.clone(),
            scenario_elapsed: Seconds(extras.scenario_elapsed),
            speed: KilometersPerHour(state.speed),
            target_speed: KilometersPerHour(state.target_speed),
            motor_rpm: Rpm(state.motor_rpm),
            drive_mode: state.drive_mode,
            soc: Percent::new(state.state_of_charge),
            soh: Percent::new(state.state_of_health),
            power: Kilowatts(state.power),
            battery_voltage: Volts(state.battery_voltage),
            battery_current: Amperes(state.battery_current),
            battery_temp: Celsius(state.battery_temp),
            motor_temp: Celsius(state.motor_temp),
            charging: state.charging,
            time_to_full_min: extras.time_to_full_min,
            energy_added: KilowattHours(extras.energy_added_kwh),
            range: Kilometers(state.range_km),
            efficiency: WattHoursPerKm(state.efficiency_wh_per_km),
            range_optimistic: Kilometers(extras.range_estimates.optimistic_km),
            range_realistic: Kilometers(extras.range_estimates.realistic_km),
            range_pessimistic: Kilometers(extras.range_estimates.pessimistic_km),
            trip_energy: KilowattHours(extras.trip_energy_kwh),
            avg_consumption_kwh_100km: extras.avg_consumption_kwh_100km,
            odometer: Kilometers(state.odometer),
            trip_distance: Kilometers(state.trip_distance),
            lat: Degrees(state.latitude),
            lon: Degrees(state.longitude),
            heading: Degrees(state.heading),
            ready: !(state.hv_fault || state.hv_isolation_fault),
            parking: state.speed < 0.1,
            abs: state.abs_active,
            tc: state.tc_active,
            seatbelt: state.seatbelt_warning,
            hv_fault: state.hv_fault,
            hv_isolation_fault: state.hv_isolation_fault,
            warnings: WarningFlags::from_state(state),
        }
    }
}

// === Field Masking for Selective Output ===

/// Specifies which fields to include in serialized output
///
/// Consumers that only chart a handful of values can ask for just those.
#[derive(Debug, Clone, Default)]
pub struct FieldMask {
    fields: HashSet<String>,
    include_all: bool,
}

impl FieldMask {
    /// Create a mask that includes all fields
    pub fn all() -> Self {
        Self {
            fields: HashSet::new(),
            include_all: true,
        }
    }

    /// Create a mask from a comma-separated list of field names
    pub fn parse(fields: &str) -> Self {
        let fields: HashSet<String> = fields
            .split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            fields,
            include_all: false,
        }
    }

    /// Check if a field should be included
    pub fn includes(&self, field: &str) -> bool {
        self.include_all || self.fields.contains(&field.to_lowercase())
    }

    /// Check if all fields should be included
    pub fn is_all(&self) -> bool {
        self.include_all
    }
}

impl FromStr for FieldMask {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::parse(s))
    }
}

/// Fields kept regardless of the mask
const ALWAYS_INCLUDED: [&str; 2] = ["timestamp", "sequence"];

impl TelemetrySnapshot {
    /// Serialize this snapshot respecting the given field mask
    ///
    /// `timestamp` and `sequence` are always present so consumers can order
    /// frames.
    pub fn to_json_filtered(&self, mask: Option<&FieldMask>) -> serde_json::Result<String> {
        let mask = match mask {
            Some(m) if !m.is_all() => m,
            _ => return serde_json::to_string(self),
        };

        let value = serde_json::to_value(self)?;
        let mut map = serde_json::Map::new();
        if let serde_json::Value::Object(fields) = value {
            for (key, v) in fields {
                if ALWAYS_INCLUDED.contains(&key.as_str()) || mask.includes(&key) {
                    map.insert(key, v);
                }
            }
        }
        serde_json::to_string(&map)
    }
}
