//! Type-safe wrappers for physical units
//!
//! The engine integrates in plain `f64` for speed; these newtypes exist at
//! the telemetry boundary so consumers cannot confuse kW with kWh or km/h
//! with km.
//!
//! All unit types serialize with 2 decimal places to keep snapshots compact.

use serde::{Deserialize, Serialize};

/// Round f64 to 2 decimal places for compact JSON serialization
fn round2<S: serde::Serializer>(val: &f64, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_f64((*val * 100.0).round() / 100.0)
}

/// Kilometres per hour
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct KilometersPerHour(#[serde(serialize_with = "round2")] pub f64);

impl KilometersPerHour {
    pub fn to_meters_per_second(self) -> f64 {
        self.0 / 3.6
    }
}

/// Kilometres (distance)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Kilometers(#[serde(serialize_with = "round2")] pub f64);

/// Kilowatts. Negative values mean energy flowing into the battery.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Kilowatts(#[serde(serialize_with = "round2")] pub f64);

/// Kilowatt-hours
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct KilowattHours(#[serde(serialize_with = "round2")] pub f64);

/// Watt-hours per kilometre (consumption)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct WattHoursPerKm(#[serde(serialize_with = "round2")] pub f64);

/// Celsius
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Celsius(#[serde(serialize_with = "round2")] pub f64);

/// Volts
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Volts(#[serde(serialize_with = "round2")] pub f64);

/// Amperes. Sign follows power.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Amperes(#[serde(serialize_with = "round2")] pub f64);

/// Revolutions per minute
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Rpm(#[serde(serialize_with = "round2")] pub f64);

/// Percentage (0.0 to 100.0)
///
/// Unlike a unit fraction, battery quantities are reported on a 0-100 scale.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Percent(#[serde(serialize_with = "round2")] pub f64);

impl Percent {
    /// Create a new percentage, clamping to [0.0, 100.0]
    pub fn new(value: f64) -> Self {
        Self(value.clamp(0.0, 100.0))
    }

    /// Get as a unit fraction (0-1)
    pub fn as_fraction(&self) -> f64 {
        self.0 / 100.0
    }
}

/// Degrees (GPS coordinates, heading)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Degrees(pub f64);

/// Seconds (simulated time, durations)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
pub struct Seconds(#[serde(serialize_with = "round2")] pub f64);
