//! Vehicle parameters and mutable simulation state

use serde::{Deserialize, Serialize};

/// Fixed vehicle body/powertrain class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VehicleProfile {
    #[default]
    FourWheeler,
    TwoWheeler,
}

/// Immutable vehicle parameters, chosen once at engine construction
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VehicleParameters {
    pub profile: VehicleProfile,
    /// Curb mass including driver (kg)
    pub mass_kg: f64,
    /// Peak motor power (kW)
    pub max_motor_power_kw: f64,
    pub drag_coefficient: f64,
    /// Frontal area (m²)
    pub frontal_area_m2: f64,
    pub rolling_resistance: f64,
    /// Motor RPM per km/h of road speed
    pub rpm_per_kmh: f64,
    pub max_rpm: f64,
    /// Usable pack capacity (kWh)
    pub battery_capacity_kwh: f64,
    pub max_charge_power_kw: f64,
    pub max_regen_power_kw: f64,
}

impl VehicleParameters {
    /// Default profile: 65 kWh passenger car
    pub fn four_wheeler() -> Self {
        Self {
            profile: VehicleProfile::FourWheeler,
            mass_kg: 1800.0,
            max_motor_power_kw: 150.0,
            drag_coefficient: 0.28,
            frontal_area_m2: 2.3,
            rolling_resistance: 0.010,
            rpm_per_kmh: 75.0,
            max_rpm: 16_000.0,
            battery_capacity_kwh: 65.0,
            max_charge_power_kw: 150.0,
            max_regen_power_kw: 100.0,
        }
    }

    /// Electric scooter / motorcycle
    pub fn two_wheeler() -> Self {
        Self {
            profile: VehicleProfile::TwoWheeler,
            mass_kg: 180.0,
            max_motor_power_kw: 12.0,
            drag_coefficient: 0.6,
            frontal_area_m2: 0.6,
            rolling_resistance: 0.015,
            rpm_per_kmh: 80.0,
            max_rpm: 9_000.0,
            battery_capacity_kwh: 3.5,
            max_charge_power_kw: 3.3,
            max_regen_power_kw: 3.0,
        }
    }

    pub fn for_profile(profile: VehicleProfile) -> Self {
        match profile {
            VehicleProfile::FourWheeler => Self::four_wheeler(),
            VehicleProfile::TwoWheeler => Self::two_wheeler(),
        }
    }
}

impl Default for VehicleParameters {
    fn default() -> Self {
        Self::four_wheeler()
    }
}

/// Driver-selected drive mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DriveMode {
    #[default]
    Normal,
    Eco,
    Sport,
    Park,
}

impl DriveMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            DriveMode::Normal => "Normal",
            DriveMode::Eco => "Eco",
            DriveMode::Sport => "Sport",
            DriveMode::Park => "Park",
        }
    }
}

/// Initial conditions applied whenever the engine state is reset
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InitialConditions {
    pub state_of_charge: f64,
    pub odometer_km: f64,
    /// Centre of the synthetic GPS loop
    pub origin_lat: f64,
    pub origin_lon: f64,
    /// Radius of the synthetic GPS loop in degrees
    pub path_radius_deg: f64,
}

impl Default for InitialConditions {
    fn default() -> Self {
        Self {
            state_of_charge: 80.0,
            odometer_km: 12_050.0,
            origin_lat: 28.6139,
            origin_lon: 77.2090,
            path_radius_deg: 0.02,
        }
    }
}

/// Mutable simulation state, owned exclusively by the engine.
///
/// Units: speeds in km/h, power in kW (negative = into the battery),
/// temperatures in °C, distances in km, charge/health in percent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VehicleState {
    // === Kinematics ===
    pub speed: f64,
    pub target_speed: f64,
    pub previous_speed: f64,

    // === Energy ===
    pub state_of_charge: f64,
    pub state_of_health: f64,
    pub power: f64,
    pub previous_power: f64,
    pub battery_voltage: f64,
    pub battery_current: f64,

    // === Thermal ===
    pub battery_temp: f64,
    pub motor_temp: f64,
    pub motor_rpm: f64,

    // === Odometry ===
    pub odometer: f64,
    pub trip_distance: f64,

    // === Derived ===
    pub efficiency_wh_per_km: f64,
    pub range_km: f64,

    // === Fault latches ===
    pub hv_fault: bool,
    pub motor_fault: bool,
    pub hv_isolation_fault: bool,
    pub abs_active: bool,
    pub tc_active: bool,
    pub seatbelt_warning: bool,

    // === Position ===
    pub latitude: f64,
    pub longitude: f64,
    pub heading: f64,
    pub path_angle: f64,

    // === Mode ===
    pub charging: bool,
    pub drive_mode: DriveMode,

    /// Total simulated seconds since the state was last reset
    pub sim_time: f64,
}

impl VehicleState {
    /// A parked vehicle at ambient temperature
    pub fn new(initial: &InitialConditions) -> Self {
        let soc = initial.state_of_charge.clamp(0.0, 100.0);
        let mut state = Self {
            speed: 0.0,
            target_speed: 0.0,
            previous_speed: 0.0,
            state_of_charge: soc,
            state_of_health: 100.0,
            power: 0.0,
            previous_power: 0.0,
            battery_voltage: nominal_voltage(soc),
            battery_current: 0.0,
            battery_temp: 25.0,
            motor_temp: 30.0,
            motor_rpm: 0.0,
            odometer: initial.odometer_km.max(0.0),
            trip_distance: 0.0,
            efficiency_wh_per_km: 0.0,
            range_km: 0.0,
            hv_fault: false,
            motor_fault: false,
            hv_isolation_fault: false,
            abs_active: false,
            tc_active: false,
            seatbelt_warning: false,
            latitude: initial.origin_lat,
            longitude: initial.origin_lon,
            heading: 0.0,
            path_angle: 0.0,
            charging: false,
            drive_mode: DriveMode::Normal,
            sim_time: 0.0,
        };
        state.place_on_path(initial);
        state
    }

    /// Recompute lat/lon/heading from the current path angle
    pub(crate) fn place_on_path(&mut self, initial: &InitialConditions) {
        let r = initial.path_radius_deg;
        self.latitude = initial.origin_lat + r * self.path_angle.sin();
        self.longitude = initial.origin_lon + r * self.path_angle.cos();
        self.heading = self.path_angle.to_degrees().rem_euclid(360.0);
    }

    /// Energy stored in the pack at the current charge (kWh)
    pub fn remaining_energy_kwh(&self, params: &VehicleParameters) -> f64 {
        self.state_of_charge / 100.0 * params.battery_capacity_kwh
    }
}

/// Open-circuit pack voltage for a given state of charge
pub fn nominal_voltage(soc: f64) -> f64 {
    320.0 + 0.8 * soc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_profile_matches_documented_fallback() {
        let p = VehicleParameters::default();
        assert_eq!(p.profile, VehicleProfile::FourWheeler);
        assert_eq!(p.battery_capacity_kwh, 65.0);
        assert_eq!(p.max_charge_power_kw, 150.0);
        assert_eq!(p.max_regen_power_kw, 100.0);
    }

    #[test]
    fn test_new_state_starts_on_gps_path() {
        let initial = InitialConditions::default();
        let state = VehicleState::new(&initial);
        // angle 0 sits on the loop, east of the origin
        assert_eq!(state.latitude, initial.origin_lat);
        assert!((state.longitude - (initial.origin_lon + 0.02)).abs() < 1e-12);
        assert_eq!(state.battery_voltage, 384.0);
    }
}
