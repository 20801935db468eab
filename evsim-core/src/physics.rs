//! Longitudinal vehicle physics
//!
//! Pure functions over fixed [`VehicleParameters`]: consumption power from
//! aerodynamic drag and rolling resistance, regenerative braking power and
//! motor RPM. No state beyond the parameters.

use crate::vehicle::VehicleParameters;

pub const AIR_DENSITY: f64 = 1.225; // kg/m³
pub const GRAVITY: f64 = 9.81; // m/s²

/// Draw below the idle threshold (kW)
pub const IDLE_POWER_KW: f64 = 1.0;
const IDLE_SPEED_KMH: f64 = 0.5;

/// Extra kW per km/h/s of acceleration, and its ceiling
const ACCEL_POWER_PER_UNIT: f64 = 5.0;
const ACCEL_POWER_CAP_KW: f64 = 30.0;

/// Cruise band edges (km/h). Scenario power envelopes are tuned against these.
pub const CITY_BAND_KMH: f64 = 40.0;
pub const HIGHWAY_BAND_KMH: f64 = 80.0;

const REGEN_GAIN: f64 = 4.0;
const REGEN_CAP_KW: f64 = 15.0;
const REGEN_FLOOR_KW: f64 = 2.0;
const REGEN_MIN_SPEED_KMH: f64 = 3.0;

#[derive(Debug, Clone, Copy)]
pub struct PhysicsModel {
    params: VehicleParameters,
}

impl PhysicsModel {
    pub fn new(params: VehicleParameters) -> Self {
        Self { params }
    }

    pub fn params(&self) -> &VehicleParameters {
        &self.params
    }

    /// Drag plus rolling resistance power at a steady speed (kW)
    pub fn road_load_power(&self, speed_kmh: f64) -> f64 {
        let v = speed_kmh.max(0.0) / 3.6;
        let p = &self.params;
        let drag_w = 0.5 * AIR_DENSITY * p.drag_coefficient * p.frontal_area_m2 * v.powi(3);
        let rolling_w = p.rolling_resistance * p.mass_kg * GRAVITY * v;
        (drag_w + rolling_w) / 1000.0
    }

    /// Battery-side consumption power (kW).
    ///
    /// `accel_amount` is the current acceleration in km/h/s; it only matters
    /// when `is_accelerating` is set.
    pub fn consumption_power(&self, speed_kmh: f64, is_accelerating: bool, accel_amount: f64) -> f64 {
        if speed_kmh < IDLE_SPEED_KMH {
            return IDLE_POWER_KW;
        }

        let base = self.road_load_power(speed_kmh);
        let max_power = self.params.max_motor_power_kw;

        if is_accelerating {
            let accel_power = (accel_amount.max(0.0) * ACCEL_POWER_PER_UNIT).min(ACCEL_POWER_CAP_KW);
            return (base + accel_power).min(max_power);
        }

        // Drivetrain and auxiliary losses grow with speed; each band's offset
        // starts where the previous one ends so the curve has no steps.
        let offset = if speed_kmh < CITY_BAND_KMH {
            1.0 + 0.05 * speed_kmh
        } else if speed_kmh < HIGHWAY_BAND_KMH {
            3.0 + 0.025 * (speed_kmh - CITY_BAND_KMH)
        } else {
            4.0 + 0.02 * (speed_kmh - HIGHWAY_BAND_KMH)
        };

        (base + offset).min(max_power)
    }

    /// Power recovered by regenerative braking (kW, positive).
    ///
    /// `decel_rate` is in km/h/s. Negligible recovery reports as zero so the
    /// regen indicator does not flicker.
    pub fn regen_power(&self, speed_kmh: f64, decel_rate: f64) -> f64 {
        if decel_rate <= 0.0 || speed_kmh < REGEN_MIN_SPEED_KMH {
            return 0.0;
        }

        let speed_factor = (speed_kmh / 100.0).min(1.0);
        let raw = decel_rate * speed_factor * REGEN_GAIN;
        if raw <= 1.0 {
            return 0.0;
        }

        raw.clamp(REGEN_FLOOR_KW, REGEN_CAP_KW)
            .min(self.params.max_regen_power_kw)
    }

    pub fn motor_rpm(&self, speed_kmh: f64) -> f64 {
        if speed_kmh < 0.1 {
            return 0.0;
        }
        (speed_kmh * self.params.rpm_per_kmh).min(self.params.max_rpm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn car() -> PhysicsModel {
        PhysicsModel::new(VehicleParameters::four_wheeler())
    }

    #[test]
    fn test_idle_below_half_kmh() {
        assert_eq!(car().consumption_power(0.3, true, 10.0), IDLE_POWER_KW);
        assert_eq!(car().consumption_power(0.0, false, 0.0), IDLE_POWER_KW);
    }

    #[test]
    fn test_road_load_grows_with_speed() {
        let m = car();
        let p50 = m.road_load_power(50.0);
        let p100 = m.road_load_power(100.0);
        assert!(p100 > 2.0 * p50);
        // 100 km/h: ~8.45 kW drag + ~4.9 kW rolling
        assert_relative_eq!(p100, 13.36, epsilon = 0.05);
    }

    #[test]
    fn test_acceleration_power_capped_independently() {
        let m = car();
        let base = m.road_load_power(60.0);
        assert_relative_eq!(m.consumption_power(60.0, true, 2.0), base + 10.0, epsilon = 1e-9);
        assert_relative_eq!(m.consumption_power(60.0, true, 50.0), base + 30.0, epsilon = 1e-9);
    }

    #[test]
    fn test_consumption_capped_at_max_power() {
        let m = PhysicsModel::new(VehicleParameters::two_wheeler());
        assert_eq!(m.consumption_power(200.0, true, 10.0), 12.0);
    }

    #[test]
    fn test_cruise_bands_are_continuous() {
        let m = car();
        for edge in [CITY_BAND_KMH, HIGHWAY_BAND_KMH] {
            let below = m.consumption_power(edge - 1e-6, false, 0.0);
            let at = m.consumption_power(edge, false, 0.0);
            assert!((at - below).abs() < 1e-3, "step at {} km/h: {} -> {}", edge, below, at);
        }
    }

    #[test]
    fn test_regen_thresholds() {
        let m = car();
        assert_eq!(m.regen_power(50.0, 0.0), 0.0);
        assert_eq!(m.regen_power(2.0, 5.0), 0.0);
        // raw = 1 * 0.2 * 4 = 0.8 -> negligible
        assert_eq!(m.regen_power(20.0, 1.0), 0.0);
        // raw = 1 * 0.4 * 4 = 1.6 -> floored to 2
        assert_eq!(m.regen_power(40.0, 1.0), 2.0);
        // raw = 6 * 1.0 * 4 = 24 -> capped
        assert_eq!(m.regen_power(130.0, 6.0), 15.0);
    }

    #[test]
    fn test_motor_rpm() {
        let m = car();
        assert_eq!(m.motor_rpm(0.05), 0.0);
        assert_eq!(m.motor_rpm(100.0), 7500.0);
        assert_eq!(m.motor_rpm(400.0), 16_000.0);
    }
}
