//! Fixed-timestep simulation engine
//!
//! [`SimulationEngine::tick`] runs one ordered pipeline over the owned
//! [`VehicleState`]:
//!
//! 1. advance the scenario, derive and sanitize the target speed, latch
//!    scenario faults, derive ABS/TC from demanded acceleration
//! 2. rate-limit speed toward the target
//! 3. rate-limit motor RPM
//! 4. pick exactly one power path (scenario charge, manual charge, regen,
//!    drive, idle) and move charge at that power
//! 5. scenario heat injection
//! 6. passive cooling
//! 7. clamp temperatures to their operating bands
//! 8. enforcement: thermal trip, empty pack, overcharge, HV fault, limp mode;
//!    RPM follows any speed the enforcement overrides
//! 9. odometry, then battery voltage/current, health decay, charge clamp,
//!    efficiency/range, GPS, and previous-value bookkeeping
//!
//! Enforcement sees the charge level this tick ends with, so a pack that
//! empties or fills mid-tick has its power zeroed in that same tick. An
//! empty pack gives nothing and a full pack takes nothing. The engine never
//! clocks itself; the host calls `tick`.

use crate::charging::{charge_taper, ChargeSession};
use crate::config::SimConfig;
use crate::error::SimError;
use crate::model::{SnapshotExtras, TelemetrySnapshot};
use crate::physics::{PhysicsModel, IDLE_POWER_KW};
use crate::range::{RangePredictor, TripMeter};
use crate::scenario::{HeatTarget, Scenario};
use crate::smoothing::smooth_transition;
use crate::vehicle::{nominal_voltage, DriveMode, InitialConditions, VehicleParameters, VehicleState};
use tracing::{debug, info, warn};

// Speed approach (km/h/s)
pub const MAX_ACCEL_RATE: f64 = 5.0;
pub const MAX_DECEL_RATE: f64 = 6.0;
const DECEL_RATE_FACTOR: f64 = 1.5;
const MICRO_ADJUST_RATE: f64 = 1.0;
const SPEED_DEADBAND: f64 = 0.5;
const DEFAULT_ACCEL_RATE: f64 = 2.0;

// Ramp limits
pub const RPM_RATE: f64 = 500.0; // RPM/s
pub const CHARGE_RAMP_KW_S: f64 = 20.0;
pub const REGEN_RAMP_KW_S: f64 = 15.0;
pub const DRIVE_RAMP_KW_S: f64 = 10.0;
pub const IDLE_RAMP_KW_S: f64 = 2.0;
pub const VOLTAGE_RATE: f64 = 5.0; // V/s

// Power path selection
const REGEN_DECEL_THRESHOLD: f64 = 0.5; // km/h/s
const DRIVE_SPEED_THRESHOLD: f64 = 0.5; // km/h
const REGEN_EFFICIENCY: f64 = 0.75;
const LEGACY_CHARGE_KW: f64 = 11.0;

// Thermal
const MOTOR_HEAT_RATE: f64 = 0.8; // °C/s at full power
const BATTERY_HEAT_RATE: f64 = 0.5; // °C/s at full power above the threshold
const BATTERY_HEAT_THRESHOLD_KW: f64 = 20.0;
const CHARGE_HEAT_PER_KW: f64 = 0.001; // °C/s per kW
const LEGACY_CHARGE_HEAT: f64 = 0.01; // °C/s
const ACTIVE_COOLING_START: f64 = 35.0;
const ACTIVE_COOLING_RATE: f64 = 0.2;
const PASSIVE_COOLING_BELOW_KW: f64 = 10.0;
const MOTOR_AMBIENT: f64 = 25.0;
const MOTOR_COOLING_RATE: f64 = 0.15;
const BATTERY_AMBIENT: f64 = 22.0;
const BATTERY_COOLING_RATE: f64 = 0.08;
pub const MOTOR_TEMP_BAND: (f64, f64) = (20.0, 150.0);
pub const BATTERY_TEMP_BAND: (f64, f64) = (15.0, 90.0);

// Enforcement
pub const MOTOR_TRIP_TEMP: f64 = 130.0;
pub const BATTERY_TRIP_TEMP: f64 = 70.0;
const DEPLETED_COAST_RATE: f64 = 2.0;
const HV_COAST_RATE: f64 = 3.0;
pub const LIMP_POWER_KW: f64 = 20.0;
pub const LIMP_SPEED_KMH: f64 = 30.0;
pub const ISOLATION_SPEED_CAP_KMH: f64 = 30.0;

// ABS/TC from demanded acceleration over a one second horizon
const ABS_DECEL_THRESHOLD: f64 = 8.0;
const TC_ACCEL_THRESHOLD: f64 = 10.0;

const SOH_DECAY_PER_S: f64 = 0.00001;
pub const DEFAULT_EFFICIENCY_WH_KM: f64 = 150.0;

const DEBUG_LOG_EVERY: u64 = 100;

/// Which power path a tick took
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerPath {
    ScenarioCharge,
    ManualCharge,
    Regen,
    Drive,
    Idle,
}

impl PowerPath {
    fn is_charging(self) -> bool {
        matches!(self, PowerPath::ScenarioCharge | PowerPath::ManualCharge)
    }
}

/// Owns the vehicle state and the active scenario
pub struct SimulationEngine {
    physics: PhysicsModel,
    initial: InitialConditions,
    state: VehicleState,
    scenario: Option<Box<dyn Scenario>>,
    paused: bool,
    manual_charging: bool,
    manual_target_speed: f64,
    sequence: u64,
    last_path: PowerPath,
    charge_session: ChargeSession,
    range_predictor: RangePredictor,
    trip: TripMeter,
}

impl SimulationEngine {
    pub fn new(params: VehicleParameters, initial: InitialConditions, charge_target_soc: f64) -> Self {
        Self {
            physics: PhysicsModel::new(params),
            initial,
            state: VehicleState::new(&initial),
            scenario: None,
            paused: false,
            manual_charging: false,
            manual_target_speed: 0.0,
            sequence: 0,
            last_path: PowerPath::Idle,
            charge_session: ChargeSession::new(params.battery_capacity_kwh, charge_target_soc),
            range_predictor: RangePredictor::new(params.battery_capacity_kwh),
            trip: TripMeter::default(),
        }
    }

    pub fn from_config(config: &SimConfig) -> Self {
        Self::new(config.vehicle.parameters(), config.initial, config.charging.target_soc)
    }

    pub fn params(&self) -> &VehicleParameters {
        self.physics.params()
    }

    pub fn state(&self) -> &VehicleState {
        &self.state
    }

    /// Direct state access for hosts seeding custom conditions
    pub fn state_mut(&mut self) -> &mut VehicleState {
        &mut self.state
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn last_power_path(&self) -> PowerPath {
        self.last_path
    }

    pub fn scenario(&self) -> Option<&dyn Scenario> {
        self.scenario.as_deref()
    }

    pub fn is_scenario_complete(&self) -> bool {
        self.scenario.as_ref().map(|s| s.is_complete()).unwrap_or(false)
    }

    // === Scenario lifecycle ===

    /// Replace the active scenario.
    ///
    /// The vehicle returns to a fresh parked state (odometer kept), fault
    /// latches clear, then the scenario seeds its initial conditions.
    pub fn start_scenario(&mut self, mut scenario: Box<dyn Scenario>) {
        scenario.reset();
        self.reset_state();
        scenario.apply_initial_state(&mut self.state);
        self.sanitize_seeded_state();
        self.state.drive_mode = scenario.drive_mode();

        info!(
            scenario = scenario.key(),
            soc = self.state.state_of_charge,
            "Scenario started: {}",
            scenario.name()
        );
        self.scenario = Some(scenario);
        self.paused = false;
    }

    /// Restart the active scenario from t=0.
    ///
    /// Scenario time and fault latches clear. The vehicle carries on from
    /// where it is, so a looping scenario never jumps.
    pub fn restart_scenario(&mut self) {
        if let Some(scenario) = self.scenario.as_mut() {
            scenario.reset();
            let s = &mut self.state;
            s.hv_fault = false;
            s.motor_fault = false;
            s.hv_isolation_fault = false;
            s.abs_active = false;
            s.tc_active = false;
            s.drive_mode = scenario.drive_mode();
            info!(scenario = scenario.key(), speed = s.speed, "Scenario restarted");
        }
    }

    /// Detach the active scenario. The vehicle keeps its state and coasts
    /// toward the manual target speed.
    pub fn stop_scenario(&mut self) -> Option<Box<dyn Scenario>> {
        let scenario = self.scenario.take();
        if let Some(ref s) = scenario {
            info!(scenario = s.key(), elapsed = s.elapsed(), "Scenario stopped");
        }
        self.manual_target_speed = 0.0;
        scenario
    }

    /// Fresh parked vehicle, no scenario
    pub fn reset(&mut self) {
        self.scenario = None;
        self.reset_state();
        self.paused = false;
    }

    fn reset_state(&mut self) {
        let odometer = self.state.odometer;
        self.state = VehicleState::new(&self.initial);
        self.state.odometer = odometer;
        self.manual_charging = false;
        self.manual_target_speed = 0.0;
        self.last_path = PowerPath::Idle;
        self.charge_session.reset();
        self.range_predictor.reset();
        self.trip.reset();
    }

    /// Scenario seeds are trusted for intent, not for range
    fn sanitize_seeded_state(&mut self) {
        let s = &mut self.state;
        s.state_of_charge = finite_or(s.state_of_charge, self.initial.state_of_charge).clamp(0.0, 100.0);
        s.state_of_health = finite_or(s.state_of_health, 100.0).clamp(0.0, 100.0);
        s.speed = finite_or(s.speed, 0.0).max(0.0);
        s.previous_speed = s.speed;
        s.battery_temp = finite_or(s.battery_temp, 25.0).clamp(BATTERY_TEMP_BAND.0, BATTERY_TEMP_BAND.1);
        s.motor_temp = finite_or(s.motor_temp, 30.0).clamp(MOTOR_TEMP_BAND.0, MOTOR_TEMP_BAND.1);
        s.battery_voltage = nominal_voltage(s.state_of_charge);
    }

    // === Manual controls ===

    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    /// Legacy plug-in toggle, independent of any charging scenario
    pub fn set_manual_charging(&mut self, plugged_in: bool) {
        if self.manual_charging != plugged_in {
            info!(plugged_in, "Manual charging toggled");
        }
        self.manual_charging = plugged_in;
    }

    pub fn is_manual_charging(&self) -> bool {
        self.manual_charging
    }

    /// Target speed used when no scenario is active
    pub fn set_target_speed(&mut self, kmh: f64) {
        self.manual_target_speed = finite_or(kmh, 0.0).max(0.0);
    }

    pub fn reset_trip(&mut self) {
        self.state.trip_distance = 0.0;
        self.trip.reset();
    }

    // === Tick ===

    /// Advance the simulation by `dt` seconds.
    ///
    /// `dt == 0` only forwards zero time to the scenario. Negative or
    /// non-finite `dt` is rejected. While paused nothing changes.
    pub fn tick(&mut self, dt: f64) -> Result<(), SimError> {
        if !dt.is_finite() || dt < 0.0 {
            return Err(SimError::InvalidTimestep(dt));
        }
        if self.paused {
            return Ok(());
        }
        if dt == 0.0 {
            if let Some(scenario) = self.scenario.as_mut() {
                scenario.update(0.0);
            }
            return Ok(());
        }

        let start_speed = self.state.speed;
        let start_rpm = self.state.motor_rpm;
        let start_soc = self.state.state_of_charge;

        // 1. Scenario target and latches
        let accel_pref = self.update_target(dt, start_speed);

        // 2. Speed
        self.state.speed = self
            .approach_speed(start_speed, self.state.target_speed, accel_pref, dt)
            .max(0.0);

        // 3. RPM
        let target_rpm = self.physics.motor_rpm(self.state.speed);
        self.state.motor_rpm = smooth_transition(self.state.motor_rpm, target_rpm, RPM_RATE, dt);

        // 4. Power path
        let path = self.apply_power_path(dt);
        self.integrate_charge(path, start_soc, dt);

        // 5. Heat injection
        if let Some(heat) = self.scenario.as_ref().and_then(|s| s.heat_injection()) {
            let delta = heat.rate.max(0.0) * dt;
            match heat.target {
                HeatTarget::Battery => self.state.battery_temp += delta,
                HeatTarget::Motor => self.state.motor_temp += delta,
            }
        }

        // 6. Passive cooling
        if self.state.power < PASSIVE_COOLING_BELOW_KW {
            self.state.motor_temp =
                smooth_transition(self.state.motor_temp, MOTOR_AMBIENT, MOTOR_COOLING_RATE, dt);
            self.state.battery_temp =
                smooth_transition(self.state.battery_temp, BATTERY_AMBIENT, BATTERY_COOLING_RATE, dt);
        }

        // 7. Operating bands
        self.state.motor_temp = self.state.motor_temp.clamp(MOTOR_TEMP_BAND.0, MOTOR_TEMP_BAND.1);
        self.state.battery_temp = self
            .state
            .battery_temp
            .clamp(BATTERY_TEMP_BAND.0, BATTERY_TEMP_BAND.1);

        // 8. Enforcement
        let unenforced_speed = self.state.speed;
        self.enforce_limits(path, start_speed, accel_pref, dt);
        if self.state.speed != unenforced_speed {
            let target_rpm = self.physics.motor_rpm(self.state.speed);
            self.state.motor_rpm = smooth_transition(start_rpm, target_rpm, RPM_RATE, dt);
        }

        self.record_energy(dt);
        self.last_path = path;

        // 9. Odometry
        if self.state.speed > 0.0 {
            let distance = self.state.speed * dt / 3600.0;
            self.state.odometer += distance;
            self.state.trip_distance += distance;
        }

        // 10. Voltage and current
        let target_voltage = nominal_voltage(self.state.state_of_charge);
        self.state.battery_voltage =
            smooth_transition(self.state.battery_voltage, target_voltage, VOLTAGE_RATE, dt);
        self.state.battery_current = if self.state.battery_voltage.abs() > 1.0 {
            self.state.power * 1000.0 / self.state.battery_voltage
        } else {
            0.0
        };

        // 11. Health
        self.state.state_of_health = (self.state.state_of_health - SOH_DECAY_PER_S * dt).max(0.0);

        // 12. Charge clamp
        self.state.state_of_charge = self.state.state_of_charge.clamp(0.0, 100.0);

        // 13. Efficiency and range
        self.update_efficiency_and_range();

        // 14. GPS
        if self.state.speed > 0.0 {
            self.state.path_angle += self.state.speed / 3600.0 * dt;
            self.state.place_on_path(&self.initial);
        }

        // 15. Bookkeeping
        self.state.previous_speed = self.state.speed;
        self.state.previous_power = self.state.power;
        self.state.sim_time += dt;
        self.sequence += 1;

        if self.sequence % DEBUG_LOG_EVERY == 0 {
            debug!(
                seq = self.sequence,
                speed = self.state.speed,
                power = self.state.power,
                soc = self.state.state_of_charge,
                motor_temp = self.state.motor_temp,
                battery_temp = self.state.battery_temp,
                "tick"
            );
        }

        Ok(())
    }

    /// Stage 1. Returns the scenario's preferred acceleration rate.
    fn update_target(&mut self, dt: f64, start_speed: f64) -> f64 {
        let (raw_target, accel_pref, reports_abs_tc, latches, charge_scenario) = match self.scenario.as_mut() {
            Some(scenario) => {
                scenario.update(dt);
                let t = scenario.elapsed();
                self.state.drive_mode = scenario.drive_mode();
                (
                    scenario.target_speed(t),
                    scenario.acceleration_rate(),
                    scenario.reports_abs_tc(),
                    scenario.latches(),
                    scenario.charge_power().is_some(),
                )
            }
            None => (
                self.manual_target_speed,
                DEFAULT_ACCEL_RATE,
                false,
                Default::default(),
                false,
            ),
        };

        let mut target = finite_or(raw_target, 0.0).max(0.0);

        if latches.hv_isolation && !self.state.hv_isolation_fault {
            warn!(sim_time = self.state.sim_time, "HV isolation fault latched");
            self.state.hv_isolation_fault = true;
        }
        if self.state.hv_isolation_fault {
            target = target.min(ISOLATION_SPEED_CAP_KMH);
        }

        if charge_scenario || self.manual_charging {
            target = 0.0;
            if self.manual_charging && self.scenario.is_none() {
                self.state.drive_mode = DriveMode::Park;
            }
        }

        // Faults latched on earlier ticks shape the approach as well
        if self.state.hv_fault || self.state.state_of_charge <= 0.0 {
            target = 0.0;
        } else if self.state.motor_fault {
            target = target.min(LIMP_SPEED_KMH);
        }

        self.state.target_speed = target;

        let demand = target - start_speed;
        if reports_abs_tc {
            self.state.abs_active = demand < -ABS_DECEL_THRESHOLD;
            self.state.tc_active = demand > TC_ACCEL_THRESHOLD;
        } else {
            self.state.abs_active = false;
            self.state.tc_active = false;
        }

        finite_or(accel_pref, DEFAULT_ACCEL_RATE).max(0.0)
    }

    /// Rate-limited approach from `from` toward `target`
    fn approach_speed(&self, from: f64, target: f64, accel_pref: f64, dt: f64) -> f64 {
        let diff = target - from;
        let rate = if diff > SPEED_DEADBAND {
            accel_pref.min(MAX_ACCEL_RATE)
        } else if diff < -SPEED_DEADBAND {
            (accel_pref * DECEL_RATE_FACTOR).min(MAX_DECEL_RATE)
        } else {
            MICRO_ADJUST_RATE
        };
        smooth_transition(from, target, rate, dt)
    }

    /// Stage 4. Exactly one path per tick.
    fn apply_power_path(&mut self, dt: f64) -> PowerPath {
        let params = *self.physics.params();
        let speed = self.state.speed;
        let accel_rate = (speed - self.state.previous_speed) / dt;
        let decel_rate = -accel_rate;
        let max_power = if self.state.motor_fault {
            LIMP_POWER_KW.min(params.max_motor_power_kw)
        } else {
            params.max_motor_power_kw
        };

        let scenario_charge = self.scenario.as_ref().and_then(|s| s.charge_power());

        if let Some(charger_kw) = scenario_charge {
            self.state.charging = true;
            let base = finite_or(charger_kw, 0.0).clamp(0.0, params.max_charge_power_kw);
            let target_kw = charge_taper(self.state.state_of_charge, base);
            self.state.power = smooth_transition(self.state.power, -target_kw, CHARGE_RAMP_KW_S, dt);

            let charge_kw = (-self.state.power).max(0.0);
            self.state.battery_temp += charge_kw * CHARGE_HEAT_PER_KW * dt;
            if self.state.battery_temp > ACTIVE_COOLING_START {
                self.state.battery_temp = smooth_transition(
                    self.state.battery_temp,
                    ACTIVE_COOLING_START,
                    ACTIVE_COOLING_RATE,
                    dt,
                );
            }
            return PowerPath::ScenarioCharge;
        }

        if self.manual_charging {
            self.state.charging = true;
            let target_kw = LEGACY_CHARGE_KW.min(params.max_charge_power_kw);
            self.state.power = smooth_transition(self.state.power, -target_kw, CHARGE_RAMP_KW_S, dt);
            self.state.battery_temp += LEGACY_CHARGE_HEAT * dt;
            return PowerPath::ManualCharge;
        }

        self.state.charging = false;

        if decel_rate > REGEN_DECEL_THRESHOLD {
            let regen_kw = self.physics.regen_power(speed, decel_rate);
            self.state.power = smooth_transition(self.state.power, -regen_kw, REGEN_RAMP_KW_S, dt);
            return PowerPath::Regen;
        }

        if speed > DRIVE_SPEED_THRESHOLD {
            let accelerating = accel_rate > 0.0;
            let mut demand = self
                .physics
                .consumption_power(speed, accelerating, accel_rate.max(0.0));
            if let Some(range) = self.scenario.as_ref().map(|s| s.power_range()) {
                if range.min_kw >= 0.0 && range.max_kw > 0.0 {
                    demand = range.clamp(demand);
                }
            }
            demand = demand.min(max_power);
            self.state.power = smooth_transition(self.state.power, demand, DRIVE_RAMP_KW_S, dt);

            let load = (self.state.power / params.max_motor_power_kw).max(0.0);
            self.state.motor_temp += MOTOR_HEAT_RATE * load * dt;
            if self.state.power > BATTERY_HEAT_THRESHOLD_KW {
                let excess = (self.state.power - BATTERY_HEAT_THRESHOLD_KW) / params.max_motor_power_kw;
                self.state.battery_temp += BATTERY_HEAT_RATE * excess * dt;
            }
            return PowerPath::Drive;
        }

        self.state.power = smooth_transition(self.state.power, IDLE_POWER_KW, IDLE_RAMP_KW_S, dt);
        PowerPath::Idle
    }

    /// Stage 8. Runs every tick in a fixed order; later rules win.
    fn enforce_limits(&mut self, path: PowerPath, start_speed: f64, accel_pref: f64, dt: f64) {
        let s = &mut self.state;

        if s.motor_temp > MOTOR_TRIP_TEMP || s.battery_temp > BATTERY_TRIP_TEMP {
            if !(s.hv_fault && s.motor_fault) {
                warn!(
                    motor_temp = s.motor_temp,
                    battery_temp = s.battery_temp,
                    "Thermal limit exceeded, HV and motor faults latched"
                );
            }
            s.hv_fault = true;
            s.motor_fault = true;
        }

        if s.state_of_charge <= 0.0 && !path.is_charging() {
            s.state_of_charge = 0.0;
            s.power = 0.0;
            s.target_speed = 0.0;
            s.speed = smooth_transition(start_speed, 0.0, DEPLETED_COAST_RATE, dt);
        }

        if s.state_of_charge >= 100.0 && s.power < 0.0 {
            s.power = 0.0;
        }

        if s.hv_fault {
            s.power = 0.0;
            s.target_speed = 0.0;
            s.speed = smooth_transition(start_speed, 0.0, HV_COAST_RATE, dt);
        } else if s.motor_fault {
            s.power = s.power.min(LIMP_POWER_KW);
            if s.target_speed > LIMP_SPEED_KMH || s.speed > LIMP_SPEED_KMH {
                s.target_speed = s.target_speed.min(LIMP_SPEED_KMH);
                let target = s.target_speed;
                self.state.speed = self.approach_speed(start_speed, target, accel_pref, dt).max(0.0);
            }
        }
    }

    /// Stage 4. Move charge between pack and wheels/charger at the path's
    /// power. An empty pack gives nothing unless charging and a full pack
    /// takes nothing.
    fn integrate_charge(&mut self, path: PowerPath, start_soc: f64, dt: f64) {
        let power = self.state.power;
        let empty = start_soc <= 0.0 && !path.is_charging();
        let full = start_soc >= 100.0 && power < 0.0;
        if empty || full {
            return;
        }

        let capacity = self.physics.params().battery_capacity_kwh;
        let energy_kwh = if power < 0.0 && !path.is_charging() {
            power * REGEN_EFFICIENCY * dt / 3600.0
        } else {
            power * dt / 3600.0
        };
        self.state.state_of_charge =
            (self.state.state_of_charge - energy_kwh / capacity * 100.0).clamp(0.0, 100.0);
    }

    /// Trip, charge session and range bookkeeping at the enforced power
    fn record_energy(&mut self, dt: f64) {
        let power = self.state.power;
        self.trip.update(power, self.state.speed, dt);
        self.charge_session.update(
            self.state.charging,
            self.state.state_of_charge,
            (-power).max(0.0),
            dt,
        );
        self.range_predictor
            .update(power, self.state.speed, self.state.battery_temp);
    }

    /// Stage 13
    fn update_efficiency_and_range(&mut self) {
        let remaining_wh = self.state.remaining_energy_kwh(self.physics.params()) * 1000.0;
        if self.state.speed > 1.0 && self.state.power > 0.0 {
            let efficiency = self.state.power * 1000.0 / self.state.speed;
            self.state.efficiency_wh_per_km = efficiency;
            self.state.range_km = remaining_wh / efficiency;
        } else {
            self.state.efficiency_wh_per_km = DEFAULT_EFFICIENCY_WH_KM;
            self.state.range_km = remaining_wh / DEFAULT_EFFICIENCY_WH_KM;
        }
    }

    // === Snapshot ===

    /// Full copy of the current state plus derived telemetry
    pub fn snapshot(&self) -> TelemetrySnapshot {
        let extras = SnapshotExtras {
            scenario_key: self.scenario.as_ref().map(|s| s.key().to_string()),
            scenario_name: self.scenario.as_ref().map(|s| s.name().to_string()),
            scenario_elapsed: self.scenario.as_ref().map(|s| s.elapsed()).unwrap_or(0.0),
            time_to_full_min: self.charge_session.time_to_full_min(),
            energy_added_kwh: self.charge_session.energy_added(),
            trip_energy_kwh: self.trip.energy_used_kwh - self.trip.energy_recovered_kwh,
            avg_consumption_kwh_100km: self.trip.average_consumption(),
            range_estimates: self.range_predictor.estimates(),
        };
        TelemetrySnapshot::from_state(&self.state, self.sequence, &extras)
    }

    pub fn charge_session(&self) -> &ChargeSession {
        &self.charge_session
    }

    pub fn range_predictor(&self) -> &RangePredictor {
        &self.range_predictor
    }

    pub fn trip_meter(&self) -> &TripMeter {
        &self.trip
    }
}

impl Default for SimulationEngine {
    fn default() -> Self {
        Self::from_config(&SimConfig::default())
    }
}

fn finite_or(value: f64, fallback: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        fallback
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_idle_engine_draws_idle_power() {
        let mut engine = SimulationEngine::default();
        for _ in 0..20 {
            engine.tick(0.1).unwrap();
        }
        assert_eq!(engine.last_power_path(), PowerPath::Idle);
        assert!((engine.state().power - IDLE_POWER_KW).abs() < 1e-9);
        assert_eq!(engine.state().speed, 0.0);
    }

    #[test]
    fn test_negative_dt_rejected() {
        let mut engine = SimulationEngine::default();
        assert_eq!(engine.tick(-0.1), Err(SimError::InvalidTimestep(-0.1)));
        assert!(engine.tick(f64::NAN).is_err());
        assert_eq!(engine.sequence(), 0);
    }

    #[test]
    fn test_approach_speed_rates() {
        let engine = SimulationEngine::default();
        // accelerate: min(8, 5) = 5 km/h/s
        assert!((engine.approach_speed(0.0, 100.0, 8.0, 0.1) - 0.5).abs() < 1e-12);
        // decelerate: min(8 * 1.5, 6) = 6 km/h/s
        assert!((engine.approach_speed(100.0, 0.0, 8.0, 0.1) - 99.4).abs() < 1e-12);
        // decelerate gently: 2 * 1.5 = 3 km/h/s
        assert!((engine.approach_speed(100.0, 0.0, 2.0, 0.1) - 99.7).abs() < 1e-12);
        // inside the deadband: 1 km/h/s micro-adjustment
        assert!((engine.approach_speed(50.0, 50.4, 2.0, 0.1) - 50.1).abs() < 1e-12);
    }

    #[test]
    fn test_manual_target_speed_drives_without_scenario() {
        let mut engine = SimulationEngine::default();
        engine.set_target_speed(30.0);
        for _ in 0..200 {
            engine.tick(0.1).unwrap();
        }
        assert!((engine.state().speed - 30.0).abs() < 1e-6);
        assert_eq!(engine.last_power_path(), PowerPath::Drive);
        assert!(engine.state().trip_distance > 0.0);
    }

    #[test]
    fn test_manual_charging_path() {
        let mut engine = SimulationEngine::default();
        engine.set_manual_charging(true);
        for _ in 0..20 {
            engine.tick(0.1).unwrap();
        }
        assert_eq!(engine.last_power_path(), PowerPath::ManualCharge);
        assert!(engine.state().charging);
        assert!((engine.state().power + LEGACY_CHARGE_KW).abs() < 1e-9);
        assert!(engine.state().state_of_charge > 80.0);
        assert_eq!(engine.state().drive_mode, DriveMode::Park);
        assert!(engine.charge_session().is_active());
    }

    #[test]
    fn test_reset_trip_keeps_odometer() {
        let mut engine = SimulationEngine::default();
        engine.set_target_speed(50.0);
        for _ in 0..100 {
            engine.tick(0.1).unwrap();
        }
        let odometer = engine.state().odometer;
        engine.reset_trip();
        assert_eq!(engine.state().trip_distance, 0.0);
        assert_eq!(engine.state().odometer, odometer);
        assert!(odometer > 12_050.0);
    }
}
