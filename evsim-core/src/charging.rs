//! Charge taper curve and charging session bookkeeping

use serde::Serialize;
use std::collections::VecDeque;
use tracing::info;

/// State of charge where the taper begins (%)
pub const TAPER_START_SOC: f64 = 80.0;
/// Fraction of base power still delivered at 100 %
pub const TAPER_END_FRACTION: f64 = 0.1;

/// Charge power (kW, positive) for a given state of charge.
///
/// Full `base_power_kw` up to 80 %, then linear down to 10 % of base at 100 %.
pub fn charge_taper(soc: f64, base_power_kw: f64) -> f64 {
    if soc <= TAPER_START_SOC {
        return base_power_kw;
    }
    let progress = ((soc - TAPER_START_SOC) / (100.0 - TAPER_START_SOC)).clamp(0.0, 1.0);
    base_power_kw * (1.0 - (1.0 - TAPER_END_FRACTION) * progress)
}

/// ~60 s of samples at the default 200 ms display cadence
const POWER_SAMPLE_WINDOW: usize = 300;

/// Summary of a charging session
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ChargeSessionSummary {
    pub start_soc: f64,
    pub end_soc: f64,
    pub energy_added_kwh: f64,
    pub average_power_kw: f64,
    pub duration_s: f64,
    pub is_complete: bool,
}

/// Tracks the current (or most recent) charging session
#[derive(Debug, Clone)]
pub struct ChargeSession {
    battery_capacity_kwh: f64,
    target_soc: f64,
    active: bool,
    current: ChargeSessionSummary,
    recent_power: VecDeque<f64>,
}

impl ChargeSession {
    pub fn new(battery_capacity_kwh: f64, target_soc: f64) -> Self {
        Self {
            battery_capacity_kwh,
            target_soc: target_soc.clamp(0.0, 100.0),
            active: false,
            current: ChargeSessionSummary::default(),
            recent_power: VecDeque::with_capacity(POWER_SAMPLE_WINDOW),
        }
    }

    /// Feed one tick. `charge_power_kw` is the positive power flowing in.
    pub fn update(&mut self, charging: bool, soc: f64, charge_power_kw: f64, dt: f64) {
        if charging && !self.active {
            self.start(soc);
        }
        if !charging && self.active {
            self.finish(soc);
        }

        if charging {
            if self.recent_power.len() == POWER_SAMPLE_WINDOW {
                self.recent_power.pop_front();
            }
            self.recent_power.push_back(charge_power_kw.max(0.0));

            self.current.energy_added_kwh += charge_power_kw.max(0.0) * dt / 3600.0;
            self.current.end_soc = soc;
            self.current.duration_s += dt;
        }
    }

    fn start(&mut self, soc: f64) {
        info!(soc = soc, "Charging session started");
        self.active = true;
        self.recent_power.clear();
        self.current = ChargeSessionSummary {
            start_soc: soc,
            end_soc: soc,
            ..Default::default()
        };
    }

    fn finish(&mut self, soc: f64) {
        self.active = false;
        self.current.end_soc = soc;
        self.current.average_power_kw = self.average_power();
        self.current.is_complete = true;
        info!(
            soc = soc,
            energy_kwh = self.current.energy_added_kwh,
            duration_s = self.current.duration_s,
            "Charging session ended"
        );
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn target_soc(&self) -> f64 {
        self.target_soc
    }

    pub fn energy_added(&self) -> f64 {
        self.current.energy_added_kwh
    }

    pub fn average_power(&self) -> f64 {
        if self.recent_power.is_empty() {
            return 0.0;
        }
        self.recent_power.iter().sum::<f64>() / self.recent_power.len() as f64
    }

    /// Minutes until the target state of charge at the recent average power
    pub fn time_to_full_min(&self) -> u32 {
        if !self.active {
            return 0;
        }
        let avg = self.average_power();
        if avg <= 0.1 {
            return 0;
        }
        let needed_kwh = (self.target_soc - self.current.end_soc) * self.battery_capacity_kwh / 100.0;
        if needed_kwh <= 0.0 {
            return 0;
        }
        (needed_kwh / avg * 60.0) as u32
    }

    pub fn summary(&self) -> ChargeSessionSummary {
        let mut summary = self.current.clone();
        if self.active {
            summary.average_power_kw = self.average_power();
        }
        summary
    }

    pub fn reset(&mut self) {
        self.active = false;
        self.current = ChargeSessionSummary::default();
        self.recent_power.clear();
    }
}
