//! Range prediction and trip energy metering

use serde::Serialize;
use std::collections::VecDeque;

/// Typical consumption used before any samples exist (Wh/km)
pub const DEFAULT_EFFICIENCY_WH_KM: f64 = 180.0;

const HISTORY_SAMPLES: usize = 10_000;
const RECENT_SAMPLES: usize = 1_500;

/// Efficiency penalty for pack temperature
pub fn temperature_factor(battery_temp: f64) -> f64 {
    if battery_temp < 0.0 {
        0.70
    } else if battery_temp < 10.0 {
        0.85
    } else if battery_temp < 20.0 {
        0.95
    } else if battery_temp <= 35.0 {
        1.0
    } else if battery_temp <= 45.0 {
        0.95
    } else {
        0.85
    }
}

/// Full-charge range estimates (km)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct RangeEstimates {
    pub optimistic_km: f64,
    pub realistic_km: f64,
    pub pessimistic_km: f64,
}

/// Learns driving efficiency and projects range
#[derive(Debug, Clone)]
pub struct RangePredictor {
    battery_capacity_kwh: f64,
    history: VecDeque<f64>,
    recent: VecDeque<f64>,
    temperature_factor: f64,
}

impl RangePredictor {
    pub fn new(battery_capacity_kwh: f64) -> Self {
        Self {
            battery_capacity_kwh,
            history: VecDeque::new(),
            recent: VecDeque::new(),
            temperature_factor: 1.0,
        }
    }

    /// Record one sample. Ignored when parked or coasting near zero power.
    pub fn update(&mut self, power_kw: f64, speed_kmh: f64, battery_temp: f64) {
        if speed_kmh < 1.0 || power_kw.abs() < 0.5 {
            return;
        }

        let efficiency = power_kw * 1000.0 / speed_kmh;
        self.temperature_factor = temperature_factor(battery_temp);

        push_bounded(&mut self.recent, efficiency, RECENT_SAMPLES);
        push_bounded(&mut self.history, efficiency, HISTORY_SAMPLES);
    }

    pub fn sample_count(&self) -> usize {
        self.history.len()
    }

    pub fn average_efficiency(&self) -> f64 {
        mean(&self.history).unwrap_or(DEFAULT_EFFICIENCY_WH_KM)
    }

    pub fn recent_efficiency(&self) -> f64 {
        mean(&self.recent).unwrap_or_else(|| self.average_efficiency())
    }

    fn estimate(&self, efficiency: f64, soc: f64) -> f64 {
        if efficiency <= 0.0 || soc <= 0.0 {
            return 0.0;
        }
        let available_kwh = soc / 100.0 * self.battery_capacity_kwh;
        available_kwh * 1000.0 / efficiency * self.temperature_factor
    }

    /// Efficiency at the 20th percentile of the sorted history
    fn percentile_efficiency(&self, best: bool) -> Option<f64> {
        if self.history.is_empty() {
            return None;
        }
        let mut sorted: Vec<f64> = self.history.iter().copied().collect();
        sorted.sort_by(|a, b| a.total_cmp(b));
        if !best {
            sorted.reverse();
        }
        Some(sorted[sorted.len() / 5])
    }

    pub fn estimates(&self) -> RangeEstimates {
        let optimistic = self
            .percentile_efficiency(true)
            .map(|e| self.estimate(e, 100.0))
            .unwrap_or(0.0);
        let pessimistic = self
            .percentile_efficiency(false)
            .map(|e| self.estimate(e, 100.0))
            .unwrap_or(0.0);
        RangeEstimates {
            optimistic_km: optimistic,
            realistic_km: self.estimate(self.average_efficiency(), 100.0),
            pessimistic_km: pessimistic,
        }
    }

    pub fn reset(&mut self) {
        self.history.clear();
        self.recent.clear();
        self.temperature_factor = 1.0;
    }
}

fn push_bounded(buf: &mut VecDeque<f64>, value: f64, cap: usize) {
    if buf.len() == cap {
        buf.pop_front();
    }
    buf.push_back(value);
}

fn mean(buf: &VecDeque<f64>) -> Option<f64> {
    if buf.is_empty() {
        None
    } else {
        Some(buf.iter().sum::<f64>() / buf.len() as f64)
    }
}

/// Energy drawn and recovered over a trip
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct TripMeter {
    pub energy_used_kwh: f64,
    pub energy_recovered_kwh: f64,
    pub distance_km: f64,
}

impl TripMeter {
    pub fn update(&mut self, power_kw: f64, speed_kmh: f64, dt: f64) {
        let energy = power_kw * dt / 3600.0;
        if energy >= 0.0 {
            self.energy_used_kwh += energy;
        } else {
            self.energy_recovered_kwh -= energy;
        }
        self.distance_km += speed_kmh.max(0.0) * dt / 3600.0;
    }

    /// Net consumption in kWh per 100 km
    pub fn average_consumption(&self) -> f64 {
        if self.distance_km <= 0.0 {
            return 0.0;
        }
        (self.energy_used_kwh - self.energy_recovered_kwh) / self.distance_km * 100.0
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_temperature_bands() {
        assert_eq!(temperature_factor(-5.0), 0.70);
        assert_eq!(temperature_factor(5.0), 0.85);
        assert_eq!(temperature_factor(15.0), 0.95);
        assert_eq!(temperature_factor(25.0), 1.0);
        assert_eq!(temperature_factor(35.0), 1.0);
        assert_eq!(temperature_factor(40.0), 0.95);
        assert_eq!(temperature_factor(50.0), 0.85);
    }

    #[test]
    fn test_empty_predictor_uses_default_efficiency() {
        let predictor = RangePredictor::new(65.0);
        assert_eq!(predictor.average_efficiency(), DEFAULT_EFFICIENCY_WH_KM);
        let est = predictor.estimates();
        assert_eq!(est.optimistic_km, 0.0);
        assert_relative_eq!(est.realistic_km, 65_000.0 / 180.0, epsilon = 1e-9);
    }

    #[test]
    fn test_ignores_parked_samples() {
        let mut predictor = RangePredictor::new(65.0);
        predictor.update(1.0, 0.0, 25.0);
        predictor.update(0.1, 50.0, 25.0);
        assert_eq!(predictor.sample_count(), 0);
    }

    #[test]
    fn test_estimates_are_ordered() {
        let mut predictor = RangePredictor::new(65.0);
        for i in 0..100 {
            let power = 10.0 + i as f64 * 0.1;
            predictor.update(power, 60.0, 25.0);
        }
        let est = predictor.estimates();
        assert!(est.optimistic_km > est.realistic_km);
        assert!(est.realistic_km > est.pessimistic_km);
    }

    #[test]
    fn test_trip_meter_consumption() {
        let mut trip = TripMeter::default();
        // 18 kW at 100 km/h for one hour = 18 kWh over 100 km
        trip.update(18.0, 100.0, 3600.0);
        assert_relative_eq!(trip.average_consumption(), 18.0, epsilon = 1e-9);

        trip.update(-3.6, 0.0, 1000.0);
        assert_relative_eq!(trip.energy_recovered_kwh, 1.0, epsilon = 1e-9);
        assert_relative_eq!(trip.average_consumption(), 17.0, epsilon = 1e-9);
    }
}
