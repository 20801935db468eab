//! Simulation configuration
//!
//! Loaded from TOML. A missing or unreadable file never stops the
//! simulation: [`SimConfig::load_or_default`] logs and falls back to the
//! four-wheeler profile.

use crate::error::ConfigError;
use crate::vehicle::{InitialConditions, VehicleParameters, VehicleProfile};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const ENV_CONFIG_PATH: &str = "EVSIM_CONFIG";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    pub vehicle: VehicleConfig,
    pub initial: InitialConditions,
    pub host: HostConfig,
    pub charging: ChargingConfig,
}

/// Vehicle profile plus optional battery/charger overrides
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VehicleConfig {
    pub profile: VehicleProfile,
    pub battery_capacity_kwh: Option<f64>,
    pub max_charge_power_kw: Option<f64>,
    pub max_regen_power_kw: Option<f64>,
}

impl VehicleConfig {
    pub fn parameters(&self) -> VehicleParameters {
        let mut params = VehicleParameters::for_profile(self.profile);
        if let Some(capacity) = self.battery_capacity_kwh {
            params.battery_capacity_kwh = capacity;
        }
        if let Some(charge) = self.max_charge_power_kw {
            params.max_charge_power_kw = charge;
        }
        if let Some(regen) = self.max_regen_power_kw {
            params.max_regen_power_kw = regen;
        }
        params
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HostConfig {
    /// Engine cadence in milliseconds
    pub tick_interval_ms: u64,
    /// Restart a scenario when it completes instead of stopping
    pub loop_scenarios: bool,
    pub listen: SocketAddr,
    pub broadcast_capacity: usize,
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 100,
            loop_scenarios: true,
            listen: SocketAddr::from(([127, 0, 0, 1], 9100)),
            broadcast_capacity: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChargingConfig {
    /// State of charge the time-to-full estimate aims for
    pub target_soc: f64,
}

impl Default for ChargingConfig {
    fn default() -> Self {
        Self { target_soc: 80.0 }
    }
}

impl SimConfig {
    /// Parse and validate a TOML document
    pub fn from_toml_str(raw: &str, origin: &Path) -> Result<Self, ConfigError> {
        let config: SimConfig = toml::from_str(raw).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Strict load from an explicit path
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&raw, path)
    }

    /// Resolve the config path: explicit argument, then `EVSIM_CONFIG`, then
    /// the per-user config directory.
    pub fn resolve_path(explicit: Option<&Path>) -> Option<PathBuf> {
        if let Some(path) = explicit {
            return Some(path.to_path_buf());
        }
        if let Ok(env_path) = std::env::var(ENV_CONFIG_PATH) {
            return Some(PathBuf::from(env_path));
        }
        dirs::config_dir()
            .map(|dir| dir.join("evsim").join("config.toml"))
            .filter(|path| path.exists())
    }

    /// Load configuration, falling back to defaults on any failure
    pub fn load_or_default(explicit: Option<&Path>) -> Self {
        let Some(path) = Self::resolve_path(explicit) else {
            debug!("No configuration file found, using default vehicle profile");
            return Self::default();
        };

        match Self::load(&path) {
            Ok(config) => {
                debug!(path = %path.display(), "Loaded configuration");
                config
            }
            Err(e) => {
                warn!("{}; using default vehicle profile", e);
                Self::default()
            }
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let v = &self.vehicle;
        for (name, value) in [
            ("vehicle.battery_capacity_kwh", v.battery_capacity_kwh),
            ("vehicle.max_charge_power_kw", v.max_charge_power_kw),
            ("vehicle.max_regen_power_kw", v.max_regen_power_kw),
        ] {
            if let Some(value) = value {
                if !(value.is_finite() && value > 0.0) {
                    return Err(ConfigError::Invalid(format!("{} must be positive, got {}", name, value)));
                }
            }
        }

        if !(0.0..=100.0).contains(&self.initial.state_of_charge) {
            return Err(ConfigError::Invalid(format!(
                "initial.state_of_charge must be within 0-100, got {}",
                self.initial.state_of_charge
            )));
        }
        if !(10..=1000).contains(&self.host.tick_interval_ms) {
            return Err(ConfigError::Invalid(format!(
                "host.tick_interval_ms must be within 10-1000, got {}",
                self.host.tick_interval_ms
            )));
        }
        if self.host.broadcast_capacity == 0 {
            return Err(ConfigError::Invalid("host.broadcast_capacity must be non-zero".to_string()));
        }
        if !(0.0..=100.0).contains(&self.charging.target_soc) {
            return Err(ConfigError::Invalid(format!(
                "charging.target_soc must be within 0-100, got {}",
                self.charging.target_soc
            )));
        }
        Ok(())
    }

    pub fn tick_seconds(&self) -> f64 {
        self.host.tick_interval_ms as f64 / 1000.0
    }
}
