//! EVSim Core Library
//!
//! This crate provides the vehicle physics, the fixed-timestep simulation
//! engine and the telemetry snapshot model for a simulated electric vehicle.
//! Scenarios plug in through the [`Scenario`] trait; hosts consume snapshots
//! through [`TelemetryTransport`].

pub mod charging;
pub mod config;
pub mod engine;
pub mod error;
pub mod model;
pub mod physics;
pub mod range;
pub mod scenario;
pub mod smoothing;
pub mod transport;
pub mod units;
pub mod vehicle;

pub use config::SimConfig;
pub use engine::{PowerPath, SimulationEngine};
pub use error::{ConfigError, SimError};
pub use model::{FieldMask, TelemetrySnapshot, WarningFlags};
pub use physics::PhysicsModel;
pub use scenario::{HeatInjection, HeatTarget, PowerRange, Scenario, ScenarioLatches};
pub use transport::{TelemetryTransport, TransportError};
pub use vehicle::{DriveMode, InitialConditions, VehicleParameters, VehicleProfile, VehicleState};
