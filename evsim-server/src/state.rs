//! Application state management

use crate::sinks::BroadcastTransport;
use evsim_core::{SimConfig, SimulationEngine, TelemetrySnapshot, TelemetryTransport};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, RwLock};
use tokio_util::sync::CancellationToken;

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    /// The single engine. Ticks and scenario switches both take the write
    /// lock, so a tick never sees a half-applied switch.
    pub engine: Arc<RwLock<SimulationEngine>>,

    /// Broadcast channel for telemetry snapshots
    /// Multiple consumers can subscribe to receive snapshots
    pub telemetry_tx: broadcast::Sender<TelemetrySnapshot>,

    /// Most recent snapshot (None before the first tick)
    pub latest: Arc<RwLock<Option<TelemetrySnapshot>>>,

    /// Consumers fed after every tick
    pub transports: Arc<RwLock<Vec<Box<dyn TelemetryTransport>>>>,

    pub tick_interval: Duration,

    /// Restart completed scenarios instead of stopping them
    pub loop_scenarios: bool,

    /// Stops the host loop
    pub shutdown: CancellationToken,
}

/// Host status as reported by the API
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostStatus {
    pub running: bool,
    pub paused: bool,
    pub scenario: Option<String>,
    pub scenario_name: Option<String>,
    pub elapsed_s: f64,
    pub complete: bool,
    pub manual_charging: bool,
    pub sequence: u64,
    pub tick_interval_ms: u64,
    pub loop_scenarios: bool,
}

impl AppState {
    pub fn new(config: &SimConfig) -> Self {
        let (telemetry_tx, _) = broadcast::channel(config.host.broadcast_capacity.max(1));
        let broadcast: Box<dyn TelemetryTransport> = Box::new(BroadcastTransport::new(telemetry_tx.clone()));

        Self {
            engine: Arc::new(RwLock::new(SimulationEngine::from_config(config))),
            telemetry_tx,
            latest: Arc::new(RwLock::new(None)),
            transports: Arc::new(RwLock::new(vec![broadcast])),
            tick_interval: Duration::from_millis(config.host.tick_interval_ms),
            loop_scenarios: config.host.loop_scenarios,
            shutdown: CancellationToken::new(),
        }
    }

    /// Register an additional transport
    pub async fn register_transport(&self, transport: Box<dyn TelemetryTransport>) {
        let mut transports = self.transports.write().await;
        transports.push(transport);
    }

    /// Subscribe to telemetry snapshots
    pub fn subscribe(&self) -> broadcast::Receiver<TelemetrySnapshot> {
        self.telemetry_tx.subscribe()
    }

    pub async fn status(&self) -> HostStatus {
        let engine = self.engine.read().await;
        let scenario = engine.scenario();
        HostStatus {
            running: scenario.is_some() && !engine.is_paused(),
            paused: engine.is_paused(),
            scenario: scenario.map(|s| s.key().to_string()),
            scenario_name: scenario.map(|s| s.name().to_string()),
            elapsed_s: scenario.map(|s| s.elapsed()).unwrap_or(0.0),
            complete: engine.is_scenario_complete(),
            manual_charging: engine.is_manual_charging(),
            sequence: engine.sequence(),
            tick_interval_ms: self.tick_interval.as_millis() as u64,
            loop_scenarios: self.loop_scenarios,
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(&SimConfig::default())
    }
}
