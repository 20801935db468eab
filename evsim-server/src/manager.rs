//! Scenario host
//!
//! This module handles:
//! - Ticking the engine on a fixed cadence
//! - Looping or stopping completed scenarios
//! - Publishing each snapshot to the registered transports
//! - Scenario switches and manual controls requested through the API

use crate::state::AppState;
use anyhow::Result;
use evsim_core::TelemetrySnapshot;
use evsim_scenarios::ScenarioKind;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info, warn};

/// Main host loop. Runs until the state's shutdown token is cancelled.
pub async fn run(state: AppState) {
    info!(
        interval_ms = state.tick_interval.as_millis() as u64,
        loop_scenarios = state.loop_scenarios,
        "Scenario host started"
    );

    let mut ticker = interval(state.tick_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = state.shutdown.cancelled() => break,
            _ = ticker.tick() => {}
        }

        if let Err(e) = tick_cycle(&state).await {
            error!("Error in tick cycle: {}", e);
        }
    }

    info!("Scenario host stopped");
}

/// Advance the engine one tick and publish the snapshot.
///
/// Returns `None` while paused.
pub async fn tick_cycle(state: &AppState) -> Result<Option<TelemetrySnapshot>> {
    let dt = state.tick_interval.as_secs_f64();

    let snapshot = {
        let mut engine = state.engine.write().await;
        if engine.is_paused() {
            return Ok(None);
        }
        engine.tick(dt)?;
        let snapshot = engine.snapshot();

        if engine.is_scenario_complete() {
            if state.loop_scenarios {
                info!(scenario = snapshot.scenario.as_deref(), "Scenario complete, looping");
                engine.restart_scenario();
            } else {
                info!(scenario = snapshot.scenario.as_deref(), "Scenario complete, stopping");
                engine.stop_scenario();
            }
        }
        snapshot
    };

    {
        let mut latest = state.latest.write().await;
        *latest = Some(snapshot.clone());
    }

    let transports = state.transports.read().await;
    for transport in transports.iter() {
        if let Err(e) = transport.publish(snapshot.clone()) {
            warn!("Transport {} error: {}", transport.name(), e);
        }
    }

    Ok(Some(snapshot))
}

/// Replace the running scenario under the engine lock
pub async fn start_scenario(state: &AppState, kind: ScenarioKind, charge_power_kw: Option<f64>) {
    let scenario = kind.build(charge_power_kw);
    let mut engine = state.engine.write().await;
    engine.start_scenario(scenario);
}

/// Manual host controls
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ControlAction {
    Pause,
    Resume,
    Stop,
    ResetTrip,
    PlugIn,
    Unplug,
}

impl ControlAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ControlAction::Pause => "pause",
            ControlAction::Resume => "resume",
            ControlAction::Stop => "stop",
            ControlAction::ResetTrip => "reset_trip",
            ControlAction::PlugIn => "plug_in",
            ControlAction::Unplug => "unplug",
        }
    }
}

impl fmt::Display for ControlAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ControlAction {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pause" => Ok(ControlAction::Pause),
            "resume" => Ok(ControlAction::Resume),
            "stop" => Ok(ControlAction::Stop),
            "reset_trip" => Ok(ControlAction::ResetTrip),
            "plug_in" => Ok(ControlAction::PlugIn),
            "unplug" => Ok(ControlAction::Unplug),
            other => Err(anyhow::anyhow!("Unknown action: {}", other)),
        }
    }
}

pub async fn apply_control(state: &AppState, action: ControlAction) {
    let mut engine = state.engine.write().await;
    match action {
        ControlAction::Pause => engine.pause(),
        ControlAction::Resume => engine.resume(),
        ControlAction::Stop => {
            engine.stop_scenario();
        }
        ControlAction::ResetTrip => engine.reset_trip(),
        ControlAction::PlugIn => engine.set_manual_charging(true),
        ControlAction::Unplug => engine.set_manual_charging(false),
    }
    info!(action = action.as_str(), "Host control applied");
}
