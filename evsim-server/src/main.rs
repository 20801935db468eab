//! EVSim Server
//!
//! Scenario host with a local control API and telemetry stream

use anyhow::Result;
use evsim_core::SimConfig;
use evsim_server::{api, manager, sinks::LogTransport, state};
use std::path::PathBuf;
use tracing::info;

/// Log one snapshot in this many at debug level
const LOG_EVERY_TICKS: u64 = 50;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    info!("Starting EVSim Server");

    // Optional config path as the first argument
    let config_path = std::env::args().nth(1).map(PathBuf::from);
    let config = SimConfig::load_or_default(config_path.as_deref());
    let params = config.vehicle.parameters();
    info!(
        profile = ?params.profile,
        battery_kwh = params.battery_capacity_kwh,
        tick_ms = config.host.tick_interval_ms,
        "Vehicle configured"
    );

    // Create application state
    let state = state::AppState::new(&config);
    state
        .register_transport(Box::new(LogTransport::new(
            LOG_EVERY_TICKS,
            Some("speed,soc,power,battery_temp,motor_temp,warnings"),
        )))
        .await;

    // Build the router
    let app = api::create_router(state.clone());

    // Start scenario host in background
    let host = tokio::spawn(manager::run(state.clone()));

    // Start server
    let addr = config.host.listen;
    info!("Server listening on http://{}", addr);
    info!("POST /api/scenario to start a scenario; GET /api/scenarios lists them");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    let shutdown = state.shutdown.clone();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            let _ = tokio::signal::ctrl_c().await;
            info!("Shutdown requested");
            shutdown.cancel();
        })
        .await?;

    host.await?;
    Ok(())
}
