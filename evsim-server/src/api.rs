//! REST API and SSE routes

use crate::manager::{self, ControlAction};
use crate::state::{AppState, HostStatus};
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{
        sse::{Event, KeepAlive, Sse},
        IntoResponse, Response,
    },
    routing::{get, post},
    Json, Router,
};
use evsim_core::model::FieldMask;
use evsim_scenarios::{catalogue, ScenarioInfo, ScenarioKind};
use futures::stream::{Stream, StreamExt as FuturesStreamExt};
use serde::Deserialize;
use std::convert::Infallible;
use tokio_stream::wrappers::BroadcastStream;
use tower_http::cors::CorsLayer;

/// Create the main application router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/scenarios", get(list_scenarios))
        .route("/api/scenario", post(start_scenario))
        .route("/api/control", post(control))
        .route("/api/status", get(status))
        .route("/api/telemetry", get(latest_telemetry))
        .route("/api/telemetry/stream", get(telemetry_stream))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// === Scenario Endpoints ===

async fn list_scenarios() -> Json<Vec<ScenarioInfo>> {
    Json(catalogue())
}

#[derive(Deserialize)]
struct StartScenarioRequest {
    key: String,
    charge_power_kw: Option<f64>,
}

async fn start_scenario(
    State(state): State<AppState>,
    Json(request): Json<StartScenarioRequest>,
) -> Result<Json<HostStatus>, (StatusCode, String)> {
    let kind: ScenarioKind = request
        .key
        .parse()
        .map_err(|e: evsim_scenarios::UnknownScenario| (StatusCode::BAD_REQUEST, e.to_string()))?;

    if let Some(power) = request.charge_power_kw {
        if kind != ScenarioKind::Charging {
            return Err((
                StatusCode::BAD_REQUEST,
                "charge_power_kw only applies to the charging scenario".to_string(),
            ));
        }
        if !(power.is_finite() && power > 0.0) {
            return Err((
                StatusCode::BAD_REQUEST,
                format!("charge_power_kw must be positive, got {}", power),
            ));
        }
    }

    manager::start_scenario(&state, kind, request.charge_power_kw).await;
    Ok(Json(state.status().await))
}

// === Host Control Endpoints ===

#[derive(Deserialize)]
struct ControlRequest {
    action: String,
}

async fn control(
    State(state): State<AppState>,
    Json(request): Json<ControlRequest>,
) -> Result<Json<HostStatus>, (StatusCode, String)> {
    let action: ControlAction = request
        .action
        .parse()
        .map_err(|e: anyhow::Error| (StatusCode::BAD_REQUEST, e.to_string()))?;

    manager::apply_control(&state, action).await;
    Ok(Json(state.status().await))
}

async fn status(State(state): State<AppState>) -> Json<HostStatus> {
    Json(state.status().await)
}

// === Telemetry Endpoints ===

#[derive(Deserialize)]
struct FieldsQuery {
    fields: Option<String>,
}

async fn latest_telemetry(
    State(state): State<AppState>,
    Query(query): Query<FieldsQuery>,
) -> Result<Response, (StatusCode, String)> {
    let latest = state.latest.read().await;
    let snapshot = latest
        .as_ref()
        .ok_or((StatusCode::NOT_FOUND, "No telemetry yet".to_string()))?;

    let mask = query.fields.map(|f| FieldMask::parse(&f));
    let json = snapshot.to_json_filtered(mask.as_ref()).map_err(|e| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            format!("Failed to serialize snapshot: {}", e),
        )
    })?;

    Ok(([(header::CONTENT_TYPE, "application/json")], json).into_response())
}

async fn telemetry_stream(
    State(state): State<AppState>,
    Query(query): Query<FieldsQuery>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = state.subscribe();
    let field_mask = query.fields.map(|f| FieldMask::parse(&f));

    let stream = BroadcastStream::new(rx).filter_map(move |result| {
        let mask = field_mask.clone();
        async move {
            match result {
                Ok(snapshot) => match snapshot.to_json_filtered(mask.as_ref()) {
                    Ok(json) => Some(Ok(Event::default().data(json))),
                    Err(e) => {
                        tracing::error!("Failed to serialize snapshot: {}", e);
                        None
                    }
                },
                Err(e) => {
                    // Lagged receivers skip ahead
                    tracing::warn!("Broadcast stream error: {}", e);
                    None
                }
            }
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}
