//! HTTP endpoint handlers

use std::{convert::Infallible, sync::Arc};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{
        sse::{Event, KeepAlive, Sse},
        Json,
    },
};
use futures::Stream;
use serde::Deserialize;
use tokio_stream::{wrappers::BroadcastStream, StreamExt};
use tracing::{error, info, warn};

use crate::{
    engine::{session_events, RhythmConfig},
    services::{ProxyError, Recommendation},
    state::{AppState, SettingField, Settings, Theme},
};
use super::responses::{
    AppliedResponse, ErrorResponse, HealthResponse, PlanResponse, SessionResponse, StatusResponse,
};

type HandlerError = (StatusCode, Json<ErrorResponse>);

fn internal_error(context: &str, e: String) -> HandlerError {
    error!("{}: {}", context, e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse::new("Internal server error")),
    )
}

/// Handle POST /ask-ai - Proxy a mood query to the AI upstream
pub async fn ask_ai_handler(
    State(state): State<Arc<AppState>>,
    body: Bytes,
) -> Result<Json<Recommendation>, ProxyError> {
    state.proxy.ask(&body).await.map(Json)
}

/// Any method other than POST on /ask-ai
pub async fn ask_ai_method_not_allowed() -> ProxyError {
    ProxyError::MethodNotAllowed
}

/// Handle GET /session - Current session state
pub async fn session_handler(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    Json(state.session.state().into())
}

/// Handle POST /session/start - Start (or restart) with the current settings
pub async fn session_start_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, HandlerError> {
    let session = state
        .start_session()
        .map_err(|e| internal_error("Failed to start session", e))?;
    info!("Session start requested");
    Ok(Json(session.into()))
}

/// Handle POST /session/toggle - Start/Stop button
pub async fn session_toggle_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<SessionResponse>, HandlerError> {
    let session = state
        .toggle_session()
        .map_err(|e| internal_error("Failed to toggle session", e))?;
    Ok(Json(session.into()))
}

/// Handle POST /session/stop - Cancel the running session
pub async fn session_stop_handler(State(state): State<Arc<AppState>>) -> Json<SessionResponse> {
    Json(state.session.stop().into())
}

/// Handle GET /session/plan - Full transition plan for the current settings
pub async fn session_plan_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<PlanResponse>, HandlerError> {
    let rhythm = state
        .with_settings(|store| store.rhythm())
        .map_err(|e| internal_error("Failed to read settings", e))?;
    let events: Vec<_> = session_events(&rhythm).collect();
    let total_duration_ms = events.last().map(|e| e.offset_ms).unwrap_or(0);

    Ok(Json(PlanResponse {
        rhythm,
        total_duration_ms,
        events,
    }))
}

/// Handle GET /session/events - Server-sent feedback stream for the view
pub async fn session_events_handler(
    State(state): State<Arc<AppState>>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let stream = BroadcastStream::new(state.feedback.subscribe()).filter_map(|message| match message {
        Ok(feedback) => Event::default().json_data(&feedback).ok().map(Ok::<Event, Infallible>),
        Err(e) => {
            warn!("View fell behind the feedback stream: {}", e);
            None
        }
    });

    Sse::new(stream).keep_alive(KeepAlive::default())
}

/// Handle GET /settings - Current settings
pub async fn settings_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Settings>, HandlerError> {
    state
        .get_settings()
        .map(Json)
        .map_err(|e| internal_error("Failed to read settings", e))
}

#[derive(Debug, Deserialize)]
pub struct AdjustRequest {
    pub field: SettingField,
    pub delta: i32,
}

/// Handle POST /settings/adjust - Step a numeric setting within its bounds
pub async fn settings_adjust_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AdjustRequest>,
) -> Result<Json<Settings>, HandlerError> {
    let (changed, settings) = state
        .with_settings(|store| {
            let changed = store.adjust(request.field, request.delta);
            (changed, store.settings().clone())
        })
        .map_err(|e| internal_error("Failed to adjust settings", e))?;

    if !changed {
        info!("Ignored out-of-range adjustment of {:?} by {}", request.field, request.delta);
    }
    Ok(Json(settings))
}

#[derive(Debug, Deserialize)]
pub struct ThemeRequest {
    pub theme: Theme,
}

/// Handle POST /settings/theme - Switch between light and dark
pub async fn settings_theme_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<ThemeRequest>,
) -> Result<Json<Settings>, HandlerError> {
    state
        .with_settings(|store| {
            store.set_theme(request.theme);
            store.settings().clone()
        })
        .map(Json)
        .map_err(|e| internal_error("Failed to set theme", e))
}

/// Handle POST /settings/haptics - Toggle haptic pulses
pub async fn settings_haptics_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Settings>, HandlerError> {
    state
        .with_settings(|store| {
            store.toggle_haptics();
            store.settings().clone()
        })
        .map(Json)
        .map_err(|e| internal_error("Failed to toggle haptics", e))
}

/// Handle POST /settings/voice - Toggle voice guidance
pub async fn settings_voice_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Settings>, HandlerError> {
    state
        .toggle_voice()
        .map(Json)
        .map_err(|e| internal_error("Failed to toggle voice", e))
}

/// Handle POST /recommendation/apply - Adopt a suggested rhythm and reset
pub async fn apply_recommendation_handler(
    State(state): State<Arc<AppState>>,
    Json(rhythm): Json<RhythmConfig>,
) -> Result<Json<AppliedResponse>, HandlerError> {
    if let Err(e) = Settings::validate_rhythm(&rhythm) {
        warn!("Rejected recommended rhythm: {}", e);
        return Err((StatusCode::BAD_REQUEST, Json(ErrorResponse::new(e.to_string()))));
    }

    let settings = state
        .with_settings(|store| {
            store.apply_rhythm(rhythm);
            store.settings().clone()
        })
        .map_err(|e| internal_error("Failed to apply recommendation", e))?;

    info!("Applied recommended rhythm, resetting session");
    let session = state.session.reset();

    Ok(Json(AppliedResponse {
        settings,
        session: session.into(),
    }))
}

/// Handle GET /status - Return current server status
pub async fn status_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<StatusResponse>, HandlerError> {
    let settings = state
        .get_settings()
        .map_err(|e| internal_error("Failed to read settings", e))?;

    Ok(Json(StatusResponse {
        session: state.session.state().into(),
        settings,
        ai_configured: state.proxy.is_configured(),
        uptime: state.get_uptime(),
        port: state.port,
        host: state.host.clone(),
    }))
}

/// Handle GET /health - Health check endpoint
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::ok())
}
