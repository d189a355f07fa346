//! HTTP API module
//! 
//! This module contains all HTTP endpoint handlers and response structures.

pub mod handlers;
pub mod responses;

use std::sync::Arc;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use handlers::*;

/// Create the HTTP router with all endpoints
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ask-ai", post(ask_ai_handler).fallback(ask_ai_method_not_allowed))
        .route("/session", get(session_handler))
        .route("/session/start", post(session_start_handler))
        .route("/session/toggle", post(session_toggle_handler))
        .route("/session/stop", post(session_stop_handler))
        .route("/session/plan", get(session_plan_handler))
        .route("/session/events", get(session_events_handler))
        .route("/settings", get(settings_handler))
        .route("/settings/adjust", post(settings_adjust_handler))
        .route("/settings/theme", post(settings_theme_handler))
        .route("/settings/haptics", post(settings_haptics_handler))
        .route("/settings/voice", post(settings_voice_handler))
        .route("/recommendation/apply", post(apply_recommendation_handler))
        .route("/status", get(status_handler))
        .route("/health", get(health_handler))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
