//! API response structures

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Json, Response},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::{
    engine::{PhaseEvent, RhythmConfig},
    services::{ProxyError, UNAVAILABLE_MESSAGE},
    state::{SessionPhase, SessionState, Settings},
};

/// Session snapshot as seen by the view
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionResponse {
    pub phase: SessionPhase,
    pub current_cycle: u32,
    pub total_cycles: u32,
    pub is_active: bool,
    pub counter: String,
    pub timestamp: DateTime<Utc>,
}

impl From<SessionState> for SessionResponse {
    fn from(state: SessionState) -> Self {
        Self {
            phase: state.phase,
            current_cycle: state.current_cycle,
            total_cycles: state.total_cycles,
            is_active: state.is_active(),
            counter: state.counter_text(),
            timestamp: Utc::now(),
        }
    }
}

/// Planned transitions for the current settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanResponse {
    pub rhythm: RhythmConfig,
    pub total_duration_ms: u64,
    pub events: Vec<PhaseEvent>,
}

/// Settings together with the session they now apply to
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppliedResponse {
    pub settings: Settings,
    pub session: SessionResponse,
}

/// Enhanced status response with session information
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusResponse {
    pub session: SessionResponse,
    pub settings: Settings,
    pub ai_configured: bool,
    pub uptime: String,
    pub port: u16,
    pub host: String,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: DateTime<Utc>,
    pub version: String,
}

impl HealthResponse {
    /// Create a new health response
    pub fn ok() -> Self {
        Self {
            status: "ok".to_string(),
            timestamp: Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

/// Error body, the only shape a failed request returns
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self { error: error.into() }
    }
}

impl ProxyError {
    pub fn status(&self) -> StatusCode {
        match self {
            ProxyError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ProxyError::BadRequest => StatusCode::BAD_REQUEST,
            ProxyError::MissingCredential
            | ProxyError::Upstream(_)
            | ProxyError::MalformedResponse(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to show the client; server-side details stay in the log
    pub fn public_message(&self) -> String {
        match self {
            ProxyError::MethodNotAllowed | ProxyError::BadRequest => self.to_string(),
            _ => UNAVAILABLE_MESSAGE.to_string(),
        }
    }
}

impl IntoResponse for ProxyError {
    fn into_response(self) -> Response {
        match &self {
            ProxyError::MethodNotAllowed | ProxyError::BadRequest => warn!("Rejected ask-ai request: {}", self),
            ProxyError::MissingCredential => error!("FATAL: GEMINI_API_KEY is not configured"),
            ProxyError::Upstream(_) | ProxyError::MalformedResponse(_) => error!("ask-ai failed: {}", self),
        }

        let body = Json(ErrorResponse::new(self.public_message()));
        match self {
            ProxyError::MethodNotAllowed => {
                (self.status(), [(header::ALLOW, "POST")], body).into_response()
            }
            _ => (self.status(), body).into_response(),
        }
    }
}
