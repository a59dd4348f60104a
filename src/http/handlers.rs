use super::state::AppState;
use crate::room::PresentationState;
use crate::session::SessionStatus;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use tracing::info;

#[derive(Debug, Serialize, Deserialize)]
pub struct EndSessionResponse {
    pub session_id: String,
    pub status: String,
    pub message: String,
    pub stats: SessionStatus,
}

/// GET /session/status
pub async fn get_session_status(State(state): State<AppState>) -> Json<SessionStatus> {
    Json(state.room.controller().stats().await)
}

/// GET /session/metrics
/// Latest fused metrics as the presentation layer renders them
pub async fn get_session_metrics(State(state): State<AppState>) -> Json<PresentationState> {
    Json(state.room.render().await)
}

/// POST /session/end
/// Stop the analyzers and tear the session down before responding
pub async fn end_session(State(state): State<AppState>) -> impl IntoResponse {
    let session_id = state.room.controller().config().session_id.clone();
    info!("End requested for session {}", session_id);

    state.room.on_end().await;
    let stats = state.room.controller().stats().await;

    state.shutdown.cancel();

    (
        StatusCode::OK,
        Json(EndSessionResponse {
            session_id,
            status: stats.state.to_string(),
            message: format!("Session ended after {}", stats.timer_text),
            stats,
        }),
    )
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}
