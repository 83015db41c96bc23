//! Study-time session endpoints

use axum::{extract::State, Extension, Json};

use crate::error::Result;
use crate::models::{SessionHeartbeatResponse, SessionStartResponse, SessionStopResponse};
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// POST /api/session/start
/// Starting a session that is already running changes nothing.
pub async fn start(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SessionStartResponse>> {
    let started = state.timers.start(auth.user_id);
    Ok(Json(SessionStartResponse { started }))
}

/// POST /api/session/heartbeat
/// Keeps a running session alive; sessions without heartbeats end on their own.
pub async fn heartbeat(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SessionHeartbeatResponse>> {
    let running = state.timers.heartbeat(auth.user_id);
    Ok(Json(SessionHeartbeatResponse { running }))
}

/// POST /api/session/stop
/// Flushes the partial remainder; a no-op if no session is running.
pub async fn stop(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<SessionStopResponse>> {
    let session_ms = state.timers.stop(auth.user_id).await;
    Ok(Json(SessionStopResponse {
        stopped: session_ms.is_some(),
        session_ms: session_ms.unwrap_or(0),
    }))
}
