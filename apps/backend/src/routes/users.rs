//! Registration and profile endpoints

use axum::{extract::State, Extension, Json};
use chrono::Utc;

use crate::error::{ApiError, Result};
use crate::models::{RegisterRequest, RegisterResponse, Role, User};
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// POST /api/auth/register
/// Creates a user and returns its bearer token
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>> {
    // Validate through the core type so trimming rules match local mode
    let role = Role::from_invite(
        payload.invite_code.as_deref(),
        &state.config.admin_invite_code,
    );
    let draft = User::new(&payload.name, &payload.email, role, Utc::now());
    if draft.name.is_empty() || draft.email.is_empty() {
        return Err(ApiError::BadRequest("name and email are required".to_string()));
    }

    let user = state.db.create_user(&draft.name, &draft.email, role).await?;

    tracing::info!(user_id = %user.id, role = role.as_str(), "Registered new user");

    Ok(Json(RegisterResponse {
        user_id: user.id,
        token: user.token,
        role,
    }))
}

/// GET /api/me
pub async fn me(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
) -> Result<Json<User>> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    Ok(Json(user.to_core_user()))
}
