//! Dashboard stats endpoint

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use chrono::Utc;
use vocab_core::session;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::routes::study::cards_in_view;
use crate::AppState;

/// GET /api/stats?set_id=
pub async fn get(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<SetFilterQuery>,
) -> Result<Json<StudyStats>> {
    let user = state
        .db
        .get_user(auth.user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?
        .to_core_user();
    let (cards, progress) = cards_in_view(&state, auth.user_id, query.set_id).await?;

    Ok(Json(session::study_stats(&cards, &progress, &user, Utc::now())))
}
