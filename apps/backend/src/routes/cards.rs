//! Card endpoints

use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use chrono::Utc;
use uuid::Uuid;
use vocab_core::algorithm;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/cards?set_id=
/// Cards in view, each carrying the caller's box and next review time
pub async fn list(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<SetFilterQuery>,
) -> Result<Json<Vec<Card>>> {
    let cards = state.db.list_cards(query.set_id).await?;
    let progress = state.db.progress_map(auth.user_id).await?;

    Ok(Json(
        cards
            .iter()
            .map(|c| {
                let review = progress.get(auth.user_id, c.id).unwrap_or_else(ReviewState::unseen);
                c.to_core_card(review)
            })
            .collect(),
    ))
}

/// POST /api/cards (admin)
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<NewCard>,
) -> Result<Json<Card>> {
    auth.require_admin()?;

    let set_id = payload.set_id;
    if state.db.get_set(set_id).await?.is_none() {
        return Err(ApiError::NotFound(format!("set {set_id} not found")));
    }

    let now = Utc::now();
    let card = payload
        .into_card(now)
        .ok_or_else(|| ApiError::BadRequest("term and definition are required".to_string()))?;
    let stored = state.db.create_card(&card, now).await?;

    tracing::info!(card_id = %stored.id, %set_id, "Added card");
    Ok(Json(stored.to_core_card(ReviewState::unseen())))
}

/// POST /api/cards/:id/force-due (admin)
/// Makes the card due now for every learner; boxes are unchanged.
pub async fn force_due(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(card_id): Path<Uuid>,
) -> Result<Json<Card>> {
    auth.require_admin()?;
    let card = state
        .db
        .get_card(card_id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("card {card_id} not found")))?;

    let now = Utc::now();
    let updated = state.db.force_due(card_id, now).await?;
    tracing::info!(%card_id, learners = updated, "Forced card due");

    let current = state
        .db
        .get_progress(auth.user_id, card_id)
        .await?
        .map(|p| p.to_review_state())
        .unwrap_or_else(ReviewState::unseen);
    Ok(Json(card.to_core_card(algorithm::force_due(current, now))))
}
