//! Study endpoints

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use uuid::Uuid;
use vocab_core::session;
use vocab_core::store::ProgressMap;
use vocab_core::types::SessionContext;

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// The client's seed, or a fresh one when none was sent.
pub(crate) fn session_seed(seed: Option<u32>) -> u32 {
    seed.unwrap_or_else(|| Uuid::new_v4().as_fields().0)
}

/// Cards in view with the user's state applied, plus the state itself.
pub(crate) async fn cards_in_view(
    state: &AppState,
    user_id: Uuid,
    set_id: Option<Uuid>,
) -> Result<(Vec<Card>, ProgressMap)> {
    let cards = state.db.list_cards(set_id).await?;
    let progress = state.db.progress_map(user_id).await?;
    let cards = cards
        .iter()
        .map(|c| {
            let review = progress.get(user_id, c.id).unwrap_or_else(ReviewState::unseen);
            c.to_core_card(review)
        })
        .collect();
    Ok((cards, progress))
}

/// GET /api/study/queue?set_id=&seed=
pub async fn queue(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<SeededQuery>,
) -> Result<Json<StudyQueueResponse>> {
    let seed = session_seed(query.seed);
    let ctx = SessionContext::now(auth.user_id);
    let (cards, progress) = cards_in_view(&state, auth.user_id, query.set_id).await?;

    let queue = session::review_queue(&cards, &progress, &ctx, seed);

    Ok(Json(StudyQueueResponse {
        seed,
        cards: queue.into_iter().cloned().collect(),
    }))
}

/// POST /api/study/grade
/// Only due cards can be graded; an easy grade pays out once per review.
pub async fn grade(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<GradeRequest>,
) -> Result<Json<GradeResponse>> {
    let ctx = SessionContext::now(auth.user_id);
    let record = state
        .db
        .grade(auth.user_id, payload.card_id, payload.is_easy, ctx.now)
        .await?;

    tracing::debug!(
        user_id = %auth.user_id,
        card_id = %payload.card_id,
        new_box = record.schedule.new_box,
        "card graded"
    );

    Ok(Json(GradeResponse {
        card_id: payload.card_id,
        previous_box: record.schedule.previous_box,
        new_box: record.schedule.new_box,
        next_review: record.schedule.next_review,
        coins_awarded: record.reward.coins,
        coins: record.user.to_core_user().coins,
    }))
}
