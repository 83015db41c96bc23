//! Quiz endpoints

use axum::{
    extract::{Query, State},
    Extension, Json,
};
use vocab_core::session::QuizSession;

use crate::error::Result;
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::routes::study::{cards_in_view, session_seed};
use crate::AppState;

/// GET /api/quiz?set_id=&seed=
/// Questions carry the term and the options; answers stay on the server.
/// The quiz replaces any earlier one the user had open.
pub async fn generate(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Query(query): Query<SeededQuery>,
) -> Result<Json<QuizResponse>> {
    let seed = session_seed(query.seed);
    let (cards, _) = cards_in_view(&state, auth.user_id, query.set_id).await?;
    let quiz = QuizSession::generate(&cards, seed);
    state.db.save_quiz(auth.user_id, &quiz).await?;

    Ok(Json(QuizResponse {
        seed,
        questions: quiz
            .questions()
            .iter()
            .map(|q| QuizQuestionView {
                card_id: q.card_id,
                question: q.question.clone(),
                options: q.options.clone(),
            })
            .collect(),
    }))
}

/// POST /api/quiz/answer
/// Answers the current question of the user's quiz. Questions are answered
/// in order and once each; anything else is a conflict.
pub async fn answer(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<QuizAnswerRequest>,
) -> Result<Json<QuizAnswerResponse>> {
    let record = state
        .db
        .answer_quiz(auth.user_id, payload.card_id, &payload.choice)
        .await?;

    Ok(Json(QuizAnswerResponse {
        correct: record.outcome.correct,
        answer: record.outcome.answer,
        coins_awarded: record.reward.coins,
        coins: record.user.to_core_user().coins,
        score: record.score,
        finished: record.finished,
    }))
}
