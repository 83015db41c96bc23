//! Leaderboard endpoint

use axum::{extract::State, Json};
use vocab_core::rewards;

use crate::error::Result;
use crate::models::{DbUser, LeaderboardEntry};
use crate::AppState;

/// GET /api/leaderboard
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<LeaderboardEntry>>> {
    let users: Vec<_> = state
        .db
        .list_users()
        .await?
        .iter()
        .map(DbUser::to_core_user)
        .collect();
    Ok(Json(rewards::leaderboard(&users)))
}
