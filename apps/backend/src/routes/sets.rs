//! Word set endpoints

use axum::{
    extract::{Path, State},
    Extension, Json,
};
use uuid::Uuid;

use crate::error::{ApiError, Result};
use crate::models::*;
use crate::routes::auth::AuthenticatedUser;
use crate::AppState;

/// GET /api/sets
pub async fn list(State(state): State<AppState>) -> Result<Json<Vec<WordSet>>> {
    let sets = state.db.list_sets().await?;
    Ok(Json(sets.iter().map(DbSet::to_core_set).collect()))
}

/// POST /api/sets (admin)
pub async fn create(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Json(payload): Json<CreateSetRequest>,
) -> Result<Json<WordSet>> {
    auth.require_admin()?;
    if payload.book.trim().is_empty() {
        return Err(ApiError::BadRequest("book is required".to_string()));
    }

    let set = state.db.create_set(&payload.book, payload.unit).await?;
    tracing::info!(set_id = %set.id, title = %set.title, "Created word set");

    Ok(Json(set.to_core_set()))
}

/// DELETE /api/sets/:id (admin)
/// Cards in the set are kept and stay visible in the global view.
pub async fn delete(
    State(state): State<AppState>,
    Extension(auth): Extension<AuthenticatedUser>,
    Path(set_id): Path<Uuid>,
) -> Result<Json<DeleteSetResponse>> {
    auth.require_admin()?;
    let deleted = state.db.delete_set(set_id).await?;
    if !deleted {
        return Err(ApiError::NotFound(format!("set {set_id} not found")));
    }

    tracing::info!(%set_id, "Deleted word set");
    Ok(Json(DeleteSetResponse { deleted }))
}
