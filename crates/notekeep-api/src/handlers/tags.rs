//! Tag handlers.

use axum::{
    extract::{Path, State},
    Json,
};

use notekeep_core::{Note, TagWithCount};

use crate::auth::CurrentUser;
use crate::{ApiError, AppState};

/// GET /api/v1/tags
#[utoipa::path(
    get,
    path = "/api/v1/tags",
    tag = "Tags",
    responses(
        (status = 200, description = "Tags by name with active note counts", body = [TagWithCount]),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_tags(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
) -> Result<Json<Vec<TagWithCount>>, ApiError> {
    Ok(Json(state.tags.list_with_counts(&ctx).await?))
}

/// GET /api/v1/tags/:tag/notes
///
/// Responds 404 when no active note carries the tag, whether or not the tag
/// exists.
#[utoipa::path(
    get,
    path = "/api/v1/tags/{tag}/notes",
    tag = "Tags",
    params(("tag" = String, Path, description = "Tag name, case-insensitive")),
    responses(
        (status = 200, description = "Active notes with the tag", body = [Note]),
        (status = 404, description = "No active notes with this tag")
    )
)]
pub async fn notes_for_tag(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(tag): Path<String>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = state.notes.list(&ctx, false, Some(&tag)).await?;
    if notes.is_empty() {
        return Err(ApiError::NotFound(format!("No notes tagged '{}'", tag)));
    }
    Ok(Json(notes))
}
