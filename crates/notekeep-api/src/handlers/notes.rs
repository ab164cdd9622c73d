//! Note handlers.
//!
//! Every mutation emits a `notes.changed` event for the owning user after
//! the repository call succeeds.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use notekeep_core::{Note, NoteChange, NoteDraft, RequestContext};

use crate::auth::CurrentUser;
use crate::{ApiError, AppState};

/// Query parameters for the active-notes listing.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct NotesQuery {
    /// Case-insensitive substring over title, text, and tag names.
    pub q: Option<String>,
    /// List archived notes instead of active ones.
    #[serde(default)]
    pub archived: bool,
}

/// Query parameters for the archive listing.
#[derive(Debug, Default, Deserialize, utoipa::IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ArchivedQuery {
    pub q: Option<String>,
}

async fn search_or_list(
    state: &AppState,
    ctx: &RequestContext,
    q: Option<&str>,
    archived: bool,
) -> Result<Vec<Note>, ApiError> {
    let notes = match q {
        Some(q) => state.notes.search(ctx, q, archived).await?,
        None => state.notes.list(ctx, archived, None).await?,
    };
    Ok(notes)
}

/// GET /api/v1/notes
#[utoipa::path(
    get,
    path = "/api/v1/notes",
    tag = "Notes",
    params(NotesQuery),
    responses(
        (status = 200, description = "Notes, most recently updated first", body = [Note]),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_notes(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<NotesQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = search_or_list(&state, &ctx, query.q.as_deref(), query.archived).await?;
    Ok(Json(notes))
}

/// GET /api/v1/archived
#[utoipa::path(
    get,
    path = "/api/v1/archived",
    tag = "Notes",
    params(ArchivedQuery),
    responses(
        (status = 200, description = "Archived notes", body = [Note]),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_archived(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Query(query): Query<ArchivedQuery>,
) -> Result<Json<Vec<Note>>, ApiError> {
    let notes = search_or_list(&state, &ctx, query.q.as_deref(), true).await?;
    Ok(Json(notes))
}

/// POST /api/v1/notes
#[utoipa::path(
    post,
    path = "/api/v1/notes",
    tag = "Notes",
    request_body = NoteDraft,
    responses(
        (status = 201, description = "Note created", body = Note),
        (status = 400, description = "Blank title or text"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn create_note(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Json(draft): Json<NoteDraft>,
) -> Result<(StatusCode, Json<Note>), ApiError> {
    let note = state.notes.create(&ctx, draft).await?;
    state
        .event_bus
        .notes_changed(ctx.user_id(), note.id, NoteChange::Created);
    Ok((StatusCode::CREATED, Json(note)))
}

/// GET /api/v1/notes/:id
#[utoipa::path(
    get,
    path = "/api/v1/notes/{id}",
    tag = "Notes",
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 200, description = "The note", body = Note),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn get_note(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<Json<Note>, ApiError> {
    Ok(Json(state.notes.fetch(&ctx, id).await?))
}

/// PUT /api/v1/notes/:id
#[utoipa::path(
    put,
    path = "/api/v1/notes/{id}",
    tag = "Notes",
    params(("id" = Uuid, Path, description = "Note id")),
    request_body = NoteDraft,
    responses(
        (status = 200, description = "Updated note", body = Note),
        (status = 400, description = "Blank title or text"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn update_note(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
    Json(draft): Json<NoteDraft>,
) -> Result<Json<Note>, ApiError> {
    let note = state.notes.update(&ctx, id, draft).await?;
    state
        .event_bus
        .notes_changed(ctx.user_id(), id, NoteChange::Updated);
    Ok(Json(note))
}

/// DELETE /api/v1/notes/:id
#[utoipa::path(
    delete,
    path = "/api/v1/notes/{id}",
    tag = "Notes",
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 204, description = "Deleted"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn delete_note(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.notes.delete(&ctx, id).await?;
    state
        .event_bus
        .notes_changed(ctx.user_id(), id, NoteChange::Deleted);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notes/:id/archive
#[utoipa::path(
    post,
    path = "/api/v1/notes/{id}/archive",
    tag = "Notes",
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 204, description = "Archived"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn archive_note(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.notes.archive(&ctx, id).await?;
    state
        .event_bus
        .notes_changed(ctx.user_id(), id, NoteChange::Archived);
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/notes/:id/unarchive
#[utoipa::path(
    post,
    path = "/api/v1/notes/{id}/unarchive",
    tag = "Notes",
    params(("id" = Uuid, Path, description = "Note id")),
    responses(
        (status = 204, description = "Unarchived"),
        (status = 404, description = "Not found or not owned")
    )
)]
pub async fn unarchive_note(
    State(state): State<AppState>,
    CurrentUser(ctx): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.notes.unarchive(&ctx, id).await?;
    state
        .event_bus
        .notes_changed(ctx.user_id(), id, NoteChange::Unarchived);
    Ok(StatusCode::NO_CONTENT)
}
