use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::error::{ApiError, ApiJson, ApiPath, ApiQuery};
use super::{with_storage, ApiState};
use crate::storage::{NewNote, NotePatch};

#[derive(Debug, Deserialize)]
pub struct NotesQuery {
    folder_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct CreateNoteBody {
    folder_id: Option<i64>,
    title: Option<String>,
    content: Option<String>,
}

/// `null` clears a text field, an absent key leaves it alone.
#[derive(Debug, Deserialize)]
pub struct UpdateNoteBody {
    #[serde(default, with = "::serde_with::rust::double_option")]
    title: Option<Option<String>>,
    #[serde(default, with = "::serde_with::rust::double_option")]
    content: Option<Option<String>>,
    folder_id: Option<i64>,
}

pub async fn list(
    State(state): State<ApiState>,
    ApiQuery(query): ApiQuery<NotesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let folder_id = query.folder_id.ok_or_else(|| {
        ApiError::BadRequest("folder_id query parameter is required".to_string())
    })?;
    let notes = with_storage(&state, move |storage| storage.list_notes(folder_id)).await?;
    Ok(Json(notes))
}

pub async fn create(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<CreateNoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let folder_id = body
        .folder_id
        .ok_or_else(|| ApiError::BadRequest("folder_id is required".to_string()))?;
    let new_note = NewNote {
        folder_id,
        title: body.title,
        content: body.content,
    };
    let note = with_storage(&state, move |storage| storage.create_note(&new_note)).await?;
    tracing::info!(note_id = note.id, folder_id, "note created");
    Ok((StatusCode::CREATED, Json(note)))
}

pub async fn show(
    State(state): State<ApiState>,
    ApiPath(note_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let note = with_storage(&state, move |storage| storage.fetch_note(note_id)).await?;
    Ok(Json(note))
}

pub async fn update(
    State(state): State<ApiState>,
    ApiPath(note_id): ApiPath<i64>,
    ApiJson(body): ApiJson<UpdateNoteBody>,
) -> Result<impl IntoResponse, ApiError> {
    let patch = NotePatch {
        title: body.title,
        content: body.content,
        folder_id: body.folder_id,
    };
    if patch.is_empty() {
        return Err(ApiError::BadRequest("no fields to update provided".to_string()));
    }
    let note = with_storage(&state, move |storage| storage.update_note(note_id, &patch)).await?;
    tracing::debug!(note_id, "note updated");
    Ok(Json(note))
}

pub async fn destroy(
    State(state): State<ApiState>,
    ApiPath(note_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    with_storage(&state, move |storage| storage.delete_note(note_id)).await?;
    tracing::info!(note_id, "note deleted");
    Ok(StatusCode::NO_CONTENT)
}
