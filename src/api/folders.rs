use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;

use super::error::{ApiError, ApiJson, ApiPath};
use super::{with_storage, ApiState};

#[derive(Debug, Deserialize)]
pub struct FolderBody {
    name: Option<String>,
}

impl FolderBody {
    fn into_name(self) -> Result<String, ApiError> {
        self.name
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ApiError::BadRequest("folder name is required".to_string()))
    }
}

pub async fn list(State(state): State<ApiState>) -> Result<impl IntoResponse, ApiError> {
    let folders = with_storage(&state, |storage| storage.list_folders()).await?;
    Ok(Json(folders))
}

pub async fn create(
    State(state): State<ApiState>,
    ApiJson(body): ApiJson<FolderBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.into_name()?;
    let folder = with_storage(&state, move |storage| storage.create_folder(&name)).await?;
    tracing::info!(folder_id = folder.id, "folder created");
    Ok((StatusCode::CREATED, Json(folder)))
}

pub async fn show(
    State(state): State<ApiState>,
    ApiPath(folder_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    let folder = with_storage(&state, move |storage| storage.fetch_folder(folder_id)).await?;
    Ok(Json(folder))
}

pub async fn update(
    State(state): State<ApiState>,
    ApiPath(folder_id): ApiPath<i64>,
    ApiJson(body): ApiJson<FolderBody>,
) -> Result<impl IntoResponse, ApiError> {
    let name = body.into_name()?;
    let folder =
        with_storage(&state, move |storage| storage.rename_folder(folder_id, &name)).await?;
    Ok(Json(folder))
}

pub async fn destroy(
    State(state): State<ApiState>,
    ApiPath(folder_id): ApiPath<i64>,
) -> Result<impl IntoResponse, ApiError> {
    with_storage(&state, move |storage| storage.delete_folder(folder_id)).await?;
    tracing::info!(folder_id, "folder deleted");
    Ok(StatusCode::NO_CONTENT)
}
