use axum::{extract::State, http::StatusCode, response::Json};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    handlers::{
        extract::{AppJson, AppPath},
        success, success_message, AppState,
    },
    middleware::auth::AuthenticatedUser,
    models::{CreateFolderRequest, Folder, FolderTree, RenameFolderRequest},
};

#[utoipa::path(
    get,
    path = "/api/folders",
    tag = "folders",
    responses(
        (status = 200, description = "Root folder and every folder of the user", body = FolderTree),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn list_folders(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Value>> {
    let root_folder = state.media.ensure_user_root_folder(auth.id).await?;
    let folders = state.media.get_folder_tree(auth.id).await?;

    Ok(success(FolderTree { root_folder, folders }))
}

#[utoipa::path(
    post,
    path = "/api/folders",
    tag = "folders",
    request_body = CreateFolderRequest,
    responses(
        (status = 201, description = "Folder created", body = Folder),
        (status = 400, description = "Invalid name or name already used at this level"),
        (status = 404, description = "Parent folder not found")
    )
)]
pub async fn create_folder(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(request): AppJson<CreateFolderRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Folder name is required".to_string()));
    }

    let folder = state
        .media
        .create_folder(&request.name, request.parent_id, auth.id)
        .await?;

    Ok((StatusCode::CREATED, success(folder)))
}

#[utoipa::path(
    put,
    path = "/api/folders/{id}",
    tag = "folders",
    params(("id" = Uuid, Path, description = "Folder id")),
    request_body = RenameFolderRequest,
    responses(
        (status = 200, description = "Folder renamed", body = Folder),
        (status = 400, description = "Invalid name, name already used, or root folder"),
        (status = 403, description = "Folder belongs to another user"),
        (status = 404, description = "Folder not found")
    )
)]
pub async fn rename_folder(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppPath(folder_id): AppPath<Uuid>,
    AppJson(request): AppJson<RenameFolderRequest>,
) -> Result<Json<Value>> {
    let name = request.name.trim();
    if name.is_empty() {
        return Err(AppError::Validation("Folder name is required".to_string()));
    }

    let folder = state.media.rename_folder(folder_id, name, auth.id).await?;
    Ok(success(folder))
}

#[utoipa::path(
    delete,
    path = "/api/folders/{id}",
    tag = "folders",
    params(("id" = Uuid, Path, description = "Folder id")),
    responses(
        (status = 200, description = "Folder deleted"),
        (status = 400, description = "Root folder or folder not empty"),
        (status = 403, description = "Folder belongs to another user"),
        (status = 404, description = "Folder not found")
    )
)]
pub async fn delete_folder(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppPath(folder_id): AppPath<Uuid>,
) -> Result<Json<Value>> {
    state.media.delete_folder(folder_id, auth.id).await?;
    Ok(success_message("Folder deleted successfully"))
}
