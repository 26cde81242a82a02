use axum::{extract::State, response::Json};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    handlers::{
        extract::{AppPath, AppQuery},
        success, success_message, AppState,
    },
    middleware::auth::AuthenticatedUser,
    models::{File, FolderContentsQuery},
    services::{image_processor::thumbnail_keys, FolderContents},
    utils::file::user_file_key,
};

#[utoipa::path(
    get,
    path = "/api/files",
    tag = "files",
    params(FolderContentsQuery),
    responses(
        (status = 200, description = "Sub-folders and files of the folder", body = FolderContents),
        (status = 403, description = "Folder belongs to another user"),
        (status = 404, description = "Folder not found")
    )
)]
pub async fn list_files(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppQuery(query): AppQuery<FolderContentsQuery>,
) -> Result<Json<Value>> {
    let folder_id = match query.folder_id {
        Some(id) => id,
        None => state.media.ensure_user_root_folder(auth.id).await?.id,
    };

    let contents = state.media.get_folder_contents(folder_id, auth.id).await?;
    Ok(success(contents))
}

#[utoipa::path(
    get,
    path = "/api/files/public",
    tag = "files",
    responses((status = 200, description = "Files shared publicly", body = [File]))
)]
pub async fn list_public_files(
    State(state): State<AppState>,
    _auth: AuthenticatedUser,
) -> Result<Json<Value>> {
    let files = state.media.get_public_files().await?;
    Ok(success(files))
}

#[utoipa::path(
    get,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 200, description = "File record", body = File),
        (status = 403, description = "Private file of another user"),
        (status = 404, description = "File not found")
    )
)]
pub async fn get_file(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppPath(file_id): AppPath<Uuid>,
) -> Result<Json<Value>> {
    let file = state
        .media
        .get_file_by_id(file_id)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    if file.user_id != auth.id && !file.is_public {
        return Err(AppError::Forbidden("Access denied to this file".to_string()));
    }

    Ok(success(file))
}

#[utoipa::path(
    delete,
    path = "/api/files/{id}",
    tag = "files",
    params(("id" = Uuid, Path, description = "File id")),
    responses(
        (status = 200, description = "File deleted"),
        (status = 403, description = "File belongs to another user"),
        (status = 404, description = "File not found")
    )
)]
pub async fn delete_file(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppPath(file_id): AppPath<Uuid>,
) -> Result<Json<Value>> {
    let file = state.media.delete_file(file_id, auth.id).await?;

    // The row is gone; leftover blobs are only logged.
    let mut keys = vec![user_file_key(file.user_id, &file.name)];
    keys.extend(thumbnail_keys(file.user_id, file.id));

    for key in keys {
        if let Err(e) = state.storage.delete(&key).await {
            tracing::error!("Failed to remove {} for deleted file {}: {}", key, file.id, e);
        }
    }

    Ok(success_message("File deleted successfully"))
}
