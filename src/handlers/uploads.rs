use axum::{body::Body, extract::State, http::header, response::Response};
use tokio_util::io::ReaderStream;

use crate::{
    errors::{AppError, Result},
    handlers::{extract::AppPath, AppState},
    utils::file::{content_type_for, user_file_key},
};

const CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

/// Streams the blob stored under `key`.
async fn serve_key(state: &AppState, key: &str) -> Result<Response> {
    if !state.storage.exists(key).await? {
        return Err(AppError::NotFound("File not found".to_string()));
    }

    let size = state.storage.size(key).await?;
    let reader = state.storage.retrieve(key).await?;

    Response::builder()
        .header(header::CONTENT_TYPE, content_type_for(key))
        .header(header::CONTENT_LENGTH, size)
        .header(header::CACHE_CONTROL, CACHE_CONTROL)
        .body(Body::from_stream(ReaderStream::new(reader)))
        .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to build response: {}", e)))
}

/// `GET /api/uploads/*path`
pub async fn serve_upload(
    State(state): State<AppState>,
    AppPath(path): AppPath<String>,
) -> Result<Response> {
    serve_key(&state, &path).await
}

/// `GET /uploads/users/:user/files/:name`
pub async fn serve_user_file(
    State(state): State<AppState>,
    AppPath((user, name)): AppPath<(String, String)>,
) -> Result<Response> {
    serve_key(&state, &format!("users/{}/files/{}", user, name)).await
}

/// `GET /uploads/users/:user/thumbs/:name`
pub async fn serve_thumbnail(
    State(state): State<AppState>,
    AppPath((user, name)): AppPath<(String, String)>,
) -> Result<Response> {
    serve_key(&state, &format!("users/{}/thumbs/{}", user, name)).await
}

/// `GET /uploads/:name`, resolved through the file table by physical name.
pub async fn serve_by_name(
    State(state): State<AppState>,
    AppPath(name): AppPath<String>,
) -> Result<Response> {
    let file = state
        .media
        .get_file_by_name(&name)
        .await?
        .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

    serve_key(&state, &user_file_key(file.user_id, &file.name)).await
}
