use axum::{
    extract::{Multipart, State},
    http::StatusCode,
    response::Json,
};
use serde_json::Value;
use uuid::Uuid;

use crate::{
    errors::{AppError, Result},
    handlers::{success, AppState},
    middleware::auth::AuthenticatedUser,
    models::{File, UploadFileForm},
    services::{image_processor::ImageProcessor, UploadFileCommand},
    utils::file::{format_size, guess_mime_type, user_file_key},
};

/// Headroom on top of `max_file_size` for the multipart framing and the
/// other form fields, so oversized files reach the explicit size check.
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

struct UploadForm {
    file_name: String,
    content_type: Option<String>,
    data: Vec<u8>,
    folder_id: Option<Uuid>,
    is_public: bool,
}

async fn read_form(mut multipart: Multipart) -> Result<UploadForm> {
    let mut file: Option<(String, Option<String>, Vec<u8>)> = None;
    let mut folder_id = None;
    let mut is_public = false;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("Invalid multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();

        match name.as_str() {
            "file" => {
                let file_name = field.file_name().unwrap_or("").to_string();
                let content_type = field.content_type().map(|s| s.to_string());
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::Validation(format!("Failed to read upload: {}", e)))?;
                file = Some((file_name, content_type, data.to_vec()));
            }
            "folderId" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid folderId: {}", e)))?;
                let id = Uuid::parse_str(text.trim())
                    .map_err(|_| AppError::Validation("Invalid folderId".to_string()))?;
                folder_id = Some(id);
            }
            "isPublic" => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| AppError::Validation(format!("Invalid isPublic: {}", e)))?;
                is_public = text.trim() == "true";
            }
            _ => {}
        }
    }

    let (file_name, content_type, data) =
        file.ok_or_else(|| AppError::Validation("No file provided".to_string()))?;

    Ok(UploadForm {
        file_name,
        content_type,
        data,
        folder_id,
        is_public,
    })
}

#[utoipa::path(
    post,
    path = "/api/files/upload",
    tag = "files",
    request_body(content = UploadFileForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "File stored", body = File),
        (status = 400, description = "Missing file, bad folder id, file too large or duplicate content"),
        (status = 403, description = "Folder belongs to another user"),
        (status = 404, description = "Folder not found")
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>)> {
    let form = read_form(multipart).await?;

    if form.file_name.trim().is_empty() {
        return Err(AppError::Validation("No file provided".to_string()));
    }

    let max_size = state.config.max_file_size;
    if form.data.len() as u64 > max_size {
        return Err(AppError::Validation(format!(
            "File size exceeds {} limit",
            format_size(max_size)
        )));
    }

    let folder_id = match form.folder_id {
        Some(id) => id,
        None => state.media.ensure_user_root_folder(auth.id).await?.id,
    };

    let mime_type = form
        .content_type
        .filter(|ct| ct.contains('/') && ct != "application/octet-stream")
        .unwrap_or_else(|| guess_mime_type(&form.file_name));

    let command = UploadFileCommand {
        original_name: form.file_name,
        data: form.data,
        mime_type,
        folder_id,
        user_id: auth.id,
        is_public: form.is_public,
    };

    let file = state.media.upload_file(&command).await?;

    let key = user_file_key(auth.id, &file.name);
    if let Err(e) = state.storage.store(&key, &command.data).await {
        tracing::error!("Failed to write {} for file {}: {}", key, file.id, e);
        if let Err(cleanup) = state.media.delete_file(file.id, auth.id).await {
            tracing::error!("Failed to remove orphaned row {}: {}", file.id, cleanup);
        }
        return Err(e);
    }

    if file.is_image() {
        if let Err(e) =
            ImageProcessor::generate_thumbnails(state.storage.as_ref(), auth.id, file.id, command.data)
                .await
        {
            tracing::warn!("Thumbnail generation failed for file {}: {}", file.id, e);
        }
    }

    Ok((StatusCode::CREATED, success(file)))
}
