use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::errors::{AppError, Result};

pub const MAX_FILE_SIZE: i64 = 100 * 1024 * 1024;
const MAX_NAME_LENGTH: usize = 255;

const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "application/msword",
    "application/vnd.openxmlformats-officedocument.wordprocessingml.document",
    "text/plain",
];

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct FileMetadata {
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration: Option<f64>,
    pub bitrate: Option<i32>,
    pub format: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct File {
    pub id: Uuid,
    /// Physical name on disk: id + original extension.
    pub name: String,
    pub original_name: String,
    pub slug: String,
    pub mime_type: String,
    pub size: i64,
    pub path: String,
    pub checksum: String,
    pub user_id: Uuid,
    pub folder_id: Uuid,
    pub is_public: bool,
    pub url: Option<String>,
    pub metadata: Option<FileMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Field set for [`File::new`].
#[derive(Debug, Clone)]
pub struct NewFile {
    pub id: Uuid,
    pub name: String,
    pub original_name: String,
    pub slug: String,
    pub mime_type: String,
    pub size: i64,
    pub path: String,
    pub checksum: String,
    pub user_id: Uuid,
    pub folder_id: Uuid,
    pub is_public: bool,
    pub url: Option<String>,
    pub metadata: Option<FileMetadata>,
}

impl File {
    pub fn new(new: NewFile) -> Result<Self> {
        validate_name(&new.name)?;
        validate_mime_type(&new.mime_type)?;
        validate_size(new.size)?;

        let now = Utc::now();
        Ok(Self {
            id: new.id,
            name: new.name,
            original_name: new.original_name,
            slug: new.slug,
            mime_type: new.mime_type,
            size: new.size,
            path: new.path,
            checksum: new.checksum,
            user_id: new.user_id,
            folder_id: new.folder_id,
            is_public: new.is_public,
            url: new.url,
            metadata: new.metadata,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn is_image(&self) -> bool {
        self.mime_type.starts_with("image/")
    }

    pub fn is_video(&self) -> bool {
        self.mime_type.starts_with("video/")
    }

    pub fn is_audio(&self) -> bool {
        self.mime_type.starts_with("audio/")
    }

    pub fn is_document(&self) -> bool {
        DOCUMENT_TYPES.contains(&self.mime_type.as_str())
    }

    /// Extension of the physical name, lowercased and without the dot.
    pub fn extension(&self) -> String {
        let parts: Vec<&str> = self.name.split('.').collect();
        if parts.len() > 1 {
            parts[parts.len() - 1].to_lowercase()
        } else {
            String::new()
        }
    }

    pub fn formatted_size(&self) -> String {
        const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
        let mut size = self.size as f64;
        let mut unit = 0;

        while size >= 1024.0 && unit < UNITS.len() - 1 {
            size /= 1024.0;
            unit += 1;
        }

        format!("{:.1} {}", size, UNITS[unit])
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("File name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(
            "File name cannot exceed 255 characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_mime_type(mime_type: &str) -> Result<()> {
    if !mime_type.contains('/') {
        return Err(AppError::Validation("Invalid MIME type".to_string()));
    }
    Ok(())
}

fn validate_size(size: i64) -> Result<()> {
    if size < 0 {
        return Err(AppError::Validation("File size must be positive".to_string()));
    }
    if size > MAX_FILE_SIZE {
        return Err(AppError::Validation(
            "File exceeds the maximum allowed size (100MB)".to_string(),
        ));
    }
    Ok(())
}

/// Row shape of `files LEFT JOIN file_metadata`.
#[derive(Debug, FromRow)]
pub struct FileRecord {
    pub id: Uuid,
    pub name: String,
    pub original_name: String,
    pub slug: String,
    pub mime_type: String,
    pub size: i64,
    pub path: String,
    pub checksum: String,
    pub user_id: Uuid,
    pub folder_id: Uuid,
    pub is_public: bool,
    pub url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub has_metadata: bool,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub duration: Option<f64>,
    pub bitrate: Option<i32>,
    pub format: Option<String>,
}

impl From<FileRecord> for File {
    fn from(record: FileRecord) -> Self {
        let metadata = record.has_metadata.then(|| FileMetadata {
            width: record.width,
            height: record.height,
            duration: record.duration,
            bitrate: record.bitrate,
            format: record.format,
        });

        Self {
            id: record.id,
            name: record.name,
            original_name: record.original_name,
            slug: record.slug,
            mime_type: record.mime_type,
            size: record.size,
            path: record.path,
            checksum: record.checksum,
            user_id: record.user_id,
            folder_id: record.folder_id,
            is_public: record.is_public,
            url: record.url,
            metadata,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Multipart form of `POST /api/files/upload`. Only documents the fields;
/// the handler reads the parts as they stream in.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileForm {
    #[schema(value_type = String, format = Binary)]
    pub file: Vec<u8>,
    /// Defaults to the user's root folder.
    pub folder_id: Option<Uuid>,
    /// `"true"` to share the file; anything else keeps it private.
    pub is_public: Option<bool>,
}

#[derive(Debug, Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct FolderContentsQuery {
    /// Defaults to the user's root folder.
    pub folder_id: Option<Uuid>,
}
