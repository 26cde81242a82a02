use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::errors::{AppError, Result};

pub const ROOT_PATH: &str = "/";
pub const ROOT_NAME: &str = "Root";
pub const ROOT_SLUG: &str = "root";
const MAX_NAME_LENGTH: usize = 255;

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub path: String,
    pub parent_id: Option<Uuid>,
    pub is_root: bool,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Folder {
    pub fn new(
        id: Uuid,
        name: &str,
        slug: &str,
        path: &str,
        user_id: Uuid,
        parent_id: Option<Uuid>,
    ) -> Result<Self> {
        validate_name(name)?;
        validate_path(path)?;

        if parent_id.is_none() {
            return Err(AppError::Validation("A non-root folder must have a parent".to_string()));
        }

        let now = Utc::now();
        Ok(Self {
            id,
            name: name.to_string(),
            slug: slug.to_string(),
            path: path.to_string(),
            parent_id,
            is_root: false,
            user_id,
            created_at: now,
            updated_at: now,
        })
    }

    pub fn root(user_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            name: ROOT_NAME.to_string(),
            slug: ROOT_SLUG.to_string(),
            path: ROOT_PATH.to_string(),
            parent_id: None,
            is_root: true,
            user_id,
            created_at: now,
            updated_at: now,
        }
    }

    /// Path of a direct child named `segment` under `parent_path`.
    pub fn child_path(parent_path: &str, segment: &str) -> String {
        if parent_path == ROOT_PATH {
            format!("/{}", segment)
        } else {
            format!("{}/{}", parent_path, segment)
        }
    }

    /// Path of the folder this one sits in, derived from its own path.
    pub fn parent_path(&self) -> &str {
        match self.path.rfind('/') {
            Some(0) | None => ROOT_PATH,
            Some(idx) => &self.path[..idx],
        }
    }

    pub fn is_child_of(&self, parent: &Folder) -> bool {
        self.parent_id == Some(parent.id)
    }

    pub fn can_be_deleted(&self) -> bool {
        !self.is_root
    }

    /// Copy carrying a new display name, slug and path.
    pub fn renamed(&self, name: &str, slug: &str, path: &str) -> Result<Self> {
        validate_name(name)?;
        validate_path(path)?;

        Ok(Self {
            name: name.to_string(),
            slug: slug.to_string(),
            path: path.to_string(),
            updated_at: Utc::now(),
            ..self.clone()
        })
    }
}

/// Rewrites `path` when it lies strictly below `old_prefix`.
pub fn rebase_path(path: &str, old_prefix: &str, new_prefix: &str) -> Option<String> {
    let rest = path.strip_prefix(old_prefix)?;
    if rest.starts_with('/') {
        Some(format!("{}{}", new_prefix, rest))
    } else {
        None
    }
}

fn validate_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(AppError::Validation("Folder name cannot be empty".to_string()));
    }
    if name.chars().count() > MAX_NAME_LENGTH {
        return Err(AppError::Validation(
            "Folder name cannot exceed 255 characters".to_string(),
        ));
    }
    let allowed = |c: char| c.is_alphanumeric() || c.is_whitespace() || matches!(c, '-' | '_' | '.');
    if !name.chars().all(allowed) {
        return Err(AppError::Validation(
            "Folder name contains forbidden characters".to_string(),
        ));
    }
    Ok(())
}

fn validate_path(path: &str) -> Result<()> {
    if !path.starts_with('/') {
        return Err(AppError::Validation("Folder path must start with /".to_string()));
    }
    Ok(())
}

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateFolderRequest {
    pub name: String,
    pub parent_id: Option<Uuid>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenameFolderRequest {
    pub name: String,
}

/// Body of `GET /api/folders`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct FolderTree {
    pub root_folder: Folder,
    /// Every folder of the user, root included, ordered by path.
    pub folders: Vec<Folder>,
}
