use std::sync::Arc;
use uuid::Uuid;

use crate::{
    database::{FileRepository, FolderRepository},
    errors::{AppError, Result},
    models::Folder,
    utils::slug::slugify,
};

pub struct FolderService {
    folders: Arc<dyn FolderRepository>,
    files: Arc<dyn FileRepository>,
}

/// Loads a folder and checks that `user_id` owns it.
pub(crate) async fn find_owned_folder(
    folders: &dyn FolderRepository,
    folder_id: Uuid,
    user_id: Uuid,
) -> Result<Folder> {
    let folder = folders
        .find_by_id(folder_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Folder not found".to_string()))?;

    if folder.user_id != user_id {
        return Err(AppError::Forbidden("Access denied to this folder".to_string()));
    }

    Ok(folder)
}

/// Slug for a folder name; names without any ASCII letter or digit fall back
/// to `folder-<first 8 hex digits of the id>`.
fn folder_slug(name: &str, folder_id: Uuid) -> String {
    let slug = slugify(name);
    if slug.is_empty() {
        format!("folder-{}", &folder_id.simple().to_string()[..8])
    } else {
        slug
    }
}

impl FolderService {
    pub fn new(folders: Arc<dyn FolderRepository>, files: Arc<dyn FileRepository>) -> Self {
        Self { folders, files }
    }

    pub async fn create_folder(
        &self,
        name: &str,
        parent_id: Option<Uuid>,
        user_id: Uuid,
    ) -> Result<Folder> {
        let name = name.trim();

        let parent = match parent_id {
            Some(parent_id) => find_owned_folder(self.folders.as_ref(), parent_id, user_id)
                .await
                .map_err(|e| match e {
                    AppError::NotFound(_) => AppError::NotFound("Parent folder not found".to_string()),
                    other => other,
                })?,
            None => self.ensure_root_folder(user_id).await?,
        };

        let id = Uuid::new_v4();
        let slug = folder_slug(name, id);
        let path = Folder::child_path(&parent.path, &slug);
        let folder = Folder::new(id, name, &slug, &path, user_id, Some(parent.id))?;

        if self.folders.exists(user_id, &path).await? {
            return Err(AppError::Conflict(
                "A folder with this name already exists at this location".to_string(),
            ));
        }

        let created = self.folders.create(&folder).await?;
        tracing::info!("Folder {} created at {} for user {}", created.id, created.path, user_id);
        Ok(created)
    }

    pub async fn delete_folder(&self, folder_id: Uuid, user_id: Uuid) -> Result<()> {
        let folder = find_owned_folder(self.folders.as_ref(), folder_id, user_id).await?;

        if !folder.can_be_deleted() {
            return Err(AppError::Validation("The root folder cannot be deleted".to_string()));
        }

        let children = self.folders.find_by_parent_id(folder_id).await?;
        let file_count = self.files.count_by_folder_id(folder_id).await?;
        if !children.is_empty() || file_count > 0 {
            return Err(AppError::Conflict("Folder is not empty".to_string()));
        }

        self.folders.delete(folder_id).await?;
        tracing::info!("Folder {} deleted by user {}", folder_id, user_id);
        Ok(())
    }

    /// Renames a folder; every folder and file below it moves to the new path.
    pub async fn rename_folder(&self, folder_id: Uuid, new_name: &str, user_id: Uuid) -> Result<Folder> {
        let folder = find_owned_folder(self.folders.as_ref(), folder_id, user_id).await?;

        if folder.is_root {
            return Err(AppError::Validation("The root folder cannot be renamed".to_string()));
        }

        let new_name = new_name.trim();
        let slug = folder_slug(new_name, folder.id);
        let path = Folder::child_path(folder.parent_path(), &slug);
        let renamed = folder.renamed(new_name, &slug, &path)?;

        if path != folder.path && self.folders.exists(user_id, &path).await? {
            return Err(AppError::Conflict(
                "A folder with this name already exists at this location".to_string(),
            ));
        }

        let stored = self.folders.rename(&renamed, &folder.path).await?;
        tracing::info!("Folder {} renamed from {} to {}", folder_id, folder.path, stored.path);
        Ok(stored)
    }

    /// Returns the user's root folder, creating it on first use.
    pub async fn ensure_root_folder(&self, user_id: Uuid) -> Result<Folder> {
        if let Some(root) = self.folders.find_root_folder(user_id).await? {
            return Ok(root);
        }

        match self.folders.create(&Folder::root(user_id)).await {
            Ok(root) => Ok(root),
            // Lost the race against a concurrent request; the winner's row is the root.
            Err(AppError::Conflict(_)) => self
                .folders
                .find_root_folder(user_id)
                .await?
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Root folder vanished for user {}", user_id))),
            Err(e) => Err(e),
        }
    }

    pub async fn get_folder_tree(&self, user_id: Uuid) -> Result<Vec<Folder>> {
        self.folders.find_all_by_user_id(user_id).await
    }

    pub async fn get_folder_contents(&self, folder_id: Uuid, user_id: Uuid) -> Result<Vec<Folder>> {
        find_owned_folder(self.folders.as_ref(), folder_id, user_id).await?;
        self.folders.find_by_parent_id(folder_id).await
    }
}
