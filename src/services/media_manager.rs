use serde::Serialize;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    database::{FileRepository, FolderRepository},
    errors::Result,
    models::{File, Folder},
    services::{
        file_service::{FileService, UploadFileCommand},
        folder_service::FolderService,
    },
};

#[derive(Debug, Serialize, ToSchema)]
pub struct FolderContents {
    pub folders: Vec<Folder>,
    pub files: Vec<File>,
}

/// Single entry point of the HTTP layer into the folder and file services.
pub struct MediaManager {
    folders: FolderService,
    files: FileService,
}

impl MediaManager {
    pub fn new(folders: Arc<dyn FolderRepository>, files: Arc<dyn FileRepository>) -> Self {
        Self {
            folders: FolderService::new(folders.clone(), files.clone()),
            files: FileService::new(files, folders),
        }
    }

    pub async fn create_folder(&self, name: &str, parent_id: Option<Uuid>, user_id: Uuid) -> Result<Folder> {
        self.folders.create_folder(name, parent_id, user_id).await
    }

    pub async fn get_folder_tree(&self, user_id: Uuid) -> Result<Vec<Folder>> {
        self.folders.get_folder_tree(user_id).await
    }

    pub async fn get_folder_contents(&self, folder_id: Uuid, user_id: Uuid) -> Result<FolderContents> {
        let (folders, files) = tokio::try_join!(
            self.folders.get_folder_contents(folder_id, user_id),
            self.files.get_files_by_folder(folder_id, user_id),
        )?;

        Ok(FolderContents { folders, files })
    }

    pub async fn upload_file(&self, command: &UploadFileCommand) -> Result<File> {
        self.files.upload_file(command).await
    }

    pub async fn delete_folder(&self, folder_id: Uuid, user_id: Uuid) -> Result<()> {
        self.folders.delete_folder(folder_id, user_id).await
    }

    pub async fn rename_folder(&self, folder_id: Uuid, new_name: &str, user_id: Uuid) -> Result<Folder> {
        self.folders.rename_folder(folder_id, new_name, user_id).await
    }

    pub async fn get_file_by_id(&self, file_id: Uuid) -> Result<Option<File>> {
        self.files.get_file_by_id(file_id).await
    }

    pub async fn get_file_by_name(&self, name: &str) -> Result<Option<File>> {
        self.files.get_file_by_name(name).await
    }

    pub async fn get_public_files(&self) -> Result<Vec<File>> {
        self.files.get_public_files().await
    }

    pub async fn delete_file(&self, file_id: Uuid, user_id: Uuid) -> Result<File> {
        self.files.delete_file(file_id, user_id).await
    }

    pub async fn ensure_user_root_folder(&self, user_id: Uuid) -> Result<Folder> {
        self.folders.ensure_root_folder(user_id).await
    }
}
