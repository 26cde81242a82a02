use std::sync::Arc;
use uuid::Uuid;

use crate::{
    database::{FileRepository, FolderRepository},
    errors::{AppError, Result},
    models::{File, Folder, NewFile},
    services::{folder_service::find_owned_folder, image_processor::ImageProcessor},
    utils::{
        crypto::calculate_md5,
        file::{get_file_extension, physical_name, public_file_url},
        slug::{file_stem, slugify},
    },
};

/// Everything needed to register an upload.
#[derive(Debug, Clone)]
pub struct UploadFileCommand {
    pub original_name: String,
    pub data: Vec<u8>,
    pub mime_type: String,
    pub folder_id: Uuid,
    pub user_id: Uuid,
    pub is_public: bool,
}

pub struct FileService {
    files: Arc<dyn FileRepository>,
    folders: Arc<dyn FolderRepository>,
}

impl FileService {
    pub fn new(files: Arc<dyn FileRepository>, folders: Arc<dyn FolderRepository>) -> Self {
        Self { files, folders }
    }

    /// Records an upload. The id is drawn before the insert so the physical
    /// name `<id><ext>`, the path and the URL are final in the stored row.
    pub async fn upload_file(&self, command: &UploadFileCommand) -> Result<File> {
        let folder = find_owned_folder(self.folders.as_ref(), command.folder_id, command.user_id).await?;

        let checksum = calculate_md5(&command.data);
        if self
            .files
            .find_by_checksum(command.user_id, &checksum)
            .await?
            .is_some()
        {
            return Err(AppError::Conflict("This file already exists".to_string()));
        }

        let id = Uuid::new_v4();
        let extension = get_file_extension(&command.original_name);
        let name = physical_name(id, &extension);

        let slug = match slugify(file_stem(&command.original_name)) {
            slug if slug.is_empty() => "file".to_string(),
            slug => slug,
        };

        let size = i64::try_from(command.data.len())
            .map_err(|_| AppError::Validation("File is too large".to_string()))?;

        let file = File::new(NewFile {
            id,
            path: Folder::child_path(&folder.path, &name),
            url: Some(public_file_url(command.user_id, &name)),
            name,
            original_name: command.original_name.clone(),
            slug,
            mime_type: command.mime_type.clone(),
            size,
            checksum,
            user_id: command.user_id,
            folder_id: folder.id,
            is_public: command.is_public,
            metadata: ImageProcessor::extract_metadata(&command.data, &command.mime_type),
        })?;

        let created = self.files.create(&file).await?;
        tracing::info!(
            "File {} ({}, {} bytes) stored in folder {} for user {}",
            created.id,
            created.original_name,
            created.size,
            folder.path,
            command.user_id
        );
        Ok(created)
    }

    pub async fn get_files_by_folder(&self, folder_id: Uuid, user_id: Uuid) -> Result<Vec<File>> {
        find_owned_folder(self.folders.as_ref(), folder_id, user_id).await?;
        self.files.find_by_folder_id(folder_id).await
    }

    pub async fn get_file_by_id(&self, file_id: Uuid) -> Result<Option<File>> {
        self.files.find_by_id(file_id).await
    }

    pub async fn get_file_by_name(&self, name: &str) -> Result<Option<File>> {
        self.files.find_by_name(name).await
    }

    pub async fn get_public_files(&self) -> Result<Vec<File>> {
        self.files.find_public_files().await
    }

    /// Removes the row and returns it, so the caller can clean up the blobs.
    pub async fn delete_file(&self, file_id: Uuid, user_id: Uuid) -> Result<File> {
        let file = self
            .files
            .find_by_id(file_id)
            .await?
            .ok_or_else(|| AppError::NotFound("File not found".to_string()))?;

        if file.user_id != user_id {
            return Err(AppError::Forbidden("Access denied to this file".to_string()));
        }

        self.files.delete(file_id).await?;
        tracing::info!("File {} deleted by user {}", file_id, user_id);
        Ok(file)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::MemoryStore;
    use crate::services::folder_service::FolderService;

    struct Fixture {
        files: FileService,
        folders: FolderService,
    }

    fn fixture() -> Fixture {
        let store = Arc::new(MemoryStore::new());
        Fixture {
            files: FileService::new(store.clone(), store.clone()),
            folders: FolderService::new(store.clone(), store),
        }
    }

    fn command(folder_id: Uuid, user_id: Uuid, name: &str, data: &[u8]) -> UploadFileCommand {
        UploadFileCommand {
            original_name: name.to_string(),
            data: data.to_vec(),
            mime_type: "text/plain".to_string(),
            folder_id,
            user_id,
            is_public: false,
        }
    }

    #[tokio::test]
    async fn test_upload_builds_final_names() {
        let fx = fixture();
        let user = Uuid::new_v4();
        let folder = fx.folders.create_folder("Docs", None, user).await.unwrap();

        let file = fx
            .files
            .upload_file(&command(folder.id, user, "Meeting Notes.TXT", b"hello"))
            .await
            .unwrap();

        assert_eq!(file.name, format!("{}.txt", file.id));
        assert_eq!(file.path, format!("/docs/{}.txt", file.id));
        assert_eq!(file.url, Some(format!("/uploads/users/{}/files/{}.txt", user, file.id)));
        assert_eq!(file.slug, "meeting-notes");
        assert_eq!(file.checksum, "5d41402abc4b2a76b9719d911017c592");
        assert_eq!(file.size, 5);
        assert!(file.metadata.is_none());
    }

    #[tokio::test]
    async fn test_upload_into_root_and_slug_fallback() {
        let fx = fixture();
        let user = Uuid::new_v4();
        let root = fx.folders.ensure_root_folder(user).await.unwrap();

        let file = fx
            .files
            .upload_file(&command(root.id, user, "日本.txt", b"x"))
            .await
            .unwrap();

        assert_eq!(file.path, format!("/{}.txt", file.id));
        assert_eq!(file.slug, "file");
    }

    #[tokio::test]
    async fn test_upload_name_never_contains_separators() {
        let fx = fixture();
        let user = Uuid::new_v4();
        let root = fx.folders.ensure_root_folder(user).await.unwrap();

        let file = fx
            .files
            .upload_file(&command(root.id, user, "photo.x/y", b"slashed"))
            .await
            .unwrap();

        assert_eq!(file.name, file.id.to_string());
        assert_eq!(file.path, format!("/{}", file.id));
        assert_eq!(file.original_name, "photo.x/y");
    }

    #[tokio::test]
    async fn test_duplicate_content_is_per_user() {
        let fx = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let alice_root = fx.folders.ensure_root_folder(alice).await.unwrap();
        let bob_root = fx.folders.ensure_root_folder(bob).await.unwrap();

        fx.files.upload_file(&command(alice_root.id, alice, "a.txt", b"same")).await.unwrap();

        let dup = fx.files.upload_file(&command(alice_root.id, alice, "b.txt", b"same")).await;
        assert!(matches!(dup, Err(AppError::Conflict(ref msg)) if msg == "This file already exists"));

        assert!(fx.files.upload_file(&command(bob_root.id, bob, "a.txt", b"same")).await.is_ok());
    }

    #[tokio::test]
    async fn test_upload_requires_owned_folder() {
        let fx = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let root = fx.folders.ensure_root_folder(alice).await.unwrap();

        assert!(matches!(
            fx.files.upload_file(&command(root.id, bob, "a.txt", b"x")).await,
            Err(AppError::Forbidden(_))
        ));
        assert!(matches!(
            fx.files.upload_file(&command(Uuid::new_v4(), alice, "a.txt", b"x")).await,
            Err(AppError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_invalid_mime_type_is_rejected() {
        let fx = fixture();
        let user = Uuid::new_v4();
        let root = fx.folders.ensure_root_folder(user).await.unwrap();

        let mut cmd = command(root.id, user, "a.bin", b"x");
        cmd.mime_type = "binary".to_string();
        assert!(matches!(fx.files.upload_file(&cmd).await, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_delete_file_checks_owner() {
        let fx = fixture();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let root = fx.folders.ensure_root_folder(alice).await.unwrap();
        let file = fx.files.upload_file(&command(root.id, alice, "a.txt", b"x")).await.unwrap();

        assert!(matches!(fx.files.delete_file(file.id, bob).await, Err(AppError::Forbidden(_))));

        let deleted = fx.files.delete_file(file.id, alice).await.unwrap();
        assert_eq!(deleted.id, file.id);
        assert!(fx.files.get_file_by_id(file.id).await.unwrap().is_none());
        assert!(matches!(fx.files.delete_file(file.id, alice).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_folder_with_files_cannot_be_deleted() {
        let fx = fixture();
        let user = Uuid::new_v4();
        let folder = fx.folders.create_folder("Full", None, user).await.unwrap();
        fx.files.upload_file(&command(folder.id, user, "a.txt", b"x")).await.unwrap();

        assert!(matches!(
            fx.folders.delete_folder(folder.id, user).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_public_files_and_lookup_by_name() {
        let fx = fixture();
        let user = Uuid::new_v4();
        let root = fx.folders.ensure_root_folder(user).await.unwrap();

        let mut public = command(root.id, user, "shared.txt", b"public");
        public.is_public = true;
        let shared = fx.files.upload_file(&public).await.unwrap();
        fx.files.upload_file(&command(root.id, user, "private.txt", b"private")).await.unwrap();

        let listed = fx.files.get_public_files().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, shared.id);

        let by_name = fx.files.get_file_by_name(&shared.name).await.unwrap().unwrap();
        assert_eq!(by_name.id, shared.id);
    }
}
