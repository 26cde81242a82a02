//! Process-local repository backend.
//!
//! Mirrors the unique constraints and the rename cascade of the PostgreSQL
//! schema so services behave the same against either backend. Used by the
//! test suites and when the server runs without `DATABASE_URL`.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::database::repositories::{FileRepository, FolderRepository, UserRepository};
use crate::errors::{unique_violation_message, AppError, Result};
use crate::models::*;

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    folders: HashMap<Uuid, Folder>,
    files: HashMap<Uuid, File>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

fn conflict(constraint: &str) -> AppError {
    AppError::Conflict(unique_violation_message(Some(constraint)))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| AppError::Internal(anyhow!("memory store lock poisoned")))
    }
}

#[async_trait]
impl FolderRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Folder>> {
        Ok(self.lock()?.folders.get(&id).cloned())
    }

    async fn find_by_parent_id(&self, parent_id: Uuid) -> Result<Vec<Folder>> {
        let mut folders: Vec<Folder> = self
            .lock()?
            .folders
            .values()
            .filter(|f| f.parent_id == Some(parent_id))
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(folders)
    }

    async fn find_root_folder(&self, user_id: Uuid) -> Result<Option<Folder>> {
        Ok(self
            .lock()?
            .folders
            .values()
            .find(|f| f.user_id == user_id && f.is_root)
            .cloned())
    }

    async fn find_all_by_user_id(&self, user_id: Uuid) -> Result<Vec<Folder>> {
        let mut folders: Vec<Folder> = self
            .lock()?
            .folders
            .values()
            .filter(|f| f.user_id == user_id)
            .cloned()
            .collect();
        folders.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(folders)
    }

    async fn create(&self, folder: &Folder) -> Result<Folder> {
        let mut tables = self.lock()?;

        if folder.is_root
            && tables
                .folders
                .values()
                .any(|f| f.user_id == folder.user_id && f.is_root)
        {
            return Err(conflict("folders_one_root_per_user"));
        }
        if tables
            .folders
            .values()
            .any(|f| f.user_id == folder.user_id && f.path == folder.path)
        {
            return Err(conflict("folders_user_path_key"));
        }

        tables.folders.insert(folder.id, folder.clone());
        Ok(folder.clone())
    }

    async fn rename(&self, folder: &Folder, old_path: &str) -> Result<Folder> {
        let mut tables = self.lock()?;

        if !tables.folders.contains_key(&folder.id) {
            return Err(AppError::NotFound("Folder not found".to_string()));
        }

        // Compute every new path first so a clash leaves the tables untouched.
        let mut folder_paths: HashMap<Uuid, String> = HashMap::new();
        folder_paths.insert(folder.id, folder.path.clone());
        for other in tables.folders.values().filter(|f| f.user_id == folder.user_id) {
            if let Some(path) = rebase_path(&other.path, old_path, &folder.path) {
                folder_paths.insert(other.id, path);
            }
        }

        let mut file_paths: HashMap<Uuid, String> = HashMap::new();
        for file in tables.files.values().filter(|f| f.user_id == folder.user_id) {
            if let Some(path) = rebase_path(&file.path, old_path, &folder.path) {
                file_paths.insert(file.id, path);
            }
        }

        let folder_clash = tables.folders.values().any(|f| {
            f.user_id == folder.user_id
                && !folder_paths.contains_key(&f.id)
                && folder_paths.values().any(|p| *p == f.path)
        });
        if folder_clash {
            return Err(conflict("folders_user_path_key"));
        }

        let file_clash = tables.files.values().any(|f| {
            f.user_id == folder.user_id
                && !file_paths.contains_key(&f.id)
                && file_paths.values().any(|p| *p == f.path)
        });
        if file_clash {
            return Err(conflict("files_user_path_key"));
        }

        let now = Utc::now();
        for (id, path) in folder_paths {
            if let Some(stored) = tables.folders.get_mut(&id) {
                stored.path = path;
                stored.updated_at = now;
            }
        }
        for (id, path) in file_paths {
            if let Some(stored) = tables.files.get_mut(&id) {
                stored.path = path;
                stored.updated_at = now;
            }
        }

        let stored = tables
            .folders
            .get_mut(&folder.id)
            .ok_or_else(|| AppError::NotFound("Folder not found".to_string()))?;
        stored.name = folder.name.clone();
        stored.slug = folder.slug.clone();

        Ok(stored.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.lock()?.folders.remove(&id);
        Ok(())
    }

    async fn exists(&self, user_id: Uuid, path: &str) -> Result<bool> {
        Ok(self
            .lock()?
            .folders
            .values()
            .any(|f| f.user_id == user_id && f.path == path))
    }
}

fn newest_first(mut files: Vec<File>) -> Vec<File> {
    files.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    files
}

#[async_trait]
impl FileRepository for MemoryStore {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<File>> {
        Ok(self.lock()?.files.get(&id).cloned())
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<File>> {
        Ok(self.lock()?.files.values().find(|f| f.name == name).cloned())
    }

    async fn find_by_folder_id(&self, folder_id: Uuid) -> Result<Vec<File>> {
        let files = self
            .lock()?
            .files
            .values()
            .filter(|f| f.folder_id == folder_id)
            .cloned()
            .collect();
        Ok(newest_first(files))
    }

    async fn find_by_checksum(&self, user_id: Uuid, checksum: &str) -> Result<Option<File>> {
        Ok(self
            .lock()?
            .files
            .values()
            .find(|f| f.user_id == user_id && f.checksum == checksum)
            .cloned())
    }

    async fn find_public_files(&self) -> Result<Vec<File>> {
        let files = self
            .lock()?
            .files
            .values()
            .filter(|f| f.is_public)
            .cloned()
            .collect();
        Ok(newest_first(files))
    }

    async fn count_by_folder_id(&self, folder_id: Uuid) -> Result<i64> {
        let count = self
            .lock()?
            .files
            .values()
            .filter(|f| f.folder_id == folder_id)
            .count();
        Ok(count as i64)
    }

    async fn create(&self, file: &File) -> Result<File> {
        let mut tables = self.lock()?;

        for existing in tables.files.values() {
            if existing.name == file.name {
                return Err(conflict("files_name_key"));
            }
            if existing.user_id == file.user_id {
                if existing.checksum == file.checksum {
                    return Err(conflict("files_user_checksum_key"));
                }
                if existing.path == file.path {
                    return Err(conflict("files_user_path_key"));
                }
            }
        }

        tables.files.insert(file.id, file.clone());
        Ok(file.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        self.lock()?.files.remove(&id);
        Ok(())
    }

    async fn exists(&self, user_id: Uuid, path: &str) -> Result<bool> {
        Ok(self
            .lock()?
            .files
            .values()
            .any(|f| f.user_id == user_id && f.path == path))
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let mut tables = self.lock()?;

        if tables.users.values().any(|u| u.email == user.email) {
            return Err(conflict("users_email_key"));
        }
        if let Some(username) = &user.username {
            if tables
                .users
                .values()
                .any(|u| u.username.as_deref() == Some(username.as_str()))
            {
                return Err(conflict("users_username_key"));
            }
        }

        let now = Utc::now();
        let created = User {
            id: Uuid::new_v4(),
            email: user.email.clone(),
            username: user.username.clone(),
            name: user.name.clone(),
            password_hash: user.password_hash.clone(),
            reset_token: None,
            reset_token_expiry: None,
            created_at: now,
            updated_at: now,
        };
        tables.users.insert(created.id, created.clone());
        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        Ok(self.lock()?.users.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self.lock()?.users.values().find(|u| u.email == email).cloned())
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.username.as_deref() == Some(username))
            .cloned())
    }

    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| {
                u.reset_token.as_deref() == Some(token_hash)
                    && u.reset_token_expiry.is_some_and(|expiry| expiry > now)
            })
            .cloned())
    }

    async fn set_reset_token(&self, id: Uuid, token_hash: &str, expiry: DateTime<Utc>) -> Result<()> {
        if let Some(user) = self.lock()?.users.get_mut(&id) {
            user.reset_token = Some(token_hash.to_string());
            user.reset_token_expiry = Some(expiry);
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        if let Some(user) = self.lock()?.users.get_mut(&id) {
            user.password_hash = password_hash.to_string();
            user.reset_token = None;
            user.reset_token_expiry = None;
            user.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<User> {
        let mut tables = self.lock()?;

        if let Some(username) = &update.username {
            if tables
                .users
                .values()
                .any(|u| u.id != id && u.username.as_deref() == Some(username.as_str()))
            {
                return Err(conflict("users_username_key"));
            }
        }

        let user = tables
            .users
            .get_mut(&id)
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if let Some(name) = &update.name {
            user.name = Some(name.clone());
        }
        if let Some(username) = &update.username {
            user.username = Some(username.clone());
        }
        if let Some(password_hash) = &update.password_hash {
            user.password_hash = password_hash.clone();
        }
        user.updated_at = Utc::now();

        Ok(user.clone())
    }

    async fn ping(&self) -> Result<()> {
        self.lock().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_file(user_id: Uuid, folder_id: Uuid, path: &str, checksum: &str) -> File {
        let id = Uuid::new_v4();
        File::new(NewFile {
            id,
            name: format!("{}.txt", id),
            original_name: "notes.txt".to_string(),
            slug: "notes".to_string(),
            mime_type: "text/plain".to_string(),
            size: 5,
            path: path.to_string(),
            checksum: checksum.to_string(),
            user_id,
            folder_id,
            is_public: false,
            url: None,
            metadata: None,
        })
        .unwrap()
    }

    #[tokio::test]
    async fn test_single_root_per_user() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();

        FolderRepository::create(&store, &Folder::root(user)).await.unwrap();
        let second = FolderRepository::create(&store, &Folder::root(user)).await;

        assert!(matches!(second, Err(AppError::Conflict(_))));
        assert!(FolderRepository::create(&store, &Folder::root(Uuid::new_v4())).await.is_ok());
    }

    #[tokio::test]
    async fn test_rename_rebases_descendants() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let root = FolderRepository::create(&store, &Folder::root(user)).await.unwrap();
        let a = Folder::new(Uuid::new_v4(), "a", "a", "/a", user, Some(root.id)).unwrap();
        let b = Folder::new(Uuid::new_v4(), "b", "b", "/a/b", user, Some(a.id)).unwrap();
        let ab = Folder::new(Uuid::new_v4(), "ab", "ab", "/ab", user, Some(root.id)).unwrap();
        for folder in [&a, &b, &ab] {
            FolderRepository::create(&store, folder).await.unwrap();
        }
        let file = sample_file(user, b.id, "/a/b/notes", "c1");
        FileRepository::create(&store, &file).await.unwrap();

        let renamed = a.renamed("x", "x", "/x").unwrap();
        let stored = store.rename(&renamed, "/a").await.unwrap();

        assert_eq!(stored.path, "/x");
        assert_eq!(FolderRepository::find_by_id(&store, b.id).await.unwrap().unwrap().path, "/x/b");
        assert_eq!(FolderRepository::find_by_id(&store, ab.id).await.unwrap().unwrap().path, "/ab");
        assert_eq!(FileRepository::find_by_id(&store, file.id).await.unwrap().unwrap().path, "/x/b/notes");
    }

    #[tokio::test]
    async fn test_rename_clash_leaves_tables_untouched() {
        let store = MemoryStore::new();
        let user = Uuid::new_v4();
        let root = FolderRepository::create(&store, &Folder::root(user)).await.unwrap();
        let a = Folder::new(Uuid::new_v4(), "a", "a", "/a", user, Some(root.id)).unwrap();
        let b = Folder::new(Uuid::new_v4(), "b", "b", "/b", user, Some(root.id)).unwrap();
        FolderRepository::create(&store, &a).await.unwrap();
        FolderRepository::create(&store, &b).await.unwrap();

        let result = store.rename(&a.renamed("b", "b", "/b").unwrap(), "/a").await;

        assert!(matches!(result, Err(AppError::Conflict(_))));
        assert_eq!(FolderRepository::find_by_id(&store, a.id).await.unwrap().unwrap().path, "/a");
    }

    #[tokio::test]
    async fn test_checksum_unique_per_user() {
        let store = MemoryStore::new();
        let (alice, bob) = (Uuid::new_v4(), Uuid::new_v4());
        let folder = Uuid::new_v4();

        FileRepository::create(&store, &sample_file(alice, folder, "/one", "same")).await.unwrap();
        let dup = FileRepository::create(&store, &sample_file(alice, folder, "/two", "same")).await;
        assert!(matches!(dup, Err(AppError::Conflict(ref msg)) if msg == "This file already exists"));

        assert!(FileRepository::create(&store, &sample_file(bob, folder, "/one", "same")).await.is_ok());
    }

    #[tokio::test]
    async fn test_reset_token_lookup_respects_expiry() {
        let store = MemoryStore::new();
        let user = UserRepository::create(
            &store,
            &NewUser {
                email: "a@example.com".to_string(),
                password_hash: "hash".to_string(),
                name: None,
                username: None,
            },
        )
        .await
        .unwrap();

        let now = Utc::now();
        store.set_reset_token(user.id, "tok", now + chrono::Duration::minutes(5)).await.unwrap();
        assert!(store.find_by_reset_token("tok", now).await.unwrap().is_some());
        assert!(store
            .find_by_reset_token("tok", now + chrono::Duration::minutes(10))
            .await
            .unwrap()
            .is_none());

        store.update_password(user.id, "new-hash").await.unwrap();
        assert!(store.find_by_reset_token("tok", now).await.unwrap().is_none());
    }
}
