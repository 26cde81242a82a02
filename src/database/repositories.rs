//! Persistence seams for the domain services.
//!
//! Each trait has a PostgreSQL implementation in [`super::queries`] and an
//! in-memory one in [`super::memory`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::errors::Result;
use crate::models::{File, Folder, NewUser, ProfileUpdate, User};

#[async_trait]
pub trait FolderRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Folder>>;

    /// Direct children, ordered by name.
    async fn find_by_parent_id(&self, parent_id: Uuid) -> Result<Vec<Folder>>;

    async fn find_root_folder(&self, user_id: Uuid) -> Result<Option<Folder>>;

    /// Every folder of the user, ordered by path.
    async fn find_all_by_user_id(&self, user_id: Uuid) -> Result<Vec<Folder>>;

    async fn create(&self, folder: &Folder) -> Result<Folder>;

    /// Persists a renamed folder and rewrites the paths of every folder and
    /// file below `old_path`, atomically.
    async fn rename(&self, folder: &Folder, old_path: &str) -> Result<Folder>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    async fn exists(&self, user_id: Uuid, path: &str) -> Result<bool>;
}

#[async_trait]
pub trait FileRepository: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<File>>;

    /// Lookup by physical name (`<id><ext>`).
    async fn find_by_name(&self, name: &str) -> Result<Option<File>>;

    /// Newest first.
    async fn find_by_folder_id(&self, folder_id: Uuid) -> Result<Vec<File>>;

    async fn find_by_checksum(&self, user_id: Uuid, checksum: &str) -> Result<Option<File>>;

    async fn find_public_files(&self) -> Result<Vec<File>>;

    async fn count_by_folder_id(&self, folder_id: Uuid) -> Result<i64>;

    /// Inserts the file row together with its metadata row.
    async fn create(&self, file: &File) -> Result<File>;

    async fn delete(&self, id: Uuid) -> Result<()>;

    async fn exists(&self, user_id: Uuid, path: &str) -> Result<bool>;
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    async fn create(&self, user: &NewUser) -> Result<User>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_by_username(&self, username: &str) -> Result<Option<User>>;

    /// User holding `token_hash` whose expiry is after `now`.
    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>>;

    async fn set_reset_token(&self, id: Uuid, token_hash: &str, expiry: DateTime<Utc>) -> Result<()>;

    /// Stores a new password hash and clears any pending reset token.
    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()>;

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<User>;

    /// Backend liveness probe.
    async fn ping(&self) -> Result<()>;
}
