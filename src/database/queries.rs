use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::database::repositories::{FileRepository, FolderRepository, UserRepository};
use crate::errors::{AppError, Result};
use crate::models::*;

const FOLDER_COLUMNS: &str =
    "id, name, slug, path, parent_id, is_root, user_id, created_at, updated_at";

const USER_COLUMNS: &str = "id, email, username, name, password_hash, reset_token, \
     reset_token_expiry, created_at, updated_at";

const FILE_SELECT: &str = r#"
    SELECT f.id, f.name, f.original_name, f.slug, f.mime_type, f.size, f.path, f.checksum,
           f.user_id, f.folder_id, f.is_public, f.url, f.created_at, f.updated_at,
           (m.file_id IS NOT NULL) AS has_metadata,
           m.width, m.height, m.duration, m.bitrate, m.format
    FROM files f
    LEFT JOIN file_metadata m ON m.file_id = f.id
"#;

pub struct FolderQueries {
    pool: PgPool,
}

impl FolderQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FolderRepository for FolderQueries {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {} FROM folders WHERE id = $1",
            FOLDER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(folder)
    }

    async fn find_by_parent_id(&self, parent_id: Uuid) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {} FROM folders WHERE parent_id = $1 ORDER BY name ASC",
            FOLDER_COLUMNS
        ))
        .bind(parent_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(folders)
    }

    async fn find_root_folder(&self, user_id: Uuid) -> Result<Option<Folder>> {
        let folder = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {} FROM folders WHERE user_id = $1 AND is_root",
            FOLDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(folder)
    }

    async fn find_all_by_user_id(&self, user_id: Uuid) -> Result<Vec<Folder>> {
        let folders = sqlx::query_as::<_, Folder>(&format!(
            "SELECT {} FROM folders WHERE user_id = $1 ORDER BY path ASC",
            FOLDER_COLUMNS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(folders)
    }

    async fn create(&self, folder: &Folder) -> Result<Folder> {
        let created = sqlx::query_as::<_, Folder>(&format!(
            r#"
            INSERT INTO folders (id, name, slug, path, parent_id, is_root, user_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {}
            "#,
            FOLDER_COLUMNS
        ))
        .bind(folder.id)
        .bind(&folder.name)
        .bind(&folder.slug)
        .bind(&folder.path)
        .bind(folder.parent_id)
        .bind(folder.is_root)
        .bind(folder.user_id)
        .bind(folder.created_at)
        .bind(folder.updated_at)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn rename(&self, folder: &Folder, old_path: &str) -> Result<Folder> {
        let mut tx = self.pool.begin().await?;

        let renamed = sqlx::query_as::<_, Folder>(&format!(
            r#"
            UPDATE folders SET name = $2, slug = $3, path = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            FOLDER_COLUMNS
        ))
        .bind(folder.id)
        .bind(&folder.name)
        .bind(&folder.slug)
        .bind(&folder.path)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Folder not found".to_string()))?;

        // Descendants keep their suffix below the renamed folder.
        sqlx::query(
            r#"
            UPDATE folders SET path = $3 || substr(path, length($2) + 1), updated_at = NOW()
            WHERE user_id = $1 AND left(path, length($2) + 1) = $2 || '/'
            "#,
        )
        .bind(folder.user_id)
        .bind(old_path)
        .bind(&folder.path)
        .execute(&mut *tx)
        .await?;

        sqlx::query(
            r#"
            UPDATE files SET path = $3 || substr(path, length($2) + 1), updated_at = NOW()
            WHERE user_id = $1 AND left(path, length($2) + 1) = $2 || '/'
            "#,
        )
        .bind(folder.user_id)
        .bind(old_path)
        .bind(&folder.path)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        Ok(renamed)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        sqlx::query("DELETE FROM folders WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn exists(&self, user_id: Uuid, path: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM folders WHERE user_id = $1 AND path = $2)",
        )
        .bind(user_id)
        .bind(path)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

pub struct FileQueries {
    pool: PgPool,
}

impl FileQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl FileRepository for FileQueries {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<File>> {
        let record = sqlx::query_as::<_, FileRecord>(&format!("{} WHERE f.id = $1", FILE_SELECT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(File::from))
    }

    async fn find_by_name(&self, name: &str) -> Result<Option<File>> {
        let record = sqlx::query_as::<_, FileRecord>(&format!("{} WHERE f.name = $1", FILE_SELECT))
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(record.map(File::from))
    }

    async fn find_by_folder_id(&self, folder_id: Uuid) -> Result<Vec<File>> {
        let records = sqlx::query_as::<_, FileRecord>(&format!(
            "{} WHERE f.folder_id = $1 ORDER BY f.created_at DESC",
            FILE_SELECT
        ))
        .bind(folder_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(File::from).collect())
    }

    async fn find_by_checksum(&self, user_id: Uuid, checksum: &str) -> Result<Option<File>> {
        let record = sqlx::query_as::<_, FileRecord>(&format!(
            "{} WHERE f.user_id = $1 AND f.checksum = $2",
            FILE_SELECT
        ))
        .bind(user_id)
        .bind(checksum)
        .fetch_optional(&self.pool)
        .await?;

        Ok(record.map(File::from))
    }

    async fn find_public_files(&self) -> Result<Vec<File>> {
        let records = sqlx::query_as::<_, FileRecord>(&format!(
            "{} WHERE f.is_public ORDER BY f.created_at DESC",
            FILE_SELECT
        ))
        .fetch_all(&self.pool)
        .await?;

        Ok(records.into_iter().map(File::from).collect())
    }

    async fn count_by_folder_id(&self, folder_id: Uuid) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM files WHERE folder_id = $1")
            .bind(folder_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn create(&self, file: &File) -> Result<File> {
        let mut tx = self.pool.begin().await?;

        sqlx::query(
            r#"
            INSERT INTO files (id, name, original_name, slug, mime_type, size, path, url, checksum,
                               is_public, user_id, folder_id, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(file.id)
        .bind(&file.name)
        .bind(&file.original_name)
        .bind(&file.slug)
        .bind(&file.mime_type)
        .bind(file.size)
        .bind(&file.path)
        .bind(&file.url)
        .bind(&file.checksum)
        .bind(file.is_public)
        .bind(file.user_id)
        .bind(file.folder_id)
        .bind(file.created_at)
        .bind(file.updated_at)
        .execute(&mut *tx)
        .await?;

        if let Some(metadata) = &file.metadata {
            sqlx::query(
                r#"
                INSERT INTO file_metadata (file_id, width, height, duration, bitrate, format)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(file.id)
            .bind(metadata.width)
            .bind(metadata.height)
            .bind(metadata.duration)
            .bind(metadata.bitrate)
            .bind(&metadata.format)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(file.clone())
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        // file_metadata goes with it through ON DELETE CASCADE.
        sqlx::query("DELETE FROM files WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn exists(&self, user_id: Uuid, path: &str) -> Result<bool> {
        let exists: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM files WHERE user_id = $1 AND path = $2)",
        )
        .bind(user_id)
        .bind(path)
        .fetch_one(&self.pool)
        .await?;

        Ok(exists)
    }
}

pub struct UserQueries {
    pool: PgPool,
}

impl UserQueries {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for UserQueries {
    async fn create(&self, user: &NewUser) -> Result<User> {
        let created = sqlx::query_as::<_, User>(&format!(
            r#"
            INSERT INTO users (id, email, password_hash, name, username)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(Uuid::new_v4())
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(&user.name)
        .bind(&user.username)
        .fetch_one(&self.pool)
        .await?;

        Ok(created)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE id = $1",
            USER_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE email = $1",
            USER_COLUMNS
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_username(&self, username: &str) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE username = $1",
            USER_COLUMNS
        ))
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_by_reset_token(&self, token_hash: &str, now: DateTime<Utc>) -> Result<Option<User>> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT {} FROM users WHERE reset_token = $1 AND reset_token_expiry > $2",
            USER_COLUMNS
        ))
        .bind(token_hash)
        .bind(now)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn set_reset_token(&self, id: Uuid, token_hash: &str, expiry: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "UPDATE users SET reset_token = $2, reset_token_expiry = $3, updated_at = NOW() WHERE id = $1",
        )
        .bind(id)
        .bind(token_hash)
        .bind(expiry)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_password(&self, id: Uuid, password_hash: &str) -> Result<()> {
        sqlx::query(
            r#"
            UPDATE users
            SET password_hash = $2, reset_token = NULL, reset_token_expiry = NULL, updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(password_hash)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn update_profile(&self, id: Uuid, update: &ProfileUpdate) -> Result<User> {
        let user = sqlx::query_as::<_, User>(&format!(
            r#"
            UPDATE users
            SET name = COALESCE($2, name),
                username = COALESCE($3, username),
                password_hash = COALESCE($4, password_hash),
                updated_at = NOW()
            WHERE id = $1
            RETURNING {}
            "#,
            USER_COLUMNS
        ))
        .bind(id)
        .bind(&update.name)
        .bind(&update.username)
        .bind(&update.password_hash)
        .fetch_optional(&self.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        Ok(user)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
