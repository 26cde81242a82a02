use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::{fs, io::AsyncRead};

use crate::{
    errors::{AppError, Result},
    storage::{resolve_key, Storage},
};

pub struct LocalStorage {
    base_path: PathBuf,
}

impl LocalStorage {
    pub fn new<P: AsRef<Path>>(base_path: P) -> Result<Self> {
        let base_path = base_path.as_ref().to_path_buf();

        std::fs::create_dir_all(&base_path)
            .map_err(|e| AppError::Storage(format!("Failed to create storage directory: {}", e)))?;

        Ok(Self { base_path })
    }

    fn get_full_path(&self, key: &str) -> Result<PathBuf> {
        resolve_key(&self.base_path, key)
    }
}

#[async_trait]
impl Storage for LocalStorage {
    async fn store(&self, key: &str, data: &[u8]) -> Result<()> {
        let full_path = self.get_full_path(key)?;

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| AppError::Storage(format!("Failed to create directory: {}", e)))?;
        }

        fs::write(&full_path, data)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to write file: {}", e)))?;

        Ok(())
    }

    async fn retrieve(&self, key: &str) -> Result<Box<dyn AsyncRead + Send + Unpin>> {
        let full_path = self.get_full_path(key)?;

        let file = fs::File::open(&full_path).await.map_err(|e| match e.kind() {
            ErrorKind::NotFound => AppError::NotFound("File not found".to_string()),
            _ => AppError::Storage(format!("Failed to open file: {}", e)),
        })?;

        Ok(Box::new(file))
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let full_path = self.get_full_path(key)?;

        match fs::remove_file(&full_path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(AppError::Storage(format!("Failed to delete file: {}", e))),
        }
    }

    async fn exists(&self, key: &str) -> Result<bool> {
        let full_path = self.get_full_path(key)?;
        Ok(fs::metadata(&full_path).await.is_ok_and(|m| m.is_file()))
    }

    async fn size(&self, key: &str) -> Result<u64> {
        let full_path = self.get_full_path(key)?;

        let metadata = fs::metadata(&full_path)
            .await
            .map_err(|e| AppError::Storage(format!("Failed to get file metadata: {}", e)))?;

        Ok(metadata.len())
    }
}
