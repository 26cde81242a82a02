use async_trait::async_trait;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncRead;

use crate::config::Config;
use crate::errors::{AppError, Result};

pub mod local;

pub use local::LocalStorage;

/// Blob store addressed by `/`-separated keys relative to the uploads root.
#[async_trait]
pub trait Storage: Send + Sync {
    async fn store(&self, key: &str, data: &[u8]) -> Result<()>;

    async fn retrieve(&self, key: &str) -> Result<Box<dyn AsyncRead + Send + Unpin>>;

    /// Removing a missing key is not an error.
    async fn delete(&self, key: &str) -> Result<()>;

    async fn exists(&self, key: &str) -> Result<bool>;

    async fn size(&self, key: &str) -> Result<u64>;
}

pub fn create_storage(config: &Config) -> Result<Arc<dyn Storage>> {
    let storage = LocalStorage::new(&config.upload_dir)?;
    Ok(Arc::new(storage))
}

/// Joins `key` onto `base`, refusing anything that could leave it.
pub fn resolve_key(base: &Path, key: &str) -> Result<PathBuf> {
    let relative = Path::new(key);
    let escapes = relative.components().any(|component| {
        !matches!(component, Component::Normal(_) | Component::CurDir)
    });

    if key.is_empty() || escapes || key.contains('\0') {
        return Err(AppError::Forbidden("Access denied".to_string()));
    }

    Ok(base.join(relative))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_key_stays_under_base() {
        let base = Path::new("/srv/uploads");
        assert_eq!(
            resolve_key(base, "users/u1/files/a.jpg").unwrap(),
            PathBuf::from("/srv/uploads/users/u1/files/a.jpg")
        );
        assert!(matches!(resolve_key(base, "../etc/passwd"), Err(AppError::Forbidden(_))));
        assert!(matches!(resolve_key(base, "users/../../secret"), Err(AppError::Forbidden(_))));
        assert!(matches!(resolve_key(base, "/etc/passwd"), Err(AppError::Forbidden(_))));
        assert!(resolve_key(base, "").is_err());
    }
}
