use bcrypt::{hash, verify};

use crate::errors::{AppError, Result};

pub const BCRYPT_COST: u32 = 12;
pub const MIN_PASSWORD_LENGTH: usize = 6;

pub struct PasswordService;

impl PasswordService {
    pub fn hash_password(password: &str) -> Result<String> {
        hash(password, BCRYPT_COST)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to hash password: {}", e)))
    }

    /// Hashes on the blocking pool; bcrypt at this cost takes a few hundred milliseconds.
    pub async fn hash_password_blocking(password: String) -> Result<String> {
        tokio::task::spawn_blocking(move || Self::hash_password(&password))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password hashing task failed: {}", e)))?
    }

    pub async fn verify_password_blocking(password: String, hash: String) -> Result<bool> {
        tokio::task::spawn_blocking(move || Self::verify_password(&password, &hash))
            .await
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Password check task failed: {}", e)))
    }

    /// A malformed stored hash counts as a mismatch.
    pub fn verify_password(password: &str, hash: &str) -> bool {
        verify(password, hash).unwrap_or(false)
    }

    pub fn validate_password_strength(password: &str) -> Result<()> {
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::Validation(
                "Password must be at least 6 characters long".to_string(),
            ));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hashing_and_verification() {
        let password = "secret123";
        let hash = PasswordService::hash_password(password).unwrap();

        assert!(hash.starts_with("$2b$12$"));
        assert!(PasswordService::verify_password(password, &hash));
        assert!(!PasswordService::verify_password("wrong_password", &hash));
        assert!(!PasswordService::verify_password(password, "not-a-hash"));
    }

    #[test]
    fn test_password_strength_validation() {
        assert!(PasswordService::validate_password_strength("abcdef").is_ok());
        assert!(PasswordService::validate_password_strength("abcde").is_err());
        assert!(PasswordService::validate_password_strength("").is_err());
    }
}
