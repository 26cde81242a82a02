use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::errors::{AppError, Result};
use crate::models::User;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // User ID
    pub email: String,
    pub username: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

impl Claims {
    pub fn user_id(&self) -> Result<Uuid> {
        Uuid::parse_str(&self.sub).map_err(|_| AppError::Auth("Invalid token".to_string()))
    }
}

/// A signed session token and the instant it stops being accepted.
#[derive(Debug, Clone)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    session_duration: Duration,
}

impl JwtService {
    pub fn new(secret: &str, session_duration: Duration) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_ref()),
            decoding_key: DecodingKey::from_secret(secret.as_ref()),
            session_duration,
        }
    }

    pub fn session_duration(&self) -> Duration {
        self.session_duration
    }

    pub fn generate_session_token(&self, user: &User) -> Result<SessionToken> {
        let now = Utc::now();
        let expires_at = now + self.session_duration;
        let claims = Claims {
            sub: user.id.to_string(),
            email: user.email.clone(),
            username: user.username.clone(),
            exp: expires_at.timestamp(),
            iat: now.timestamp(),
        };

        let token = encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(anyhow::anyhow!("Failed to sign session token: {}", e)))?;

        Ok(SessionToken { token, expires_at })
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())
            .map_err(|_| AppError::Auth("Invalid or expired session".to_string()))?;

        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> User {
        let now = Utc::now();
        User {
            id: Uuid::new_v4(),
            email: "test@example.com".to_string(),
            username: Some("tester".to_string()),
            name: None,
            password_hash: String::new(),
            reset_token: None,
            reset_token_expiry: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_session_token_generation_and_verification() {
        let jwt_service = JwtService::new("test-secret", Duration::hours(1));
        let user = user();

        let session = jwt_service.generate_session_token(&user).unwrap();
        let claims = jwt_service.verify_token(&session.token).unwrap();

        assert_eq!(claims.user_id().unwrap(), user.id);
        assert_eq!(claims.email, user.email);
        assert_eq!(claims.username.as_deref(), Some("tester"));
        assert_eq!(claims.exp, session.expires_at.timestamp());
    }

    #[test]
    fn test_rejects_foreign_signature() {
        let issuer = JwtService::new("secret-a", Duration::hours(1));
        let verifier = JwtService::new("secret-b", Duration::hours(1));

        let session = issuer.generate_session_token(&user()).unwrap();
        assert!(matches!(verifier.verify_token(&session.token), Err(AppError::Auth(_))));
    }

    #[test]
    fn test_rejects_expired_token() {
        let jwt_service = JwtService::new("test-secret", Duration::hours(-2));
        let session = jwt_service.generate_session_token(&user()).unwrap();

        assert!(jwt_service.verify_token(&session.token).is_err());
    }
}
