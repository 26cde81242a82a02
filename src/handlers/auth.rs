use axum::{extract::State, http::StatusCode, response::Json};
use axum_extra::extract::cookie::CookieJar;
use chrono::{Duration, Utc};
use rand::Rng;
use serde_json::{json, Value};
use validator::Validate;

use crate::{
    auth::PasswordService,
    errors::{AppError, Result},
    handlers::{extract::AppJson, success, success_message, AppState},
    middleware::auth::{expired_session_cookie, session_cookie},
    models::{
        validate_email, validate_username, AuthResponse, ForgotPasswordRequest, LoginRequest, NewUser,
        RegisterRequest, ResetPasswordRequest, UserResponse,
    },
    services::password_reset_email,
    utils::crypto::{generate_reset_token, hash_reset_token},
};

/// Same answer whether or not the address is registered.
pub const FORGOT_PASSWORD_MESSAGE: &str =
    "If this email is registered, you will receive a password reset link.";

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = "auth",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created"),
        (status = 400, description = "Invalid input or email already registered")
    )
)]
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<Value>)> {
    request.validate()?;

    let email = normalize_email(&request.email);
    validate_email(&email)?;
    let username = non_empty(request.username);
    if let Some(username) = &username {
        validate_username(username)?;
    }

    if state.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::Conflict("A user with this email already exists".to_string()));
    }
    if let Some(username) = &username {
        if state.users.find_by_username(username).await?.is_some() {
            return Err(AppError::Conflict("This username is already taken".to_string()));
        }
    }

    let password_hash = PasswordService::hash_password_blocking(request.password).await?;
    let user = state
        .users
        .create(&NewUser {
            email,
            password_hash,
            name: non_empty(request.name),
            username,
        })
        .await?;

    state.media.ensure_user_root_folder(user.id).await?;
    tracing::info!("User {} registered", user.id);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "message": "User created successfully",
            "data": { "user": UserResponse::from(user) }
        })),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = AuthResponse),
        (status = 401, description = "Invalid credentials")
    )
)]
pub async fn login(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<(CookieJar, Json<Value>)> {
    let invalid = || AppError::Auth("Invalid email or password".to_string());

    let user = state
        .users
        .find_by_email(&normalize_email(&request.email))
        .await?
        .ok_or_else(invalid)?;

    if !PasswordService::verify_password_blocking(request.password, user.password_hash.clone()).await? {
        return Err(invalid());
    }

    let session = state.jwt.generate_session_token(&user)?;
    let max_age = state.jwt.session_duration().num_seconds();
    let jar = jar.add(session_cookie(session.token.clone(), max_age));

    tracing::info!("User {} signed in", user.id);

    let response = AuthResponse {
        token: session.token,
        expires_at: session.expires_at,
        user: UserResponse::from(user),
    };

    Ok((jar, success(response)))
}

#[utoipa::path(
    post,
    path = "/api/auth/logout",
    tag = "auth",
    responses((status = 200, description = "Session cookie cleared"))
)]
pub async fn logout(jar: CookieJar) -> (CookieJar, Json<Value>) {
    (jar.add(expired_session_cookie()), success_message("Logged out successfully"))
}

#[utoipa::path(
    post,
    path = "/api/auth/forgot-password",
    tag = "auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset link sent if the account exists"),
        (status = 400, description = "Email missing"),
        (status = 500, description = "Email delivery failed")
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(request): AppJson<ForgotPasswordRequest>,
) -> Result<Json<Value>> {
    let email = non_empty(request.email)
        .map(|email| normalize_email(&email))
        .ok_or_else(|| AppError::Validation("Email is required".to_string()))?;

    let user = match state.users.find_by_email(&email).await? {
        Some(user) => user,
        None => {
            // Unknown addresses take about as long as known ones.
            let delay = rand::thread_rng().gen_range(500..=1500);
            tokio::time::sleep(std::time::Duration::from_millis(delay)).await;
            return Ok(success_message(FORGOT_PASSWORD_MESSAGE));
        }
    };

    let token = generate_reset_token();
    let expiry = Utc::now() + Duration::minutes(state.config.reset_token_ttl_minutes);
    state
        .users
        .set_reset_token(user.id, &hash_reset_token(&token), expiry)
        .await?;

    let reset_url = format!(
        "{}/auth/reset-password?token={}",
        state.config.app_url.trim_end_matches('/'),
        token
    );
    let display_name = user.name.as_deref().unwrap_or(&user.email);

    state
        .mailer
        .send(password_reset_email(&user.email, display_name, &reset_url))
        .await?;

    tracing::info!("Password reset requested for user {}", user.id);
    Ok(success_message(FORGOT_PASSWORD_MESSAGE))
}

#[utoipa::path(
    post,
    path = "/api/auth/reset-password",
    tag = "auth",
    request_body = ResetPasswordRequest,
    responses(
        (status = 200, description = "Password changed"),
        (status = 400, description = "Missing, invalid or expired token, or weak password")
    )
)]
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(request): AppJson<ResetPasswordRequest>,
) -> Result<Json<Value>> {
    let token = non_empty(request.token)
        .ok_or_else(|| AppError::Validation("Token is required".to_string()))?;
    let password = request.password.unwrap_or_default();
    PasswordService::validate_password_strength(&password)?;

    let user = state
        .users
        .find_by_reset_token(&hash_reset_token(&token), Utc::now())
        .await?
        .ok_or_else(|| AppError::Validation("Invalid or expired token".to_string()))?;

    let password_hash = PasswordService::hash_password_blocking(password).await?;
    state.users.update_password(user.id, &password_hash).await?;

    tracing::info!("Password reset completed for user {}", user.id);
    Ok(success_message(
        "Password reset successfully. You can now sign in.",
    ))
}
