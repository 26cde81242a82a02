use axum::{extract::State, response::Json};
use serde_json::{json, Value};

use crate::{
    auth::PasswordService,
    errors::{AppError, Result},
    handlers::{extract::AppJson, success, AppState},
    middleware::auth::AuthenticatedUser,
    models::{validate_username, ProfileUpdate, UpdateProfileRequest, UserResponse},
};

#[utoipa::path(
    get,
    path = "/api/user/profile",
    tag = "user",
    responses(
        (status = 200, description = "Current user", body = UserResponse),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn get_profile(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
) -> Result<Json<Value>> {
    let user = state
        .users
        .find_by_id(auth.id)
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(success(json!({ "user": UserResponse::from(user) })))
}

#[utoipa::path(
    put,
    path = "/api/user/profile",
    tag = "user",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated user", body = UserResponse),
        (status = 400, description = "Invalid input or wrong current password"),
        (status = 401, description = "Not signed in")
    )
)]
pub async fn update_profile(
    State(state): State<AppState>,
    auth: AuthenticatedUser,
    AppJson(request): AppJson<UpdateProfileRequest>,
) -> Result<Json<Value>> {
    let mut update = ProfileUpdate {
        name: request.name.map(|name| name.trim().to_string()),
        ..ProfileUpdate::default()
    };

    if let Some(username) = request.username {
        let username = username.trim().to_string();
        validate_username(&username)?;

        if let Some(existing) = state.users.find_by_username(&username).await? {
            if existing.id != auth.id {
                return Err(AppError::Conflict("This username is already taken".to_string()));
            }
        }
        update.username = Some(username);
    }

    if let Some(new_password) = request.new_password.filter(|p| !p.is_empty()) {
        let current_password = request
            .current_password
            .filter(|p| !p.is_empty())
            .ok_or_else(|| {
                AppError::Validation(
                    "The current password is required to set a new one".to_string(),
                )
            })?;
        PasswordService::validate_password_strength(&new_password)?;

        let user = state
            .users
            .find_by_id(auth.id)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if !PasswordService::verify_password_blocking(current_password, user.password_hash).await? {
            return Err(AppError::Validation("Current password is incorrect".to_string()));
        }

        update.password_hash = Some(PasswordService::hash_password_blocking(new_password).await?);
    }

    let user = state.users.update_profile(auth.id, &update).await?;
    tracing::info!("Profile updated for user {}", user.id);

    Ok(success(json!({ "user": UserResponse::from(user) })))
}
