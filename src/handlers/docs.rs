use axum::Router;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::handlers::AppState;

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::health::liveness,
        crate::handlers::health::readiness,
        crate::handlers::auth::register,
        crate::handlers::auth::login,
        crate::handlers::auth::logout,
        crate::handlers::auth::forgot_password,
        crate::handlers::auth::reset_password,
        crate::handlers::user::get_profile,
        crate::handlers::user::update_profile,
        crate::handlers::folders::list_folders,
        crate::handlers::folders::create_folder,
        crate::handlers::folders::rename_folder,
        crate::handlers::folders::delete_folder,
        crate::handlers::files::list_files,
        crate::handlers::files::list_public_files,
        crate::handlers::files::get_file,
        crate::handlers::files::delete_file,
        crate::handlers::upload::upload_file,
    ),
    components(
        schemas(
            crate::models::Folder,
            crate::models::File,
            crate::models::FileMetadata,
            crate::models::FolderTree,
            crate::models::UploadFileForm,
            crate::models::CreateFolderRequest,
            crate::models::RenameFolderRequest,
            crate::models::RegisterRequest,
            crate::models::LoginRequest,
            crate::models::ForgotPasswordRequest,
            crate::models::ResetPasswordRequest,
            crate::models::UpdateProfileRequest,
            crate::models::UserResponse,
            crate::models::AuthResponse,
            crate::services::FolderContents,
        )
    ),
    tags(
        (name = "auth", description = "Registration, sessions and password reset"),
        (name = "user", description = "Profile of the signed-in user"),
        (name = "folders", description = "Folder hierarchy"),
        (name = "files", description = "Uploads and file records"),
        (name = "health", description = "Health check endpoints")
    ),
    info(
        title = "Media Manager API",
        version = "0.1.0",
        description = "Per-user media library with folders, uploads and thumbnails"
    )
)]
pub struct ApiDoc;

pub fn create_docs_router() -> Router<AppState> {
    Router::new()
        .merge(SwaggerUi::new("/docs").url("/api-docs/openapi.json", ApiDoc::openapi()))
}
