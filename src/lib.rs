pub mod auth;
pub mod config;
pub mod database;
pub mod errors;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod storage;
pub mod utils;

use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    routing::{get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{config::Config, handlers::AppState};

/// Builds the complete router: JSON API, static uploads, pages and docs.
pub fn create_app(state: AppState) -> Router {
    let upload_limit = usize::try_from(state.config.max_file_size)
        .unwrap_or(usize::MAX)
        .saturating_add(handlers::upload::MULTIPART_OVERHEAD);
    let cors = cors_layer(&state.config);

    Router::new()
        .route("/health", get(handlers::health::liveness))
        .route("/health/ready", get(handlers::health::readiness))
        // Auth
        .route("/api/auth/register", post(handlers::auth::register))
        .route("/api/auth/login", post(handlers::auth::login))
        .route("/api/auth/logout", post(handlers::auth::logout))
        .route(
            "/api/auth/forgot-password",
            post(handlers::auth::forgot_password),
        )
        .route(
            "/api/auth/reset-password",
            post(handlers::auth::reset_password),
        )
        .route(
            "/api/user/profile",
            get(handlers::user::get_profile).put(handlers::user::update_profile),
        )
        // Folders and files
        .route(
            "/api/folders",
            get(handlers::folders::list_folders).post(handlers::folders::create_folder),
        )
        .route(
            "/api/folders/:id",
            put(handlers::folders::rename_folder).delete(handlers::folders::delete_folder),
        )
        .route("/api/files", get(handlers::files::list_files))
        .route(
            "/api/files/public",
            get(handlers::files::list_public_files),
        )
        .route(
            "/api/files/upload",
            post(handlers::upload::upload_file).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route(
            "/api/files/:id",
            get(handlers::files::get_file).delete(handlers::files::delete_file),
        )
        // Stored blobs
        .route(
            "/api/uploads/*path",
            get(handlers::uploads::serve_upload),
        )
        .route(
            "/uploads/users/:user/files/:name",
            get(handlers::uploads::serve_user_file),
        )
        .route(
            "/uploads/users/:user/thumbs/:name",
            get(handlers::uploads::serve_thumbnail),
        )
        .route("/uploads/:name", get(handlers::uploads::serve_by_name))
        // Pages
        .route("/manager", get(handlers::pages::manager))
        .route("/auth/signin", get(handlers::pages::signin))
        .route(
            "/auth/reset-password",
            get(handlers::pages::reset_password),
        )
        .merge(handlers::docs::create_docs_router())
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// Any origin when none are configured; otherwise the listed origins, with
/// credentials so the session cookie crosses over.
fn cors_layer(config: &Config) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true)
}
