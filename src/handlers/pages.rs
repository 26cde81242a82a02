use axum::response::{Html, IntoResponse, Redirect, Response};

use crate::middleware::auth::AuthenticatedUser;

const MANAGER_PAGE: &str = include_str!("../../web/manager.html");
const SIGNIN_PAGE: &str = include_str!("../../web/signin.html");
const RESET_PASSWORD_PAGE: &str = include_str!("../../web/reset-password.html");

/// `GET /manager`: the file manager, or a redirect to the sign-in page.
pub async fn manager(user: Option<AuthenticatedUser>) -> Response {
    match user {
        Some(_) => Html(MANAGER_PAGE).into_response(),
        None => Redirect::to("/auth/signin").into_response(),
    }
}

pub async fn signin() -> Html<&'static str> {
    Html(SIGNIN_PAGE)
}

/// The token stays in the query string; the page posts it back itself.
pub async fn reset_password() -> Html<&'static str> {
    Html(RESET_PASSWORD_PAGE)
}
