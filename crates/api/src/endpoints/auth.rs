//! Authentication endpoints.

use axum::{
    Json, Router,
    extract::State,
    routing::{delete, get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use fandom_common::{AppResult, config::AuthConfig};
use fandom_core::{Session, SigninInput, SignupInput, services::route_cache};
use fandom_db::entities::profile;
use serde::Deserialize;
use tracing::info;

use super::revalidate_content;
use crate::{
    extractors::AuthUser,
    middleware::AppState,
    response::{ApiResponse, Done},
};

/// Session cookie carrying `token`.
fn session_cookie(config: &AuthConfig, token: String) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), token))
        .path("/")
        .http_only(true)
        .secure(config.secure_cookies)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(config.session_max_age_days))
        .build()
}

/// Removal cookie matching the session cookie's path.
fn cleared_cookie(config: &AuthConfig) -> Cookie<'static> {
    Cookie::build((config.cookie_name.clone(), "")).path("/").build()
}

/// Create a new account and start a session.
async fn signup(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<SignupInput>,
) -> AppResult<(CookieJar, ApiResponse<Session>)> {
    let session = state.auth_service.signup(input).await?;
    state.route_cache.revalidate(&[route_cache::RANKING]).await;

    let jar = jar.add(session_cookie(&state.auth_config, session.token.clone()));
    Ok((jar, ApiResponse::ok(session)))
}

/// Sign in with a username or email.
async fn signin(
    State(state): State<AppState>,
    jar: CookieJar,
    Json(input): Json<SigninInput>,
) -> AppResult<(CookieJar, ApiResponse<Session>)> {
    let session = state.auth_service.signin(input).await?;
    if session.bonus_granted {
        state.route_cache.revalidate(&[route_cache::RANKING]).await;
    }

    let jar = jar.add(session_cookie(&state.auth_config, session.token.clone()));
    Ok((jar, ApiResponse::ok(session)))
}

/// End the session: rotate the token and clear the cookie.
async fn signout(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<Done>)> {
    state.auth_service.signout(&user.id).await?;
    info!(user_id = %user.id, "Signed out");

    Ok((
        jar.remove(cleared_cookie(&state.auth_config)),
        ApiResponse::done(),
    ))
}

/// The caller's own profile.
async fn me(AuthUser(user): AuthUser) -> ApiResponse<profile::Model> {
    ApiResponse::ok(user)
}

#[derive(Debug, Deserialize)]
pub struct DeleteAccountRequest {
    pub password: String,
}

/// Delete the caller's account after re-checking the password.
async fn delete_account(
    AuthUser(user): AuthUser,
    State(state): State<AppState>,
    jar: CookieJar,
    Json(req): Json<DeleteAccountRequest>,
) -> AppResult<(CookieJar, ApiResponse<Done>)> {
    state
        .auth_service
        .delete_account(&user, &req.password)
        .await?;
    revalidate_content(&state.route_cache).await;

    Ok((
        jar.remove(cleared_cookie(&state.auth_config)),
        ApiResponse::done(),
    ))
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/signin", post(signin))
        .route("/signout", post(signout))
        .route("/me", get(me))
        .route("/account", delete(delete_account))
}
