//! Authentication route handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::middleware::{OptionalAuth, RequireAuth, clear_current_user, set_current_user};
use crate::models::{CurrentUser, User};
use crate::routes::envelope::{ApiJson, ApiResponse};
use crate::services::AuthService;
use crate::state::AppState;

/// Login form data.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

/// Registration form data.
#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub fullname: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// Password reset form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default, rename = "newPassword", alias = "new_password")]
    pub new_password: String,
}

fn session_error(e: &tower_sessions::session::Error) -> AppError {
    AppError::Internal(format!("session error: {e}"))
}

/// Handle login.
///
/// POST /api/auth/login
#[instrument(skip(state, session, form), fields(username = %form.username))]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    ApiJson(form): ApiJson<LoginRequest>,
) -> Result<ApiResponse<User>> {
    let auth = AuthService::new(state.pool());
    let user = auth.login(&form.username, &form.password).await?;

    let current_user = CurrentUser {
        id: user.id,
        username: user.username.clone(),
    };
    set_current_user(&session, &current_user)
        .await
        .map_err(|e| session_error(&e))?;

    set_sentry_user(&user.id, user.username.as_str());
    tracing::info!(user_id = %user.id, "User logged in");

    Ok(ApiResponse::ok("Login successful", user))
}

/// Handle registration.
///
/// POST /api/auth/register
///
/// Does not sign the new user in; the client logs in afterwards.
#[instrument(skip(state, form), fields(username = %form.username))]
pub async fn register(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<RegisterRequest>,
) -> Result<impl IntoResponse> {
    let auth = AuthService::new(state.pool());
    let user = auth
        .register(&form.username, &form.fullname, &form.email, &form.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Registration successful", user),
    ))
}

/// Handle password reset.
///
/// POST /api/auth/reset-password
#[instrument(skip(state, form))]
pub async fn reset_password(
    State(state): State<AppState>,
    ApiJson(form): ApiJson<ResetPasswordRequest>,
) -> Result<ApiResponse<()>> {
    let auth = AuthService::new(state.pool());
    auth.reset_password(&form.email, &form.new_password).await?;

    Ok(ApiResponse::message("Password updated successfully"))
}

/// Handle logout. Succeeds even without an active login.
///
/// POST /api/auth/logout
pub async fn logout(
    session: Session,
    OptionalAuth(current_user): OptionalAuth,
) -> Result<ApiResponse<()>> {
    clear_current_user(&session)
        .await
        .map_err(|e| session_error(&e))?;
    clear_sentry_user();

    if let Some(user) = current_user {
        tracing::info!(user_id = %user.id, "User logged out");
    }

    Ok(ApiResponse::message("Logged out"))
}

/// The signed-in user's profile.
///
/// GET /api/auth/me
pub async fn me(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
) -> Result<ApiResponse<User>> {
    let auth = AuthService::new(state.pool());
    let user = auth.get_user(current_user.id).await?;

    Ok(ApiResponse::ok("Authenticated", user))
}
