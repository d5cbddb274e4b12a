//! Authentication extractors.
//!
//! The signed-in user lives in the server-side session; handlers never
//! trust a user id supplied by the client.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use crate::error::AppError;
use crate::models::session::{CURRENT_USER_KEY, CurrentUser};

/// Read the session user, if any. A missing session layer or an unreadable
/// record both count as signed out.
async fn session_user(parts: &Parts) -> Option<CurrentUser> {
    let session = parts.extensions.get::<Session>()?;
    match session.get::<CurrentUser>(CURRENT_USER_KEY).await {
        Ok(user) => user,
        Err(e) => {
            tracing::warn!(error = %e, "Could not read session user");
            None
        }
    }
}

/// The signed-in user. Rejects with the `Unauthorized` envelope (401).
///
/// ```rust,ignore
/// async fn cart(RequireAuth(user): RequireAuth) -> ApiResult<CartView> { ... }
/// ```
pub struct RequireAuth(pub CurrentUser);

impl<S> FromRequestParts<S> for RequireAuth
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let user = session_user(parts)
            .await
            .ok_or_else(|| AppError::Unauthorized("Please log in to continue".to_owned()))?;

        tracing::Span::current().record("user_id", tracing::field::display(user.id));
        Ok(Self(user))
    }
}

/// The signed-in user when there is one; never rejects.
pub struct OptionalAuth(pub Option<CurrentUser>);

impl<S> FromRequestParts<S> for OptionalAuth
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(session_user(parts).await))
    }
}

/// Store the signed-in user, cycling the session id first so a pre-login
/// id cannot be reused.
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn set_current_user(
    session: &Session,
    user: &CurrentUser,
) -> Result<(), tower_sessions::session::Error> {
    session.cycle_id().await?;
    session.insert(CURRENT_USER_KEY, user).await
}

/// Drop the session row and expire the cookie.
///
/// # Errors
///
/// Returns an error if the session store cannot be updated.
pub async fn clear_current_user(session: &Session) -> Result<(), tower_sessions::session::Error> {
    session.flush().await
}
