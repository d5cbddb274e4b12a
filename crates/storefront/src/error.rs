//! Unified error handling with Sentry integration.
//!
//! Route handlers return `Result<T, AppError>`. Every error renders as the
//! JSON failure envelope:
//!
//! ```json
//! {"success": false, "error": "Conflict", "message": "Username or email already exists"}
//! ```
//!
//! Storage failures are captured to Sentry and answered with a generic
//! message so database or filesystem details never reach the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::db::RepositoryError;
use crate::services::auth::AuthError;
use crate::services::profile::ProfileError;
use crate::services::purchase::PurchaseError;

/// Client-visible error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorKind {
    InvalidInput,
    Unauthorized,
    NotFound,
    Conflict,
    RateLimited,
    StorageError,
}

impl ErrorKind {
    /// HTTP status for this category.
    #[must_use]
    pub const fn status(self) -> StatusCode {
        match self {
            Self::InvalidInput => StatusCode::BAD_REQUEST,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::RateLimited => StatusCode::TOO_MANY_REQUESTS,
            Self::StorageError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Profile operation failed.
    #[error("Profile error: {0}")]
    Profile(#[from] ProfileError),

    /// Purchase operation failed.
    #[error("Purchase error: {0}")]
    Purchase(#[from] PurchaseError),

    /// Missing or malformed request parameters.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request conflicts with current state.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Rate limited.
    #[error("Rate limited")]
    RateLimited,

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

const INTERNAL_MESSAGE: &str = "Internal server error";

impl AppError {
    /// The category this error is reported under.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Database(err) => match err {
                RepositoryError::NotFound => ErrorKind::NotFound,
                RepositoryError::Conflict(_) => ErrorKind::Conflict,
                RepositoryError::Database(_) | RepositoryError::DataCorruption(_) => {
                    ErrorKind::StorageError
                }
            },
            Self::Auth(err) => match err {
                AuthError::MissingField(_)
                | AuthError::InvalidUsername(_)
                | AuthError::InvalidEmail(_)
                | AuthError::InvalidPassword(_) => ErrorKind::InvalidInput,
                AuthError::InvalidCredentials => ErrorKind::Unauthorized,
                AuthError::UserNotFound => ErrorKind::NotFound,
                AuthError::UserAlreadyExists => ErrorKind::Conflict,
                AuthError::Repository(_) | AuthError::PasswordHash => ErrorKind::StorageError,
            },
            Self::Profile(err) => match err {
                ProfileError::InvalidEmail(_) | ProfileError::InvalidImageType => {
                    ErrorKind::InvalidInput
                }
                ProfileError::NotFound => ErrorKind::NotFound,
                ProfileError::EmailTaken => ErrorKind::Conflict,
                ProfileError::Storage(_) | ProfileError::Repository(_) => ErrorKind::StorageError,
            },
            Self::Purchase(err) => match err {
                PurchaseError::NoCars
                | PurchaseError::InvalidAmount
                | PurchaseError::InvalidStatus(_)
                | PurchaseError::InvalidCarId
                | PurchaseError::NotInCart(_) => ErrorKind::InvalidInput,
                PurchaseError::UnknownCar(_) | PurchaseError::NotFound => ErrorKind::NotFound,
                PurchaseError::AlreadyFinal(_) | PurchaseError::NotRemovable => {
                    ErrorKind::Conflict
                }
                PurchaseError::Repository(_) => ErrorKind::StorageError,
            },
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Unauthorized(_) => ErrorKind::Unauthorized,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::RateLimited => ErrorKind::RateLimited,
            Self::Internal(_) => ErrorKind::StorageError,
        }
    }

    /// Message shown to the client.
    fn client_message(&self) -> String {
        if self.kind() == ErrorKind::StorageError {
            return INTERNAL_MESSAGE.to_owned();
        }

        match self {
            Self::Auth(err) => match err {
                AuthError::InvalidCredentials => "Invalid username or password".to_owned(),
                AuthError::UserNotFound => "No account found for that email".to_owned(),
                AuthError::UserAlreadyExists => "Username or email already exists".to_owned(),
                AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
                AuthError::InvalidPassword(msg) => msg.clone(),
                other => capitalize(&other.to_string()),
            },
            Self::Database(err) => match err {
                RepositoryError::Conflict(msg) => capitalize(msg),
                _ => "Not found".to_owned(),
            },
            Self::Profile(ProfileError::InvalidEmail(_)) => "Invalid email address".to_owned(),
            Self::Profile(err) => capitalize(&err.to_string()),
            Self::Purchase(err) => capitalize(&err.to_string()),
            Self::InvalidInput(msg)
            | Self::Unauthorized(msg)
            | Self::NotFound(msg)
            | Self::Conflict(msg)
            | Self::Internal(msg) => msg.clone(),
            Self::RateLimited => "Too many requests, please try again later".to_owned(),
        }
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

/// Failure envelope.
#[derive(Debug, Serialize)]
struct ErrorBody {
    success: bool,
    error: ErrorKind,
    message: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let kind = self.kind();

        // Capture server errors to Sentry
        if kind == ErrorKind::StorageError {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        } else {
            tracing::debug!(error = %self, kind = ?kind, "Request rejected");
        }

        let body = ErrorBody {
            success: false,
            error: kind,
            message: self.client_message(),
        };

        (kind.status(), Json(body)).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, username: &str) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            username: Some(username.to_owned()),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    use autoelite_core::{CarId, PurchaseStatus};

    async fn render(err: AppError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("car 99".to_string());
        assert_eq!(err.to_string(), "Not found: car 99");

        let err = AppError::InvalidInput("car_id is required".to_string());
        assert_eq!(err.to_string(), "Invalid input: car_id is required");
    }

    #[test]
    fn test_kind_mapping() {
        assert_eq!(
            AppError::from(AuthError::InvalidCredentials).kind(),
            ErrorKind::Unauthorized
        );
        assert_eq!(
            AppError::from(AuthError::UserAlreadyExists).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::from(AuthError::MissingField("fullname")).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            AppError::from(AuthError::UserNotFound).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::from(ProfileError::InvalidImageType).kind(),
            ErrorKind::InvalidInput
        );
        assert_eq!(
            AppError::from(ProfileError::EmailTaken).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::from(PurchaseError::AlreadyFinal(PurchaseStatus::Completed)).kind(),
            ErrorKind::Conflict
        );
        assert_eq!(
            AppError::from(PurchaseError::UnknownCar(CarId::new(99))).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            AppError::from(RepositoryError::DataCorruption("bad".to_owned())).kind(),
            ErrorKind::StorageError
        );
    }

    #[test]
    fn test_app_error_status_codes() {
        fn get_status(err: AppError) -> StatusCode {
            let response = err.into_response();
            response.status()
        }

        assert_eq!(
            get_status(AppError::NotFound("test".to_string())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Unauthorized("test".to_string())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::InvalidInput("test".to_string())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Conflict("test".to_string())),
            StatusCode::CONFLICT
        );
        assert_eq!(
            get_status(AppError::RateLimited),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(
            get_status(AppError::Internal("test".to_string())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn test_error_envelope() {
        let (status, body) = render(PurchaseError::NoCars.into()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "InvalidInput");
        assert_eq!(body["message"], "At least one car is required");
    }

    #[tokio::test]
    async fn test_storage_errors_are_not_leaked() {
        let err = AppError::Database(RepositoryError::DataCorruption(
            "invalid email in database: secret@internal".to_owned(),
        ));
        let (status, body) = render(err).await;

        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "StorageError");
        assert_eq!(body["message"], INTERNAL_MESSAGE);
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("purchase not found"), "Purchase not found");
        assert_eq!(capitalize(""), "");
    }
}
