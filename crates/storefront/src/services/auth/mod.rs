//! Authentication service.
//!
//! Username/password accounts with Argon2id hashing.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sqlx::PgPool;
use tracing::{info, warn};

use autoelite_core::{Email, UserId, Username};

use crate::db::RepositoryError;
use crate::db::users::{NewUser, UserRepository};
use crate::models::user::User;

/// Maximum password length, in characters.
const MAX_PASSWORD_LENGTH: usize = 128;

/// Authentication service.
///
/// Handles registration, login, password reset, and user lookup.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self {
            users: UserRepository::new(pool),
        }
    }

    /// Register a new account.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if any field is blank.
    /// Returns `AuthError::InvalidUsername`, `AuthError::InvalidEmail` or
    /// `AuthError::InvalidPassword` if a field fails validation.
    /// Returns `AuthError::UserAlreadyExists` if the username or email is taken.
    pub async fn register(
        &self,
        username: &str,
        fullname: &str,
        email: &str,
        password: &str,
    ) -> Result<User, AuthError> {
        let username = Username::parse(required("username", username)?)?;
        let fullname = required("fullname", fullname)?;
        let email = Email::parse(required("email", email)?)?;
        validate_password(password)?;

        if self.users.exists(&username, &email).await? {
            return Err(AuthError::UserAlreadyExists);
        }

        let password_hash = hash_password(password)?;

        // A concurrent registration can still win the race; the unique
        // constraints turn that into the same error.
        let user = self
            .users
            .create(&NewUser {
                username: &username,
                fullname,
                email: &email,
                password_hash: &password_hash,
            })
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        info!(user_id = %user.id, username = %user.username, "User registered");
        Ok(user)
    }

    /// Login with username and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if either field is blank.
    /// Returns `AuthError::InvalidCredentials` if the username/password is wrong.
    pub async fn login(&self, username: &str, password: &str) -> Result<User, AuthError> {
        let username = required("username", username)?;
        if password.is_empty() {
            return Err(AuthError::MissingField("password"));
        }

        // A name that could never have been registered cannot match.
        let username = Username::parse(username).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_password_hash(&username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash).inspect_err(|_| {
            warn!(username = %username, "Failed login attempt");
        })?;

        Ok(user)
    }

    /// Overwrite the password of the account registered with `email`.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingField` if either field is blank.
    /// Returns `AuthError::InvalidEmail` if the email is malformed.
    /// Returns `AuthError::UserNotFound` if no account uses this email.
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<(), AuthError> {
        let email = Email::parse(required("email", email)?)?;
        if new_password.is_empty() {
            return Err(AuthError::MissingField("newPassword"));
        }
        validate_password(new_password)?;

        let password_hash = hash_password(new_password)?;

        self.users
            .update_password_by_email(&email, &password_hash)
            .await
            .map_err(|e| match e {
                RepositoryError::NotFound => AuthError::UserNotFound,
                other => AuthError::Repository(other),
            })?;

        info!(email = %email, "Password reset");
        Ok(())
    }

    /// Get a user by ID.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if the user doesn't exist.
    pub async fn get_user(&self, user_id: UserId) -> Result<User, AuthError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)
    }
}

/// Trim a required field, rejecting blank input.
fn required<'s>(field: &'static str, value: &'s str) -> Result<&'s str, AuthError> {
    let value = value.trim();
    if value.is_empty() {
        return Err(AuthError::MissingField(field));
    }
    Ok(value)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.trim().is_empty() {
        return Err(AuthError::MissingField("password"));
    }

    if password.chars().count() > MAX_PASSWORD_LENGTH {
        return Err(AuthError::InvalidPassword(format!(
            "password must be at most {MAX_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}
