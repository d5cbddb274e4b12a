//! Seed the storefront database with customer accounts.
//!
//! Accounts go through the same validation and password hashing as
//! registration over HTTP.

use std::path::Path;

use autoelite_core::Username;
use autoelite_storefront::db;
use autoelite_storefront::models::User;
use autoelite_storefront::services::{AuthError, AuthService, ProfileError, ProfileService};
use thiserror::Error;

use super::{MissingEnvVar, database_url};

/// Errors that can occur while seeding.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    MissingEnvVar(#[from] MissingEnvVar),

    #[error("Database connection error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Could not create user: {0}")]
    User(#[from] AuthError),

    #[error("Could not look up existing user: {0}")]
    Lookup(#[from] ProfileError),
}

/// The account a conflicting registration ran into. `None` means the
/// username is free, so the email must be the taken field.
fn existing_account(lookup: Result<User, ProfileError>) -> Result<Option<User>, SeedError> {
    match lookup {
        Ok(user) => Ok(Some(user)),
        Err(ProfileError::NotFound) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Create a customer account. An existing username or email is reported
/// and left untouched.
///
/// # Errors
///
/// Returns `SeedError` if the URL is missing, the connection fails, or the
/// account details are invalid.
pub async fn user(
    username: &str,
    fullname: &str,
    email: &str,
    password: &str,
) -> Result<(), SeedError> {
    let database_url = database_url()?;

    tracing::info!("Connecting to storefront database...");
    let pool = db::create_pool(&database_url).await?;

    match AuthService::new(&pool)
        .register(username, fullname, email, password)
        .await
    {
        Ok(user) => {
            tracing::info!(
                "User created successfully! ID: {}, Username: {}",
                user.id,
                user.username
            );
            Ok(())
        }
        Err(AuthError::UserAlreadyExists) => {
            // Pictures are never touched here, so any upload dir will do.
            let profiles = ProfileService::new(&pool, Path::new("."));
            let existing = match Username::parse(username) {
                Ok(name) => existing_account(profiles.get_by_username(&name).await)?,
                Err(_) => None,
            };
            match existing {
                Some(user) => tracing::warn!(
                    "User {} already exists (ID: {}), skipping",
                    user.username,
                    user.id
                ),
                None => tracing::warn!("Email {} is already registered, skipping", email),
            }
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use autoelite_storefront::db::RepositoryError;

    use super::*;

    #[test]
    fn test_missing_username_means_email_was_taken() {
        assert!(matches!(existing_account(Err(ProfileError::NotFound)), Ok(None)));
    }

    #[test]
    fn test_lookup_failure_is_reported() {
        let failure = ProfileError::Repository(RepositoryError::DataCorruption("bad row".to_owned()));
        assert!(matches!(
            existing_account(Err(failure)),
            Err(SeedError::Lookup(ProfileError::Repository(_)))
        ));
    }
}
