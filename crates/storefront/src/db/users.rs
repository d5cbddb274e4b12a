//! User repository for database operations.
//!
//! Queries are runtime-checked (`sqlx::query_as`) and decoded through
//! [`UserRow`], which re-validates stored usernames and emails.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use tracing::instrument;

use autoelite_core::{Email, UserId, Username};

use super::RepositoryError;
use crate::models::user::{ProfileUpdate, User};

const USER_COLUMNS: &str =
    "id, username, fullname, email, phone, address, profilepic, created_at, updated_at";

/// Raw `users` row.
#[derive(Debug, sqlx::FromRow)]
struct UserRow {
    id: i32,
    username: String,
    fullname: String,
    email: String,
    phone: Option<String>,
    address: Option<String>,
    profilepic: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<UserRow> for User {
    type Error = RepositoryError;

    fn try_from(r: UserRow) -> Result<Self, Self::Error> {
        let username = Username::parse(&r.username).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid username in database: {e}"))
        })?;
        let email = Email::parse(&r.email).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid email in database: {e}"))
        })?;

        Ok(Self {
            id: UserId::new(r.id),
            username,
            fullname: r.fullname,
            email,
            phone: r.phone,
            address: r.address,
            profilepic: r.profilepic,
            created_at: r.created_at,
            updated_at: r.updated_at,
        })
    }
}

/// Row used for login: the user plus their stored hash.
#[derive(Debug, sqlx::FromRow)]
struct CredentialRow {
    #[sqlx(flatten)]
    user: UserRow,
    password_hash: String,
}

/// Fields required to create an account.
#[derive(Debug)]
pub struct NewUser<'a> {
    pub username: &'a Username,
    pub fullname: &'a str,
    pub email: &'a Email,
    pub password_hash: &'a str,
}

/// Repository for user database operations.
pub struct UserRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> UserRepository<'a> {
    /// Create a new user repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a user by their ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_id(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> =
            sqlx::query_as(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
                .bind(id)
                .fetch_optional(self.pool)
                .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user by their exact (case-sensitive) username.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored row is invalid.
    pub async fn get_by_username(
        &self,
        username: &Username,
    ) -> Result<Option<User>, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        row.map(User::try_from).transpose()
    }

    /// Get a user and their password hash by username.
    ///
    /// Returns `None` if the user doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_password_hash(
        &self,
        username: &Username,
    ) -> Result<Option<(User, String)>, RepositoryError> {
        let row: Option<CredentialRow> = sqlx::query_as(&format!(
            "SELECT {USER_COLUMNS}, password_hash FROM users WHERE username = $1"
        ))
        .bind(username)
        .fetch_optional(self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let user = User::try_from(row.user)?;
        Ok(Some((user, row.password_hash)))
    }

    /// Whether an account already uses this username or email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn exists(&self, username: &Username, email: &Email) -> Result<bool, RepositoryError> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (SELECT 1 FROM users WHERE username = $1 OR email = $2)",
        )
        .bind(username)
        .bind(email)
        .fetch_one(self.pool)
        .await?;

        Ok(exists)
    }

    /// Create a new user.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the username or email already exists.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, new_user), fields(username = %new_user.username))]
    pub async fn create(&self, new_user: &NewUser<'_>) -> Result<User, RepositoryError> {
        let row: UserRow = sqlx::query_as(&format!(
            r"
            INSERT INTO users (username, fullname, email, password_hash)
            VALUES ($1, $2, $3, $4)
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(new_user.username)
        .bind(new_user.fullname)
        .bind(new_user.email)
        .bind(new_user.password_hash)
        .fetch_one(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "username or email already exists"))?;

        User::try_from(row)
    }

    /// Replace the password hash of the account with this email.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if no account has this email.
    /// Returns `RepositoryError::Database` for other database errors.
    pub async fn update_password_by_email(
        &self,
        email: &Email,
        password_hash: &str,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE users
            SET password_hash = $2, updated_at = now()
            WHERE email = $1
            ",
        )
        .bind(email)
        .bind(password_hash)
        .execute(self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }

        Ok(())
    }

    /// Apply a partial profile update; `None` fields keep their stored value.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Conflict` if the new email belongs to another account.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, update), fields(user_id = %id))]
    pub async fn update_profile(
        &self,
        id: UserId,
        update: &ProfileUpdate,
    ) -> Result<User, RepositoryError> {
        let row: Option<UserRow> = sqlx::query_as(&format!(
            r"
            UPDATE users
            SET fullname   = COALESCE($2, fullname),
                email      = COALESCE($3, email),
                phone      = COALESCE($4, phone),
                address    = COALESCE($5, address),
                profilepic = COALESCE($6, profilepic),
                updated_at = now()
            WHERE id = $1
            RETURNING {USER_COLUMNS}
            "
        ))
        .bind(id)
        .bind(update.fullname.as_deref())
        .bind(update.email.as_ref())
        .bind(update.phone.as_deref())
        .bind(update.address.as_deref())
        .bind(update.profilepic.as_deref())
        .fetch_optional(self.pool)
        .await
        .map_err(|e| RepositoryError::from_unique(e, "email already in use"))?;

        row.ok_or(RepositoryError::NotFound)
            .and_then(User::try_from)
    }
}
