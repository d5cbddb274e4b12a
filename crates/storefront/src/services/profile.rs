//! Profile service: read and partially update the signed-in user's profile.

use std::path::{Path, PathBuf};

use sqlx::PgPool;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use autoelite_core::{Email, EmailError, UserId, Username};

use crate::db::{RepositoryError, UserRepository};
use crate::models::user::{ProfileUpdate, User};

/// Image extensions accepted for profile pictures (compared case-insensitively).
pub const ALLOWED_IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "gif"];

/// URL prefix under which the upload directory is served.
pub const UPLOADS_URL_PREFIX: &str = "/uploads";

/// Errors from profile operations.
#[derive(Debug, Error)]
pub enum ProfileError {
    #[error("user not found")]
    NotFound,

    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    #[error("invalid file type; allowed types are jpg, jpeg, png and gif")]
    InvalidImageType,

    #[error("email already in use")]
    EmailTaken,

    #[error("failed to store profile picture: {0}")]
    Storage(#[from] std::io::Error),

    #[error("database error: {0}")]
    Repository(RepositoryError),
}

impl From<RepositoryError> for ProfileError {
    fn from(e: RepositoryError) -> Self {
        match e {
            RepositoryError::NotFound => Self::NotFound,
            RepositoryError::Conflict(_) => Self::EmailTaken,
            other => Self::Repository(other),
        }
    }
}

/// Text fields submitted with a profile update. Blank values are ignored.
#[derive(Debug, Clone, Default)]
pub struct ProfileFields {
    pub fullname: Option<String>,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
}

/// An uploaded picture.
#[derive(Debug, Clone)]
pub struct ProfileImage<'a> {
    /// Client-supplied file name; only its extension is used.
    pub file_name: &'a str,
    pub bytes: &'a [u8],
}

/// Profile operations for one request.
pub struct ProfileService<'a> {
    users: UserRepository<'a>,
    upload_dir: &'a Path,
}

impl<'a> ProfileService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, upload_dir: &'a Path) -> Self {
        Self {
            users: UserRepository::new(pool),
            upload_dir,
        }
    }

    /// Get a profile by user ID.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::NotFound` if the user doesn't exist.
    pub async fn get(&self, user_id: UserId) -> Result<User, ProfileError> {
        self.users
            .get_by_id(user_id)
            .await?
            .ok_or(ProfileError::NotFound)
    }

    /// Get a profile by username.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::NotFound` if the user doesn't exist.
    pub async fn get_by_username(&self, username: &Username) -> Result<User, ProfileError> {
        self.users
            .get_by_username(username)
            .await?
            .ok_or(ProfileError::NotFound)
    }

    /// Apply a partial update and optionally replace the profile picture.
    ///
    /// The image extension is checked before anything is written. If the
    /// database update fails the stored file is removed again.
    ///
    /// # Errors
    ///
    /// Returns `ProfileError::InvalidEmail`, `ProfileError::InvalidImageType`,
    /// `ProfileError::EmailTaken`, `ProfileError::NotFound`, or
    /// `ProfileError::Storage` if the file cannot be written.
    pub async fn update(
        &self,
        user_id: UserId,
        fields: ProfileFields,
        image: Option<ProfileImage<'_>>,
    ) -> Result<User, ProfileError> {
        let mut update = build_update(fields)?;

        let stored = match image {
            Some(image) => {
                let extension = image_extension(image.file_name)?;
                Some(self.store_image(&extension, image.bytes).await?)
            }
            None => None,
        };

        if let Some((_, public_path)) = &stored {
            update.profilepic = Some(public_path.clone());
        }

        if update.is_empty() {
            return self.get(user_id).await;
        }

        match self.users.update_profile(user_id, &update).await {
            Ok(user) => {
                info!(user_id = %user_id, picture = stored.is_some(), "Profile updated");
                Ok(user)
            }
            Err(e) => {
                if let Some((file, _)) = stored
                    && let Err(remove_err) = tokio::fs::remove_file(&file).await
                {
                    warn!(path = %file.display(), error = %remove_err, "Failed to remove orphaned upload");
                }
                Err(e.into())
            }
        }
    }

    /// Write the picture under a fresh unique name.
    ///
    /// Returns the file path on disk and its public URL path.
    async fn store_image(
        &self,
        extension: &str,
        bytes: &[u8],
    ) -> Result<(PathBuf, String), ProfileError> {
        tokio::fs::create_dir_all(self.upload_dir).await?;

        let file_name = format!("profile_{}.{extension}", Uuid::new_v4().simple());
        let path = self.upload_dir.join(&file_name);
        tokio::fs::write(&path, bytes).await?;

        Ok((path, format!("{UPLOADS_URL_PREFIX}/{file_name}")))
    }
}

/// Turn submitted fields into an update, ignoring blanks.
fn build_update(fields: ProfileFields) -> Result<ProfileUpdate, ProfileError> {
    let clean = |value: Option<String>| {
        value
            .map(|v| v.trim().to_owned())
            .filter(|v| !v.is_empty())
    };

    let email = clean(fields.email)
        .map(|e| Email::parse(&e))
        .transpose()?;

    Ok(ProfileUpdate {
        fullname: clean(fields.fullname),
        email,
        phone: clean(fields.phone),
        address: clean(fields.address),
        profilepic: None,
    })
}

/// Lowercased extension of an uploaded file, if it is an allowed image type.
fn image_extension(file_name: &str) -> Result<String, ProfileError> {
    let extension = Path::new(file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .ok_or(ProfileError::InvalidImageType)?;

    if ALLOWED_IMAGE_EXTENSIONS.contains(&extension.as_str()) {
        Ok(extension)
    } else {
        Err(ProfileError::InvalidImageType)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_image_extension_allow_list() {
        assert_eq!(image_extension("me.JPG").unwrap(), "jpg");
        assert_eq!(image_extension("holiday.photo.jpeg").unwrap(), "jpeg");
        assert_eq!(image_extension("a.png").unwrap(), "png");
        assert_eq!(image_extension("a.Gif").unwrap(), "gif");

        for bad in ["script.php", "noext", "archive.png.exe", ".png", "image.webp"] {
            assert!(
                matches!(image_extension(bad), Err(ProfileError::InvalidImageType)),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_build_update_ignores_blank_fields() {
        let update = build_update(ProfileFields {
            fullname: Some("  Alice Tan ".to_owned()),
            email: Some("   ".to_owned()),
            phone: None,
            address: Some(String::new()),
        })
        .unwrap();

        assert_eq!(update.fullname.as_deref(), Some("Alice Tan"));
        assert!(update.email.is_none());
        assert!(update.address.is_none());
        assert!(!update.is_empty());
    }

    #[test]
    fn test_build_update_validates_email() {
        let err = build_update(ProfileFields {
            email: Some("not-an-email".to_owned()),
            ..ProfileFields::default()
        })
        .unwrap_err();
        assert!(matches!(err, ProfileError::InvalidEmail(_)));
    }

    #[tokio::test]
    async fn test_store_image_writes_unique_file() {
        let dir = tempfile::tempdir().unwrap();
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://localhost/unused")
            .unwrap();
        let service = ProfileService::new(&pool, dir.path());

        let (path, public) = service.store_image("png", b"\x89PNG").await.unwrap();
        let (other, _) = service.store_image("png", b"\x89PNG").await.unwrap();

        assert_ne!(path, other);
        assert!(public.starts_with("/uploads/profile_"));
        assert!(public.ends_with(".png"));
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"\x89PNG");
    }
}
