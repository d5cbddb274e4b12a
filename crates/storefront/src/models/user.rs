//! User domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use autoelite_core::{Email, UserId, Username};

/// A storefront account (domain type).
///
/// Serializes to the public profile shape returned by login, `me` and the
/// profile endpoints. The password hash is never part of this type.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    /// Unique user ID.
    pub id: UserId,
    /// Login name.
    pub username: Username,
    /// Display name.
    pub fullname: String,
    /// Contact email, unique across accounts.
    pub email: Email,
    /// Contact phone number.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
    /// Public path of the uploaded profile picture, e.g. `/uploads/profile_<uuid>.png`.
    pub profilepic: Option<String>,
    /// When the account was created.
    pub created_at: DateTime<Utc>,
    /// When the account was last updated.
    pub updated_at: DateTime<Utc>,
}

/// Fields a user may change on their profile.
///
/// `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub fullname: Option<String>,
    pub email: Option<Email>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub profilepic: Option<String>,
}

impl ProfileUpdate {
    /// Whether the update would change nothing.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.fullname.is_none()
            && self.email.is_none()
            && self.phone.is_none()
            && self.address.is_none()
            && self.profilepic.is_none()
    }
}
