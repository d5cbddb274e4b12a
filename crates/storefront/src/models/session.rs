//! What the session remembers about the signed-in user.

use serde::{Deserialize, Serialize};

use autoelite_core::{UserId, Username};

/// Session key holding the [`CurrentUser`].
pub const CURRENT_USER_KEY: &str = "current_user";

/// Identity of the signed-in customer. Profile fields are always read
/// fresh from the database; only the id and login name live here.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CurrentUser {
    pub id: UserId,
    pub username: Username,
}
