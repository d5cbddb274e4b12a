//! Domain models for storefront.
//!
//! These types represent validated domain objects separate from database row types.

pub mod purchase;
pub mod session;
pub mod user;

pub use purchase::Purchase;
pub use session::CurrentUser;
pub use user::{ProfileUpdate, User};
