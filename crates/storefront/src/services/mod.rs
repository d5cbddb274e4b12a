//! Business logic services for storefront.
//!
//! # Services
//!
//! - `auth` - Registration, login, and password reset
//! - `profile` - Profile reads, partial updates, and picture uploads
//! - `purchase` - Purchase lifecycle and checkout

pub mod auth;
pub mod profile;
pub mod purchase;

pub use auth::{AuthError, AuthService};
pub use profile::{ProfileError, ProfileService};
pub use purchase::{PurchaseError, PurchaseService};
