//! Core types for AutoElite.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod email;
pub mod id;
pub mod price;
pub mod status;
pub mod username;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{DELIVERY_FEE, checkout_total, round_money};
pub use status::*;
pub use username::{Username, UsernameError};
