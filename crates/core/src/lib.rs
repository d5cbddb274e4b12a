//! AutoElite Core - Shared domain types.
//!
//! This crate provides the types shared by the AutoElite components:
//! - `storefront` - JSON API for the dealership storefront
//! - `cli` - Command-line tools for migrations and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP. Database encoding lives behind the optional `postgres`
//! feature so the types stay usable anywhere.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, validated usernames and emails, purchase status,
//!   and checkout pricing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
