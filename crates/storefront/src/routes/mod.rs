//! HTTP route handlers for the storefront API.
//!
//! Every response body is a JSON envelope, see [`envelope`].
//!
//! # Route Structure
//!
//! ```text
//! # Auth (rate limited per client IP)
//! POST /api/auth/login           - Log in, starts a session
//! POST /api/auth/register        - Create an account
//! POST /api/auth/reset-password  - Set a new password by email
//! POST /api/auth/logout          - End the session
//! GET  /api/auth/me              - Signed-in user
//!
//! # Profile (requires auth)
//! GET  /api/profile              - Profile
//! POST /api/profile              - Update profile (multipart, optional picture)
//!
//! # Cart (requires auth)
//! GET  /api/cart                 - Cart contents
//! POST /api/cart/add             - Add a car
//! POST /api/cart/remove          - Remove a car
//!
//! # Purchases (requires auth)
//! GET    /api/purchases              - Purchase history
//! POST   /api/purchases              - Record a purchase
//! POST   /api/purchases/checkout     - Buy cars from the cart
//! POST   /api/purchases/{id}/status  - Complete or cancel
//! DELETE /api/purchases/{id}         - Remove a finished purchase
//!
//! # Catalog
//! GET  /api/cars                 - Browse with filters
//! GET  /api/cars/facets          - Filter values
//! GET  /api/cars/{id}            - Car detail
//! ```

pub mod auth;
pub mod cart;
pub mod catalog;
pub mod envelope;
pub mod profile;
pub mod purchase;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};

use crate::config::StorefrontConfig;
use crate::error::AppError;
use crate::middleware::{auth_rate_limiter, rate_limit_envelope};
use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes(config: &StorefrontConfig) -> Router<AppState> {
    let router = Router::new()
        .route("/login", post(auth::login))
        .route("/register", post(auth::register))
        .route("/reset-password", post(auth::reset_password))
        .route("/logout", post(auth::logout))
        .route("/me", get(auth::me));

    if config.auth_rate_limit {
        router
            .layer(auth_rate_limiter())
            .layer(axum::middleware::map_response(rate_limit_envelope))
    } else {
        router
    }
}

/// Create the profile routes router.
pub fn profile_routes(config: &StorefrontConfig) -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).post(profile::update))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/add", post(cart::add))
        .route("/remove", post(cart::remove))
}

/// Create the purchase routes router.
pub fn purchase_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(purchase::index).post(purchase::create))
        .route("/checkout", post(purchase::checkout))
        .route("/{id}/status", post(purchase::update_status))
        .route("/{id}", axum::routing::delete(purchase::delete))
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(catalog::index))
        .route("/facets", get(catalog::facets))
        .route("/{id}", get(catalog::show))
}

/// Create all API routes.
pub fn routes(config: &StorefrontConfig) -> Router<AppState> {
    let api = Router::new()
        .nest("/auth", auth_routes(config))
        .nest("/profile", profile_routes(config))
        .nest("/cart", cart_routes())
        .nest("/purchases", purchase_routes())
        .nest("/cars", catalog_routes())
        .fallback(api_not_found);

    Router::new().nest("/api", api)
}

/// Unknown API paths get the JSON envelope instead of an empty 404.
async fn api_not_found() -> AppError {
    AppError::NotFound("Endpoint not found".to_owned())
}
