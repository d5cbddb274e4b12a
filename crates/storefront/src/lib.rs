//! `AutoElite` storefront library.
//!
//! The JSON API for the car dealership: accounts, profiles, carts and
//! purchases backed by `PostgreSQL`, plus a read-only car catalog. The
//! binary in `main.rs` is a thin wrapper around [`app`].

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{
    Router,
    extract::State,
    http::{Request, StatusCode},
    middleware::from_fn,
    routing::get,
};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::services::profile::UPLOADS_URL_PREFIX;
use crate::state::AppState;

/// Build the complete application router.
///
/// Sentry layers are added by the binary so tests can run without a hub.
pub fn app(state: AppState) -> Router {
    let session_layer = middleware::create_session_layer(state.pool(), state.config());
    let uploads = ServeDir::new(&state.config().upload_dir);

    Router::new()
        .route("/health", get(health))
        .route("/health/ready", get(readiness))
        .merge(routes::routes(state.config()))
        .nest_service(UPLOADS_URL_PREFIX, uploads)
        .layer(session_layer)
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::request_id_middleware))
        .layer(
            TraceLayer::new_for_http().make_span_with(|request: &Request<_>| {
                tracing::info_span!(
                    "http_request",
                    method = %request.method(),
                    path = %request.uri().path(),
                    request_id = tracing::field::Empty,
                    user_id = tracing::field::Empty,
                )
            }),
        )
        .with_state(state)
}

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// Returns 503 Service Unavailable if the database is not reachable.
async fn readiness(State(state): State<AppState>) -> StatusCode {
    match sqlx::query("SELECT 1").fetch_one(state.pool()).await {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            tracing::warn!(error = %e, "Readiness check failed");
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::{Body, to_bytes};
    use axum::http::header::CONTENT_TYPE;
    use sqlx::postgres::PgPoolOptions;
    use tower::ServiceExt;

    use super::*;
    use crate::catalog::Catalog;
    use crate::config::StorefrontConfig;

    const UNREACHABLE_DB: &str = "postgres://autoelite@127.0.0.1:1/autoelite";

    fn test_app() -> Router {
        let pool = PgPoolOptions::new().connect_lazy(UNREACHABLE_DB).unwrap();
        let catalog = Catalog::from_json(include_str!("../data/cars.json")).unwrap();
        app(AppState::new(
            StorefrontConfig::for_tests(UNREACHABLE_DB),
            pool,
            catalog,
        ))
    }

    async fn send(request: Request<Body>) -> (StatusCode, serde_json::Value) {
        let response = test_app().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap_or_default())
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_health_is_ok() {
        let request = Request::get("/health").body(Body::empty()).unwrap();
        let response = test_app().oneshot(request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_protected_routes_reject_without_session() {
        for uri in ["/api/cart", "/api/purchases", "/api/profile", "/api/auth/me"] {
            let (status, body) = send(Request::get(uri).body(Body::empty()).unwrap()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{uri}");
            assert_eq!(body["error"], "Unauthorized", "{uri}");
            assert_eq!(body["success"], false, "{uri}");
        }
    }

    #[tokio::test]
    async fn test_register_validation_runs_before_storage() {
        let (status, body) = send(post_json(
            "/api/auth/register",
            r#"{"username":"","fullname":"A","email":"a@example.com","password":"x"}"#,
        ))
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidInput");
    }

    #[tokio::test]
    async fn test_wrong_content_type_is_invalid_input() {
        let request = Request::post("/api/auth/login")
            .body(Body::from("username=alice"))
            .unwrap();
        let (status, body) = send(request).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "InvalidInput");
    }

    #[tokio::test]
    async fn test_catalog_detail() {
        let (status, body) = send(Request::get("/api/cars/5").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Proton X50 1.5T Flagship");

        let (status, body) = send(Request::get("/api/cars/0").body(Body::empty()).unwrap()).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], "NotFound");
    }
}
