//! Server-side sessions in `PostgreSQL`.
//!
//! The cookie only carries an opaque ID. The session row holds the
//! signed-in [`CurrentUser`](crate::models::CurrentUser) and nothing else.
//! The `tower_sessions.session` table comes from the storefront migrations.

use sqlx::PgPool;
use tokio::task::JoinHandle;
use tower_sessions::{
    Expiry, ExpiredDeletion, SessionManagerLayer,
    cookie::{SameSite, time::Duration},
};
use tower_sessions_sqlx_store::PostgresStore;

use crate::config::StorefrontConfig;

/// Session cookie name.
pub const SESSION_COOKIE_NAME: &str = "ae_session";

/// Sessions expire after 7 days without a request.
const INACTIVITY_LIMIT: Duration = Duration::days(7);

/// How often expired rows are purged.
const CLEANUP_PERIOD: std::time::Duration = std::time::Duration::from_secs(60 * 60);

/// Build the session layer. Cookies are `Secure` when the public base URL is
/// HTTPS.
#[must_use]
pub fn create_session_layer(
    pool: &PgPool,
    config: &StorefrontConfig,
) -> SessionManagerLayer<PostgresStore> {
    SessionManagerLayer::new(PostgresStore::new(pool.clone()))
        .with_name(SESSION_COOKIE_NAME)
        .with_expiry(Expiry::OnInactivity(INACTIVITY_LIMIT))
        .with_secure(config.is_secure())
        .with_same_site(SameSite::Lax)
        .with_http_only(true)
        .with_path("/")
}

/// Purge expired sessions in the background until the runtime shuts down.
pub fn spawn_expired_session_cleanup(pool: &PgPool) -> JoinHandle<()> {
    let store = PostgresStore::new(pool.clone());
    tokio::spawn(async move {
        if let Err(e) = store.continuously_delete_expired(CLEANUP_PERIOD).await {
            tracing::error!(error = %e, "Expired session cleanup stopped");
        }
    })
}
