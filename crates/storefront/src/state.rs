//! Shared request state.

use std::sync::Arc;

use sqlx::PgPool;

use crate::catalog::Catalog;
use crate::config::StorefrontConfig;

/// Everything a handler may need: configuration, the database pool and the
/// car catalog. Built once in `main` and read-only afterwards; cloning only
/// bumps a reference count.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<Shared>,
}

struct Shared {
    config: StorefrontConfig,
    pool: PgPool,
    catalog: Catalog,
}

impl AppState {
    #[must_use]
    pub fn new(config: StorefrontConfig, pool: PgPool, catalog: Catalog) -> Self {
        Self {
            inner: Arc::new(Shared {
                config,
                pool,
                catalog,
            }),
        }
    }

    #[must_use]
    pub fn config(&self) -> &StorefrontConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.inner.pool
    }

    /// Cars loaded from `STOREFRONT_CATALOG_PATH` at startup.
    #[must_use]
    pub fn catalog(&self) -> &Catalog {
        &self.inner.catalog
    }
}
