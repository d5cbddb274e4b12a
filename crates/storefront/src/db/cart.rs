//! Cart repository.
//!
//! A cart is the set of `(user_id, car_id)` rows for one user. The
//! `cart_user_car_unique` constraint makes repeated adds a no-op.

use sqlx::PgPool;
use tracing::{debug, instrument};

use autoelite_core::{CarId, UserId};

use super::RepositoryError;

/// Repository for cart rows.
pub struct CartRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> CartRepository<'a> {
    /// Create a new cart repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Add a car to the user's cart.
    ///
    /// Returns `false` when the car was already in the cart.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self), fields(user_id = %user_id, car_id = %car_id))]
    pub async fn add(&self, user_id: UserId, car_id: CarId) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r"
            INSERT INTO cart (car_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT ON CONSTRAINT cart_user_car_unique DO NOTHING
            ",
        )
        .bind(car_id)
        .bind(user_id)
        .execute(self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(ref db_err) = e
                && db_err.is_foreign_key_violation()
            {
                return RepositoryError::NotFound;
            }
            RepositoryError::Database(e)
        })?;

        let inserted = result.rows_affected() > 0;
        debug!(inserted, "Cart add");
        Ok(inserted)
    }

    /// Remove a car from the user's cart. Removing a missing car is not an error.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn remove(&self, user_id: UserId, car_id: CarId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM cart WHERE user_id = $1 AND car_id = $2")
            .bind(user_id)
            .bind(car_id)
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    /// Car IDs in the user's cart, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<CarId>, RepositoryError> {
        let rows: Vec<(CarId,)> = sqlx::query_as(
            r"
            SELECT car_id
            FROM cart
            WHERE user_id = $1
            ORDER BY created_at ASC, id ASC
            ",
        )
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(|(id,)| id).collect())
    }
}
