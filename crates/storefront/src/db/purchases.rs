//! Purchase repository.
//!
//! The `cars` column stores the purchased car names as a JSON array in a
//! `TEXT` column. Status changes are single conditional statements so that
//! concurrent updates cannot move a purchase out of a terminal state.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{debug, instrument};

use autoelite_core::{CarId, PurchaseId, PurchaseStatus, UserId};

use super::RepositoryError;
use crate::models::Purchase;

const PURCHASE_COLUMNS: &str = "id, user_id, cars, amount, status, purchase_date";

/// Raw `purchase` row.
#[derive(Debug, sqlx::FromRow)]
struct PurchaseRow {
    id: PurchaseId,
    user_id: UserId,
    cars: String,
    amount: Decimal,
    status: PurchaseStatus,
    purchase_date: DateTime<Utc>,
}

impl TryFrom<PurchaseRow> for Purchase {
    type Error = RepositoryError;

    fn try_from(r: PurchaseRow) -> Result<Self, Self::Error> {
        let cars: Vec<String> = serde_json::from_str(&r.cars).map_err(|e| {
            RepositoryError::DataCorruption(format!("invalid cars list for purchase {}: {e}", r.id))
        })?;

        Ok(Self {
            id: r.id,
            user_id: r.user_id,
            cars,
            amount: r.amount,
            status: r.status,
            purchase_date: r.purchase_date,
        })
    }
}

/// Database names of `statuses`, for binding to `status::text = ANY($n)`.
fn status_names(statuses: impl Iterator<Item = PurchaseStatus>) -> Vec<&'static str> {
    statuses.map(PurchaseStatus::as_str).collect()
}

fn encode_cars(cars: &[String]) -> Result<String, RepositoryError> {
    serde_json::to_string(cars)
        .map_err(|e| RepositoryError::DataCorruption(format!("failed to serialize cars: {e}")))
}

/// Outcome of a conditional status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChange {
    /// The row was updated.
    Updated,
    /// The purchase exists but its current status does not allow the change.
    Blocked(PurchaseStatus),
    /// No purchase with this ID belongs to the user.
    Missing,
}

/// Outcome of a checkout transaction.
#[derive(Debug)]
pub enum CheckoutOutcome {
    /// Cart rows were claimed and the purchase committed.
    Committed(Purchase),
    /// This car was not in the cart when the transaction ran; nothing was
    /// written.
    NotInCart(CarId),
}

/// Repository for purchases.
pub struct PurchaseRepository<'a> {
    pool: &'a PgPool,
}

impl<'a> PurchaseRepository<'a> {
    /// Create a new purchase repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert a purchase with status `ongoing`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors.
    #[instrument(skip(self, cars), fields(user_id = %user_id, cars = cars.len(), amount = %amount))]
    pub async fn create(
        &self,
        user_id: UserId,
        cars: &[String],
        amount: Decimal,
    ) -> Result<Purchase, RepositoryError> {
        let row: PurchaseRow = sqlx::query_as(&format!(
            r"
            INSERT INTO purchase (user_id, cars, amount)
            VALUES ($1, $2, $3)
            RETURNING {PURCHASE_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(encode_cars(cars)?)
        .bind(amount)
        .fetch_one(self.pool)
        .await
        .map_err(map_foreign_key)?;

        debug!(purchase_id = %row.id, "Created purchase");
        Purchase::try_from(row)
    }

    /// Claim the cars from the cart and insert the purchase, atomically.
    ///
    /// The cart rows are deleted first. Concurrent checkouts of the same
    /// cart row serialize on its row lock, so only one of them gets it back
    /// and the other rolls back with [`CheckoutOutcome::NotInCart`].
    /// `car_ids` must not contain duplicates.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user doesn't exist.
    /// Returns `RepositoryError::Database` for other database errors; nothing
    /// is written in that case.
    #[instrument(skip(self, cars, car_ids), fields(user_id = %user_id, amount = %amount))]
    pub async fn checkout(
        &self,
        user_id: UserId,
        cars: &[String],
        car_ids: &[CarId],
        amount: Decimal,
    ) -> Result<CheckoutOutcome, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let ids: Vec<i32> = car_ids.iter().map(CarId::as_i32).collect();
        let claimed: Vec<(CarId,)> = sqlx::query_as(
            "DELETE FROM cart WHERE user_id = $1 AND car_id = ANY($2) RETURNING car_id",
        )
        .bind(user_id)
        .bind(&ids)
        .fetch_all(&mut *tx)
        .await?;

        if let Some(&missing) = car_ids
            .iter()
            .find(|id| !claimed.iter().any(|(c,)| c == *id))
        {
            tx.rollback().await?;
            debug!(car_id = %missing, "Checkout rolled back, car not in cart");
            return Ok(CheckoutOutcome::NotInCart(missing));
        }

        let row: PurchaseRow = sqlx::query_as(&format!(
            r"
            INSERT INTO purchase (user_id, cars, amount)
            VALUES ($1, $2, $3)
            RETURNING {PURCHASE_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(encode_cars(cars)?)
        .bind(amount)
        .fetch_one(&mut *tx)
        .await
        .map_err(map_foreign_key)?;
        let purchase = Purchase::try_from(row)?;

        tx.commit().await?;

        debug!(purchase_id = %purchase.id, cleared = claimed.len(), "Checkout committed");
        Ok(CheckoutOutcome::Committed(purchase))
    }

    /// Get one of the user's purchases.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if the stored cars list is invalid.
    pub async fn get(
        &self,
        user_id: UserId,
        id: PurchaseId,
    ) -> Result<Option<Purchase>, RepositoryError> {
        let row: Option<PurchaseRow> = sqlx::query_as(&format!(
            "SELECT {PURCHASE_COLUMNS} FROM purchase WHERE id = $1 AND user_id = $2"
        ))
        .bind(id)
        .bind(user_id)
        .fetch_optional(self.pool)
        .await?;

        row.map(Purchase::try_from).transpose()
    }

    /// The user's purchases, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    /// Returns `RepositoryError::DataCorruption` if any stored cars list is invalid.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Purchase>, RepositoryError> {
        let rows: Vec<PurchaseRow> = sqlx::query_as(&format!(
            r"
            SELECT {PURCHASE_COLUMNS}
            FROM purchase
            WHERE user_id = $1
            ORDER BY purchase_date DESC, id DESC
            "
        ))
        .bind(user_id)
        .fetch_all(self.pool)
        .await?;

        rows.into_iter().map(Purchase::try_from).collect()
    }

    /// Set the status of a purchase whose current state allows it.
    ///
    /// The update only matches rows in one of
    /// [`PurchaseStatus::sources_for`]`(status)`; when nothing
    /// matches, the current row is read to tell a missing purchase from a
    /// blocked one.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self), fields(user_id = %user_id, purchase_id = %id, status = %status))]
    pub async fn update_status(
        &self,
        user_id: UserId,
        id: PurchaseId,
        status: PurchaseStatus,
    ) -> Result<StatusChange, RepositoryError> {
        let result = sqlx::query(
            r"
            UPDATE purchase
            SET status = $3
            WHERE id = $1 AND user_id = $2 AND status::text = ANY($4)
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(status)
        .bind(status_names(PurchaseStatus::sources_for(status)))
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(StatusChange::Updated);
        }

        Ok(match self.current_status(user_id, id).await? {
            Some(current) => StatusChange::Blocked(current),
            None => StatusChange::Missing,
        })
    }

    /// Delete a purchase that has reached a terminal state.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if a query fails.
    #[instrument(skip(self), fields(user_id = %user_id, purchase_id = %id))]
    pub async fn delete_terminal(
        &self,
        user_id: UserId,
        id: PurchaseId,
    ) -> Result<StatusChange, RepositoryError> {
        let result = sqlx::query(
            r"
            DELETE FROM purchase
            WHERE id = $1 AND user_id = $2 AND status::text = ANY($3)
            ",
        )
        .bind(id)
        .bind(user_id)
        .bind(status_names(PurchaseStatus::removable()))
        .execute(self.pool)
        .await?;

        if result.rows_affected() > 0 {
            return Ok(StatusChange::Updated);
        }

        Ok(match self.current_status(user_id, id).await? {
            Some(current) => StatusChange::Blocked(current),
            None => StatusChange::Missing,
        })
    }

    async fn current_status(
        &self,
        user_id: UserId,
        id: PurchaseId,
    ) -> Result<Option<PurchaseStatus>, RepositoryError> {
        let row: Option<(PurchaseStatus,)> =
            sqlx::query_as("SELECT status FROM purchase WHERE id = $1 AND user_id = $2")
                .bind(id)
                .bind(user_id)
                .fetch_optional(self.pool)
                .await?;

        Ok(row.map(|(status,)| status))
    }
}

fn map_foreign_key(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(ref db_err) = e
        && db_err.is_foreign_key_violation()
    {
        return RepositoryError::NotFound;
    }
    RepositoryError::Database(e)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn row(cars: &str) -> PurchaseRow {
        PurchaseRow {
            id: PurchaseId::new(7),
            user_id: UserId::new(1),
            cars: cars.to_owned(),
            amount: Decimal::new(2_020_000, 2),
            status: PurchaseStatus::Ongoing,
            purchase_date: Utc::now(),
        }
    }

    #[test]
    fn test_cars_column_round_trips_order() {
        let cars = vec!["Car B".to_owned(), "Car A".to_owned()];
        let encoded = encode_cars(&cars).unwrap();
        assert_eq!(encoded, r#"["Car B","Car A"]"#);

        let purchase = Purchase::try_from(row(&encoded)).unwrap();
        assert_eq!(purchase.cars, cars);
    }

    #[test]
    fn test_status_names_bind_lifecycle_sets() {
        assert_eq!(
            status_names(PurchaseStatus::sources_for(PurchaseStatus::Completed)),
            vec!["ongoing"]
        );
        assert_eq!(
            status_names(PurchaseStatus::removable()),
            vec!["completed", "cancelled"]
        );
    }

    #[test]
    fn test_corrupt_cars_column_is_reported() {
        let err = Purchase::try_from(row("Car A, Car B")).unwrap_err();
        assert!(matches!(err, RepositoryError::DataCorruption(msg) if msg.contains("purchase 7")));
    }
}
