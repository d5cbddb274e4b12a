//! Purchase lifecycle service.
//!
//! ```text
//! ongoing ──► completed ──┐
//!    │                    ├──► removed
//!    └──────► cancelled ──┘
//! ```
//!
//! Transitions are enforced in SQL (conditional `UPDATE`/`DELETE`); this
//! service validates input and turns the outcome into a typed error.

use rust_decimal::Decimal;
use sqlx::PgPool;
use thiserror::Error;
use tracing::info;

use autoelite_core::{
    CarId, InvalidStatus, PurchaseId, PurchaseStatus, UserId, checkout_total, round_money,
};

use crate::catalog::Catalog;
use crate::db::purchases::{CheckoutOutcome, StatusChange};
use crate::db::{PurchaseRepository, RepositoryError};
use crate::models::Purchase;

/// Errors from purchase operations.
#[derive(Debug, Error)]
pub enum PurchaseError {
    #[error("at least one car is required")]
    NoCars,

    #[error("amount must be greater than zero")]
    InvalidAmount,

    #[error(transparent)]
    InvalidStatus(#[from] InvalidStatus),

    #[error("car id must be a positive integer")]
    InvalidCarId,

    #[error("car {0} is not in the catalog")]
    UnknownCar(CarId),

    #[error("car {0} is not in your cart")]
    NotInCart(CarId),

    #[error("purchase not found")]
    NotFound,

    #[error("purchase is already {0}")]
    AlreadyFinal(PurchaseStatus),

    #[error("only completed or cancelled purchases can be removed")]
    NotRemovable,

    #[error("database error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Purchase operations for one request.
pub struct PurchaseService<'a> {
    purchases: PurchaseRepository<'a>,
    catalog: &'a Catalog,
}

impl<'a> PurchaseService<'a> {
    #[must_use]
    pub const fn new(pool: &'a PgPool, catalog: &'a Catalog) -> Self {
        Self {
            purchases: PurchaseRepository::new(pool),
            catalog,
        }
    }

    /// Record a purchase priced by the caller.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::NoCars` if no non-blank car name is given.
    /// Returns `PurchaseError::InvalidAmount` if `amount <= 0`.
    pub async fn create(
        &self,
        user_id: UserId,
        cars: &[String],
        amount: Decimal,
    ) -> Result<Purchase, PurchaseError> {
        let cars = normalize_cars(cars)?;
        let amount = validate_amount(amount)?;

        let purchase = self.purchases.create(user_id, &cars, amount).await?;
        info!(purchase_id = %purchase.id, user_id = %user_id, "Purchase created");
        Ok(purchase)
    }

    /// Buy cars from the user's cart at catalog prices plus the delivery fee.
    ///
    /// The bought cars are claimed from the cart and the purchase row is
    /// written in one transaction, so a cart entry is paid for at most once.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::NoCars`, `PurchaseError::InvalidCarId`,
    /// `PurchaseError::UnknownCar` or `PurchaseError::NotInCart` when the
    /// selection is not purchasable.
    pub async fn checkout(
        &self,
        user_id: UserId,
        car_ids: &[CarId],
    ) -> Result<Purchase, PurchaseError> {
        let mut selected: Vec<CarId> = Vec::with_capacity(car_ids.len());
        for &id in car_ids {
            if !id.is_valid() {
                return Err(PurchaseError::InvalidCarId);
            }
            if !selected.contains(&id) {
                selected.push(id);
            }
        }
        if selected.is_empty() {
            return Err(PurchaseError::NoCars);
        }

        let mut names = Vec::with_capacity(selected.len());
        let mut prices = Vec::with_capacity(selected.len());
        for &id in &selected {
            let car = self.catalog.get(id).ok_or(PurchaseError::UnknownCar(id))?;
            names.push(car.name.clone());
            prices.push(car.price);
        }

        let amount = checkout_total(prices).ok_or(PurchaseError::NoCars)?;

        let purchase = match self
            .purchases
            .checkout(user_id, &names, &selected, amount)
            .await?
        {
            CheckoutOutcome::Committed(purchase) => purchase,
            CheckoutOutcome::NotInCart(id) => return Err(PurchaseError::NotInCart(id)),
        };
        info!(purchase_id = %purchase.id, user_id = %user_id, amount = %amount, "Checkout complete");
        Ok(purchase)
    }

    /// Move an ongoing purchase to `status`.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::InvalidStatus` for unknown status strings,
    /// `PurchaseError::NotFound` if the user has no such purchase, and
    /// `PurchaseError::AlreadyFinal` if it is completed or cancelled.
    pub async fn update_status(
        &self,
        user_id: UserId,
        id: PurchaseId,
        status: &str,
    ) -> Result<PurchaseStatus, PurchaseError> {
        let status: PurchaseStatus = status.parse()?;

        match self.purchases.update_status(user_id, id, status).await? {
            StatusChange::Updated => {
                info!(purchase_id = %id, status = %status, "Purchase status updated");
                Ok(status)
            }
            StatusChange::Blocked(current) => Err(PurchaseError::AlreadyFinal(current)),
            StatusChange::Missing => Err(PurchaseError::NotFound),
        }
    }

    /// Remove a completed or cancelled purchase.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::NotFound` if the user has no such purchase and
    /// `PurchaseError::NotRemovable` if it is still ongoing.
    pub async fn delete(&self, user_id: UserId, id: PurchaseId) -> Result<(), PurchaseError> {
        match self.purchases.delete_terminal(user_id, id).await? {
            StatusChange::Updated => {
                info!(purchase_id = %id, "Purchase removed");
                Ok(())
            }
            StatusChange::Blocked(_) => Err(PurchaseError::NotRemovable),
            StatusChange::Missing => Err(PurchaseError::NotFound),
        }
    }

    /// The user's purchases, newest first.
    ///
    /// # Errors
    ///
    /// Returns `PurchaseError::Repository` if the query fails.
    pub async fn list(&self, user_id: UserId) -> Result<Vec<Purchase>, PurchaseError> {
        Ok(self.purchases.list(user_id).await?)
    }
}

/// Trim car names and drop blanks, keeping order.
fn normalize_cars(cars: &[String]) -> Result<Vec<String>, PurchaseError> {
    let cars: Vec<String> = cars
        .iter()
        .map(|name| name.trim())
        .filter(|name| !name.is_empty())
        .map(str::to_owned)
        .collect();

    if cars.is_empty() {
        return Err(PurchaseError::NoCars);
    }
    Ok(cars)
}

/// Reject non-positive amounts and round to cents.
fn validate_amount(amount: Decimal) -> Result<Decimal, PurchaseError> {
    let amount = round_money(amount);
    if amount <= Decimal::ZERO {
        return Err(PurchaseError::InvalidAmount);
    }
    Ok(amount)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_cars_keeps_order_and_drops_blanks() {
        let cars = vec![" Car B ".to_owned(), String::new(), "Car A".to_owned()];
        assert_eq!(normalize_cars(&cars).unwrap(), vec!["Car B", "Car A"]);
    }

    #[test]
    fn test_normalize_cars_rejects_empty() {
        assert!(matches!(normalize_cars(&[]), Err(PurchaseError::NoCars)));
        assert!(matches!(
            normalize_cars(&["  ".to_owned()]),
            Err(PurchaseError::NoCars)
        ));
    }

    #[test]
    fn test_validate_amount() {
        assert_eq!(
            validate_amount(Decimal::new(20_200, 0)).unwrap().to_string(),
            "20200.00"
        );
        assert!(matches!(
            validate_amount(Decimal::ZERO),
            Err(PurchaseError::InvalidAmount)
        ));
        assert!(matches!(
            validate_amount(Decimal::new(-1, 0)),
            Err(PurchaseError::InvalidAmount)
        ));
        // Rounds to zero cents, so it is not a positive charge.
        assert!(matches!(
            validate_amount(Decimal::new(4, 3)),
            Err(PurchaseError::InvalidAmount)
        ));
    }

    #[test]
    fn test_invalid_status_converts() {
        let err: PurchaseError = "pending".parse::<PurchaseStatus>().unwrap_err().into();
        assert!(matches!(err, PurchaseError::InvalidStatus(_)));
    }
}
