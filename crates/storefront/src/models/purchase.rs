//! Purchase domain type.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;

use autoelite_core::{PurchaseId, PurchaseStatus, UserId};

/// An order and its lifecycle status.
#[derive(Debug, Clone, Serialize)]
pub struct Purchase {
    pub id: PurchaseId,
    pub user_id: UserId,
    /// Car names in the order they were bought.
    pub cars: Vec<String>,
    /// Total charged, in ringgit with two decimal places.
    pub amount: Decimal,
    pub status: PurchaseStatus,
    pub purchase_date: DateTime<Utc>,
}
