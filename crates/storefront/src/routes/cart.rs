//! Cart route handlers.

use axum::extract::State;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use autoelite_core::{CarId, DELIVERY_FEE, checkout_total};

use crate::catalog::Car;
use crate::db::CartRepository;
use crate::error::{AppError, Result};
use crate::middleware::RequireAuth;
use crate::routes::envelope::{ApiJson, ApiResponse};
use crate::state::AppState;

/// Add/remove request body.
#[derive(Debug, Deserialize)]
pub struct CartItemRequest {
    pub car_id: i32,
}

/// Acknowledgement for add/remove.
#[derive(Debug, Serialize)]
pub struct CartItemAck {
    pub car_id: CarId,
}

/// Cart contents.
#[derive(Debug, Serialize)]
pub struct CartView {
    /// Raw car IDs, oldest first.
    pub car_ids: Vec<CarId>,
    /// Catalog entries for the IDs that still resolve.
    pub items: Vec<Car>,
    pub delivery_fee: Decimal,
    /// Checkout total for everything in the cart; `null` when empty.
    pub total: Option<Decimal>,
}

fn validate_car_id(raw: i32) -> Result<CarId> {
    let car_id = CarId::new(raw);
    if car_id.is_valid() {
        Ok(car_id)
    } else {
        Err(AppError::InvalidInput("car_id must be a positive integer".to_owned()))
    }
}

/// List the cart.
///
/// GET /api/cart
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
) -> Result<ApiResponse<CartView>> {
    let car_ids = CartRepository::new(state.pool())
        .list(current_user.id)
        .await?;

    let items: Vec<Car> = car_ids
        .iter()
        .filter_map(|&id| state.catalog().get(id).cloned())
        .collect();
    let total = checkout_total(items.iter().map(|car| car.price));

    Ok(ApiResponse::ok(
        "Cart loaded",
        CartView {
            car_ids,
            items,
            delivery_fee: DELIVERY_FEE,
            total,
        },
    ))
}

/// Add a car to the cart. Adding a car already in the cart is a no-op.
///
/// POST /api/cart/add
#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn add(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<ApiResponse<CartItemAck>> {
    let car_id = validate_car_id(body.car_id)?;
    if state.catalog().get(car_id).is_none() {
        return Err(AppError::NotFound(format!("Car {car_id} not found")));
    }

    let inserted = CartRepository::new(state.pool())
        .add(current_user.id, car_id)
        .await?;
    if inserted {
        tracing::info!(car_id = %car_id, "Car added to cart");
    }

    Ok(ApiResponse::ok("Car added to cart", CartItemAck { car_id }))
}

/// Remove a car from the cart. Removing a car that is not there succeeds.
///
/// POST /api/cart/remove
#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn remove(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    ApiJson(body): ApiJson<CartItemRequest>,
) -> Result<ApiResponse<CartItemAck>> {
    let car_id = validate_car_id(body.car_id)?;

    CartRepository::new(state.pool())
        .remove(current_user.id, car_id)
        .await?;

    Ok(ApiResponse::ok("Car removed from cart", CartItemAck { car_id }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_car_id() {
        assert!(validate_car_id(5).is_ok());
        assert!(matches!(validate_car_id(0), Err(AppError::InvalidInput(_))));
        assert!(matches!(validate_car_id(-3), Err(AppError::InvalidInput(_))));
    }
}
