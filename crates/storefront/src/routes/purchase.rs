//! Purchase route handlers.

use axum::{extract::State, http::StatusCode, response::IntoResponse};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use autoelite_core::{CarId, PurchaseId, PurchaseStatus};

use crate::error::Result;
use crate::middleware::RequireAuth;
use crate::models::Purchase;
use crate::routes::envelope::{ApiJson, ApiPath, ApiResponse};
use crate::services::PurchaseService;
use crate::state::AppState;

/// Client-priced purchase.
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    #[serde(default)]
    pub cars: Vec<String>,
    pub amount: Decimal,
}

/// Checkout of cars in the cart.
#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub car_ids: Vec<CarId>,
}

/// Status change request.
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

/// Result of a status change.
#[derive(Debug, Serialize)]
pub struct StatusView {
    pub id: PurchaseId,
    pub status: PurchaseStatus,
}

/// The user's purchase history, newest first.
///
/// GET /api/purchases
pub async fn index(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
) -> Result<ApiResponse<Vec<Purchase>>> {
    let purchases = PurchaseService::new(state.pool(), state.catalog())
        .list(current_user.id)
        .await?;

    Ok(ApiResponse::ok("Purchases loaded", purchases))
}

/// Record a purchase.
///
/// POST /api/purchases
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn create(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    ApiJson(body): ApiJson<CreatePurchaseRequest>,
) -> Result<impl IntoResponse> {
    let purchase = PurchaseService::new(state.pool(), state.catalog())
        .create(current_user.id, &body.cars, body.amount)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Purchase created", purchase),
    ))
}

/// Buy cars from the cart at catalog prices.
///
/// POST /api/purchases/checkout
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn checkout(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    ApiJson(body): ApiJson<CheckoutRequest>,
) -> Result<impl IntoResponse> {
    let purchase = PurchaseService::new(state.pool(), state.catalog())
        .checkout(current_user.id, &body.car_ids)
        .await?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::ok("Checkout complete", purchase),
    ))
}

/// Complete or cancel an ongoing purchase.
///
/// POST /api/purchases/{id}/status
#[instrument(skip(state, current_user, body), fields(user_id = %current_user.id))]
pub async fn update_status(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    ApiPath(id): ApiPath<PurchaseId>,
    ApiJson(body): ApiJson<UpdateStatusRequest>,
) -> Result<ApiResponse<StatusView>> {
    let status = PurchaseService::new(state.pool(), state.catalog())
        .update_status(current_user.id, id, &body.status)
        .await?;

    Ok(ApiResponse::ok(
        "Purchase status updated",
        StatusView { id, status },
    ))
}

/// Remove a completed or cancelled purchase.
///
/// DELETE /api/purchases/{id}
#[instrument(skip(state, current_user), fields(user_id = %current_user.id))]
pub async fn delete(
    State(state): State<AppState>,
    RequireAuth(current_user): RequireAuth,
    ApiPath(id): ApiPath<PurchaseId>,
) -> Result<ApiResponse<()>> {
    PurchaseService::new(state.pool(), state.catalog())
        .delete(current_user.id, id)
        .await?;

    Ok(ApiResponse::message("Purchase deleted"))
}
