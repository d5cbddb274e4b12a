//! Car catalog route handlers. Public, no session required.

use axum::extract::State;

use autoelite_core::CarId;

use crate::catalog::{Car, CarFilter, Facets, Page};
use crate::error::{AppError, Result};
use crate::routes::envelope::{ApiPath, ApiQuery, ApiResponse};
use crate::state::AppState;

/// Browse cars.
///
/// GET /api/cars?make=&year=&category=&price=&q=&page=&per_page=
pub async fn index(
    State(state): State<AppState>,
    ApiQuery(filter): ApiQuery<CarFilter>,
) -> Result<ApiResponse<Page<Car>>> {
    Ok(ApiResponse::ok("Cars loaded", state.catalog().list(&filter)))
}

/// Filter dropdown values.
///
/// GET /api/cars/facets
pub async fn facets(State(state): State<AppState>) -> ApiResponse<Facets> {
    ApiResponse::ok("Facets loaded", state.catalog().facets())
}

/// Car detail.
///
/// GET /api/cars/{id}
pub async fn show(
    State(state): State<AppState>,
    ApiPath(id): ApiPath<CarId>,
) -> Result<ApiResponse<Car>> {
    let car = state
        .catalog()
        .get(id)
        .cloned()
        .ok_or_else(|| AppError::NotFound(format!("Car {id} not found")))?;

    Ok(ApiResponse::ok("Car loaded", car))
}
