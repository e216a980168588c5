use std::str::FromStr;

use axum::Json;
use axum::extract::rejection::JsonRejection;
use serde::{Deserialize, Serialize};

use rentstock_core::{CategoryId, DomainError, RentalId};
use rentstock_inventory::StockStatus;
use rentstock_products::{ProductChanges, ProductWithCategory};

use crate::app::errors::ApiError;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductListQuery {
    pub category_id: Option<CategoryId>,
}

/// Product update body. `quantity` is accepted only so it can be refused
/// explicitly: stock moves through inventory movements.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProductRequest {
    #[serde(default)]
    pub quantity: Option<i64>,
    #[serde(flatten)]
    pub changes: ProductChanges,
}

impl UpdateProductRequest {
    pub fn into_changes(self) -> Result<ProductChanges, DomainError> {
        if self.quantity.is_some() {
            return Err(DomainError::validation(
                "quantity cannot be edited directly; record an inventory movement",
            ));
        }
        self.changes.validate()?;
        Ok(self.changes)
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRentalsRequest {
    #[serde(default)]
    pub supplier_name: Option<String>,
    pub items: Vec<RentalId>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BulkCancelRequest {
    pub rental_ids: Vec<RentalId>,
}

#[derive(Debug, Deserialize)]
pub struct NotesRequest {
    #[serde(default)]
    pub notes: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    #[serde(flatten)]
    pub product: ProductWithCategory,
    pub stock_status: StockStatus,
}

impl From<ProductWithCategory> for ProductView {
    fn from(product: ProductWithCategory) -> Self {
        Self {
            stock_status: StockStatus::of(&product.product),
            product,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReturnRentalsResponse {
    pub success: bool,
    pub message: String,
    pub completed: u64,
}

#[derive(Debug, Serialize)]
pub struct BulkCancelResponse {
    pub cancelled: u64,
}

// -------------------------
// Helpers
// -------------------------

/// Unwrap a JSON body, turning axum's rejection into a 400.
pub fn body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, ApiError> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| ApiError::BadRequest(rejection.body_text()))
}

pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(ApiError::from)
}
