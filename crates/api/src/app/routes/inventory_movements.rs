use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use rentstock_core::ProductId;
use rentstock_inventory::MovementRequest;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_movements).post(record_movement))
        .route("/product/:product_id", get(list_product_movements))
}

pub async fn list_movements(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Response> {
    Ok(Json(services.list_movements(None).await?).into_response())
}

pub async fn list_product_movements(
    Extension(services): Extension<Arc<AppServices>>,
    Path(product_id): Path<String>,
) -> ApiResult<Response> {
    let product_id: ProductId = dto::parse_id(&product_id)?;
    Ok(Json(services.list_movements(Some(product_id)).await?).into_response())
}

pub async fn record_movement(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<MovementRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request = dto::body(payload)?;
    let recorded = services.record_movement(request).await?;
    Ok((StatusCode::CREATED, Json(recorded)).into_response())
}
