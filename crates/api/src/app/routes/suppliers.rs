use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use rentstock_core::SupplierId;
use rentstock_parties::{NewSupplier, SupplierChanges};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_suppliers).post(create_supplier))
        .route(
            "/:id",
            get(get_supplier).put(update_supplier).delete(delete_supplier),
        )
}

pub async fn list_suppliers(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Response> {
    Ok(Json(services.list_suppliers().await?).into_response())
}

pub async fn get_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: SupplierId = dto::parse_id(&id)?;
    Ok(Json(services.get_supplier(id).await?).into_response())
}

pub async fn create_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<NewSupplier>, JsonRejection>,
) -> ApiResult<Response> {
    let supplier = services.create_supplier(dto::body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(supplier)).into_response())
}

pub async fn update_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<SupplierChanges>, JsonRejection>,
) -> ApiResult<Response> {
    let id: SupplierId = dto::parse_id(&id)?;
    let changes = dto::body(payload)?;
    Ok(Json(services.update_supplier(id, changes).await?).into_response())
}

pub async fn delete_supplier(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: SupplierId = dto::parse_id(&id)?;
    services.delete_supplier(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
