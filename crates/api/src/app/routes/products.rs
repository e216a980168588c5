use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Path, Query,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use rentstock_core::ProductId;
use rentstock_infra::store::ProductFilter;
use rentstock_products::NewProduct;

use crate::app::dto::{self, ProductListQuery, UpdateProductRequest};
use crate::app::errors::{ApiError, ApiResult};
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route("/low-stock", get(list_low_stock))
        .route(
            "/:id",
            get(get_product).put(update_product).delete(delete_product),
        )
}

pub async fn list_products(
    Extension(services): Extension<Arc<AppServices>>,
    query: Result<Query<ProductListQuery>, QueryRejection>,
) -> ApiResult<Response> {
    let Query(query) = query.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let filter = ProductFilter {
        category_id: query.category_id,
    };
    Ok(Json(services.list_products(filter).await?).into_response())
}

pub async fn list_low_stock(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Response> {
    Ok(Json(services.list_low_stock().await?).into_response())
}

pub async fn get_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: ProductId = dto::parse_id(&id)?;
    Ok(Json(services.get_product(id).await?).into_response())
}

pub async fn create_product(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<NewProduct>, JsonRejection>,
) -> ApiResult<Response> {
    let input = dto::body(payload)?;
    let product = services.create_product(input).await?;
    Ok((StatusCode::CREATED, Json(product)).into_response())
}

pub async fn update_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<UpdateProductRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let id: ProductId = dto::parse_id(&id)?;
    let changes = dto::body(payload)?.into_changes()?;
    Ok(Json(services.update_product(id, changes).await?).into_response())
}

pub async fn delete_product(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: ProductId = dto::parse_id(&id)?;
    services.delete_product(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
