use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};

use rentstock_core::CategoryId;
use rentstock_products::{CategoryChanges, NewCategory};

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_categories).post(create_category))
        .route(
            "/:id",
            get(get_category).put(update_category).delete(delete_category),
        )
}

pub async fn list_categories(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Response> {
    Ok(Json(services.list_categories().await?).into_response())
}

pub async fn get_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: CategoryId = dto::parse_id(&id)?;
    Ok(Json(services.get_category(id).await?).into_response())
}

pub async fn create_category(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<NewCategory>, JsonRejection>,
) -> ApiResult<Response> {
    let category = services.create_category(dto::body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(category)).into_response())
}

pub async fn update_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<CategoryChanges>, JsonRejection>,
) -> ApiResult<Response> {
    let id: CategoryId = dto::parse_id(&id)?;
    let changes = dto::body(payload)?;
    Ok(Json(services.update_category(id, changes).await?).into_response())
}

pub async fn delete_category(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: CategoryId = dto::parse_id(&id)?;
    services.delete_category(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}
