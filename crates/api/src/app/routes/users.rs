use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

use rentstock_core::UserId;
use rentstock_parties::NewUser;

use crate::app::dto;
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_user))
        .route("/:id", get(get_user))
}

pub async fn create_user(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<NewUser>, JsonRejection>,
) -> ApiResult<Response> {
    let user = services.create_user(dto::body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(user)).into_response())
}

pub async fn get_user(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: UserId = dto::parse_id(&id)?;
    Ok(Json(services.get_user(id).await?).into_response())
}
