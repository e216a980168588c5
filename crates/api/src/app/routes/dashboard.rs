use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse, response::Response, Json};

use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub async fn stats(Extension(services): Extension<Arc<AppServices>>) -> ApiResult<Response> {
    let stats = services.dashboard_stats().await?;
    Ok(Json(stats).into_response())
}
