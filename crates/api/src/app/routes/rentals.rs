use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};

use rentstock_core::RentalId;
use rentstock_rentals::{NewRental, RentalChanges, RenewRental};

use crate::app::dto::{
    self, BulkCancelRequest, BulkCancelResponse, NotesRequest, ReturnRentalsRequest,
    ReturnRentalsResponse,
};
use crate::app::errors::ApiResult;
use crate::app::services::AppServices;

pub fn router() -> Router {
    Router::new()
        .route("/", get(list_rentals).post(create_rental))
        .route("/active", get(list_active))
        .route("/overdue", get(list_overdue))
        .route("/return", post(return_rentals))
        .route("/bulk-cancel", post(bulk_cancel))
        .route(
            "/:id",
            get(get_rental).put(update_rental).delete(delete_rental),
        )
        .route("/:id/renew", put(renew_rental))
        .route("/:id/notes", put(set_notes))
}

pub async fn list_rentals(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Response> {
    Ok(Json(services.list_rentals().await?).into_response())
}

pub async fn list_active(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Response> {
    Ok(Json(services.list_active_rentals().await?).into_response())
}

pub async fn list_overdue(
    Extension(services): Extension<Arc<AppServices>>,
) -> ApiResult<Response> {
    Ok(Json(services.list_overdue_rentals().await?).into_response())
}

pub async fn get_rental(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: RentalId = dto::parse_id(&id)?;
    Ok(Json(services.get_rental(id).await?).into_response())
}

pub async fn create_rental(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<NewRental>, JsonRejection>,
) -> ApiResult<Response> {
    let rental = services.create_rental(dto::body(payload)?).await?;
    Ok((StatusCode::CREATED, Json(rental)).into_response())
}

pub async fn update_rental(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<RentalChanges>, JsonRejection>,
) -> ApiResult<Response> {
    let id: RentalId = dto::parse_id(&id)?;
    let changes = dto::body(payload)?;
    Ok(Json(services.update_rental(id, changes).await?).into_response())
}

pub async fn delete_rental(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> ApiResult<Response> {
    let id: RentalId = dto::parse_id(&id)?;
    services.delete_rental(id).await?;
    Ok(StatusCode::NO_CONTENT.into_response())
}

pub async fn renew_rental(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<RenewRental>, JsonRejection>,
) -> ApiResult<Response> {
    let id: RentalId = dto::parse_id(&id)?;
    let terms = dto::body(payload)?;
    Ok(Json(services.renew_rental(id, terms).await?).into_response())
}

pub async fn set_notes(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    payload: Result<Json<NotesRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let id: RentalId = dto::parse_id(&id)?;
    let NotesRequest { notes } = dto::body(payload)?;
    Ok(Json(services.set_rental_notes(id, notes).await?).into_response())
}

pub async fn return_rentals(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<ReturnRentalsRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request = dto::body(payload)?;
    let completed = services.return_rentals(&request.items).await?;

    let message = match request.supplier_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => {
            format!("{completed} rental(s) returned to {name}")
        }
        _ => format!("{completed} rental(s) returned"),
    };
    Ok(Json(ReturnRentalsResponse {
        success: true,
        message,
        completed,
    })
    .into_response())
}

pub async fn bulk_cancel(
    Extension(services): Extension<Arc<AppServices>>,
    payload: Result<Json<BulkCancelRequest>, JsonRejection>,
) -> ApiResult<Response> {
    let request = dto::body(payload)?;
    let cancelled = services.cancel_rentals(&request.rental_ids).await?;
    Ok(Json(BulkCancelResponse { cancelled }).into_response())
}
