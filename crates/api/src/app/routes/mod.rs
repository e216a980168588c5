use axum::{routing::get, Router};

pub mod categories;
pub mod dashboard;
pub mod inventory_movements;
pub mod products;
pub mod rentals;
pub mod suppliers;
pub mod system;
pub mod users;

/// Router for everything under `/api`.
pub fn router() -> Router {
    Router::new()
        .nest("/products", products::router())
        .nest("/categories", categories::router())
        .nest("/suppliers", suppliers::router())
        .nest("/users", users::router())
        .nest("/rentals", rentals::router())
        .nest("/inventory-movements", inventory_movements::router())
        .route("/dashboard/stats", get(dashboard::stats))
}
