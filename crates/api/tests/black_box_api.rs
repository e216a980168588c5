use std::sync::Arc;

use reqwest::StatusCode;
use serde_json::{json, Value};

use rentstock_api::app::{build_app, services::AppServices};

struct TestServer {
    base_url: String,
    client: reqwest::Client,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn() -> Self {
        // Same router as prod over an empty in-memory store, on an ephemeral port.
        let app = build_app(Arc::new(AppServices::in_memory()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            base_url,
            client: reqwest::Client::new(),
            handle,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let res = self.client.get(self.url(path)).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.post(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn put(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let res = self.client.put(self.url(path)).json(&body).send().await.unwrap();
        let status = res.status();
        (status, res.json().await.unwrap_or(Value::Null))
    }

    async fn delete(&self, path: &str) -> StatusCode {
        self.client.delete(self.url(path)).send().await.unwrap().status()
    }

    async fn create_product(&self, code: &str, quantity: i64, min_stock: i64) -> String {
        let (status, body) = self
            .post(
                "/api/products",
                json!({
                    "code": code,
                    "name": format!("Product {code}"),
                    "unitPrice": "12.50",
                    "quantity": quantity,
                    "minStock": min_stock,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        body["id"].as_str().unwrap().to_string()
    }

    async fn move_stock(&self, product_id: &str, kind: &str, quantity: i64) -> (StatusCode, Value) {
        self.post(
            "/api/inventory-movements",
            json!({
                "productId": product_id,
                "type": kind,
                "quantity": quantity,
                "reason": "count",
            }),
        )
        .await
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

#[tokio::test]
async fn health_is_ok() {
    let server = TestServer::spawn().await;
    let res = server.client.get(server.url("/health")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn inbound_movement_raises_stock_and_is_listed() {
    let server = TestServer::spawn().await;
    let id = server.create_product("FI-001", 10, 2).await;

    let (status, body) = server.move_stock(&id, "in", 5).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["productQuantity"], 15);
    assert_eq!(body["type"], "in");

    let (_, product) = server.get(&format!("/api/products/{id}")).await;
    assert_eq!(product["quantity"], 15);
    assert_eq!(product["stockStatus"], "in_stock");

    let (_, movements) = server.get("/api/inventory-movements").await;
    let movements = movements.as_array().unwrap();
    assert_eq!(movements.len(), 1);
    assert_eq!(movements[0]["product"]["code"], "FI-001");
}

#[tokio::test]
async fn outbound_movement_may_drive_stock_negative() {
    let server = TestServer::spawn().await;
    let id = server.create_product("FI-002", 10, 2).await;

    let (status, body) = server.move_stock(&id, "out", 20).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["productQuantity"], -10);
    assert_eq!(body["stockStatus"], "out_of_stock");
}

#[tokio::test]
async fn low_stock_listing_includes_products_at_their_minimum() {
    let server = TestServer::spawn().await;
    let at_min = server.create_product("LOW-1", 5, 5).await;
    server.create_product("OK-1", 6, 5).await;
    let empty = server.create_product("ZERO-1", 0, 0).await;

    let (status, body) = server.get("/api/products/low-stock").await;
    assert_eq!(status, StatusCode::OK);
    let mut ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["id"].as_str().unwrap())
        .collect();
    ids.sort_unstable();
    let mut expected = vec![at_min.as_str(), empty.as_str()];
    expected.sort_unstable();
    assert_eq!(ids, expected);
}

#[tokio::test]
async fn invalid_movement_payloads_are_bad_requests() {
    let server = TestServer::spawn().await;
    let id = server.create_product("FI-003", 10, 2).await;

    let (status, body) = server.move_stock(&id, "in", 0).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "validation_error");

    let (status, _) = server.move_stock(&id, "sideways", 3).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = server
        .post("/api/inventory-movements", json!({"productId": id}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, product) = server.get(&format!("/api/products/{id}")).await;
    assert_eq!(product["quantity"], 10);
}

#[tokio::test]
async fn movement_for_unknown_product_is_not_found() {
    let server = TestServer::spawn().await;
    let missing = rentstock_core::ProductId::new().to_string();

    let (status, body) = server.move_stock(&missing, "in", 5).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");

    let (_, movements) = server.get("/api/inventory-movements").await;
    assert!(movements.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn product_movement_listing_is_filtered() {
    let server = TestServer::spawn().await;
    let a = server.create_product("A-1", 10, 0).await;
    let b = server.create_product("B-1", 10, 0).await;
    server.move_stock(&a, "in", 1).await;
    server.move_stock(&b, "out", 2).await;
    server.move_stock(&a, "adjustment", -3).await;

    let (status, body) = server
        .get(&format!("/api/inventory-movements/product/{a}"))
        .await;
    assert_eq!(status, StatusCode::OK);
    let listed = body.as_array().unwrap();
    assert_eq!(listed.len(), 2);
    assert!(listed.iter().all(|m| m["productId"] == a.as_str()));
}

#[tokio::test]
async fn product_quantity_cannot_be_edited_directly() {
    let server = TestServer::spawn().await;
    let id = server.create_product("FI-004", 10, 2).await;

    let (status, _) = server
        .put(&format!("/api/products/{id}"), json!({"quantity": 99}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = server
        .put(&format!("/api/products/{id}"), json!({"name": "Renamed", "minStock": 4}))
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["name"], "Renamed");
    assert_eq!(body["quantity"], 10);
}

#[tokio::test]
async fn duplicate_code_and_referenced_deletes_conflict() {
    let server = TestServer::spawn().await;
    let id = server.create_product("DUP-1", 10, 2).await;

    let (status, _) = server
        .post(
            "/api/products",
            json!({"code": "DUP-1", "name": "Again", "unitPrice": 1}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    server.move_stock(&id, "in", 1).await;
    assert_eq!(
        server.delete(&format!("/api/products/{id}")).await,
        StatusCode::CONFLICT
    );

    let unused = server.create_product("FREE-1", 0, 0).await;
    assert_eq!(
        server.delete(&format!("/api/products/{unused}")).await,
        StatusCode::NO_CONTENT
    );
    assert_eq!(
        server.delete(&format!("/api/products/{unused}")).await,
        StatusCode::NOT_FOUND
    );
}

#[tokio::test]
async fn category_filter_and_in_use_category() {
    let server = TestServer::spawn().await;
    let (status, category) = server
        .post("/api/categories", json!({"name": "Tools"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let category_id = category["id"].as_str().unwrap().to_string();

    let (status, _) = server
        .post(
            "/api/products",
            json!({"code": "T-1", "name": "Drill", "unitPrice": "45.00", "categoryId": category_id}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    server.create_product("X-1", 1, 0).await;

    let (_, filtered) = server
        .get(&format!("/api/products?categoryId={category_id}"))
        .await;
    let filtered = filtered.as_array().unwrap();
    assert_eq!(filtered.len(), 1);
    assert_eq!(filtered[0]["category"]["name"], "Tools");

    assert_eq!(
        server.delete(&format!("/api/categories/{category_id}")).await,
        StatusCode::CONFLICT
    );
}

#[tokio::test]
async fn explicit_null_clears_nullable_fields() {
    let server = TestServer::spawn().await;
    let (_, category) = server
        .post("/api/categories", json!({"name": "Tools"}))
        .await;
    let category_id = category["id"].as_str().unwrap().to_string();

    let (status, product) = server
        .post(
            "/api/products",
            json!({
                "code": "N-1",
                "name": "Drill",
                "description": "d",
                "unitPrice": "45.00",
                "categoryId": category_id,
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{product}");
    let id = product["id"].as_str().unwrap().to_string();

    let (status, body) = server
        .put(
            &format!("/api/products/{id}"),
            json!({"categoryId": null, "description": null}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["categoryId"], Value::Null);
    assert_eq!(body["category"], Value::Null);
    assert_eq!(body["description"], Value::Null);
    assert_eq!(body["name"], "Drill");

    assert_eq!(
        server.delete(&format!("/api/categories/{category_id}")).await,
        StatusCode::NO_CONTENT
    );

    let (_, supplier) = server
        .post(
            "/api/suppliers",
            json!({"name": "ABC", "email": "ops@abc.example", "phone": "555-0100"}),
        )
        .await;
    let supplier_id = supplier["id"].as_str().unwrap().to_string();
    let (status, supplier) = server
        .put(&format!("/api/suppliers/{supplier_id}"), json!({"phone": null}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(supplier["phone"], Value::Null);
    assert_eq!(supplier["email"], "ops@abc.example");
}

#[tokio::test]
async fn rental_lifecycle() {
    let server = TestServer::spawn().await;

    let (status, supplier) = server
        .post(
            "/api/suppliers",
            json!({"name": "ABC Equipment Rentals", "email": "ops@abc.example"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{supplier}");
    let supplier_id = supplier["id"].as_str().unwrap().to_string();

    let (status, rental) = server
        .post(
            "/api/rentals",
            json!({
                "supplierId": supplier_id,
                "equipmentName": "Excavator",
                "quantity": 2,
                "startDate": "2020-01-01T00:00:00Z",
                "endDate": "2020-01-06T00:00:00Z",
                "dailyRate": "100.00",
                "status": "active",
            }),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{rental}");
    assert_eq!(rental["supplier"]["name"], "ABC Equipment Rentals");
    let rental_id = rental["id"].as_str().unwrap().to_string();

    let (status, renewed) = server
        .put(
            &format!("/api/rentals/{rental_id}/renew"),
            json!({"additionalDays": 3}),
        )
        .await;
    assert_eq!(status, StatusCode::OK, "{renewed}");
    assert_eq!(renewed["endDate"], "2020-01-09T00:00:00Z");

    let (status, _) = server
        .put(&format!("/api/rentals/{rental_id}/renew"), json!({}))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (_, overdue) = server.get("/api/rentals/overdue").await;
    assert_eq!(overdue.as_array().unwrap().len(), 1);

    let (status, noted) = server
        .put(
            &format!("/api/rentals/{rental_id}/notes"),
            json!({"notes": "Bucket scratched"}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(noted["notes"], "Bucket scratched");

    assert_eq!(
        server.delete(&format!("/api/suppliers/{supplier_id}")).await,
        StatusCode::CONFLICT
    );

    let (status, returned) = server
        .post(
            "/api/rentals/return",
            json!({"supplierName": "ABC Equipment Rentals", "items": [rental_id]}),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(returned["completed"], 1);

    let (_, active) = server.get("/api/rentals/active").await;
    assert!(active.as_array().unwrap().is_empty());

    let (_, cancelled) = server
        .post("/api/rentals/bulk-cancel", json!({"rentalIds": [rental_id]}))
        .await;
    assert_eq!(cancelled["cancelled"], 0);
}

#[tokio::test]
async fn dashboard_stats_summarise_the_store() {
    let server = TestServer::spawn().await;
    server.create_product("S-1", 10, 2).await;
    server.create_product("S-2", 1, 5).await;

    let (status, stats) = server.get("/api/dashboard/stats").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(stats["activeRentals"], 0);
    assert_eq!(stats["productsInStock"], 11);
    assert_eq!(stats["lowStockItems"], 1);
}

#[tokio::test]
async fn users_are_created_and_fetched() {
    let server = TestServer::spawn().await;
    let (status, user) = server
        .post(
            "/api/users",
            json!({"username": "ana", "name": "Ana", "email": "ana@example.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(user["role"], "user");

    let (status, _) = server
        .post(
            "/api/users",
            json!({"username": "ana", "name": "Other", "email": "other@example.com"}),
        )
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, fetched) = server
        .get(&format!("/api/users/{}", user["id"].as_str().unwrap()))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(fetched["username"], "ana");
}
