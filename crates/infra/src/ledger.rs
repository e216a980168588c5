//! Inventory ledger service.
//!
//! Validates movement requests against the domain rules, hands them to the
//! store for atomic application, and exposes the low-stock and movement
//! history queries.

use chrono::Utc;
use serde::Serialize;
use thiserror::Error;
use tracing::{info, instrument, warn};

use rentstock_core::{DomainError, MovementId, ProductId};
use rentstock_inventory::{
    InventoryMovement, MovementRequest, MovementWithDetails, StockStatus, is_low_stock,
};
use rentstock_products::ProductWithCategory;

use crate::store::{MovementStore, ProductStore, StoreError};

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A movement as stored, plus where it left its product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecordedMovement {
    #[serde(flatten)]
    pub movement: InventoryMovement,
    pub product_quantity: i64,
    pub stock_status: StockStatus,
}

#[derive(Debug, Clone)]
pub struct InventoryLedger<S> {
    store: S,
}

impl<S> InventoryLedger<S>
where
    S: MovementStore + ProductStore,
{
    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Record one movement and apply its delta to the product's quantity.
    #[instrument(
        skip(self, request),
        fields(
            product_id = %request.product_id,
            movement_type = %request.movement_type,
            quantity = request.quantity
        ),
        err
    )]
    pub async fn record_movement(
        &self,
        request: MovementRequest,
    ) -> Result<RecordedMovement, LedgerError> {
        let delta = request.validate()?;
        let movement = request.into_movement(MovementId::new(), Utc::now());
        let product = self.store.record_movement(&movement).await?;

        info!(
            movement_id = %movement.id,
            product_id = %product.id,
            delta,
            quantity = product.quantity,
            "inventory movement recorded"
        );

        // `before` cannot overflow: the store already computed before + delta.
        let before = product.quantity - delta;
        if is_low_stock(&product) && before > product.min_stock {
            warn!(
                product_id = %product.id,
                code = %product.code,
                quantity = product.quantity,
                min_stock = product.min_stock,
                "product dropped to low stock"
            );
        }

        Ok(RecordedMovement {
            stock_status: StockStatus::of(&product),
            product_quantity: product.quantity,
            movement,
        })
    }

    /// Products at or below their minimum stock.
    pub async fn list_low_stock(&self) -> Result<Vec<ProductWithCategory>, LedgerError> {
        Ok(self.store.list_low_stock().await?)
    }

    /// Movement history in insertion order, optionally for one product.
    pub async fn list_movements(
        &self,
        product_id: Option<ProductId>,
    ) -> Result<Vec<MovementWithDetails>, LedgerError> {
        Ok(self.store.list_movements(product_id).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use rentstock_core::UserId;
    use rentstock_inventory::{MovementType, replay};
    use rentstock_products::NewProduct;
    use rust_decimal::Decimal;

    use crate::store::{InMemoryStore, UserStore};

    type MemLedger = InventoryLedger<Arc<InMemoryStore>>;

    async fn ledger_with_product(quantity: i64, min_stock: i64) -> (MemLedger, Arc<InMemoryStore>, ProductId) {
        let store = Arc::new(InMemoryStore::new());
        let product = NewProduct {
            code: "FI-001".to_string(),
            name: "Industrial drill".to_string(),
            description: None,
            category_id: None,
            unit_price: Decimal::new(45000, 2),
            quantity,
            min_stock,
            is_rentable: true,
        }
        .into_product(ProductId::new(), Utc::now());
        let id = product.id;
        store.insert_product(product).await.unwrap();
        (InventoryLedger::new(store.clone()), store, id)
    }

    fn request(product_id: ProductId, kind: MovementType, quantity: i64) -> MovementRequest {
        MovementRequest {
            product_id,
            movement_type: kind,
            quantity,
            reason: "count".to_string(),
            notes: None,
            user_id: None,
        }
    }

    async fn quantity_of(store: &InMemoryStore, id: ProductId) -> i64 {
        store.get_product(id).await.unwrap().unwrap().product.quantity
    }

    #[tokio::test]
    async fn in_five_on_ten_gives_fifteen_and_one_movement() {
        let (ledger, store, id) = ledger_with_product(10, 2).await;

        let recorded = ledger
            .record_movement(request(id, MovementType::In, 5))
            .await
            .unwrap();

        assert_eq!(recorded.product_quantity, 15);
        assert_eq!(recorded.stock_status, StockStatus::InStock);
        assert_eq!(quantity_of(&store, id).await, 15);
        assert_eq!(ledger.list_movements(Some(id)).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn out_twenty_on_ten_goes_negative() {
        let (ledger, store, id) = ledger_with_product(10, 2).await;

        let recorded = ledger
            .record_movement(request(id, MovementType::Out, 20))
            .await
            .unwrap();

        assert_eq!(recorded.product_quantity, -10);
        assert_eq!(recorded.stock_status, StockStatus::OutOfStock);
        assert_eq!(quantity_of(&store, id).await, -10);
    }

    #[tokio::test]
    async fn adjustment_adds_signed_quantity() {
        let (ledger, _store, id) = ledger_with_product(10, 2).await;
        let recorded = ledger
            .record_movement(request(id, MovementType::Adjustment, -4))
            .await
            .unwrap();
        assert_eq!(recorded.product_quantity, 6);
    }

    #[tokio::test]
    async fn invalid_request_is_rejected_before_touching_the_store() {
        let (ledger, store, id) = ledger_with_product(10, 2).await;

        let err = ledger
            .record_movement(request(id, MovementType::In, 0))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Domain(DomainError::Validation(_))));
        assert_eq!(quantity_of(&store, id).await, 10);
        assert!(ledger.list_movements(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_product_is_not_found_and_nothing_is_persisted() {
        let (ledger, _store, _id) = ledger_with_product(10, 2).await;

        let err = ledger
            .record_movement(request(ProductId::new(), MovementType::In, 5))
            .await
            .unwrap_err();

        assert!(matches!(err, LedgerError::Store(StoreError::NotFound("product"))));
        assert!(ledger.list_movements(None).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn unknown_user_is_not_found() {
        let (ledger, store, id) = ledger_with_product(10, 2).await;
        let mut req = request(id, MovementType::In, 5);
        req.user_id = Some(UserId::new());

        let err = ledger.record_movement(req).await.unwrap_err();

        assert!(matches!(err, LedgerError::Store(StoreError::NotFound("user"))));
        assert_eq!(quantity_of(&store, id).await, 10);
    }

    #[tokio::test]
    async fn movement_lists_joined_user() {
        let (ledger, store, id) = ledger_with_product(10, 2).await;
        let user = store
            .insert_user(rentstock_parties::User {
                id: UserId::new(),
                username: "ana".to_string(),
                name: "Ana".to_string(),
                email: "ana@example.com".to_string(),
                role: "user".to_string(),
            })
            .await
            .unwrap();
        let mut req = request(id, MovementType::Out, 1);
        req.user_id = Some(user.id);
        ledger.record_movement(req).await.unwrap();

        let listed = ledger.list_movements(Some(id)).await.unwrap();
        assert_eq!(listed[0].user.as_ref().map(|u| u.username.as_str()), Some("ana"));
    }

    #[tokio::test]
    async fn low_stock_reflects_movements() {
        let (ledger, _store, id) = ledger_with_product(10, 5).await;
        assert!(ledger.list_low_stock().await.unwrap().is_empty());

        ledger
            .record_movement(request(id, MovementType::Out, 5))
            .await
            .unwrap();

        let low = ledger.list_low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].product.quantity, 5);
    }

    #[tokio::test]
    async fn history_replays_to_current_quantity() {
        let (ledger, store, id) = ledger_with_product(10, 0).await;
        for (kind, q) in [
            (MovementType::In, 7),
            (MovementType::Out, 12),
            (MovementType::Adjustment, 3),
            (MovementType::Out, 1),
        ] {
            ledger.record_movement(request(id, kind, q)).await.unwrap();
        }

        let history = ledger.list_movements(Some(id)).await.unwrap();
        let replayed = replay(10, history.iter().map(|m| &m.movement));
        assert_eq!(replayed, quantity_of(&store, id).await);
        assert_eq!(replayed, 7);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_in_and_out_never_lose_an_update() {
        for _ in 0..50 {
            let (ledger, store, id) = ledger_with_product(10, 0).await;
            let ledger = Arc::new(ledger);

            let receive = {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    ledger.record_movement(request(id, MovementType::In, 5)).await
                })
            };
            let issue = {
                let ledger = ledger.clone();
                tokio::spawn(async move {
                    ledger.record_movement(request(id, MovementType::Out, 3)).await
                })
            };

            receive.await.unwrap().unwrap();
            issue.await.unwrap().unwrap();

            assert_eq!(quantity_of(&store, id).await, 12);
            assert_eq!(ledger.list_movements(Some(id)).await.unwrap().len(), 2);
        }
    }
}
