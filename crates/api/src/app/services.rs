//! Application services: the use cases behind each route, wired to a storage
//! backend chosen at start-up.

use std::sync::Arc;

use anyhow::Context;
use chrono::{DateTime, Utc};
use tracing::{info, instrument};

use rentstock_core::{CategoryId, DomainResult, ProductId, RentalId, SupplierId, UserId};
use rentstock_infra::store::{
    CategoryStore, ProductFilter, ProductStore, RentalStore, SupplierStore, UserStore,
};
use rentstock_infra::{
    DashboardStats, InMemoryStore, InventoryLedger, PostgresStore, RecordedMovement, Storage,
    StoreBackend, StoreSettings, seed,
};
use rentstock_inventory::{MovementRequest, MovementWithDetails};
use rentstock_parties::{NewSupplier, NewUser, Supplier, SupplierChanges, User};
use rentstock_products::{Category, CategoryChanges, NewCategory, NewProduct, ProductChanges};
use rentstock_rentals::{
    NewRental, Rental, RentalChanges, RentalStatus, RentalWithSupplier, RenewRental,
};

use crate::app::dto::ProductView;
use crate::app::errors::{ApiError, ApiResult};

/// Shared state handed to every handler through an `Extension`.
pub struct AppServices {
    store: Arc<dyn Storage>,
    ledger: InventoryLedger<Arc<dyn Storage>>,
}

impl AppServices {
    pub fn new(store: Arc<dyn Storage>) -> Self {
        Self {
            ledger: InventoryLedger::new(store.clone()),
            store,
        }
    }

    /// Empty in-memory backend, no demo data.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryStore::new()))
    }

    // -------------------------
    // Products
    // -------------------------

    pub async fn list_products(&self, filter: ProductFilter) -> ApiResult<Vec<ProductView>> {
        let products = self.store.list_products(filter).await?;
        Ok(products.into_iter().map(ProductView::from).collect())
    }

    pub async fn get_product(&self, id: ProductId) -> ApiResult<ProductView> {
        self.store
            .get_product(id)
            .await?
            .map(ProductView::from)
            .ok_or(ApiError::NotFound("product"))
    }

    pub async fn list_low_stock(&self) -> ApiResult<Vec<ProductView>> {
        let products = self.ledger.list_low_stock().await?;
        Ok(products.into_iter().map(ProductView::from).collect())
    }

    #[instrument(skip(self, input), fields(code = %input.code))]
    pub async fn create_product(&self, input: NewProduct) -> ApiResult<ProductView> {
        input.validate()?;
        let product = self
            .store
            .insert_product(input.into_product(ProductId::new(), Utc::now()))
            .await?;
        info!(product_id = %product.id, "product created");
        self.get_product(product.id).await
    }

    pub async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> ApiResult<ProductView> {
        changes.validate()?;
        self.store
            .update_product(id, changes)
            .await?
            .ok_or(ApiError::NotFound("product"))?;
        self.get_product(id).await
    }

    pub async fn delete_product(&self, id: ProductId) -> ApiResult<()> {
        found(self.store.delete_product(id).await?, "product")
    }

    // -------------------------
    // Categories
    // -------------------------

    pub async fn list_categories(&self) -> ApiResult<Vec<Category>> {
        Ok(self.store.list_categories().await?)
    }

    pub async fn get_category(&self, id: CategoryId) -> ApiResult<Category> {
        self.store
            .get_category(id)
            .await?
            .ok_or(ApiError::NotFound("category"))
    }

    pub async fn create_category(&self, input: NewCategory) -> ApiResult<Category> {
        input.validate()?;
        Ok(self
            .store
            .insert_category(input.into_category(CategoryId::new()))
            .await?)
    }

    pub async fn update_category(
        &self,
        id: CategoryId,
        changes: CategoryChanges,
    ) -> ApiResult<Category> {
        changes.validate()?;
        self.store
            .update_category(id, changes)
            .await?
            .ok_or(ApiError::NotFound("category"))
    }

    pub async fn delete_category(&self, id: CategoryId) -> ApiResult<()> {
        found(self.store.delete_category(id).await?, "category")
    }

    // -------------------------
    // Suppliers
    // -------------------------

    pub async fn list_suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(self.store.list_suppliers().await?)
    }

    pub async fn get_supplier(&self, id: SupplierId) -> ApiResult<Supplier> {
        self.store
            .get_supplier(id)
            .await?
            .ok_or(ApiError::NotFound("supplier"))
    }

    pub async fn create_supplier(&self, input: NewSupplier) -> ApiResult<Supplier> {
        input.validate()?;
        Ok(self
            .store
            .insert_supplier(input.into_supplier(SupplierId::new(), Utc::now()))
            .await?)
    }

    pub async fn update_supplier(
        &self,
        id: SupplierId,
        changes: SupplierChanges,
    ) -> ApiResult<Supplier> {
        changes.validate()?;
        self.store
            .update_supplier(id, changes)
            .await?
            .ok_or(ApiError::NotFound("supplier"))
    }

    pub async fn delete_supplier(&self, id: SupplierId) -> ApiResult<()> {
        found(self.store.delete_supplier(id).await?, "supplier")
    }

    // -------------------------
    // Users
    // -------------------------

    pub async fn create_user(&self, input: NewUser) -> ApiResult<User> {
        input.validate()?;
        Ok(self.store.insert_user(input.into_user(UserId::new())).await?)
    }

    pub async fn get_user(&self, id: UserId) -> ApiResult<User> {
        self.store
            .get_user(id)
            .await?
            .ok_or(ApiError::NotFound("user"))
    }

    // -------------------------
    // Rentals
    // -------------------------

    pub async fn list_rentals(&self) -> ApiResult<Vec<RentalWithSupplier>> {
        Ok(self.store.list_rentals().await?)
    }

    pub async fn list_active_rentals(&self) -> ApiResult<Vec<RentalWithSupplier>> {
        let mut rentals = self.store.list_rentals().await?;
        rentals.retain(|r| r.rental.status == RentalStatus::Active);
        Ok(rentals)
    }

    pub async fn list_overdue_rentals(&self) -> ApiResult<Vec<RentalWithSupplier>> {
        let now = Utc::now();
        let mut rentals = self.store.list_rentals().await?;
        rentals.retain(|r| r.rental.is_overdue(now));
        Ok(rentals)
    }

    pub async fn get_rental(&self, id: RentalId) -> ApiResult<RentalWithSupplier> {
        self.store
            .get_rental(id)
            .await?
            .ok_or(ApiError::NotFound("rental"))
    }

    #[instrument(skip(self, input), fields(supplier_id = %input.supplier_id))]
    pub async fn create_rental(&self, input: NewRental) -> ApiResult<RentalWithSupplier> {
        input.validate()?;
        let rental = self
            .store
            .insert_rental(input.into_rental(RentalId::new(), Utc::now()))
            .await?;
        info!(rental_id = %rental.id, total = %rental.total_amount, "rental registered");
        self.get_rental(rental.id).await
    }

    pub async fn update_rental(
        &self,
        id: RentalId,
        changes: RentalChanges,
    ) -> ApiResult<RentalWithSupplier> {
        self.modify_rental(id, |rental, now| rental.apply_changes(changes, now))
            .await
    }

    pub async fn renew_rental(
        &self,
        id: RentalId,
        terms: RenewRental,
    ) -> ApiResult<RentalWithSupplier> {
        self.modify_rental(id, |rental, now| rental.renew(&terms, now))
            .await
    }

    pub async fn set_rental_notes(
        &self,
        id: RentalId,
        notes: Option<String>,
    ) -> ApiResult<RentalWithSupplier> {
        self.modify_rental(id, |rental, now| {
            rental.set_notes(notes, now);
            Ok(())
        })
        .await
    }

    pub async fn delete_rental(&self, id: RentalId) -> ApiResult<()> {
        found(self.store.delete_rental(id).await?, "rental")
    }

    /// Marks the listed active rentals completed; returns how many changed.
    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn return_rentals(&self, ids: &[RentalId]) -> ApiResult<u64> {
        let completed = self.store.complete_rentals(ids, Utc::now()).await?;
        info!(completed, "rentals returned");
        Ok(completed)
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()))]
    pub async fn cancel_rentals(&self, ids: &[RentalId]) -> ApiResult<u64> {
        let cancelled = self.store.cancel_rentals(ids, Utc::now()).await?;
        info!(cancelled, "rentals cancelled");
        Ok(cancelled)
    }

    /// Read, change and save one rental. The read and the save are separate
    /// store calls, so concurrent edits of the same rental are last-writer-wins.
    async fn modify_rental<F>(&self, id: RentalId, change: F) -> ApiResult<RentalWithSupplier>
    where
        F: FnOnce(&mut Rental, DateTime<Utc>) -> DomainResult<()>,
    {
        let mut rental = self.get_rental(id).await?.rental;
        change(&mut rental, Utc::now())?;
        found(self.store.save_rental(&rental).await?, "rental")?;
        self.get_rental(id).await
    }

    // -------------------------
    // Inventory movements
    // -------------------------

    pub async fn record_movement(&self, request: MovementRequest) -> ApiResult<RecordedMovement> {
        Ok(self.ledger.record_movement(request).await?)
    }

    pub async fn list_movements(
        &self,
        product_id: Option<ProductId>,
    ) -> ApiResult<Vec<MovementWithDetails>> {
        Ok(self.ledger.list_movements(product_id).await?)
    }

    // -------------------------
    // Dashboard
    // -------------------------

    pub async fn dashboard_stats(&self) -> ApiResult<DashboardStats> {
        Ok(DashboardStats::load(&*self.store).await?)
    }
}

fn found(present: bool, what: &'static str) -> ApiResult<()> {
    if present { Ok(()) } else { Err(ApiError::NotFound(what)) }
}

/// Build services for the configured backend.
///
/// The memory backend is seeded with demo data when `seed_demo_data` is set;
/// the Postgres backend gets its schema applied before the pool is handed out.
pub async fn build_services(settings: &StoreSettings) -> anyhow::Result<AppServices> {
    let store: Arc<dyn Storage> = match settings.backend {
        StoreBackend::Memory => {
            let store = InMemoryStore::new();
            if settings.seed_demo_data {
                seed::seed_demo_data(&store)
                    .await
                    .context("failed to seed demo data")?;
            }
            Arc::new(store)
        }
        StoreBackend::Postgres => {
            let url = settings
                .database_url
                .as_deref()
                .context("store.database_url is required for the postgres backend")?;
            let store = PostgresStore::connect(url, settings.max_connections)
                .await
                .context("failed to connect to postgres")?;
            store.migrate().await.context("failed to apply schema")?;
            Arc::new(store)
        }
    };

    info!(backend = ?settings.backend, "storage ready");
    Ok(AppServices::new(store))
}
