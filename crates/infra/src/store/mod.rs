//! Repository interfaces over the flat tables, plus the in-memory and Postgres
//! implementations.
//!
//! Each table gets its own async trait so call sites only depend on what they
//! touch; [`Storage`] bundles them for wiring. `Arc<S>` forwards every trait,
//! so services can hold `Arc<dyn Storage>` and tests can hand in a concrete
//! store.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use rentstock_core::{CategoryId, ProductId, RentalId, SupplierId, UserId};
use rentstock_inventory::{InventoryMovement, MovementWithDetails};
use rentstock_parties::{Supplier, SupplierChanges, User};
use rentstock_products::{
    Category, CategoryChanges, Product, ProductChanges, ProductWithCategory,
};
use rentstock_rentals::{Rental, RentalWithSupplier};

mod in_memory;
mod postgres;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;

pub type StoreResult<T> = Result<T, StoreError>;

/// Persistence failure.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A record the operation depends on does not exist.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// Unique key clash, or a record is still referenced elsewhere.
    #[error("conflict: {0}")]
    Conflict(String),

    /// The backend refused a value (check constraint, numeric range).
    #[error("rejected by store: {0}")]
    Rejected(String),

    /// Anything else: connection loss, poisoned lock, undecodable row.
    #[error("storage backend error: {0}")]
    Backend(String),
}

/// Optional filter for product listings.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ProductFilter {
    pub category_id: Option<CategoryId>,
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_categories(&self) -> StoreResult<Vec<Category>>;
    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>>;
    async fn insert_category(&self, category: Category) -> StoreResult<Category>;
    async fn update_category(
        &self,
        id: CategoryId,
        changes: CategoryChanges,
    ) -> StoreResult<Option<Category>>;
    /// `Ok(false)` when missing; `Conflict` while products still reference it.
    async fn delete_category(&self, id: CategoryId) -> StoreResult<bool>;
}

#[async_trait]
pub trait ProductStore: Send + Sync {
    /// Products in creation order, category joined.
    async fn list_products(&self, filter: ProductFilter) -> StoreResult<Vec<ProductWithCategory>>;
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<ProductWithCategory>>;
    /// `Conflict` on a duplicate code, `NotFound("category")` for a dangling
    /// category reference. `update_product` follows the same rules.
    async fn insert_product(&self, product: Product) -> StoreResult<Product>;
    /// Applies the changes in place. Never touches `quantity`.
    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>>;
    /// `Ok(false)` when missing; `Conflict` once movements exist for it.
    async fn delete_product(&self, id: ProductId) -> StoreResult<bool>;
    /// Every product with `quantity <= min_stock`, category joined.
    async fn list_low_stock(&self) -> StoreResult<Vec<ProductWithCategory>>;
}

#[async_trait]
pub trait SupplierStore: Send + Sync {
    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>>;
    async fn get_supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>>;
    async fn insert_supplier(&self, supplier: Supplier) -> StoreResult<Supplier>;
    async fn update_supplier(
        &self,
        id: SupplierId,
        changes: SupplierChanges,
    ) -> StoreResult<Option<Supplier>>;
    /// `Ok(false)` when missing; `Conflict` while rentals reference it.
    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<bool>;
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// `Conflict` on a duplicate username.
    async fn insert_user(&self, user: User) -> StoreResult<User>;
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>>;
}

#[async_trait]
pub trait RentalStore: Send + Sync {
    /// Newest first, supplier joined.
    async fn list_rentals(&self) -> StoreResult<Vec<RentalWithSupplier>>;
    async fn get_rental(&self, id: RentalId) -> StoreResult<Option<RentalWithSupplier>>;
    /// `NotFound("supplier")` when the supplier is missing; same for `save_rental`.
    async fn insert_rental(&self, rental: Rental) -> StoreResult<Rental>;
    /// Overwrites every mutable column. `Ok(false)` when missing.
    async fn save_rental(&self, rental: &Rental) -> StoreResult<bool>;
    async fn delete_rental(&self, id: RentalId) -> StoreResult<bool>;
    /// Runs `Rental::complete` on each listed rental; returns how many changed.
    async fn complete_rentals(&self, ids: &[RentalId], now: DateTime<Utc>) -> StoreResult<u64>;
    /// Runs `Rental::cancel` on each listed rental; returns how many changed.
    async fn cancel_rentals(&self, ids: &[RentalId], now: DateTime<Utc>) -> StoreResult<u64>;
}

#[async_trait]
pub trait MovementStore: Send + Sync {
    /// Persist `movement` and add its delta to the product's quantity as one
    /// atomic step. Returns the product as it stands afterwards.
    ///
    /// `NotFound("product")` / `NotFound("user")` leave nothing behind.
    async fn record_movement(&self, movement: &InventoryMovement) -> StoreResult<Product>;
    /// Insertion order, optionally restricted to one product.
    async fn list_movements(
        &self,
        product_id: Option<ProductId>,
    ) -> StoreResult<Vec<MovementWithDetails>>;
}

/// Everything the application needs from a backend.
pub trait Storage:
    CategoryStore + ProductStore + SupplierStore + UserStore + RentalStore + MovementStore
{
}

impl<T> Storage for T where
    T: CategoryStore + ProductStore + SupplierStore + UserStore + RentalStore + MovementStore
{
}

#[async_trait]
impl<S> CategoryStore for Arc<S>
where
    S: CategoryStore + ?Sized,
{
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        (**self).list_categories().await
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        (**self).get_category(id).await
    }

    async fn insert_category(&self, category: Category) -> StoreResult<Category> {
        (**self).insert_category(category).await
    }

    async fn update_category(
        &self,
        id: CategoryId,
        changes: CategoryChanges,
    ) -> StoreResult<Option<Category>> {
        (**self).update_category(id, changes).await
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<bool> {
        (**self).delete_category(id).await
    }
}

#[async_trait]
impl<S> ProductStore for Arc<S>
where
    S: ProductStore + ?Sized,
{
    async fn list_products(&self, filter: ProductFilter) -> StoreResult<Vec<ProductWithCategory>> {
        (**self).list_products(filter).await
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<ProductWithCategory>> {
        (**self).get_product(id).await
    }

    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        (**self).insert_product(product).await
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>> {
        (**self).update_product(id, changes).await
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<bool> {
        (**self).delete_product(id).await
    }

    async fn list_low_stock(&self) -> StoreResult<Vec<ProductWithCategory>> {
        (**self).list_low_stock().await
    }
}

#[async_trait]
impl<S> SupplierStore for Arc<S>
where
    S: SupplierStore + ?Sized,
{
    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>> {
        (**self).list_suppliers().await
    }

    async fn get_supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        (**self).get_supplier(id).await
    }

    async fn insert_supplier(&self, supplier: Supplier) -> StoreResult<Supplier> {
        (**self).insert_supplier(supplier).await
    }

    async fn update_supplier(
        &self,
        id: SupplierId,
        changes: SupplierChanges,
    ) -> StoreResult<Option<Supplier>> {
        (**self).update_supplier(id, changes).await
    }

    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<bool> {
        (**self).delete_supplier(id).await
    }
}

#[async_trait]
impl<S> UserStore for Arc<S>
where
    S: UserStore + ?Sized,
{
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        (**self).insert_user(user).await
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        (**self).get_user(id).await
    }
}

#[async_trait]
impl<S> RentalStore for Arc<S>
where
    S: RentalStore + ?Sized,
{
    async fn list_rentals(&self) -> StoreResult<Vec<RentalWithSupplier>> {
        (**self).list_rentals().await
    }

    async fn get_rental(&self, id: RentalId) -> StoreResult<Option<RentalWithSupplier>> {
        (**self).get_rental(id).await
    }

    async fn insert_rental(&self, rental: Rental) -> StoreResult<Rental> {
        (**self).insert_rental(rental).await
    }

    async fn save_rental(&self, rental: &Rental) -> StoreResult<bool> {
        (**self).save_rental(rental).await
    }

    async fn delete_rental(&self, id: RentalId) -> StoreResult<bool> {
        (**self).delete_rental(id).await
    }

    async fn complete_rentals(&self, ids: &[RentalId], now: DateTime<Utc>) -> StoreResult<u64> {
        (**self).complete_rentals(ids, now).await
    }

    async fn cancel_rentals(&self, ids: &[RentalId], now: DateTime<Utc>) -> StoreResult<u64> {
        (**self).cancel_rentals(ids, now).await
    }
}

#[async_trait]
impl<S> MovementStore for Arc<S>
where
    S: MovementStore + ?Sized,
{
    async fn record_movement(&self, movement: &InventoryMovement) -> StoreResult<Product> {
        (**self).record_movement(movement).await
    }

    async fn list_movements(
        &self,
        product_id: Option<ProductId>,
    ) -> StoreResult<Vec<MovementWithDetails>> {
        (**self).list_movements(product_id).await
    }
}
