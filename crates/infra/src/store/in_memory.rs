use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use rentstock_core::{CategoryId, Entity, ProductId, RentalId, SupplierId, UserId};
use rentstock_inventory::{
    InventoryMovement, MovementWithDetails, ProductSummary, UserSummary, apply_delta, is_low_stock,
};
use rentstock_parties::{Supplier, SupplierChanges, User};
use rentstock_products::{
    Category, CategoryChanges, Product, ProductChanges, ProductWithCategory,
};
use rentstock_rentals::{Rental, RentalWithSupplier};

use super::{
    CategoryStore, MovementStore, ProductFilter, ProductStore, RentalStore, StoreError,
    StoreResult, SupplierStore, UserStore,
};

/// Rows keyed by entity id, iterated in insertion order.
#[derive(Debug)]
struct Table<E: Entity> {
    rows: HashMap<E::Id, E>,
    order: Vec<E::Id>,
}

impl<E: Entity> Default for Table<E> {
    fn default() -> Self {
        Self {
            rows: HashMap::new(),
            order: Vec::new(),
        }
    }
}

impl<E: Entity> Table<E> {
    fn insert(&mut self, row: E) {
        let id = row.id();
        if self.rows.insert(id, row).is_none() {
            self.order.push(id);
        }
    }

    fn get(&self, id: &E::Id) -> Option<&E> {
        self.rows.get(id)
    }

    fn get_mut(&mut self, id: &E::Id) -> Option<&mut E> {
        self.rows.get_mut(id)
    }

    fn contains(&self, id: &E::Id) -> bool {
        self.rows.contains_key(id)
    }

    fn remove(&mut self, id: &E::Id) -> Option<E> {
        let row = self.rows.remove(id)?;
        self.order.retain(|existing| existing != id);
        Some(row)
    }

    fn iter(&self) -> impl DoubleEndedIterator<Item = &E> + '_ {
        self.order.iter().filter_map(|id| self.rows.get(id))
    }
}

#[derive(Debug, Default)]
struct Tables {
    categories: Table<Category>,
    products: Table<Product>,
    suppliers: Table<Supplier>,
    users: Table<User>,
    rentals: Table<Rental>,
    movements: Table<InventoryMovement>,
}

impl Tables {
    fn with_category(&self, product: &Product) -> ProductWithCategory {
        ProductWithCategory {
            product: product.clone(),
            category: product
                .category_id
                .and_then(|id| self.categories.get(&id).cloned()),
        }
    }

    fn with_supplier(&self, rental: &Rental) -> Option<RentalWithSupplier> {
        let supplier = self.suppliers.get(&rental.supplier_id)?.clone();
        Some(RentalWithSupplier {
            rental: rental.clone(),
            supplier,
        })
    }

    fn code_taken(&self, code: &str, except: Option<ProductId>) -> bool {
        self.products
            .iter()
            .any(|p| p.code == code && Some(p.id) != except)
    }
}

/// Process-local store for development and tests.
///
/// Every table lives behind one lock, so a movement insert and the quantity
/// change it causes are applied by a single writer and cannot interleave with
/// another movement.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, Tables>> {
        self.tables
            .read()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, Tables>> {
        self.tables
            .write()
            .map_err(|_| StoreError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl CategoryStore for InMemoryStore {
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let mut categories: Vec<Category> = self.read()?.categories.iter().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        Ok(self.read()?.categories.get(&id).cloned())
    }

    async fn insert_category(&self, category: Category) -> StoreResult<Category> {
        self.write()?.categories.insert(category.clone());
        Ok(category)
    }

    async fn update_category(
        &self,
        id: CategoryId,
        changes: CategoryChanges,
    ) -> StoreResult<Option<Category>> {
        let mut tables = self.write()?;
        Ok(tables.categories.get_mut(&id).map(|category| {
            category.apply_changes(changes);
            category.clone()
        }))
    }

    async fn delete_category(&self, id: CategoryId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if !tables.categories.contains(&id) {
            return Ok(false);
        }
        if tables.products.iter().any(|p| p.category_id == Some(id)) {
            return Err(StoreError::Conflict(
                "category is still assigned to products".to_string(),
            ));
        }
        Ok(tables.categories.remove(&id).is_some())
    }
}

#[async_trait]
impl ProductStore for InMemoryStore {
    async fn list_products(&self, filter: ProductFilter) -> StoreResult<Vec<ProductWithCategory>> {
        let tables = self.read()?;
        Ok(tables
            .products
            .iter()
            .filter(|p| filter.category_id.is_none() || p.category_id == filter.category_id)
            .map(|p| tables.with_category(p))
            .collect())
    }

    async fn get_product(&self, id: ProductId) -> StoreResult<Option<ProductWithCategory>> {
        let tables = self.read()?;
        Ok(tables.products.get(&id).map(|p| tables.with_category(p)))
    }

    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        let mut tables = self.write()?;
        if tables.code_taken(&product.code, None) {
            return Err(StoreError::Conflict(format!(
                "product code {:?} already exists",
                product.code
            )));
        }
        if let Some(category_id) = product.category_id {
            if !tables.categories.contains(&category_id) {
                return Err(StoreError::NotFound("category"));
            }
        }
        tables.products.insert(product.clone());
        Ok(product)
    }

    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>> {
        let mut tables = self.write()?;
        if !tables.products.contains(&id) {
            return Ok(None);
        }
        if let Some(code) = &changes.code {
            if tables.code_taken(code, Some(id)) {
                return Err(StoreError::Conflict(format!("product code {code:?} already exists")));
            }
        }
        if let Some(Some(category_id)) = changes.category_id {
            if !tables.categories.contains(&category_id) {
                return Err(StoreError::NotFound("category"));
            }
        }
        Ok(tables.products.get_mut(&id).map(|product| {
            product.apply_changes(changes);
            product.clone()
        }))
    }

    async fn delete_product(&self, id: ProductId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if !tables.products.contains(&id) {
            return Ok(false);
        }
        if tables.movements.iter().any(|m| m.product_id == id) {
            return Err(StoreError::Conflict(
                "product has inventory movements".to_string(),
            ));
        }
        Ok(tables.products.remove(&id).is_some())
    }

    async fn list_low_stock(&self) -> StoreResult<Vec<ProductWithCategory>> {
        let tables = self.read()?;
        Ok(tables
            .products
            .iter()
            .filter(|p| is_low_stock(p))
            .map(|p| tables.with_category(p))
            .collect())
    }
}

#[async_trait]
impl SupplierStore for InMemoryStore {
    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>> {
        let mut suppliers: Vec<Supplier> = self.read()?.suppliers.iter().cloned().collect();
        suppliers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(suppliers)
    }

    async fn get_supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        Ok(self.read()?.suppliers.get(&id).cloned())
    }

    async fn insert_supplier(&self, supplier: Supplier) -> StoreResult<Supplier> {
        self.write()?.suppliers.insert(supplier.clone());
        Ok(supplier)
    }

    async fn update_supplier(
        &self,
        id: SupplierId,
        changes: SupplierChanges,
    ) -> StoreResult<Option<Supplier>> {
        let mut tables = self.write()?;
        Ok(tables.suppliers.get_mut(&id).map(|supplier| {
            supplier.apply_changes(changes);
            supplier.clone()
        }))
    }

    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if !tables.suppliers.contains(&id) {
            return Ok(false);
        }
        if tables.rentals.iter().any(|r| r.supplier_id == id) {
            return Err(StoreError::Conflict(
                "supplier is referenced by rentals".to_string(),
            ));
        }
        Ok(tables.suppliers.remove(&id).is_some())
    }
}

#[async_trait]
impl UserStore for InMemoryStore {
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        let mut tables = self.write()?;
        if tables.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!(
                "username {:?} already exists",
                user.username
            )));
        }
        tables.users.insert(user.clone());
        Ok(user)
    }

    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        Ok(self.read()?.users.get(&id).cloned())
    }
}

#[async_trait]
impl RentalStore for InMemoryStore {
    async fn list_rentals(&self) -> StoreResult<Vec<RentalWithSupplier>> {
        let tables = self.read()?;
        let mut rentals: Vec<RentalWithSupplier> = tables
            .rentals
            .iter()
            .rev()
            .filter_map(|r| tables.with_supplier(r))
            .collect();
        // Stable sort keeps later inserts first among equal timestamps.
        rentals.sort_by(|a, b| b.rental.created_at.cmp(&a.rental.created_at));
        Ok(rentals)
    }

    async fn get_rental(&self, id: RentalId) -> StoreResult<Option<RentalWithSupplier>> {
        let tables = self.read()?;
        Ok(tables.rentals.get(&id).and_then(|r| tables.with_supplier(r)))
    }

    async fn insert_rental(&self, rental: Rental) -> StoreResult<Rental> {
        let mut tables = self.write()?;
        if !tables.suppliers.contains(&rental.supplier_id) {
            return Err(StoreError::NotFound("supplier"));
        }
        tables.rentals.insert(rental.clone());
        Ok(rental)
    }

    async fn save_rental(&self, rental: &Rental) -> StoreResult<bool> {
        let mut tables = self.write()?;
        if !tables.rentals.contains(&rental.id) {
            return Ok(false);
        }
        if !tables.suppliers.contains(&rental.supplier_id) {
            return Err(StoreError::NotFound("supplier"));
        }
        tables.rentals.insert(rental.clone());
        Ok(true)
    }

    async fn delete_rental(&self, id: RentalId) -> StoreResult<bool> {
        Ok(self.write()?.rentals.remove(&id).is_some())
    }

    async fn complete_rentals(&self, ids: &[RentalId], now: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.write()?;
        let mut changed = 0;
        for id in ids {
            if let Some(rental) = tables.rentals.get_mut(id) {
                if rental.complete(now) {
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }

    async fn cancel_rentals(&self, ids: &[RentalId], now: DateTime<Utc>) -> StoreResult<u64> {
        let mut tables = self.write()?;
        let mut changed = 0;
        for id in ids {
            if let Some(rental) = tables.rentals.get_mut(id) {
                if rental.cancel(now) {
                    changed += 1;
                }
            }
        }
        Ok(changed)
    }
}

#[async_trait]
impl MovementStore for InMemoryStore {
    async fn record_movement(&self, movement: &InventoryMovement) -> StoreResult<Product> {
        let mut guard = self.write()?;
        let tables = &mut *guard;

        if let Some(user_id) = movement.user_id {
            if !tables.users.contains(&user_id) {
                return Err(StoreError::NotFound("user"));
            }
        }
        let product = tables
            .products
            .get_mut(&movement.product_id)
            .ok_or(StoreError::NotFound("product"))?;
        apply_delta(product, movement.delta()).map_err(|e| StoreError::Rejected(e.to_string()))?;
        let updated = product.clone();

        tables.movements.insert(movement.clone());
        Ok(updated)
    }

    async fn list_movements(
        &self,
        product_id: Option<ProductId>,
    ) -> StoreResult<Vec<MovementWithDetails>> {
        let tables = self.read()?;
        Ok(tables
            .movements
            .iter()
            .filter(|m| product_id.is_none_or(|id| m.product_id == id))
            .filter_map(|m| {
                let product = tables.products.get(&m.product_id)?;
                let user = m.user_id.and_then(|id| tables.users.get(&id)).map(|u| UserSummary {
                    id: u.id,
                    username: u.username.clone(),
                    name: u.name.clone(),
                });
                Some(MovementWithDetails {
                    movement: m.clone(),
                    product: ProductSummary::from(product),
                    user,
                })
            })
            .collect())
    }
}
