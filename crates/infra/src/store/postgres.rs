//! Postgres-backed store.
//!
//! The schema lives in `migrations/` and is applied idempotently by
//! [`PostgresStore::migrate`]. Movement recording runs the quantity increment
//! and the movement insert in one transaction; the `UPDATE ... SET quantity =
//! quantity + $delta` takes the product's row lock, so concurrent movements on
//! the same product are serialized by the database instead of racing on a
//! read-modify-write.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{FromRow, PgPool, Row};
use tracing::{Span, instrument};
use uuid::Uuid;

use rentstock_core::{
    CategoryId, DomainError, MovementId, ProductId, RentalId, SupplierId, UserId,
};
use rentstock_inventory::{InventoryMovement, MovementWithDetails, ProductSummary, UserSummary};
use rentstock_parties::{Supplier, SupplierChanges, User};
use rentstock_products::{
    Category, CategoryChanges, Product, ProductChanges, ProductWithCategory,
};
use rentstock_rentals::{Rental, RentalWithSupplier};

use super::{
    CategoryStore, MovementStore, ProductFilter, ProductStore, RentalStore, StoreError,
    StoreResult, SupplierStore, UserStore,
};

const SCHEMA: &str = include_str!("../../migrations/0001_rentstock_schema.sql");

macro_rules! product_columns {
    () => {
        "p.id, p.code, p.name, p.description, p.category_id, p.unit_price, \
         p.quantity, p.min_stock, p.is_rentable, p.created_at"
    };
}

macro_rules! product_select {
    () => {
        concat!(
            "SELECT ",
            product_columns!(),
            ", c.name AS category_name, c.description AS category_description \
             FROM products p LEFT JOIN categories c ON c.id = p.category_id"
        )
    };
}

macro_rules! rental_select {
    () => {
        "SELECT r.id, r.supplier_id, r.equipment_name, r.equipment_type, r.quantity, \
                r.start_date, r.end_date, r.rental_period, r.daily_rate, r.total_amount, \
                r.status, r.notes, r.created_at, r.updated_at, \
                s.name AS supplier_name, s.email AS supplier_email, \
                s.phone AS supplier_phone, s.address AS supplier_address, \
                s.document AS supplier_document, s.created_at AS supplier_created_at \
         FROM rentals r JOIN suppliers s ON s.id = r.supplier_id"
    };
}

/// Store over a shared `PgPool`.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self {
            pool: Arc::new(pool),
        }
    }

    /// Open a pool against `database_url`.
    #[instrument(skip(database_url), err)]
    pub async fn connect(database_url: &str, max_connections: u32) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .connect(database_url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create any missing tables and indexes.
    #[instrument(skip(self), err)]
    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
        Ok(())
    }
}

#[async_trait]
impl CategoryStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_categories(&self) -> StoreResult<Vec<Category>> {
        let rows = sqlx::query("SELECT id, name, description FROM categories ORDER BY name, id")
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_categories", e))?;
        decode_all::<CategoryRow>(&rows).map(|rows| rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn get_category(&self, id: CategoryId) -> StoreResult<Option<Category>> {
        let row = sqlx::query("SELECT id, name, description FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_category", e))?;
        row.as_ref().map(|r| decode::<CategoryRow>(r).map(|c| c.0)).transpose()
    }

    #[instrument(skip(self, category), fields(category_id = %category.id), err)]
    async fn insert_category(&self, category: Category) -> StoreResult<Category> {
        sqlx::query("INSERT INTO categories (id, name, description) VALUES ($1, $2, $3)")
            .bind(category.id.as_uuid())
            .bind(&category.name)
            .bind(&category.description)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("insert_category", e))?;
        Ok(category)
    }

    #[instrument(skip(self, changes), fields(category_id = %id), err)]
    async fn update_category(
        &self,
        id: CategoryId,
        changes: CategoryChanges,
    ) -> StoreResult<Option<Category>> {
        let row = sqlx::query(
            r#"
            UPDATE categories
            SET name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END
            WHERE id = $1
            RETURNING id, name, description
            "#,
        )
        .bind(id.as_uuid())
        .bind(changes.name)
        .bind(changes.description.is_some())
        .bind(changes.description.flatten())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_category", e))?;
        row.as_ref().map(|r| decode::<CategoryRow>(r).map(|c| c.0)).transpose()
    }

    #[instrument(skip(self), fields(category_id = %id), err)]
    async fn delete_category(&self, id: CategoryId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::Conflict("category is still assigned to products".to_string())
                } else {
                    map_sqlx_error("delete_category", e)
                }
            })?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl ProductStore for PostgresStore {
    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn list_products(&self, filter: ProductFilter) -> StoreResult<Vec<ProductWithCategory>> {
        let rows = sqlx::query(concat!(
            product_select!(),
            " WHERE ($1::uuid IS NULL OR p.category_id = $1) ORDER BY p.seq"
        ))
        .bind(filter.category_id.map(Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        Span::current().record("row_count", rows.len());
        decode_all::<JoinedProductRow>(&rows).map(|rows| rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn get_product(&self, id: ProductId) -> StoreResult<Option<ProductWithCategory>> {
        let row = sqlx::query(concat!(product_select!(), " WHERE p.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_product", e))?;
        row.as_ref()
            .map(|r| decode::<JoinedProductRow>(r).map(|p| p.0))
            .transpose()
    }

    #[instrument(skip(self, product), fields(product_id = %product.id, code = %product.code), err)]
    async fn insert_product(&self, product: Product) -> StoreResult<Product> {
        sqlx::query(
            r#"
            INSERT INTO products (
                id, code, name, description, category_id,
                unit_price, quantity, min_stock, is_rentable, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            "#,
        )
        .bind(product.id.as_uuid())
        .bind(&product.code)
        .bind(&product.name)
        .bind(&product.description)
        .bind(product.category_id.map(Uuid::from))
        .bind(product.unit_price)
        .bind(product.quantity)
        .bind(product.min_stock)
        .bind(product.is_rentable)
        .bind(product.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| product_write_error("insert_product", e))?;
        Ok(product)
    }

    #[instrument(skip(self, changes), fields(product_id = %id), err)]
    async fn update_product(
        &self,
        id: ProductId,
        changes: ProductChanges,
    ) -> StoreResult<Option<Product>> {
        // `quantity` only moves through `record_movement`. Nullable columns
        // carry a "provided" flag so an explicit null clears them.
        let row = sqlx::query(concat!(
            r#"
            UPDATE products AS p
            SET code = COALESCE($2, p.code),
                name = COALESCE($3, p.name),
                description = CASE WHEN $4 THEN $5 ELSE p.description END,
                category_id = CASE WHEN $6 THEN $7 ELSE p.category_id END,
                unit_price = COALESCE($8, p.unit_price),
                min_stock = COALESCE($9, p.min_stock),
                is_rentable = COALESCE($10, p.is_rentable)
            WHERE p.id = $1
            RETURNING "#,
            product_columns!()
        ))
        .bind(id.as_uuid())
        .bind(changes.code)
        .bind(changes.name)
        .bind(changes.description.is_some())
        .bind(changes.description.flatten())
        .bind(changes.category_id.is_some())
        .bind(changes.category_id.flatten().map(Uuid::from))
        .bind(changes.unit_price)
        .bind(changes.min_stock)
        .bind(changes.is_rentable)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| product_write_error("update_product", e))?;
        row.as_ref().map(|r| decode::<ProductRow>(r).map(|p| p.0)).transpose()
    }

    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn delete_product(&self, id: ProductId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::Conflict("product has inventory movements".to_string())
                } else {
                    map_sqlx_error("delete_product", e)
                }
            })?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn list_low_stock(&self) -> StoreResult<Vec<ProductWithCategory>> {
        let rows = sqlx::query(concat!(
            product_select!(),
            " WHERE p.quantity <= p.min_stock ORDER BY p.seq"
        ))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_low_stock", e))?;

        Span::current().record("row_count", rows.len());
        decode_all::<JoinedProductRow>(&rows).map(|rows| rows.into_iter().map(|r| r.0).collect())
    }
}

#[async_trait]
impl SupplierStore for PostgresStore {
    #[instrument(skip(self), err)]
    async fn list_suppliers(&self) -> StoreResult<Vec<Supplier>> {
        let rows = sqlx::query(
            "SELECT id, name, email, phone, address, document, created_at \
             FROM suppliers ORDER BY name, id",
        )
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_suppliers", e))?;
        decode_all::<SupplierRow>(&rows).map(|rows| rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self), fields(supplier_id = %id), err)]
    async fn get_supplier(&self, id: SupplierId) -> StoreResult<Option<Supplier>> {
        let row = sqlx::query(
            "SELECT id, name, email, phone, address, document, created_at \
             FROM suppliers WHERE id = $1",
        )
        .bind(id.as_uuid())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_supplier", e))?;
        row.as_ref().map(|r| decode::<SupplierRow>(r).map(|s| s.0)).transpose()
    }

    #[instrument(skip(self, supplier), fields(supplier_id = %supplier.id), err)]
    async fn insert_supplier(&self, supplier: Supplier) -> StoreResult<Supplier> {
        sqlx::query(
            r#"
            INSERT INTO suppliers (id, name, email, phone, address, document, created_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(supplier.id.as_uuid())
        .bind(&supplier.name)
        .bind(&supplier.email)
        .bind(&supplier.phone)
        .bind(&supplier.address)
        .bind(&supplier.document)
        .bind(supplier.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_supplier", e))?;
        Ok(supplier)
    }

    #[instrument(skip(self, changes), fields(supplier_id = %id), err)]
    async fn update_supplier(
        &self,
        id: SupplierId,
        changes: SupplierChanges,
    ) -> StoreResult<Option<Supplier>> {
        let row = sqlx::query(
            r#"
            UPDATE suppliers
            SET name = COALESCE($2, name),
                email = COALESCE($3, email),
                phone = CASE WHEN $4 THEN $5 ELSE phone END,
                address = CASE WHEN $6 THEN $7 ELSE address END,
                document = CASE WHEN $8 THEN $9 ELSE document END
            WHERE id = $1
            RETURNING id, name, email, phone, address, document, created_at
            "#,
        )
        .bind(id.as_uuid())
        .bind(changes.name)
        .bind(changes.email)
        .bind(changes.phone.is_some())
        .bind(changes.phone.flatten())
        .bind(changes.address.is_some())
        .bind(changes.address.flatten())
        .bind(changes.document.is_some())
        .bind(changes.document.flatten())
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_supplier", e))?;
        row.as_ref().map(|r| decode::<SupplierRow>(r).map(|s| s.0)).transpose()
    }

    #[instrument(skip(self), fields(supplier_id = %id), err)]
    async fn delete_supplier(&self, id: SupplierId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM suppliers WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| {
                if is_foreign_key_violation(&e) {
                    StoreError::Conflict("supplier is referenced by rentals".to_string())
                } else {
                    map_sqlx_error("delete_supplier", e)
                }
            })?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl UserStore for PostgresStore {
    #[instrument(skip(self, user), fields(user_id = %user.id, username = %user.username), err)]
    async fn insert_user(&self, user: User) -> StoreResult<User> {
        sqlx::query("INSERT INTO users (id, username, name, email, role) VALUES ($1, $2, $3, $4, $5)")
            .bind(user.id.as_uuid())
            .bind(&user.username)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.role)
            .execute(&*self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    StoreError::Conflict(format!("username {:?} already exists", user.username))
                } else {
                    map_sqlx_error("insert_user", e)
                }
            })?;
        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %id), err)]
    async fn get_user(&self, id: UserId) -> StoreResult<Option<User>> {
        let row = sqlx::query("SELECT id, username, name, email, role FROM users WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        row.as_ref().map(|r| decode::<UserRow>(r).map(|u| u.0)).transpose()
    }
}

#[async_trait]
impl RentalStore for PostgresStore {
    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn list_rentals(&self) -> StoreResult<Vec<RentalWithSupplier>> {
        let rows = sqlx::query(concat!(rental_select!(), " ORDER BY r.created_at DESC, r.seq DESC"))
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_rentals", e))?;

        Span::current().record("row_count", rows.len());
        decode_all::<JoinedRentalRow>(&rows).map(|rows| rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self), fields(rental_id = %id), err)]
    async fn get_rental(&self, id: RentalId) -> StoreResult<Option<RentalWithSupplier>> {
        let row = sqlx::query(concat!(rental_select!(), " WHERE r.id = $1"))
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_rental", e))?;
        row.as_ref()
            .map(|r| decode::<JoinedRentalRow>(r).map(|r| r.0))
            .transpose()
    }

    #[instrument(skip(self, rental), fields(rental_id = %rental.id), err)]
    async fn insert_rental(&self, rental: Rental) -> StoreResult<Rental> {
        sqlx::query(
            r#"
            INSERT INTO rentals (
                id, supplier_id, equipment_name, equipment_type, quantity,
                start_date, end_date, rental_period, daily_rate, total_amount,
                status, notes, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            "#,
        )
        .bind(rental.id.as_uuid())
        .bind(rental.supplier_id.as_uuid())
        .bind(&rental.equipment_name)
        .bind(&rental.equipment_type)
        .bind(rental.quantity)
        .bind(rental.start_date)
        .bind(rental.end_date)
        .bind(rental.rental_period.as_str())
        .bind(rental.daily_rate)
        .bind(rental.total_amount)
        .bind(rental.status.as_str())
        .bind(&rental.notes)
        .bind(rental.created_at)
        .bind(rental.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| rental_write_error("insert_rental", e))?;
        Ok(rental)
    }

    #[instrument(skip(self, rental), fields(rental_id = %rental.id), err)]
    async fn save_rental(&self, rental: &Rental) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE rentals
            SET supplier_id = $2,
                equipment_name = $3,
                equipment_type = $4,
                quantity = $5,
                start_date = $6,
                end_date = $7,
                rental_period = $8,
                daily_rate = $9,
                total_amount = $10,
                status = $11,
                notes = $12,
                updated_at = $13
            WHERE id = $1
            "#,
        )
        .bind(rental.id.as_uuid())
        .bind(rental.supplier_id.as_uuid())
        .bind(&rental.equipment_name)
        .bind(&rental.equipment_type)
        .bind(rental.quantity)
        .bind(rental.start_date)
        .bind(rental.end_date)
        .bind(rental.rental_period.as_str())
        .bind(rental.daily_rate)
        .bind(rental.total_amount)
        .bind(rental.status.as_str())
        .bind(&rental.notes)
        .bind(rental.updated_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| rental_write_error("save_rental", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), fields(rental_id = %id), err)]
    async fn delete_rental(&self, id: RentalId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM rentals WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_rental", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()), err)]
    async fn complete_rentals(&self, ids: &[RentalId], now: DateTime<Utc>) -> StoreResult<u64> {
        let ids: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();
        let result = sqlx::query(
            "UPDATE rentals SET status = 'completed', updated_at = $2 \
             WHERE id = ANY($1) AND status = 'active'",
        )
        .bind(&ids)
        .bind(now)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("complete_rentals", e))?;
        Ok(result.rows_affected())
    }

    #[instrument(skip(self, ids), fields(requested = ids.len()), err)]
    async fn cancel_rentals(&self, ids: &[RentalId], now: DateTime<Utc>) -> StoreResult<u64> {
        let ids: Vec<Uuid> = ids.iter().copied().map(Uuid::from).collect();
        let result = sqlx::query(
            "UPDATE rentals SET status = 'cancelled', updated_at = $2 \
             WHERE id = ANY($1) AND status NOT IN ('completed', 'cancelled')",
        )
        .bind(&ids)
        .bind(now)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("cancel_rentals", e))?;
        Ok(result.rows_affected())
    }
}

#[async_trait]
impl MovementStore for PostgresStore {
    #[instrument(
        skip(self, movement),
        fields(
            movement_id = %movement.id,
            product_id = %movement.product_id,
            movement_type = %movement.movement_type,
            operation = tracing::field::Empty
        ),
        err
    )]
    async fn record_movement(&self, movement: &InventoryMovement) -> StoreResult<Product> {
        let span = Span::current();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        if let Some(user_id) = movement.user_id {
            span.record("operation", "check_user");
            let user = sqlx::query("SELECT 1 FROM users WHERE id = $1")
                .bind(user_id.as_uuid())
                .fetch_optional(&mut *tx)
                .await
                .map_err(|e| map_sqlx_error("check_user", e))?;
            if user.is_none() {
                tx.rollback()
                    .await
                    .map_err(|e| map_sqlx_error("rollback", e))?;
                return Err(StoreError::NotFound("user"));
            }
        }

        span.record("operation", "apply_delta");
        let row = sqlx::query(concat!(
            "UPDATE products AS p SET quantity = p.quantity + $2 WHERE p.id = $1 RETURNING ",
            product_columns!()
        ))
        .bind(movement.product_id.as_uuid())
        .bind(movement.delta())
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("apply_delta", e))?;

        let Some(row) = row else {
            tx.rollback()
                .await
                .map_err(|e| map_sqlx_error("rollback", e))?;
            return Err(StoreError::NotFound("product"));
        };
        let product = decode::<ProductRow>(&row)?.0;

        span.record("operation", "insert_movement");
        sqlx::query(
            r#"
            INSERT INTO inventory_movements (
                id, product_id, type, quantity, reason, notes, user_id, created_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            "#,
        )
        .bind(movement.id.as_uuid())
        .bind(movement.product_id.as_uuid())
        .bind(movement.movement_type.as_str())
        .bind(movement.quantity)
        .bind(&movement.reason)
        .bind(&movement.notes)
        .bind(movement.user_id.map(Uuid::from))
        .bind(movement.created_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_movement", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        Ok(product)
    }

    #[instrument(skip(self), fields(row_count = tracing::field::Empty), err)]
    async fn list_movements(
        &self,
        product_id: Option<ProductId>,
    ) -> StoreResult<Vec<MovementWithDetails>> {
        let rows = sqlx::query(
            r#"
            SELECT
                m.id, m.product_id, m.type, m.quantity, m.reason, m.notes,
                m.user_id, m.created_at,
                p.code AS product_code,
                p.name AS product_name,
                p.quantity AS product_quantity,
                p.min_stock AS product_min_stock,
                u.username AS user_username,
                u.name AS user_name
            FROM inventory_movements m
            JOIN products p ON p.id = m.product_id
            LEFT JOIN users u ON u.id = m.user_id
            WHERE ($1::uuid IS NULL OR m.product_id = $1)
            ORDER BY m.seq ASC
            "#,
        )
        .bind(product_id.map(Uuid::from))
        .fetch_all(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_movements", e))?;

        Span::current().record("row_count", rows.len());
        decode_all::<MovementDetailsRow>(&rows).map(|rows| rows.into_iter().map(|r| r.0).collect())
    }
}

fn decode<T>(row: &PgRow) -> StoreResult<T>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    T::from_row(row).map_err(|e| StoreError::Backend(format!("failed to decode row: {e}")))
}

fn decode_all<T>(rows: &[PgRow]) -> StoreResult<Vec<T>>
where
    T: for<'r> FromRow<'r, PgRow>,
{
    rows.iter().map(decode).collect()
}

fn invalid_column(err: DomainError) -> sqlx::Error {
    sqlx::Error::Decode(Box::new(err))
}

struct CategoryRow(Category);

impl<'r> FromRow<'r, PgRow> for CategoryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(CategoryRow(Category {
            id: CategoryId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            description: row.try_get("description")?,
        }))
    }
}

struct ProductRow(Product);

impl<'r> FromRow<'r, PgRow> for ProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let category_id: Option<Uuid> = row.try_get("category_id")?;
        Ok(ProductRow(Product {
            id: ProductId::from_uuid(row.try_get("id")?),
            code: row.try_get("code")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            category_id: category_id.map(CategoryId::from_uuid),
            unit_price: row.try_get("unit_price")?,
            quantity: row.try_get("quantity")?,
            min_stock: row.try_get("min_stock")?,
            is_rentable: row.try_get("is_rentable")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}

struct JoinedProductRow(ProductWithCategory);

impl<'r> FromRow<'r, PgRow> for JoinedProductRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let product = ProductRow::from_row(row)?.0;
        let category_name: Option<String> = row.try_get("category_name")?;
        let category = match (product.category_id, category_name) {
            (Some(id), Some(name)) => Some(Category {
                id,
                name,
                description: row.try_get("category_description")?,
            }),
            _ => None,
        };
        Ok(JoinedProductRow(ProductWithCategory { product, category }))
    }
}

struct SupplierRow(Supplier);

impl<'r> FromRow<'r, PgRow> for SupplierRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(SupplierRow(Supplier {
            id: SupplierId::from_uuid(row.try_get("id")?),
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            phone: row.try_get("phone")?,
            address: row.try_get("address")?,
            document: row.try_get("document")?,
            created_at: row.try_get("created_at")?,
        }))
    }
}

struct UserRow(User);

impl<'r> FromRow<'r, PgRow> for UserRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(UserRow(User {
            id: UserId::from_uuid(row.try_get("id")?),
            username: row.try_get("username")?,
            name: row.try_get("name")?,
            email: row.try_get("email")?,
            role: row.try_get("role")?,
        }))
    }
}

struct JoinedRentalRow(RentalWithSupplier);

impl<'r> FromRow<'r, PgRow> for JoinedRentalRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let supplier_id = SupplierId::from_uuid(row.try_get("supplier_id")?);
        let period: String = row.try_get("rental_period")?;
        let status: String = row.try_get("status")?;

        let rental = Rental {
            id: RentalId::from_uuid(row.try_get("id")?),
            supplier_id,
            equipment_name: row.try_get("equipment_name")?,
            equipment_type: row.try_get("equipment_type")?,
            quantity: row.try_get("quantity")?,
            start_date: row.try_get("start_date")?,
            end_date: row.try_get("end_date")?,
            rental_period: period.parse().map_err(invalid_column)?,
            daily_rate: row.try_get("daily_rate")?,
            total_amount: row.try_get("total_amount")?,
            status: status.parse().map_err(invalid_column)?,
            notes: row.try_get("notes")?,
            created_at: row.try_get("created_at")?,
            updated_at: row.try_get("updated_at")?,
        };
        let supplier = Supplier {
            id: supplier_id,
            name: row.try_get("supplier_name")?,
            email: row.try_get("supplier_email")?,
            phone: row.try_get("supplier_phone")?,
            address: row.try_get("supplier_address")?,
            document: row.try_get("supplier_document")?,
            created_at: row.try_get("supplier_created_at")?,
        };
        Ok(JoinedRentalRow(RentalWithSupplier { rental, supplier }))
    }
}

struct MovementDetailsRow(MovementWithDetails);

impl<'r> FromRow<'r, PgRow> for MovementDetailsRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        let product_id = ProductId::from_uuid(row.try_get("product_id")?);
        let user_id: Option<Uuid> = row.try_get("user_id")?;
        let user_id = user_id.map(UserId::from_uuid);
        let kind: String = row.try_get("type")?;

        let movement = InventoryMovement {
            id: MovementId::from_uuid(row.try_get("id")?),
            product_id,
            movement_type: kind.parse().map_err(invalid_column)?,
            quantity: row.try_get("quantity")?,
            reason: row.try_get("reason")?,
            notes: row.try_get("notes")?,
            user_id,
            created_at: row.try_get("created_at")?,
        };
        let product = ProductSummary {
            id: product_id,
            code: row.try_get("product_code")?,
            name: row.try_get("product_name")?,
            quantity: row.try_get("product_quantity")?,
            min_stock: row.try_get("product_min_stock")?,
        };
        let username: Option<String> = row.try_get("user_username")?;
        let user = match (user_id, username) {
            (Some(id), Some(username)) => Some(UserSummary {
                id,
                username,
                name: row.try_get("user_name")?,
            }),
            _ => None,
        };
        Ok(MovementDetailsRow(MovementWithDetails {
            movement,
            product,
            user,
        }))
    }
}

fn product_write_error(operation: &str, err: sqlx::Error) -> StoreError {
    if is_foreign_key_violation(&err) {
        StoreError::NotFound("category")
    } else if is_unique_violation(&err) {
        StoreError::Conflict("product code already exists".to_string())
    } else {
        map_sqlx_error(operation, err)
    }
}

fn rental_write_error(operation: &str, err: sqlx::Error) -> StoreError {
    if is_foreign_key_violation(&err) {
        StoreError::NotFound("supplier")
    } else {
        map_sqlx_error(operation, err)
    }
}

/// Map SQLx errors to store errors.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("database error in {}: {}", operation, db_err.message());
            match db_err.code().as_deref() {
                // unique / foreign key violation
                Some("23505") | Some("23503") => StoreError::Conflict(msg),
                // check constraint / numeric out of range
                Some("23514") | Some("22003") => StoreError::Rejected(msg),
                _ => StoreError::Backend(msg),
            }
        }
        sqlx::Error::PoolClosed => {
            StoreError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => StoreError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn has_code(err: &sqlx::Error, expected: &str) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.code().as_deref() == Some(expected),
        _ => false,
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    has_code(err, "23505")
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    has_code(err, "23503")
}
