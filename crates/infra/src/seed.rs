//! Demo catalogue for development stores.

use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use tracing::{info, instrument};

use rentstock_core::{CategoryId, ProductId, RentalId, SupplierId};
use rentstock_parties::NewSupplier;
use rentstock_products::{NewCategory, NewProduct};
use rentstock_rentals::{NewRental, RentalPeriod, RentalStatus};

use crate::store::{
    CategoryStore, ProductFilter, ProductStore, RentalStore, Storage, StoreResult, SupplierStore,
};

/// Seed two categories, two products (one already low on stock), one
/// supplier and one active rental. Does nothing if any product exists.
///
/// Returns whether anything was written.
#[instrument(skip(store), err)]
pub async fn seed_demo_data<S>(store: &S) -> StoreResult<bool>
where
    S: Storage + ?Sized,
{
    if !store.list_products(ProductFilter::default()).await?.is_empty() {
        return Ok(false);
    }

    let now = Utc::now();

    let tools = store
        .insert_category(
            NewCategory {
                name: "Tools".to_string(),
                description: Some("Power tools and general equipment".to_string()),
            }
            .into_category(CategoryId::new()),
        )
        .await?;
    let fasteners = store
        .insert_category(
            NewCategory {
                name: "Fasteners".to_string(),
                description: Some("Screws, nuts and fixings".to_string()),
            }
            .into_category(CategoryId::new()),
        )
        .await?;

    store
        .insert_product(
            NewProduct {
                code: "FI-001".to_string(),
                name: "Industrial drill".to_string(),
                description: Some("18V cordless".to_string()),
                category_id: Some(tools.id),
                unit_price: Decimal::new(45000, 2),
                quantity: 15,
                min_stock: 5,
                is_rentable: true,
            }
            .into_product(ProductId::new(), now),
        )
        .await?;
    store
        .insert_product(
            NewProduct {
                code: "PF-M8-001".to_string(),
                name: "M8 screws".to_string(),
                description: Some("Stainless steel, 30mm".to_string()),
                category_id: Some(fasteners.id),
                unit_price: Decimal::new(250, 2),
                quantity: 12,
                min_stock: 50,
                is_rentable: false,
            }
            .into_product(ProductId::new(), now),
        )
        .await?;

    let supplier = store
        .insert_supplier(
            NewSupplier {
                name: "ABC Equipment Rentals".to_string(),
                email: "contact@abc-rentals.example".to_string(),
                phone: Some("+1 555 0100".to_string()),
                address: Some("500 Industrial Ave".to_string()),
                document: Some("12-3456789".to_string()),
            }
            .into_supplier(SupplierId::new(), now),
        )
        .await?;

    let start = now - Duration::days(2);
    store
        .insert_rental(
            NewRental {
                supplier_id: supplier.id,
                equipment_name: "Hydraulic excavator".to_string(),
                equipment_type: Some("Heavy machinery".to_string()),
                quantity: 1,
                start_date: start,
                end_date: start + Duration::days(5),
                rental_period: RentalPeriod::Daily,
                daily_rate: Decimal::new(35000, 2),
                total_amount: None,
                status: Some(RentalStatus::Active),
                notes: Some("Earthworks site".to_string()),
            }
            .into_rental(RentalId::new(), now),
        )
        .await?;

    info!("demo data seeded");
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::DashboardStats;
    use crate::store::InMemoryStore;

    #[tokio::test]
    async fn seeds_once() {
        let store = InMemoryStore::new();
        assert!(seed_demo_data(&store).await.unwrap());
        assert!(!seed_demo_data(&store).await.unwrap());

        assert_eq!(store.list_products(ProductFilter::default()).await.unwrap().len(), 2);
        assert_eq!(store.list_rentals().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn seeded_catalogue_has_one_low_stock_product() {
        let store = InMemoryStore::new();
        seed_demo_data(&store).await.unwrap();

        let low = store.list_low_stock().await.unwrap();
        assert_eq!(low.len(), 1);
        assert_eq!(low[0].product.code, "PF-M8-001");
        assert_eq!(low[0].category.as_ref().map(|c| c.name.as_str()), Some("Fasteners"));

        let stats = DashboardStats::load(&store).await.unwrap();
        assert_eq!(stats.active_rentals, 1);
        assert_eq!(stats.monthly_revenue, Decimal::new(175000, 2));
        assert_eq!(stats.products_in_stock, 27);
        assert_eq!(stats.low_stock_items, 1);
    }
}
