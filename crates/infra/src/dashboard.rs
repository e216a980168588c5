//! Aggregate figures for the dashboard summary.

use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use rentstock_inventory::is_low_stock;
use rentstock_products::Product;
use rentstock_rentals::{Rental, RentalStatus};

use crate::store::{ProductFilter, ProductStore, RentalStore, StoreResult};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub active_rentals: u64,
    /// Sum of `totalAmount` over active rentals.
    pub monthly_revenue: Decimal,
    /// Sum of all product quantities.
    pub products_in_stock: i64,
    pub low_stock_items: u64,
}

impl DashboardStats {
    pub fn compute<'a>(
        products: impl IntoIterator<Item = &'a Product>,
        rentals: impl IntoIterator<Item = &'a Rental>,
    ) -> Self {
        let mut stats = DashboardStats {
            active_rentals: 0,
            monthly_revenue: Decimal::ZERO,
            products_in_stock: 0,
            low_stock_items: 0,
        };

        for rental in rentals {
            if rental.status == RentalStatus::Active {
                stats.active_rentals += 1;
                stats.monthly_revenue = stats.monthly_revenue.saturating_add(rental.total_amount);
            }
        }
        for product in products {
            stats.products_in_stock = stats.products_in_stock.saturating_add(product.quantity);
            if is_low_stock(product) {
                stats.low_stock_items += 1;
            }
        }
        stats
    }

    #[instrument(skip(store), err)]
    pub async fn load<S>(store: &S) -> StoreResult<Self>
    where
        S: ProductStore + RentalStore + ?Sized,
    {
        let products = store.list_products(ProductFilter::default()).await?;
        let rentals = store.list_rentals().await?;
        Ok(Self::compute(
            products.iter().map(|p| &p.product),
            rentals.iter().map(|r| &r.rental),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use rentstock_core::{ProductId, RentalId, SupplierId};
    use rentstock_products::NewProduct;
    use rentstock_rentals::NewRental;

    fn product(quantity: i64, min_stock: i64) -> Product {
        NewProduct {
            code: format!("P-{quantity}-{min_stock}"),
            name: "Part".to_string(),
            description: None,
            category_id: None,
            unit_price: Decimal::ONE,
            quantity,
            min_stock,
            is_rentable: false,
        }
        .into_product(ProductId::new(), Utc::now())
    }

    fn rental(status: RentalStatus, total: i64) -> Rental {
        let start = Utc::now();
        NewRental {
            supplier_id: SupplierId::new(),
            equipment_name: "Excavator".to_string(),
            equipment_type: None,
            quantity: 1,
            start_date: start,
            end_date: start + Duration::days(5),
            rental_period: Default::default(),
            daily_rate: Decimal::new(35000, 2),
            total_amount: Some(Decimal::new(total, 0)),
            status: Some(status),
            notes: None,
        }
        .into_rental(RentalId::new(), start)
    }

    #[test]
    fn counts_only_active_rentals() {
        let rentals = [
            rental(RentalStatus::Active, 1750),
            rental(RentalStatus::Active, 250),
            rental(RentalStatus::Completed, 999),
            rental(RentalStatus::Pending, 10),
        ];
        let stats = DashboardStats::compute(&[] as &[Product], &rentals);
        assert_eq!(stats.active_rentals, 2);
        assert_eq!(stats.monthly_revenue, Decimal::new(2000, 0));
    }

    #[test]
    fn sums_stock_and_counts_low_items() {
        let products = [product(15, 5), product(12, 50), product(0, 0)];
        let stats = DashboardStats::compute(&products, &[] as &[Rental]);
        assert_eq!(stats.products_in_stock, 27);
        assert_eq!(stats.low_stock_items, 2);
    }

    #[test]
    fn serializes_camel_case() {
        let stats = DashboardStats::compute(&[] as &[Product], &[] as &[Rental]);
        let json = serde_json::to_value(&stats).unwrap();
        assert_eq!(json["activeRentals"], 0);
        assert_eq!(json["lowStockItems"], 0);
        assert_eq!(json["monthlyRevenue"], "0");
    }
}
