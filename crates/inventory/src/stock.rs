use serde::{Deserialize, Serialize};

use rentstock_core::{DomainError, DomainResult};
use rentstock_products::Product;

use crate::movement::InventoryMovement;

/// Stock-level classification, derived on every read.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StockStatus {
    OutOfStock,
    Low,
    InStock,
}

impl StockStatus {
    /// Out-of-stock wins over low; both are checked against the current quantity.
    pub fn classify(quantity: i64, min_stock: i64) -> Self {
        if quantity <= 0 {
            StockStatus::OutOfStock
        } else if quantity <= min_stock {
            StockStatus::Low
        } else {
            StockStatus::InStock
        }
    }

    pub fn of(product: &Product) -> Self {
        Self::classify(product.quantity, product.min_stock)
    }
}

/// Low-stock alert condition (inclusive threshold).
pub fn is_low_stock(product: &Product) -> bool {
    product.quantity <= product.min_stock
}

/// Apply a signed movement delta to a product and return the new quantity.
///
/// There is no floor at zero: issuing more than is on hand drives the
/// quantity negative.
pub fn apply_delta(product: &mut Product, delta: i64) -> DomainResult<i64> {
    let next = product
        .quantity
        .checked_add(delta)
        .ok_or_else(|| DomainError::invariant("stock quantity overflow"))?;
    product.quantity = next;
    Ok(next)
}

/// Recompute a quantity from an opening balance and a movement history.
pub fn replay<'a>(opening: i64, movements: impl IntoIterator<Item = &'a InventoryMovement>) -> i64 {
    movements.into_iter().fold(opening, |qty, m| qty + m.delta())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rentstock_core::{MovementId, ProductId};
    use rust_decimal::Decimal;

    use crate::movement::{MovementRequest, MovementType};

    fn product(quantity: i64, min_stock: i64) -> Product {
        Product {
            id: ProductId::new(),
            code: "FI-001".to_string(),
            name: "Drill".to_string(),
            description: None,
            category_id: None,
            unit_price: Decimal::new(45000, 2),
            quantity,
            min_stock,
            is_rentable: true,
            created_at: Utc::now(),
        }
    }

    fn movement(product_id: ProductId, kind: MovementType, quantity: i64) -> InventoryMovement {
        MovementRequest {
            product_id,
            movement_type: kind,
            quantity,
            reason: "test".to_string(),
            notes: None,
            user_id: None,
        }
        .into_movement(MovementId::new(), Utc::now())
    }

    #[test]
    fn classification_boundaries() {
        assert_eq!(StockStatus::classify(0, 5), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(-3, 5), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(5, 5), StockStatus::Low);
        assert_eq!(StockStatus::classify(6, 5), StockStatus::InStock);
        assert_eq!(StockStatus::classify(0, 0), StockStatus::OutOfStock);
        assert_eq!(StockStatus::classify(1, 0), StockStatus::InStock);
    }

    #[test]
    fn low_stock_threshold_is_inclusive() {
        assert!(is_low_stock(&product(5, 5)));
        assert!(is_low_stock(&product(0, 0)));
        assert!(!is_low_stock(&product(6, 5)));
    }

    #[test]
    fn receiving_five_on_ten_gives_fifteen() {
        let mut p = product(10, 2);
        assert_eq!(apply_delta(&mut p, 5).unwrap(), 15);
    }

    #[test]
    fn issuing_past_zero_goes_negative() {
        let mut p = product(10, 2);
        let delta = crate::signed_delta(MovementType::Out, 20).unwrap();
        assert_eq!(apply_delta(&mut p, delta).unwrap(), -10);
        assert_eq!(StockStatus::of(&p), StockStatus::OutOfStock);
    }

    #[test]
    fn overflow_is_an_invariant_violation() {
        let mut p = product(i64::MAX, 0);
        assert!(matches!(apply_delta(&mut p, 1), Err(DomainError::InvariantViolation(_))));
        assert_eq!(p.quantity, i64::MAX);
    }

    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        fn kind_and_quantity() -> impl Strategy<Value = (MovementType, i64)> {
            prop_oneof![
                (1i64..1_000).prop_map(|q| (MovementType::In, q)),
                (1i64..1_000).prop_map(|q| (MovementType::Out, q)),
                (-1_000i64..1_000)
                    .prop_filter("non-zero", |q| *q != 0)
                    .prop_map(|q| (MovementType::Adjustment, q)),
            ]
        }

        proptest! {
            /// Property: the running quantity equals opening + Σin − Σout + Σadjustment.
            #[test]
            fn quantity_is_opening_plus_signed_sum(
                opening in 0i64..10_000,
                ops in proptest::collection::vec(kind_and_quantity(), 0..50),
            ) {
                let mut p = product(opening, 0);
                let mut history = Vec::new();
                for (kind, q) in &ops {
                    let delta = crate::signed_delta(*kind, *q).unwrap();
                    apply_delta(&mut p, delta).unwrap();
                    history.push(movement(p.id, *kind, *q));
                }

                let ins: i64 = ops.iter().filter(|(k, _)| *k == MovementType::In).map(|(_, q)| q).sum();
                let outs: i64 = ops.iter().filter(|(k, _)| *k == MovementType::Out).map(|(_, q)| q).sum();
                let adjs: i64 = ops.iter().filter(|(k, _)| *k == MovementType::Adjustment).map(|(_, q)| q).sum();

                prop_assert_eq!(p.quantity, opening + ins - outs + adjs);
                prop_assert_eq!(replay(opening, &history), p.quantity);
            }

            /// Property: low-stock selection is exactly `quantity <= min_stock`.
            #[test]
            fn low_stock_partition(
                levels in proptest::collection::vec((-50i64..200, 0i64..100), 0..40),
            ) {
                let products: Vec<Product> = levels.iter().map(|(q, m)| product(*q, *m)).collect();
                let low: Vec<&Product> = products.iter().filter(|p| is_low_stock(p)).collect();
                for p in &products {
                    let selected = low.iter().any(|l| l.id == p.id);
                    prop_assert_eq!(selected, p.quantity <= p.min_stock);
                }
            }
        }
    }
}
