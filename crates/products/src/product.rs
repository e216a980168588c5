use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use rentstock_core::{
    patch, require_non_blank, CategoryId, DomainError, DomainResult, Entity, Patch, ProductId,
};

use crate::category::Category;

/// A stocked part, tool or rentable piece of equipment.
///
/// `quantity` is the authoritative current stock. After creation it only moves
/// through inventory movements.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: ProductId,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub category_id: Option<CategoryId>,
    pub unit_price: Decimal,
    pub quantity: i64,
    pub min_stock: i64,
    pub is_rentable: bool,
    pub created_at: DateTime<Utc>,
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

impl Product {
    pub fn apply_changes(&mut self, changes: ProductChanges) {
        if let Some(code) = changes.code {
            self.code = code;
        }
        if let Some(name) = changes.name {
            self.name = name;
        }
        patch::apply(&mut self.description, changes.description);
        patch::apply(&mut self.category_id, changes.category_id);
        if let Some(unit_price) = changes.unit_price {
            self.unit_price = unit_price;
        }
        if let Some(min_stock) = changes.min_stock {
            self.min_stock = min_stock;
        }
        if let Some(is_rentable) = changes.is_rentable {
            self.is_rentable = is_rentable;
        }
    }
}

/// Input for creating a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewProduct {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category_id: Option<CategoryId>,
    pub unit_price: Decimal,
    /// Opening stock; counts as the implicit first movement.
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub min_stock: i64,
    #[serde(default = "default_rentable")]
    pub is_rentable: bool,
}

fn default_rentable() -> bool {
    true
}

impl NewProduct {
    pub fn validate(&self) -> DomainResult<()> {
        require_non_blank("code", &self.code)?;
        require_non_blank("name", &self.name)?;
        validate_price(self.unit_price)?;
        validate_min_stock(self.min_stock)?;
        if self.quantity < 0 {
            return Err(DomainError::validation("opening quantity cannot be negative"));
        }
        Ok(())
    }

    pub fn into_product(self, id: ProductId, created_at: DateTime<Utc>) -> Product {
        Product {
            id,
            code: self.code.trim().to_string(),
            name: self.name,
            description: self.description.filter(|d| !d.trim().is_empty()),
            category_id: self.category_id,
            unit_price: self.unit_price,
            quantity: self.quantity,
            min_stock: self.min_stock,
            is_rentable: self.is_rentable,
            created_at,
        }
    }
}

/// Partial product update. Fields left `None` keep their current value; an
/// explicit `null` clears `description` or detaches the category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductChanges {
    pub code: Option<String>,
    pub name: Option<String>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub description: Patch<String>,
    #[serde(default, deserialize_with = "patch::nullable")]
    pub category_id: Patch<CategoryId>,
    pub unit_price: Option<Decimal>,
    pub min_stock: Option<i64>,
    pub is_rentable: Option<bool>,
}

impl ProductChanges {
    pub fn validate(&self) -> DomainResult<()> {
        if let Some(code) = &self.code {
            require_non_blank("code", code)?;
        }
        if let Some(name) = &self.name {
            require_non_blank("name", name)?;
        }
        if let Some(price) = self.unit_price {
            validate_price(price)?;
        }
        if let Some(min_stock) = self.min_stock {
            validate_min_stock(min_stock)?;
        }
        Ok(())
    }
}

fn validate_price(price: Decimal) -> DomainResult<()> {
    if price.is_sign_negative() {
        return Err(DomainError::validation("unitPrice cannot be negative"));
    }
    if price.scale() > 2 {
        return Err(DomainError::validation("unitPrice supports at most 2 decimal places"));
    }
    Ok(())
}

fn validate_min_stock(min_stock: i64) -> DomainResult<()> {
    if min_stock < 0 {
        return Err(DomainError::validation("minStock cannot be negative"));
    }
    Ok(())
}

/// Product joined with its category for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductWithCategory {
    #[serde(flatten)]
    pub product: Product,
    pub category: Option<Category>,
}
