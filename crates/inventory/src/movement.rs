use core::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use rentstock_core::{
    require_non_blank, DomainError, DomainResult, Entity, MovementId, ProductId, UserId,
};

/// Kind of stock movement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MovementType {
    /// Goods received; adds the magnitude.
    In,
    /// Goods issued; subtracts the magnitude.
    Out,
    /// Stock count correction; adds the signed quantity as given.
    Adjustment,
}

impl MovementType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjustment => "adjustment",
        }
    }
}

impl core::fmt::Display for MovementType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MovementType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(MovementType::In),
            "out" => Ok(MovementType::Out),
            "adjustment" => Ok(MovementType::Adjustment),
            other => Err(DomainError::validation(format!(
                "type must be one of: in, out, adjustment (got {other:?})"
            ))),
        }
    }
}

/// Resolve the signed stock delta for a movement.
///
/// `in`/`out` take a strictly positive magnitude. `adjustment` takes a signed,
/// non-zero quantity that is applied unchanged.
pub fn signed_delta(kind: MovementType, quantity: i64) -> DomainResult<i64> {
    match kind {
        MovementType::In | MovementType::Out if quantity <= 0 => Err(DomainError::validation(
            format!("quantity must be positive for '{kind}' movements"),
        )),
        MovementType::In => Ok(quantity),
        MovementType::Out => quantity
            .checked_neg()
            .ok_or_else(|| DomainError::validation("quantity out of range")),
        MovementType::Adjustment if quantity == 0 => {
            Err(DomainError::validation("adjustment quantity cannot be zero"))
        }
        MovementType::Adjustment => Ok(quantity),
    }
}

/// Request to record one movement against a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MovementRequest {
    pub product_id: ProductId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: String,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub user_id: Option<UserId>,
}

impl MovementRequest {
    /// Validate the request and return the signed delta it will apply.
    pub fn validate(&self) -> DomainResult<i64> {
        require_non_blank("reason", &self.reason)?;
        signed_delta(self.movement_type, self.quantity)
    }

    pub fn into_movement(self, id: MovementId, created_at: DateTime<Utc>) -> InventoryMovement {
        InventoryMovement {
            id,
            product_id: self.product_id,
            movement_type: self.movement_type,
            quantity: self.quantity,
            reason: self.reason,
            notes: self.notes.filter(|n| !n.trim().is_empty()),
            user_id: self.user_id,
            created_at,
        }
    }
}

/// A recorded, immutable stock movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryMovement {
    pub id: MovementId,
    pub product_id: ProductId,
    #[serde(rename = "type")]
    pub movement_type: MovementType,
    pub quantity: i64,
    pub reason: String,
    pub notes: Option<String>,
    pub user_id: Option<UserId>,
    pub created_at: DateTime<Utc>,
}

impl Entity for InventoryMovement {
    type Id = MovementId;

    fn id(&self) -> MovementId {
        self.id
    }
}

impl InventoryMovement {
    /// Signed change this movement applied to its product.
    ///
    /// Stored movements were validated on the way in, so the sign rules always hold.
    pub fn delta(&self) -> i64 {
        match self.movement_type {
            MovementType::In | MovementType::Adjustment => self.quantity,
            MovementType::Out => -self.quantity,
        }
    }
}

/// Product fields shown next to a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: ProductId,
    pub code: String,
    pub name: String,
    pub quantity: i64,
    pub min_stock: i64,
}

impl From<&rentstock_products::Product> for ProductSummary {
    fn from(p: &rentstock_products::Product) -> Self {
        Self {
            id: p.id,
            code: p.code.clone(),
            name: p.name.clone(),
            quantity: p.quantity,
            min_stock: p.min_stock,
        }
    }
}

/// User fields shown next to a movement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSummary {
    pub id: UserId,
    pub username: String,
    pub name: String,
}

/// Movement joined with product and user summaries for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MovementWithDetails {
    #[serde(flatten)]
    pub movement: InventoryMovement,
    pub product: ProductSummary,
    pub user: Option<UserSummary>,
}
