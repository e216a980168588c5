//! Inventory ledger domain module.
//!
//! Business rules for stock movements and stock classification, implemented
//! purely as deterministic domain logic (no IO, no HTTP, no storage). A
//! product's quantity is its opening stock plus the signed delta of every
//! movement recorded against it.

pub mod movement;
pub mod stock;

pub use movement::{
    InventoryMovement, MovementRequest, MovementType, MovementWithDetails, ProductSummary,
    UserSummary, signed_delta,
};
pub use stock::{StockStatus, apply_delta, is_low_stock, replay};
