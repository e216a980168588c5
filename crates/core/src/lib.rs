//! `rentstock-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod entity;
pub mod error;
pub mod id;
pub mod patch;

pub use entity::Entity;
pub use error::{require_non_blank, DomainError, DomainResult};
pub use patch::Patch;
pub use id::{CategoryId, MovementId, ProductId, RentalId, SupplierId, UserId};
