//! Parties domain module: equipment suppliers and application users.

pub mod supplier;
pub mod user;

pub use supplier::{NewSupplier, Supplier, SupplierChanges};
pub use user::{NewUser, User};
