//! Product catalogue domain module.
//!
//! Products and their categories as plain records plus the validation rules for
//! creating and editing them. Stock quantity is owned by the inventory ledger and
//! cannot be edited through [`ProductChanges`].

pub mod category;
pub mod product;

pub use category::{Category, CategoryChanges, NewCategory};
pub use product::{NewProduct, Product, ProductChanges, ProductWithCategory};
