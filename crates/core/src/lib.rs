//! `stockorder-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! identifiers, monetary amounts, tax rates and quantities shared by the
//! catalog, inventory and sales crates.

pub mod entity;
pub mod error;
pub mod id;
pub mod money;
pub mod quantity;
pub mod value_object;

pub use entity::Entity;
pub use error::{DomainError, DomainResult};
pub use id::{CustomerId, OrderId, ProductId};
pub use money::{Money, TaxRate};
pub use quantity::Quantity;
pub use value_object::ValueObject;
