//! Inventory domain module.
//!
//! Business rules for stock decrements, implemented purely as deterministic
//! domain logic (no IO, no storage). Storage backends apply the decrement and
//! hand the observed outcome to [`InventoryPolicy::settle`].

pub mod policy;
pub mod stock;

pub use policy::{InventoryError, InventoryPolicy, Settlement};
pub use stock::{DecrementOutcome, InventoryRecord, StockDecrement};
