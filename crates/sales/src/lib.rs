//! Sales orders domain module.
//!
//! This crate contains the in-memory order aggregate (lines + computed totals)
//! and the denormalized history read model, implemented purely as
//! deterministic domain logic (no IO, no storage).

pub mod history;
pub mod order;

pub use history::{OrderHistoryRow, distinct_orders, sort_for_display};
pub use order::{Order, OrderLine, OrderTotals};
