//! Customer directory domain module.
//!
//! Customers are resolved before an order is built; orders only carry the id.

pub mod customer;

pub use customer::{ContactInfo, Customer};
