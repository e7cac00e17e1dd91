//! Product catalog domain module.
//!
//! The catalog itself is owned elsewhere; this crate only models the product
//! snapshot an order line captures (no IO, no storage).

pub mod product;

pub use product::Product;
