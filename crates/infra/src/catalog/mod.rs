//! Catalog and customer lookups consumed before an order is built.
//!
//! These are read-only and never run inside the order transaction: a product
//! resolved here becomes the price snapshot of the line it is added to.

pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;

use stockorder_core::{CustomerId, ProductId};
use stockorder_parties::Customer;
use stockorder_products::Product;

use crate::error::StoreError;

pub use postgres::PostgresCatalog;

/// A product whose stock fell below a reporting threshold.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LowStockProduct {
    pub product: Product,
    pub quantity_in_stock: i64,
}

#[async_trait]
pub trait CatalogProvider: Send + Sync {
    /// Current name/price/category of a product, or `StoreError::NotFound`.
    async fn resolve_product(&self, id: ProductId) -> Result<Product, StoreError>;

    /// The customer record, or `StoreError::NotFound`.
    async fn resolve_customer(&self, id: CustomerId) -> Result<Customer, StoreError>;

    /// All customers, by id.
    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError>;

    /// All products, by id.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;

    /// Distinct categories, ascending.
    async fn list_categories(&self) -> Result<Vec<String>, StoreError>;

    /// Products in one category, by id.
    async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, StoreError>;

    /// Products whose stock is strictly below `threshold`, by id.
    async fn low_stock_products(&self, threshold: i64) -> Result<Vec<LowStockProduct>, StoreError>;
}

#[async_trait]
impl<S> CatalogProvider for Arc<S>
where
    S: CatalogProvider + ?Sized,
{
    async fn resolve_product(&self, id: ProductId) -> Result<Product, StoreError> {
        (**self).resolve_product(id).await
    }

    async fn resolve_customer(&self, id: CustomerId) -> Result<Customer, StoreError> {
        (**self).resolve_customer(id).await
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        (**self).list_customers().await
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        (**self).list_products().await
    }

    async fn list_categories(&self) -> Result<Vec<String>, StoreError> {
        (**self).list_categories().await
    }

    async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, StoreError> {
        (**self).products_by_category(category).await
    }

    async fn low_stock_products(&self, threshold: i64) -> Result<Vec<LowStockProduct>, StoreError> {
        (**self).low_stock_products(threshold).await
    }
}
