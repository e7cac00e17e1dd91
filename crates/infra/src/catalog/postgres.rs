//! Postgres-backed catalog and customer lookups.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};
use tracing::instrument;

use stockorder_core::{CustomerId, Money, ProductId};
use stockorder_parties::{ContactInfo, Customer};
use stockorder_products::Product;

use super::{CatalogProvider, LowStockProduct};
use crate::error::{StoreError, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct PostgresCatalog {
    pool: PgPool,
}

impl PostgresCatalog {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogProvider for PostgresCatalog {
    #[instrument(skip(self), fields(product_id = %id), err)]
    async fn resolve_product(&self, id: ProductId) -> Result<Product, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT product_id, product_name, price, category
            FROM products
            WHERE product_id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("resolve_product", e))?;

        match row {
            Some(row) => product_from_row(&row),
            None => Err(StoreError::NotFound(format!("product {id}"))),
        }
    }

    #[instrument(skip(self), fields(customer_id = %id), err)]
    async fn resolve_customer(&self, id: CustomerId) -> Result<Customer, StoreError> {
        let row = sqlx::query(
            r#"
            SELECT customer_id, customer_name, email, phone
            FROM customers
            WHERE customer_id = $1
            "#,
        )
        .bind(id.get())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("resolve_customer", e))?;

        match row {
            Some(row) => customer_from_row(&row),
            None => Err(StoreError::NotFound(format!("customer {id}"))),
        }
    }

    #[instrument(skip(self), err)]
    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT customer_id, customer_name, email, phone
            FROM customers
            ORDER BY customer_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_customers", e))?;

        rows.iter().map(customer_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, price, category
            FROM products
            ORDER BY product_id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_products", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn list_categories(&self) -> Result<Vec<String>, StoreError> {
        sqlx::query_scalar::<_, String>(
            "SELECT DISTINCT category FROM products ORDER BY category",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_categories", e))
    }

    #[instrument(skip(self), err)]
    async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT product_id, product_name, price, category
            FROM products
            WHERE category = $1
            ORDER BY product_id
            "#,
        )
        .bind(category)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("products_by_category", e))?;

        rows.iter().map(product_from_row).collect()
    }

    #[instrument(skip(self), err)]
    async fn low_stock_products(&self, threshold: i64) -> Result<Vec<LowStockProduct>, StoreError> {
        let rows = sqlx::query(
            r#"
            SELECT p.product_id, p.product_name, p.price, p.category, i.quantity_in_stock
            FROM products p
            JOIN inventory i ON p.product_id = i.product_id
            WHERE i.quantity_in_stock < $1
            ORDER BY p.product_id
            "#,
        )
        .bind(threshold)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("low_stock_products", e))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in &rows {
            let quantity_in_stock: i64 = row
                .try_get("quantity_in_stock")
                .map_err(|e| map_sqlx_error("decode_inventory", e))?;
            out.push(LowStockProduct {
                product: product_from_row(row)?,
                quantity_in_stock,
            });
        }

        tracing::debug!(threshold, count = out.len(), "low stock products");
        Ok(out)
    }
}

fn customer_from_row(row: &PgRow) -> Result<Customer, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_customer", e);
    let customer_id: i64 = row.try_get("customer_id").map_err(decode)?;
    let name: String = row.try_get("customer_name").map_err(decode)?;
    let contact = ContactInfo {
        email: row.try_get("email").map_err(decode)?,
        phone: row.try_get("phone").map_err(decode)?,
    };

    Customer::new(CustomerId::new(customer_id), name, contact)
        .map_err(|e| StoreError::Decode(format!("customer {customer_id}: {e}")))
}

fn product_from_row(row: &PgRow) -> Result<Product, StoreError> {
    let decode = |e: sqlx::Error| map_sqlx_error("decode_product", e);
    let product_id: i64 = row.try_get("product_id").map_err(decode)?;
    let name: String = row.try_get("product_name").map_err(decode)?;
    let price: i64 = row.try_get("price").map_err(decode)?;
    let category: String = row.try_get("category").map_err(decode)?;

    Product::new(ProductId::new(product_id), name, Money::from_minor(price), category)
        .map_err(|e| StoreError::Decode(format!("product {product_id}: {e}")))
}
