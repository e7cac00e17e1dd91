//! Postgres order history reader.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Row};
use tracing::{Span, instrument};

use stockorder_core::{CustomerId, Money, OrderId, Quantity};
use stockorder_sales::OrderHistoryRow;

use super::OrderHistoryReader;
use crate::error::{StoreError, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct PostgresOrderHistory {
    pool: PgPool,
}

impl PostgresOrderHistory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl OrderHistoryReader for PostgresOrderHistory {
    #[instrument(
        skip(self),
        fields(customer_id = %customer_id, row_count = tracing::field::Empty),
        err
    )]
    async fn order_history(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<OrderHistoryRow>, StoreError> {
        // Product names compare bytewise so the order matches
        // `OrderHistoryRow::display_cmp` whatever the database collation.
        let rows = sqlx::query(
            r#"
            SELECT
                o.order_id,
                o.order_date,
                o.net_amount,
                o.tax,
                o.total_amount,
                p.product_name,
                ol.quantity,
                ol.unit_price
            FROM orders o
            JOIN orderlines ol ON o.order_id = ol.order_id
            JOIN products p ON ol.product_id = p.product_id
            WHERE o.customer_id = $1
            ORDER BY o.order_date DESC, o.order_id, p.product_name COLLATE "C"
            "#,
        )
        .bind(customer_id.get())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("order_history", e))?;

        let mut history = Vec::with_capacity(rows.len());
        for row in &rows {
            let raw = HistoryRow::from_row(row).map_err(|e| map_sqlx_error("decode_history", e))?;
            history.push(raw.into_row()?);
        }

        Span::current().record("row_count", history.len());
        Ok(history)
    }
}

struct HistoryRow {
    order_id: i64,
    order_date: DateTime<Utc>,
    net_amount: i64,
    tax: i64,
    total_amount: i64,
    product_name: String,
    quantity: i32,
    unit_price: i64,
}

impl<'r> FromRow<'r, PgRow> for HistoryRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(Self {
            order_id: row.try_get("order_id")?,
            order_date: row.try_get("order_date")?,
            net_amount: row.try_get("net_amount")?,
            tax: row.try_get("tax")?,
            total_amount: row.try_get("total_amount")?,
            product_name: row.try_get("product_name")?,
            quantity: row.try_get("quantity")?,
            unit_price: row.try_get("unit_price")?,
        })
    }
}

impl HistoryRow {
    fn into_row(self) -> Result<OrderHistoryRow, StoreError> {
        let quantity = Quantity::new(i64::from(self.quantity)).map_err(|e| {
            StoreError::Decode(format!("order {} line quantity: {e}", self.order_id))
        })?;

        Ok(OrderHistoryRow {
            order_id: OrderId::new(self.order_id),
            order_date: self.order_date,
            net_amount: Money::from_minor(self.net_amount),
            tax: Money::from_minor(self.tax),
            total_amount: Money::from_minor(self.total_amount),
            product_name: self.product_name,
            quantity,
            unit_price: Money::from_minor(self.unit_price),
        })
    }
}
