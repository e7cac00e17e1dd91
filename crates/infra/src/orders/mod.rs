//! Order persistence: the transactional writer and the history reader.

pub mod history;
pub mod writer;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use stockorder_core::{CustomerId, Money, OrderId, ProductId, Quantity};
use stockorder_inventory::StockDecrement;
use stockorder_sales::{Order, OrderHistoryRow};

use crate::error::{OrderWriteError, StoreError};

pub use history::PostgresOrderHistory;
pub use writer::PostgresOrderWriter;

/// Persists an order aggregate as one atomic unit: header, lines and stock.
#[async_trait]
pub trait OrderWriter: Send + Sync {
    /// Returns the generated order id once everything has committed.
    ///
    /// On error nothing the call touched survives, inventory included.
    async fn create_order(&self, order: &Order) -> Result<OrderId, OrderWriteError>;
}

/// Reads back committed orders for display.
#[async_trait]
pub trait OrderHistoryReader: Send + Sync {
    /// One row per (order, line): newest order first, then order id, then
    /// product name. A customer with no orders yields an empty vector.
    async fn order_history(&self, customer_id: CustomerId)
    -> Result<Vec<OrderHistoryRow>, StoreError>;
}

#[async_trait]
impl<S> OrderWriter for Arc<S>
where
    S: OrderWriter + ?Sized,
{
    async fn create_order(&self, order: &Order) -> Result<OrderId, OrderWriteError> {
        (**self).create_order(order).await
    }
}

#[async_trait]
impl<S> OrderHistoryReader for Arc<S>
where
    S: OrderHistoryReader + ?Sized,
{
    async fn order_history(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<OrderHistoryRow>, StoreError> {
        (**self).order_history(customer_id).await
    }
}

/// A committed `orders` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderHeaderRecord {
    pub order_id: OrderId,
    pub customer_id: CustomerId,
    pub order_date: DateTime<Utc>,
    pub net_amount: Money,
    pub tax: Money,
    pub total_amount: Money,
}

/// A committed `orderlines` row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLineRecord {
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: Quantity,
    pub unit_price: Money,
}

/// The lines of `order` as rows for `order_id`, prices taken from the snapshot.
pub(crate) fn line_records(order_id: OrderId, order: &Order) -> Vec<OrderLineRecord> {
    order
        .lines()
        .iter()
        .map(|line| OrderLineRecord {
            order_id,
            product_id: line.product_id(),
            quantity: line.quantity(),
            unit_price: line.unit_price(),
        })
        .collect()
}

/// One stock decrement per line, in line order.
pub(crate) fn stock_decrements(order: &Order) -> Vec<StockDecrement> {
    order
        .lines()
        .iter()
        .map(|line| StockDecrement::new(line.product_id(), line.quantity()))
        .collect()
}

pub(crate) fn reject_empty(order: &Order) -> Result<(), StoreError> {
    if order.is_empty() {
        return Err(StoreError::Validation(format!(
            "order for customer {} has no lines",
            order.customer_id()
        )));
    }
    Ok(())
}
