//! Order placement orchestration.
//!
//! `OrderService` composes a catalog, an order writer and a history reader:
//!
//! ```text
//! place_order(customer, items)
//!   ↓
//! 1. Resolve the customer (catalog, outside any transaction)
//!   ↓
//! 2. Resolve every product and validate every quantity
//!   ↓
//! 3. Build the order aggregate with the configured tax rate
//!   ↓
//! 4. create_order (one transaction: header, lines, stock)
//! ```
//!
//! Validation and lookup failures are reported before anything is written.
//! The service never retries; `PlaceOrderError::is_retryable` tells the caller
//! whether resubmitting the whole order makes sense.

use thiserror::Error;
use tracing::{debug, instrument};

use stockorder_core::{CustomerId, DomainError, OrderId, ProductId, Quantity, TaxRate};
use stockorder_sales::{Order, OrderHistoryRow, OrderTotals};

use crate::catalog::CatalogProvider;
use crate::error::{OrderWriteError, StoreError};
use crate::orders::{OrderHistoryReader, OrderWriter};

#[derive(Debug, Error)]
pub enum PlaceOrderError {
    #[error("invalid order: {0}")]
    Validation(String),

    #[error("unknown customer {0}")]
    UnknownCustomer(CustomerId),

    #[error("unknown product {0}")]
    UnknownProduct(ProductId),

    /// A catalog lookup failed for a reason other than a missing record.
    #[error("catalog lookup failed: {0}")]
    Catalog(#[source] StoreError),

    #[error(transparent)]
    Write(#[from] OrderWriteError),
}

impl PlaceOrderError {
    pub fn is_retryable(&self) -> bool {
        match self {
            PlaceOrderError::Catalog(e) => e.is_retryable(),
            PlaceOrderError::Write(e) => e.is_retryable(),
            _ => false,
        }
    }
}

impl From<DomainError> for PlaceOrderError {
    fn from(value: DomainError) -> Self {
        PlaceOrderError::Validation(value.to_string())
    }
}

/// Outcome of a committed order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlacedOrder {
    pub order_id: OrderId,
    pub totals: OrderTotals,
}

#[derive(Debug, Clone)]
pub struct OrderService<C, W, R> {
    catalog: C,
    writer: W,
    reader: R,
    tax_rate: TaxRate,
}

impl<C, W, R> OrderService<C, W, R>
where
    C: CatalogProvider,
    W: OrderWriter,
    R: OrderHistoryReader,
{
    pub fn new(catalog: C, writer: W, reader: R, tax_rate: TaxRate) -> Self {
        Self {
            catalog,
            writer,
            reader,
            tax_rate,
        }
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn catalog(&self) -> &C {
        &self.catalog
    }

    /// Resolves customer and products and assembles the aggregate. Writes nothing.
    pub async fn build_order(
        &self,
        customer_id: CustomerId,
        items: &[(ProductId, i64)],
    ) -> Result<Order, PlaceOrderError> {
        if items.is_empty() {
            return Err(PlaceOrderError::Validation(
                "an order needs at least one line".to_string(),
            ));
        }

        self.catalog
            .resolve_customer(customer_id)
            .await
            .map_err(|e| match e {
                StoreError::NotFound(_) => PlaceOrderError::UnknownCustomer(customer_id),
                other => PlaceOrderError::Catalog(other),
            })?;

        let mut order = Order::new(customer_id, self.tax_rate);
        for &(product_id, quantity) in items {
            let quantity = Quantity::new(quantity)?;
            let product = self
                .catalog
                .resolve_product(product_id)
                .await
                .map_err(|e| match e {
                    StoreError::NotFound(_) => PlaceOrderError::UnknownProduct(product_id),
                    other => PlaceOrderError::Catalog(other),
                })?;
            order.add_line(product, quantity)?;
        }

        debug!(
            %customer_id,
            line_count = order.lines().len(),
            total_amount = %order.total_amount(),
            "order built"
        );
        Ok(order)
    }

    #[instrument(skip(self, items), fields(customer_id = %customer_id, item_count = items.len()), err)]
    pub async fn place_order(
        &self,
        customer_id: CustomerId,
        items: &[(ProductId, i64)],
    ) -> Result<PlacedOrder, PlaceOrderError> {
        let order = self.build_order(customer_id, items).await?;
        let order_id = self.writer.create_order(&order).await?;
        Ok(PlacedOrder {
            order_id,
            totals: order.totals(),
        })
    }

    pub async fn order_history(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<OrderHistoryRow>, StoreError> {
        self.reader.order_history(customer_id).await
    }
}
