//! Postgres order writer.
//!
//! `create_order` runs as one transaction:
//! 1. insert the header and obtain the generated `order_id`
//! 2. insert every line in one batched statement, with snapshot prices
//! 3. decrement stock for every line, in product-id order
//! 4. commit
//!
//! Any failure rolls the transaction back and is reported with the step it
//! happened at. The pooled connection goes back to the pool on every path.

use async_trait::async_trait;
use sqlx::{PgPool, Postgres, Transaction};
use tracing::{Span, info, instrument, warn};

use stockorder_core::OrderId;
use stockorder_inventory::{InventoryPolicy, Settlement};
use stockorder_sales::Order;

use super::{OrderLineRecord, OrderWriter, line_records, reject_empty, stock_decrements};
use crate::adjuster::PostgresInventoryAdjuster;
use crate::error::{OrderWriteError, StoreError, WriteStep, map_sqlx_error};

#[derive(Debug, Clone)]
pub struct PostgresOrderWriter {
    pool: PgPool,
    adjuster: PostgresInventoryAdjuster,
}

impl PostgresOrderWriter {
    pub fn new(pool: PgPool, policy: InventoryPolicy) -> Self {
        Self {
            pool,
            adjuster: PostgresInventoryAdjuster::new(policy),
        }
    }

    /// Writes with the default strict inventory policy.
    pub fn strict(pool: PgPool) -> Self {
        Self::new(pool, InventoryPolicy::Strict)
    }

    pub fn policy(&self) -> InventoryPolicy {
        self.adjuster.policy()
    }

    async fn write_in(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        order: &Order,
    ) -> Result<OrderId, OrderWriteError> {
        let order_id = insert_header(tx, order)
            .await
            .map_err(OrderWriteError::at(WriteStep::InsertHeader))?;

        let lines = line_records(order_id, order);
        insert_lines(tx, &lines)
            .await
            .map_err(OrderWriteError::at(WriteStep::InsertLines))?;

        let settlements = self
            .adjuster
            .apply_all(tx, stock_decrements(order))
            .await
            .map_err(OrderWriteError::at(WriteStep::AdjustInventory))?;

        let skipped = settlements
            .iter()
            .filter(|s| matches!(s, Settlement::Skipped(_)))
            .count();
        if skipped > 0 {
            warn!(%order_id, skipped, "order committing with unadjusted inventory");
        }

        Ok(order_id)
    }
}

#[async_trait]
impl OrderWriter for PostgresOrderWriter {
    #[instrument(
        skip(self, order),
        fields(
            customer_id = %order.customer_id(),
            line_count = order.lines().len(),
            order_id = tracing::field::Empty
        ),
        err
    )]
    async fn create_order(&self, order: &Order) -> Result<OrderId, OrderWriteError> {
        reject_empty(order).map_err(OrderWriteError::at(WriteStep::Begin))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))
            .map_err(OrderWriteError::at(WriteStep::Begin))?;

        let order_id = match self.write_in(&mut tx, order).await {
            Ok(order_id) => order_id,
            Err(err) => {
                // The connection discards the work even if this fails.
                if let Err(e) = tx.rollback().await {
                    warn!(error = %e, "rollback failed");
                }
                warn!(
                    step = %err.step,
                    retryable = err.is_retryable(),
                    error = %err.source,
                    "order rolled back"
                );
                return Err(err);
            }
        };

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))
            .map_err(OrderWriteError::at(WriteStep::Commit))?;

        Span::current().record("order_id", order_id.get());
        info!(
            %order_id,
            line_count = order.lines().len(),
            total_amount = %order.total_amount(),
            "order committed"
        );
        Ok(order_id)
    }
}

async fn insert_header(
    tx: &mut Transaction<'_, Postgres>,
    order: &Order,
) -> Result<OrderId, StoreError> {
    let order_id: i64 = sqlx::query_scalar(
        r#"
        INSERT INTO orders (customer_id, order_date, net_amount, tax, total_amount)
        VALUES ($1, CURRENT_TIMESTAMP, $2, $3, $4)
        RETURNING order_id
        "#,
    )
    .bind(order.customer_id().get())
    .bind(order.net_amount().minor())
    .bind(order.tax().minor())
    .bind(order.total_amount().minor())
    .fetch_one(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_order_header", e))?;

    Ok(OrderId::new(order_id))
}

async fn insert_lines(
    tx: &mut Transaction<'_, Postgres>,
    lines: &[OrderLineRecord],
) -> Result<(), StoreError> {
    let order_ids: Vec<i64> = lines.iter().map(|l| l.order_id.get()).collect();
    let product_ids: Vec<i64> = lines.iter().map(|l| l.product_id.get()).collect();
    let quantities: Vec<i32> = lines.iter().map(|l| l.quantity.as_i32()).collect();
    let unit_prices: Vec<i64> = lines.iter().map(|l| l.unit_price.minor()).collect();

    let result = sqlx::query(
        r#"
        INSERT INTO orderlines (order_id, product_id, quantity, unit_price)
        SELECT * FROM UNNEST($1::bigint[], $2::bigint[], $3::integer[], $4::bigint[])
        "#,
    )
    .bind(&order_ids)
    .bind(&product_ids)
    .bind(&quantities)
    .bind(&unit_prices)
    .execute(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("insert_order_lines", e))?;

    let inserted = result.rows_affected();
    if inserted != lines.len() as u64 {
        return Err(StoreError::Integrity(format!(
            "expected {} order lines, inserted {inserted}",
            lines.len()
        )));
    }
    Ok(())
}
