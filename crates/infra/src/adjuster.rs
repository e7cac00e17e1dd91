//! Inventory adjuster: applies stock decrements inside the caller's transaction.
//!
//! The decrement is a single conditional `UPDATE`, so the stock check and the
//! write happen under the same row lock and two concurrent orders can never
//! both pass the check against the same stock. When the update matches no row
//! a follow-up read tells a missing inventory record apart from insufficient
//! stock; the configured [`InventoryPolicy`] then decides whether the order
//! aborts.

use sqlx::{Postgres, Transaction};
use tracing::{instrument, warn};

use stockorder_inventory::{DecrementOutcome, InventoryPolicy, Settlement, StockDecrement};

use crate::error::{StoreError, map_sqlx_error};

#[derive(Debug, Clone, Copy, Default)]
pub struct PostgresInventoryAdjuster {
    policy: InventoryPolicy,
}

impl PostgresInventoryAdjuster {
    pub fn new(policy: InventoryPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> InventoryPolicy {
        self.policy
    }

    /// Applies one decrement.
    ///
    /// `Ok(Settlement::Skipped(..))` is only possible under
    /// [`InventoryPolicy::WarnAndContinue`]; strict mode returns
    /// `StoreError::Inventory` instead and the caller must roll back.
    #[instrument(
        skip(self, tx),
        fields(
            product_id = %decrement.product_id,
            quantity = decrement.quantity.get(),
            policy = %self.policy
        ),
        err
    )]
    pub async fn apply(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        decrement: &StockDecrement,
    ) -> Result<Settlement, StoreError> {
        let outcome = decrement_stock(tx, decrement).await?;
        let settlement = self.policy.settle(decrement, outcome)?;

        if let Settlement::Skipped(reason) = &settlement {
            warn!(
                product_id = %decrement.product_id,
                quantity = decrement.quantity.get(),
                reason = %reason,
                "inventory not adjusted; order continues"
            );
        }

        Ok(settlement)
    }

    /// Applies every decrement in product-id order.
    ///
    /// Concurrent orders touching overlapping products take row locks in the
    /// same sequence, so they queue instead of deadlocking.
    pub async fn apply_all(
        &self,
        tx: &mut Transaction<'_, Postgres>,
        decrements: Vec<StockDecrement>,
    ) -> Result<Vec<Settlement>, StoreError> {
        let mut settlements = Vec::with_capacity(decrements.len());
        for decrement in StockDecrement::lock_order(decrements) {
            settlements.push(self.apply(tx, &decrement).await?);
        }
        Ok(settlements)
    }
}

async fn decrement_stock(
    tx: &mut Transaction<'_, Postgres>,
    decrement: &StockDecrement,
) -> Result<DecrementOutcome, StoreError> {
    let quantity = i64::from(decrement.quantity.get());

    let remaining: Option<i64> = sqlx::query_scalar(
        r#"
        UPDATE inventory
        SET quantity_in_stock = quantity_in_stock - $1
        WHERE product_id = $2 AND quantity_in_stock >= $1
        RETURNING quantity_in_stock
        "#,
    )
    .bind(quantity)
    .bind(decrement.product_id.get())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("decrement_stock", e))?;

    if let Some(remaining) = remaining {
        return Ok(DecrementOutcome::Applied { remaining });
    }

    let available: Option<i64> = sqlx::query_scalar(
        "SELECT quantity_in_stock FROM inventory WHERE product_id = $1",
    )
    .bind(decrement.product_id.get())
    .fetch_optional(&mut **tx)
    .await
    .map_err(|e| map_sqlx_error("read_stock", e))?;

    Ok(match available {
        Some(available) => DecrementOutcome::Insufficient { available },
        None => DecrementOutcome::Missing,
    })
}
