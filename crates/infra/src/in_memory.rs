//! In-memory catalog, order writer and history reader.
//!
//! Intended for tests/dev. Not optimized for performance: every order clones
//! the whole state, applies its steps to the copy, and swaps the copy in only
//! after the last step succeeded. Holding the write lock for the whole call
//! serializes orders, so stock checks can't race.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, RwLock};

use async_trait::async_trait;
use tracing::{info, instrument, warn};

use stockorder_core::{CustomerId, OrderId, ProductId};
use stockorder_inventory::{
    DecrementOutcome, InventoryPolicy, InventoryRecord, Settlement, StockDecrement,
};
use stockorder_parties::Customer;
use stockorder_products::Product;
use stockorder_sales::{Order, OrderHistoryRow, sort_for_display};

use crate::catalog::{CatalogProvider, LowStockProduct};
use crate::clock::{Clock, SystemClock};
use crate::error::{OrderWriteError, StoreError, WriteStep};
use crate::orders::{
    OrderHeaderRecord, OrderHistoryReader, OrderLineRecord, OrderWriter, line_records,
    reject_empty, stock_decrements,
};

#[derive(Debug, Clone, Default)]
struct State {
    customers: BTreeMap<CustomerId, Customer>,
    products: BTreeMap<ProductId, Product>,
    inventory: BTreeMap<ProductId, InventoryRecord>,
    orders: Vec<OrderHeaderRecord>,
    lines: Vec<OrderLineRecord>,
    last_order_id: i64,
}

pub struct InMemoryStore {
    state: RwLock<State>,
    clock: Arc<dyn Clock>,
    policy: InventoryPolicy,
    fail_at: Mutex<Option<WriteStep>>,
}

impl Default for InMemoryStore {
    fn default() -> Self {
        Self {
            state: RwLock::new(State::default()),
            clock: Arc::new(SystemClock),
            policy: InventoryPolicy::Strict,
            fail_at: Mutex::new(None),
        }
    }
}

impl core::fmt::Debug for InMemoryStore {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("InMemoryStore")
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_policy(mut self, policy: InventoryPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> InventoryPolicy {
        self.policy
    }

    pub fn insert_customer(&self, customer: Customer) -> Result<(), StoreError> {
        let mut state = self.write_state()?;
        state.customers.insert(customer.id_typed(), customer);
        Ok(())
    }

    pub fn insert_product(&self, product: Product) -> Result<(), StoreError> {
        let mut state = self.write_state()?;
        state.products.insert(product.id_typed(), product);
        Ok(())
    }

    /// Creates or replaces the inventory record of a known product.
    pub fn set_stock(&self, product_id: ProductId, quantity_in_stock: i64) -> Result<(), StoreError> {
        let record = InventoryRecord::new(product_id, quantity_in_stock)?;
        let mut state = self.write_state()?;
        if !state.products.contains_key(&product_id) {
            return Err(StoreError::Integrity(format!(
                "inventory references unknown product {product_id}"
            )));
        }
        state.inventory.insert(product_id, record);
        Ok(())
    }

    pub fn stock_of(&self, product_id: ProductId) -> Result<Option<i64>, StoreError> {
        let state = self.read_state()?;
        Ok(state
            .inventory
            .get(&product_id)
            .map(InventoryRecord::quantity_in_stock))
    }

    /// Committed order headers, in commit order.
    pub fn headers(&self) -> Result<Vec<OrderHeaderRecord>, StoreError> {
        Ok(self.read_state()?.orders.clone())
    }

    /// Committed order lines, in commit order.
    pub fn lines(&self) -> Result<Vec<OrderLineRecord>, StoreError> {
        Ok(self.read_state()?.lines.clone())
    }

    /// Makes the next `create_order` fail at `step` with a transient error.
    pub fn fail_next_write_at(&self, step: WriteStep) {
        match self.fail_at.lock() {
            Ok(mut slot) => *slot = Some(step),
            Err(poisoned) => *poisoned.into_inner() = Some(step),
        }
    }

    fn injected_failure(&self, step: WriteStep) -> Result<(), OrderWriteError> {
        let mut slot = match self.fail_at.lock() {
            Ok(slot) => slot,
            Err(poisoned) => poisoned.into_inner(),
        };
        if *slot == Some(step) {
            *slot = None;
            return Err(OrderWriteError::new(
                step,
                StoreError::Transient(format!("injected failure at {step}")),
            ));
        }
        Ok(())
    }

    fn read_state(&self) -> Result<std::sync::RwLockReadGuard<'_, State>, StoreError> {
        self.state
            .read()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write_state(&self) -> Result<std::sync::RwLockWriteGuard<'_, State>, StoreError> {
        self.state
            .write()
            .map_err(|_| StoreError::Backend("lock poisoned".to_string()))
    }

    fn write_in(&self, staged: &mut State, order: &Order) -> Result<OrderId, OrderWriteError> {
        self.injected_failure(WriteStep::InsertHeader)?;
        let customer_id = order.customer_id();
        if !staged.customers.contains_key(&customer_id) {
            return Err(OrderWriteError::new(
                WriteStep::InsertHeader,
                StoreError::Integrity(format!("order references unknown customer {customer_id}")),
            ));
        }
        staged.last_order_id += 1;
        let order_id = OrderId::new(staged.last_order_id);
        staged.orders.push(OrderHeaderRecord {
            order_id,
            customer_id,
            order_date: self.clock.now(),
            net_amount: order.net_amount(),
            tax: order.tax(),
            total_amount: order.total_amount(),
        });

        self.injected_failure(WriteStep::InsertLines)?;
        for line in line_records(order_id, order) {
            if !staged.products.contains_key(&line.product_id) {
                return Err(OrderWriteError::new(
                    WriteStep::InsertLines,
                    StoreError::Integrity(format!(
                        "order line references unknown product {}",
                        line.product_id
                    )),
                ));
            }
            staged.lines.push(line);
        }

        self.injected_failure(WriteStep::AdjustInventory)?;
        for decrement in StockDecrement::lock_order(stock_decrements(order)) {
            self.adjust(staged, &decrement)
                .map_err(OrderWriteError::at(WriteStep::AdjustInventory))?;
        }

        self.injected_failure(WriteStep::Commit)?;
        Ok(order_id)
    }

    fn adjust(&self, staged: &mut State, decrement: &StockDecrement) -> Result<Settlement, StoreError> {
        let outcome = match staged.inventory.get_mut(&decrement.product_id) {
            Some(record) => record.decrement(decrement.quantity),
            None => DecrementOutcome::Missing,
        };
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

    fn products_where(&self, keep: impl Fn(&Product) -> bool) -> Result<Vec<Product>, StoreError> {
        let state = self.read_state()?;
        Ok(state.products.values().filter(|p| keep(p)).cloned().collect())
    }
}

#[async_trait]
impl CatalogProvider for InMemoryStore {
    async fn resolve_product(&self, id: ProductId) -> Result<Product, StoreError> {
        self.read_state()?
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))
    }

    async fn resolve_customer(&self, id: CustomerId) -> Result<Customer, StoreError> {
        self.read_state()?
            .customers
            .get(&id)
            .cloned()
            .ok_or_else(|| StoreError::NotFound(format!("customer {id}")))
    }

    async fn list_customers(&self) -> Result<Vec<Customer>, StoreError> {
        Ok(self.read_state()?.customers.values().cloned().collect())
    }

    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.products_where(|_| true)
    }

    async fn list_categories(&self) -> Result<Vec<String>, StoreError> {
        let state = self.read_state()?;
        let mut categories: Vec<String> = state
            .products
            .values()
            .map(|p| p.category().to_string())
            .collect();
        categories.sort();
        categories.dedup();
        Ok(categories)
    }

    async fn products_by_category(&self, category: &str) -> Result<Vec<Product>, StoreError> {
        self.products_where(|p| p.category() == category)
    }

    async fn low_stock_products(&self, threshold: i64) -> Result<Vec<LowStockProduct>, StoreError> {
        let state = self.read_state()?;
        Ok(state
            .inventory
            .values()
            .filter(|record| record.quantity_in_stock() < threshold)
            .filter_map(|record| {
                state.products.get(&record.product_id()).map(|product| LowStockProduct {
                    product: product.clone(),
                    quantity_in_stock: record.quantity_in_stock(),
                })
            })
            .collect())
    }
}

#[async_trait]
impl OrderWriter for InMemoryStore {
    #[instrument(
        skip(self, order),
        fields(customer_id = %order.customer_id(), line_count = order.lines().len()),
        err
    )]
    async fn create_order(&self, order: &Order) -> Result<OrderId, OrderWriteError> {
        reject_empty(order).map_err(OrderWriteError::at(WriteStep::Begin))?;
        self.injected_failure(WriteStep::Begin)?;

        let mut state = self.write_state().map_err(OrderWriteError::at(WriteStep::Begin))?;
        let mut staged = state.clone();

        match self.write_in(&mut staged, order) {
            Ok(order_id) => {
                *state = staged;
                info!(
                    %order_id,
                    line_count = order.lines().len(),
                    total_amount = %order.total_amount(),
                    "order committed"
                );
                Ok(order_id)
            }
            Err(err) => {
                warn!(
                    step = %err.step,
                    retryable = err.is_retryable(),
                    error = %err.source,
                    "order rolled back"
                );
                Err(err)
            }
        }
    }
}

#[async_trait]
impl OrderHistoryReader for InMemoryStore {
    #[instrument(skip(self), fields(customer_id = %customer_id), err)]
    async fn order_history(
        &self,
        customer_id: CustomerId,
    ) -> Result<Vec<OrderHistoryRow>, StoreError> {
        let state = self.read_state()?;
        let mut rows = Vec::new();

        for header in state.orders.iter().filter(|h| h.customer_id == customer_id) {
            for line in state.lines.iter().filter(|l| l.order_id == header.order_id) {
                let product = state.products.get(&line.product_id).ok_or_else(|| {
                    StoreError::Decode(format!(
                        "order {} line references missing product {}",
                        header.order_id, line.product_id
                    ))
                })?;
                rows.push(OrderHistoryRow {
                    order_id: header.order_id,
                    order_date: header.order_date,
                    net_amount: header.net_amount,
                    tax: header.tax,
                    total_amount: header.total_amount,
                    product_name: product.name().to_string(),
                    quantity: line.quantity,
                    unit_price: line.unit_price,
                });
            }
        }

        sort_for_display(&mut rows);
        Ok(rows)
    }
}
