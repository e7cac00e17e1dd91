use serde::{Deserialize, Serialize};

use stockorder_core::{DomainError, DomainResult, ProductId, Quantity};

/// One requested reduction of a product's stock (one per order line).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockDecrement {
    pub product_id: ProductId,
    pub quantity: Quantity,
}

impl StockDecrement {
    pub fn new(product_id: ProductId, quantity: Quantity) -> Self {
        Self {
            product_id,
            quantity,
        }
    }

    /// Orders decrements by product id so every transaction takes row locks in
    /// the same sequence. The sort is stable: repeated products keep line order.
    pub fn lock_order(mut decrements: Vec<StockDecrement>) -> Vec<StockDecrement> {
        decrements.sort_by_key(|d| d.product_id);
        decrements
    }
}

/// What a conditional decrement observed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DecrementOutcome {
    /// Stock was reduced; `remaining` is the new on-hand count.
    Applied { remaining: i64 },
    /// The record exists but holds less than requested; nothing changed.
    Insufficient { available: i64 },
    /// No inventory record exists for the product; nothing changed.
    Missing,
}

/// On-hand stock for one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryRecord {
    product_id: ProductId,
    quantity_in_stock: i64,
}

impl InventoryRecord {
    pub fn new(product_id: ProductId, quantity_in_stock: i64) -> DomainResult<Self> {
        if quantity_in_stock < 0 {
            return Err(DomainError::invariant(format!(
                "stock cannot be negative (product {product_id}, quantity {quantity_in_stock})"
            )));
        }
        Ok(Self {
            product_id,
            quantity_in_stock,
        })
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn quantity_in_stock(&self) -> i64 {
        self.quantity_in_stock
    }

    /// Subtracts `quantity` only if the result stays at or above zero.
    pub fn decrement(&mut self, quantity: Quantity) -> DecrementOutcome {
        let requested = i64::from(quantity.get());
        if self.quantity_in_stock < requested {
            return DecrementOutcome::Insufficient {
                available: self.quantity_in_stock,
            };
        }
        self.quantity_in_stock -= requested;
        DecrementOutcome::Applied {
            remaining: self.quantity_in_stock,
        }
    }
}
