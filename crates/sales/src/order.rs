use serde::Serialize;

use stockorder_core::{CustomerId, DomainResult, Money, ProductId, Quantity, TaxRate};
use stockorder_products::Product;

/// Order line: a product snapshot and the quantity ordered.
///
/// Immutable once built. The unit price is the one the product carried when
/// the line was added and is what gets persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderLine {
    product: Product,
    quantity: Quantity,
}

impl OrderLine {
    pub fn new(product: Product, quantity: Quantity) -> Self {
        Self { product, quantity }
    }

    pub fn product(&self) -> &Product {
        &self.product
    }

    pub fn product_id(&self) -> ProductId {
        self.product.id_typed()
    }

    pub fn quantity(&self) -> Quantity {
        self.quantity
    }

    pub fn unit_price(&self) -> Money {
        self.product.unit_price()
    }

    pub fn line_total(&self) -> DomainResult<Money> {
        self.unit_price().times(self.quantity)
    }
}

/// Computed amounts of an order. `total == net + tax` by construction.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct OrderTotals {
    pub net_amount: Money,
    pub tax: Money,
    pub total_amount: Money,
}

impl OrderTotals {
    /// Computes totals from scratch over `lines`.
    pub fn compute(lines: &[OrderLine], tax_rate: TaxRate) -> DomainResult<Self> {
        let mut net_amount = Money::ZERO;
        for line in lines {
            net_amount = net_amount.checked_add(line.line_total()?)?;
        }
        let tax = tax_rate.tax_on(net_amount)?;
        let total_amount = net_amount.checked_add(tax)?;
        Ok(Self {
            net_amount,
            tax,
            total_amount,
        })
    }
}

/// Aggregate root: a customer's pending order.
///
/// Lives only in memory until the order writer commits it. Lines can be
/// appended but never edited or removed; to correct a mistake, discard the
/// aggregate and build a new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Order {
    customer_id: CustomerId,
    tax_rate: TaxRate,
    lines: Vec<OrderLine>,
    totals: OrderTotals,
}

impl Order {
    pub fn new(customer_id: CustomerId, tax_rate: TaxRate) -> Self {
        Self {
            customer_id,
            tax_rate,
            lines: Vec::new(),
            totals: OrderTotals::default(),
        }
    }

    /// Appends a line and recomputes every total.
    ///
    /// On overflow the line is not kept and the aggregate is unchanged.
    pub fn add_line(&mut self, product: Product, quantity: Quantity) -> DomainResult<()> {
        self.lines.push(OrderLine::new(product, quantity));
        match OrderTotals::compute(&self.lines, self.tax_rate) {
            Ok(totals) => {
                self.totals = totals;
                Ok(())
            }
            Err(e) => {
                self.lines.pop();
                Err(e)
            }
        }
    }

    pub fn customer_id(&self) -> CustomerId {
        self.customer_id
    }

    pub fn tax_rate(&self) -> TaxRate {
        self.tax_rate
    }

    pub fn lines(&self) -> &[OrderLine] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn totals(&self) -> OrderTotals {
        self.totals
    }

    pub fn net_amount(&self) -> Money {
        self.totals.net_amount
    }

    pub fn tax(&self) -> Money {
        self.totals.tax
    }

    pub fn total_amount(&self) -> Money {
        self.totals.total_amount
    }
}
