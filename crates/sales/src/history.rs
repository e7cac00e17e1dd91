//! Order history read model.
//!
//! One row per (order, line). Order-level totals repeat on every row of the
//! same order; that is the tabular shape callers display, not duplication.

use core::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use stockorder_core::{DomainResult, Money, OrderId, Quantity};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderHistoryRow {
    pub order_id: OrderId,
    pub order_date: DateTime<Utc>,
    pub net_amount: Money,
    pub tax: Money,
    pub total_amount: Money,
    pub product_name: String,
    pub quantity: Quantity,
    /// Snapshot price persisted with the line.
    pub unit_price: Money,
}

impl OrderHistoryRow {
    pub fn line_total(&self) -> DomainResult<Money> {
        self.unit_price.times(self.quantity)
    }

    /// Display ordering: newest order first, then order id, then product name.
    pub fn display_cmp(&self, other: &Self) -> Ordering {
        other
            .order_date
            .cmp(&self.order_date)
            .then_with(|| self.order_id.cmp(&other.order_id))
            .then_with(|| self.product_name.cmp(&other.product_name))
    }
}

/// Sorts rows into display order (stable).
pub fn sort_for_display(rows: &mut [OrderHistoryRow]) {
    rows.sort_by(OrderHistoryRow::display_cmp);
}

/// Order ids in the sequence their rows appear, each listed once.
pub fn distinct_orders(rows: &[OrderHistoryRow]) -> Vec<OrderId> {
    let mut ids: Vec<OrderId> = Vec::new();
    for row in rows {
        if ids.last() != Some(&row.order_id) {
            ids.push(row.order_id);
        }
    }
    ids
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn row(order_id: i64, date: (i32, u32, u32), product: &str) -> OrderHistoryRow {
        OrderHistoryRow {
            order_id: OrderId::new(order_id),
            order_date: Utc.with_ymd_and_hms(date.0, date.1, date.2, 12, 0, 0).unwrap(),
            net_amount: Money::from_minor(1_000),
            tax: Money::from_minor(200),
            total_amount: Money::from_minor(1_200),
            product_name: product.to_string(),
            quantity: Quantity::new(1).unwrap(),
            unit_price: Money::from_minor(1_000),
        }
    }

    #[test]
    fn newest_order_first() {
        let mut rows = vec![
            row(1, (2024, 1, 1), "A"),
            row(2, (2024, 3, 1), "A"),
            row(3, (2024, 2, 1), "A"),
        ];
        sort_for_display(&mut rows);
        assert_eq!(
            distinct_orders(&rows),
            vec![OrderId::new(2), OrderId::new(3), OrderId::new(1)]
        );
    }

    #[test]
    fn same_date_breaks_ties_by_order_id_then_product_name() {
        let mut rows = vec![
            row(5, (2024, 1, 1), "Zeta"),
            row(4, (2024, 1, 1), "Beta"),
            row(5, (2024, 1, 1), "Alpha"),
            row(4, (2024, 1, 1), "Alpha"),
        ];
        sort_for_display(&mut rows);
        let got: Vec<(i64, &str)> = rows
            .iter()
            .map(|r| (r.order_id.get(), r.product_name.as_str()))
            .collect();
        assert_eq!(got, vec![(4, "Alpha"), (4, "Beta"), (5, "Alpha"), (5, "Zeta")]);
    }

    #[test]
    fn distinct_orders_of_empty_history_is_empty() {
        assert!(distinct_orders(&[]).is_empty());
    }

    #[test]
    fn line_total_uses_snapshot_price() {
        let mut r = row(1, (2024, 1, 1), "A");
        r.quantity = Quantity::new(3).unwrap();
        assert_eq!(r.line_total().unwrap(), Money::from_minor(3_000));
    }
}
