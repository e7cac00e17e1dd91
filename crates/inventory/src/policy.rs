use core::str::FromStr;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use stockorder_core::{DomainError, ProductId};

use crate::stock::{DecrementOutcome, StockDecrement};

/// A decrement that could not be applied.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InventoryError {
    #[error("insufficient stock for product {product_id}: requested {requested}, available {available}")]
    StockExhausted {
        product_id: ProductId,
        requested: u32,
        available: i64,
    },

    #[error("no inventory record for product {product_id}")]
    MissingRecord { product_id: ProductId },
}

/// How the order writer treats a decrement that changed nothing.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InventoryPolicy {
    /// Abort the whole order. Committed orders never imply impossible stock.
    #[default]
    Strict,
    /// Log the skipped decrement and commit the order anyway.
    WarnAndContinue,
}

/// Result of settling one decrement under a policy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Settlement {
    Applied { remaining: i64 },
    /// Tolerated under [`InventoryPolicy::WarnAndContinue`]; the caller logs it.
    Skipped(InventoryError),
}

impl InventoryPolicy {
    pub fn settle(
        self,
        decrement: &StockDecrement,
        outcome: DecrementOutcome,
    ) -> Result<Settlement, InventoryError> {
        let failure = match outcome {
            DecrementOutcome::Applied { remaining } => return Ok(Settlement::Applied { remaining }),
            DecrementOutcome::Insufficient { available } => InventoryError::StockExhausted {
                product_id: decrement.product_id,
                requested: decrement.quantity.get(),
                available,
            },
            DecrementOutcome::Missing => InventoryError::MissingRecord {
                product_id: decrement.product_id,
            },
        };

        match self {
            InventoryPolicy::Strict => Err(failure),
            InventoryPolicy::WarnAndContinue => Ok(Settlement::Skipped(failure)),
        }
    }

    pub fn is_strict(self) -> bool {
        matches!(self, InventoryPolicy::Strict)
    }
}

impl core::fmt::Display for InventoryPolicy {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            InventoryPolicy::Strict => f.write_str("strict"),
            InventoryPolicy::WarnAndContinue => f.write_str("warn"),
        }
    }
}

impl FromStr for InventoryPolicy {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "strict" => Ok(InventoryPolicy::Strict),
            "warn" | "warn_and_continue" | "warn-and-continue" => Ok(InventoryPolicy::WarnAndContinue),
            other => Err(DomainError::validation(format!(
                "inventory policy must be one of: strict, warn (got '{other}')"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockorder_core::Quantity;

    fn decrement(product: i64, quantity: i64) -> StockDecrement {
        StockDecrement::new(ProductId::new(product), Quantity::new(quantity).unwrap())
    }

    #[test]
    fn default_is_strict() {
        assert_eq!(InventoryPolicy::default(), InventoryPolicy::Strict);
        assert!(InventoryPolicy::default().is_strict());
    }

    #[test]
    fn applied_outcome_settles_under_both_policies() {
        let d = decrement(1, 2);
        for policy in [InventoryPolicy::Strict, InventoryPolicy::WarnAndContinue] {
            assert_eq!(
                policy.settle(&d, DecrementOutcome::Applied { remaining: 8 }),
                Ok(Settlement::Applied { remaining: 8 })
            );
        }
    }

    #[test]
    fn strict_rejects_insufficient_stock() {
        let d = decrement(4, 5);
        let err = InventoryPolicy::Strict
            .settle(&d, DecrementOutcome::Insufficient { available: 3 })
            .unwrap_err();
        assert_eq!(
            err,
            InventoryError::StockExhausted {
                product_id: ProductId::new(4),
                requested: 5,
                available: 3,
            }
        );
    }

    #[test]
    fn warn_skips_missing_record() {
        let d = decrement(4, 1);
        let settled = InventoryPolicy::WarnAndContinue
            .settle(&d, DecrementOutcome::Missing)
            .unwrap();
        assert_eq!(
            settled,
            Settlement::Skipped(InventoryError::MissingRecord {
                product_id: ProductId::new(4)
            })
        );
    }

    #[test]
    fn parses_policy_names() {
        assert_eq!("STRICT".parse::<InventoryPolicy>().unwrap(), InventoryPolicy::Strict);
        assert_eq!(
            "warn-and-continue".parse::<InventoryPolicy>().unwrap(),
            InventoryPolicy::WarnAndContinue
        );
        assert!("lenient".parse::<InventoryPolicy>().is_err());
    }
}
