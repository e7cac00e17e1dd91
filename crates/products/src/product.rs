use serde::{Deserialize, Serialize};

use stockorder_core::{DomainError, DomainResult, Entity, Money, ProductId};

/// Point-in-time view of a catalog product.
///
/// Once an order line holds a `Product`, later catalog price changes never
/// reach it: the line keeps this value, not a reference to the live row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    id: ProductId,
    name: String,
    unit_price: Money,
    category: String,
}

impl Product {
    pub fn new(
        id: ProductId,
        name: impl Into<String>,
        unit_price: Money,
        category: impl Into<String>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("product name must not be empty"));
        }
        if unit_price < Money::ZERO {
            return Err(DomainError::validation(format!(
                "unit price must not be negative (product {id})"
            )));
        }

        Ok(Self {
            id,
            name,
            unit_price,
            category: category.into(),
        })
    }

    pub fn id_typed(&self) -> ProductId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Price in smallest currency unit (e.g., cents).
    pub fn unit_price(&self) -> Money {
        self.unit_price
    }

    pub fn category(&self) -> &str {
        &self.category
    }
}

impl Entity for Product {
    type Id = ProductId;

    fn id(&self) -> ProductId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builds_a_valid_snapshot() {
        let p = Product::new(ProductId::new(1), "Stapler", Money::from_minor(1_250), "Office").unwrap();
        assert_eq!(p.id(), ProductId::new(1));
        assert_eq!(p.name(), "Stapler");
        assert_eq!(p.unit_price(), Money::from_minor(1_250));
        assert_eq!(p.category(), "Office");
    }

    #[test]
    fn rejects_blank_name() {
        let err = Product::new(ProductId::new(1), "  ", Money::ZERO, "Office").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn rejects_negative_price() {
        let err = Product::new(ProductId::new(1), "Pen", Money::from_minor(-1), "Office").unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }
}
