//! Monetary amounts and the flat tax rate.
//!
//! Amounts are integer minor units (e.g. cents) so that `total == net + tax`
//! holds exactly. Rates are basis points (1/100 of a percent).

use core::str::FromStr;
use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::quantity::Quantity;
use crate::value_object::ValueObject;

const BASIS_POINTS_PER_UNIT: i128 = 10_000;

/// Amount in the smallest currency unit (e.g. cents). Single currency.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl ValueObject for Money {}

impl Money {
    pub const ZERO: Money = Money(0);

    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    pub const fn minor(self) -> i64 {
        self.0
    }

    pub fn checked_add(self, other: Money) -> DomainResult<Money> {
        self.0
            .checked_add(other.0)
            .map(Money)
            .ok_or_else(|| DomainError::validation("monetary amount overflow"))
    }

    /// Extended amount for `quantity` units at this unit price.
    pub fn times(self, quantity: Quantity) -> DomainResult<Money> {
        self.0
            .checked_mul(i64::from(quantity.get()))
            .map(Money)
            .ok_or_else(|| DomainError::validation("line amount overflow"))
    }
}

impl core::fmt::Display for Money {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

/// Flat tax rate applied to an order's net amount.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaxRate(u32);

impl ValueObject for TaxRate {}

impl TaxRate {
    /// 20 %.
    pub const STANDARD: TaxRate = TaxRate(2_000);

    pub fn from_basis_points(bps: u32) -> DomainResult<Self> {
        if i128::from(bps) > BASIS_POINTS_PER_UNIT {
            return Err(DomainError::validation(format!(
                "tax rate must be between 0 and 10000 basis points, got {bps}"
            )));
        }
        Ok(Self(bps))
    }

    pub const fn basis_points(self) -> u32 {
        self.0
    }

    /// Tax owed on `net`, rounded half away from zero to the minor unit.
    pub fn tax_on(self, net: Money) -> DomainResult<Money> {
        let scaled = i128::from(net.minor()) * i128::from(self.0);
        let half = BASIS_POINTS_PER_UNIT / 2;
        let rounded = if scaled >= 0 {
            (scaled + half) / BASIS_POINTS_PER_UNIT
        } else {
            (scaled - half) / BASIS_POINTS_PER_UNIT
        };
        i64::try_from(rounded)
            .map(Money::from_minor)
            .map_err(|_| DomainError::validation("tax amount overflow"))
    }
}

impl Default for TaxRate {
    fn default() -> Self {
        Self::STANDARD
    }
}

impl core::fmt::Display for TaxRate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{:02}%", self.0 / 100, self.0 % 100)
    }
}

/// Parses a decimal fraction such as `0.20` (at most four decimal places).
impl FromStr for TaxRate {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let invalid = || DomainError::validation(format!("invalid tax rate '{s}'"));

        let (whole, fraction) = s.split_once('.').unwrap_or((s, ""));
        if whole.is_empty() && fraction.is_empty() {
            return Err(invalid());
        }
        if fraction.len() > 4 || !fraction.chars().all(|c| c.is_ascii_digit()) {
            return Err(invalid());
        }

        let whole: u32 = if whole.is_empty() {
            0
        } else {
            whole.parse().map_err(|_| invalid())?
        };
        let fraction: u32 = format!("{fraction:0<4}").parse().map_err(|_| invalid())?;

        let bps = whole
            .checked_mul(10_000)
            .and_then(|w| w.checked_add(fraction))
            .ok_or_else(invalid)?;
        Self::from_basis_points(bps)
    }
}
