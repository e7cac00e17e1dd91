//! Ordered quantity value object.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, DomainResult};
use crate::value_object::ValueObject;

/// Strictly positive unit count, bounded by the storage column (`INTEGER`).
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(u32);

impl ValueObject for Quantity {}

impl Quantity {
    pub const MAX: u32 = i32::MAX as u32;

    pub fn new(value: i64) -> DomainResult<Self> {
        if value <= 0 {
            return Err(DomainError::validation(format!(
                "quantity must be positive, got {value}"
            )));
        }
        if value > i64::from(Self::MAX) {
            return Err(DomainError::validation(format!(
                "quantity {value} exceeds the maximum of {}",
                Self::MAX
            )));
        }
        Ok(Self(value as u32))
    }

    pub const fn get(self) -> u32 {
        self.0
    }

    /// Column value; lossless because `new` caps at `i32::MAX`.
    pub const fn as_i32(self) -> i32 {
        self.0 as i32
    }
}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        i64::from(value.0)
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}
