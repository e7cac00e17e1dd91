//! Value object trait: equality by value, not identity.

/// Marker trait for value objects.
///
/// Value objects are immutable and compared by their attributes: two
/// `Money::from_minor(100)` values are interchangeable, while two customers
/// with the same name are not (see [`crate::Entity`]).
///
/// To "modify" a value object, construct a new one. Constructors validate, so
/// a `Quantity` or `TaxRate` that exists is always in range.
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {}
