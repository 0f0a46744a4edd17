//! Product row model, write payloads and validation rules.
//!
//! # Responsibility
//! - Define the product row shape returned by queries.
//! - Define `ProductValues`, the tri-state write payload for insert/update.
//! - Enforce field invariants before any storage mutation.
//!
//! # Invariants
//! - `validate_insert` / `validate_update` never touch storage.
//! - Insert requires a non-empty name and non-null supplier fields.
//! - `price` and `quantity` must be non-negative whenever a value is given.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Surrogate key assigned by the storage engine on insert.
///
/// Kept as a type alias to make semantic intent explicit in signatures.
pub type ProductId = i64;

/// One product row as read back from storage.
///
/// Columns excluded from a query projection come back as `None`;
/// `price` and `quantity` may additionally be `None` because the
/// underlying columns are nullable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    /// Stable row id. Always selected, regardless of projection.
    pub id: ProductId,
    pub name: Option<String>,
    /// Unit price in minor currency units.
    pub price: Option<i64>,
    /// Units currently on hand.
    pub quantity: Option<i64>,
    pub supplier_name: Option<String>,
    pub supplier_phone: Option<String>,
}

/// Tri-state write slot for one column.
///
/// Partial updates need three cases, not two: a field the caller did not
/// mention (`Absent`, leave the column untouched), a field explicitly set
/// to SQL NULL (`Null`), and a concrete value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Provided<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Provided<T> {
    /// Returns whether the caller supplied this field at all.
    pub fn is_present(&self) -> bool {
        !matches!(self, Self::Absent)
    }

    /// Returns the concrete value, if one was supplied.
    pub fn as_value(&self) -> Option<&T> {
        match self {
            Self::Value(value) => Some(value),
            Self::Absent | Self::Null => None,
        }
    }
}

/// Write payload for insert and update operations.
///
/// Mirrors a key/value bag keyed by column: every field defaults to
/// `Provided::Absent` and only present fields participate in the SQL
/// statement.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ProductValues {
    pub name: Provided<String>,
    pub price: Provided<i64>,
    pub quantity: Provided<i64>,
    pub supplier_name: Provided<String>,
    pub supplier_phone: Provided<String>,
}

impl ProductValues {
    /// Builds a fully-populated payload for a new product.
    pub fn for_insert(
        name: impl Into<String>,
        price: Option<i64>,
        quantity: Option<i64>,
        supplier_name: impl Into<String>,
        supplier_phone: impl Into<String>,
    ) -> Self {
        Self {
            name: Provided::Value(name.into()),
            price: price.map_or(Provided::Null, Provided::Value),
            quantity: quantity.map_or(Provided::Null, Provided::Value),
            supplier_name: Provided::Value(supplier_name.into()),
            supplier_phone: Provided::Value(supplier_phone.into()),
        }
    }

    /// Returns whether no field is present at all.
    ///
    /// Empty payloads short-circuit update calls to a zero-row no-op.
    pub fn is_empty(&self) -> bool {
        !self.name.is_present()
            && !self.price.is_present()
            && !self.quantity.is_present()
            && !self.supplier_name.is_present()
            && !self.supplier_phone.is_present()
    }
}

/// Field-level validation failure, raised before any storage call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProductValidationError {
    /// `name` is missing, null or empty on insert, or null on update.
    NameRequired,
    /// `price` was given a negative value.
    NegativePrice(i64),
    /// `quantity` was given a negative value.
    NegativeQuantity(i64),
    /// `supplier_name` is missing or null on insert, or null on update.
    SupplierNameRequired,
    /// `supplier_phone` is missing or null on insert, or null on update.
    SupplierPhoneRequired,
}

impl ProductValidationError {
    /// Column name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::NameRequired => "name",
            Self::NegativePrice(_) => "price",
            Self::NegativeQuantity(_) => "quantity",
            Self::SupplierNameRequired => "supplier_name",
            Self::SupplierPhoneRequired => "supplier_phone",
        }
    }
}

impl Display for ProductValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NameRequired => write!(f, "product requires a name"),
            Self::NegativePrice(value) => {
                write!(f, "price requires a non-negative value, got {value}")
            }
            Self::NegativeQuantity(value) => {
                write!(f, "quantity requires a non-negative value, got {value}")
            }
            Self::SupplierNameRequired => write!(f, "product requires a supplier name"),
            Self::SupplierPhoneRequired => write!(f, "product requires a supplier phone"),
        }
    }
}

impl Error for ProductValidationError {}

/// Validates a payload for insert.
///
/// # Contract
/// - `name` must be present with a non-empty value.
/// - `supplier_name` and `supplier_phone` must be present with a value.
/// - `price` / `quantity` values must be >= 0; explicit nulls are allowed.
pub fn validate_insert(values: &ProductValues) -> Result<(), ProductValidationError> {
    match values.name.as_value() {
        Some(name) if !name.is_empty() => {}
        _ => return Err(ProductValidationError::NameRequired),
    }
    check_non_negative(&values.price, ProductValidationError::NegativePrice)?;
    check_non_negative(&values.quantity, ProductValidationError::NegativeQuantity)?;
    if values.supplier_name.as_value().is_none() {
        return Err(ProductValidationError::SupplierNameRequired);
    }
    if values.supplier_phone.as_value().is_none() {
        return Err(ProductValidationError::SupplierPhoneRequired);
    }
    Ok(())
}

/// Validates a payload for partial update.
///
/// Each field is checked only under its own presence flag: absent fields
/// are left untouched by the update and never fail validation, while
/// present-but-null text fields do. `price` and `quantity` accept explicit
/// nulls but reject negative values.
pub fn validate_update(values: &ProductValues) -> Result<(), ProductValidationError> {
    if matches!(values.name, Provided::Null) {
        return Err(ProductValidationError::NameRequired);
    }
    check_non_negative(&values.price, ProductValidationError::NegativePrice)?;
    check_non_negative(&values.quantity, ProductValidationError::NegativeQuantity)?;
    if matches!(values.supplier_name, Provided::Null) {
        return Err(ProductValidationError::SupplierNameRequired);
    }
    if matches!(values.supplier_phone, Provided::Null) {
        return Err(ProductValidationError::SupplierPhoneRequired);
    }
    Ok(())
}

fn check_non_negative(
    slot: &Provided<i64>,
    to_error: fn(i64) -> ProductValidationError,
) -> Result<(), ProductValidationError> {
    match slot.as_value() {
        Some(&value) if value < 0 => Err(to_error(value)),
        _ => Ok(()),
    }
}
