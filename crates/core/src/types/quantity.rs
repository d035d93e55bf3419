//! Line item quantity type.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when constructing a [`Quantity`].
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantityError {
    /// The quantity is zero.
    #[error("quantity must be at least 1")]
    Zero,
    /// The quantity is negative.
    #[error("quantity cannot be negative (got {0})")]
    Negative(i64),
    /// The quantity does not fit the supported range.
    #[error("quantity must be at most {max}")]
    TooLarge {
        /// Maximum allowed quantity.
        max: u32,
    },
}

/// A positive number of units on a line item.
///
/// ## Constraints
///
/// - At least 1
/// - At most [`Quantity::MAX`]
///
/// ## Examples
///
/// ```
/// use markethub_core::Quantity;
///
/// assert!(Quantity::new(1).is_ok());
/// assert!(Quantity::new(0).is_err());
/// assert!(Quantity::try_from_signed(-3).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct Quantity(u32);

impl Quantity {
    /// The smallest valid quantity.
    pub const ONE: Self = Self(1);

    /// Upper bound on a single line's quantity.
    pub const MAX: u32 = 10_000;

    /// Create a quantity from an unsigned count.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is zero or above [`Quantity::MAX`].
    pub const fn new(value: u32) -> Result<Self, QuantityError> {
        if value == 0 {
            return Err(QuantityError::Zero);
        }
        if value > Self::MAX {
            return Err(QuantityError::TooLarge { max: Self::MAX });
        }
        Ok(Self(value))
    }

    /// Create a quantity from a signed count, as received from a form or
    /// request body.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` is not in `1..=MAX`.
    pub fn try_from_signed(value: i64) -> Result<Self, QuantityError> {
        if value < 0 {
            return Err(QuantityError::Negative(value));
        }
        let value = u32::try_from(value).map_err(|_| QuantityError::TooLarge { max: Self::MAX })?;
        Self::new(value)
    }

    /// The number of units.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Add two quantities.
    ///
    /// # Errors
    ///
    /// Returns [`QuantityError::TooLarge`] if the sum exceeds [`Quantity::MAX`].
    pub const fn checked_add(self, other: Self) -> Result<Self, QuantityError> {
        match self.0.checked_add(other.0) {
            Some(sum) => Self::new(sum),
            None => Err(QuantityError::TooLarge { max: Self::MAX }),
        }
    }
}

impl TryFrom<u32> for Quantity {
    type Error = QuantityError;

    fn try_from(value: u32) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Quantity> for u32 {
    fn from(quantity: Quantity) -> Self {
        quantity.0
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
