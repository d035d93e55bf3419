//! Product status enum.

use serde::{Deserialize, Serialize};

/// Catalog status of a product.
///
/// Only [`ProductStatus::Active`] products can be added to a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProductStatus {
    /// Listed and purchasable.
    #[default]
    Active,
    /// Delisted by an administrator.
    Inactive,
    /// Not yet published.
    Draft,
}

impl ProductStatus {
    /// Whether products in this status may be added to a cart.
    #[must_use]
    pub const fn is_purchasable(self) -> bool {
        matches!(self, Self::Active)
    }
}

impl std::fmt::Display for ProductStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Active => write!(f, "active"),
            Self::Inactive => write!(f, "inactive"),
            Self::Draft => write!(f, "draft"),
        }
    }
}

impl std::str::FromStr for ProductStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "active" => Ok(Self::Active),
            "inactive" => Ok(Self::Inactive),
            "draft" => Ok(Self::Draft),
            _ => Err(format!("invalid product status: {s}")),
        }
    }
}
