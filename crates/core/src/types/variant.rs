//! Product variant selection (e.g. `{"Color": "Red", "Size": "M"}`).

use core::fmt;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`VariantSelection`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VariantError {
    /// An option name or value is empty.
    #[error("variant option names and values cannot be empty")]
    Empty,
    /// An option name or value contains a reserved separator.
    #[error("variant option '{0}' contains a reserved character (',' or ':')")]
    ReservedCharacter(String),
    /// A text pair is missing its `:` separator.
    #[error("variant pair '{0}' must look like Name:Value")]
    MalformedPair(String),
}

/// The options a shopper picked for a product.
///
/// Options are kept sorted by name, so two selections with the same pairs
/// are equal regardless of the order they were chosen in. Two line items for
/// the same product with different selections are distinct lines.
///
/// The text form is `Name:Value` pairs joined by commas, sorted by name:
///
/// ```
/// use markethub_core::VariantSelection;
///
/// let variant: VariantSelection = "Size:M,Color:Red".parse().unwrap();
/// assert_eq!(variant.to_string(), "Color:Red,Size:M");
/// assert_eq!(variant.get("Color"), Some("Red"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(
    into = "BTreeMap<String, String>",
    try_from = "BTreeMap<String, String>"
)]
pub struct VariantSelection(BTreeMap<String, String>);

impl VariantSelection {
    /// An empty selection.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Build a selection from name/value pairs.
    ///
    /// # Errors
    ///
    /// Returns an error if any name or value is empty or contains `,` or `:`.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self, VariantError>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut selection = Self::new();
        for (name, value) in pairs {
            selection.insert(name, value)?;
        }
        Ok(selection)
    }

    /// Select `value` for option `name`, replacing any previous choice.
    ///
    /// # Errors
    ///
    /// Returns an error if the name or value is empty or contains `,` or `:`.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: impl Into<String>,
    ) -> Result<(), VariantError> {
        let name = name.into().trim().to_owned();
        let value = value.into().trim().to_owned();
        for part in [&name, &value] {
            if part.is_empty() {
                return Err(VariantError::Empty);
            }
            if part.contains([',', ':']) {
                return Err(VariantError::ReservedCharacter(part.clone()));
            }
        }
        self.0.insert(name, value);
        Ok(())
    }

    /// The value selected for option `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Whether no options are selected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterate over `(name, value)` pairs in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Collapse an empty selection into `None`.
    #[must_use]
    pub fn normalize(selection: Option<Self>) -> Option<Self> {
        selection.filter(|s| !s.is_empty())
    }
}

impl TryFrom<BTreeMap<String, String>> for VariantSelection {
    type Error = VariantError;

    fn try_from(pairs: BTreeMap<String, String>) -> Result<Self, Self::Error> {
        Self::from_pairs(pairs)
    }
}

impl From<VariantSelection> for BTreeMap<String, String> {
    fn from(selection: VariantSelection) -> Self {
        selection.0
    }
}

impl fmt::Display for VariantSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, value) in &self.0 {
            if !first {
                f.write_str(",")?;
            }
            write!(f, "{name}:{value}")?;
            first = false;
        }
        Ok(())
    }
}

impl std::str::FromStr for VariantSelection {
    type Err = VariantError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut selection = Self::new();
        for pair in s.split(',').map(str::trim).filter(|p| !p.is_empty()) {
            let (name, value) = pair
                .split_once(':')
                .ok_or_else(|| VariantError::MalformedPair(pair.to_owned()))?;
            selection.insert(name, value)?;
        }
        Ok(selection)
    }
}
