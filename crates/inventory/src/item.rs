use serde::{Deserialize, Serialize};

use stockpile_core::{DomainError, DomainResult};

/// Validation message for a blank item name.
pub const EMPTY_NAME: &str = "item name cannot be empty";

/// Item name: the document key of an inventory item.
///
/// Trimmed of surrounding whitespace, never empty, case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ItemName(String);

impl ItemName {
    /// Validate and normalize a raw, user-supplied name.
    pub fn parse(raw: &str) -> DomainResult<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(DomainError::validation(EMPTY_NAME));
        }
        // Document ids cannot contain a path separator.
        if trimmed.contains('/') {
            return Err(DomainError::validation("item name cannot contain '/'"));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name as shown to users: first character upper-cased, rest untouched.
    pub fn display_name(&self) -> String {
        let mut chars = self.0.chars();
        match chars.next() {
            Some(first) => first.to_uppercase().chain(chars).collect(),
            None => String::new(),
        }
    }
}

impl core::fmt::Display for ItemName {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ItemName {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ItemName> for String {
    fn from(value: ItemName) -> Self {
        value.0
    }
}

impl AsRef<str> for ItemName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Quantity of a persisted item. Always at least 1.
///
/// The upper bound is `i64::MAX` so that every quantity fits the store's
/// signed 64-bit column.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub struct Quantity(u64);

impl Quantity {
    pub const ONE: Quantity = Quantity(1);
    pub const MAX: Quantity = Quantity(i64::MAX as u64);

    pub fn new(value: u64) -> DomainResult<Self> {
        if value == 0 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        if value > Self::MAX.0 {
            return Err(DomainError::validation("quantity is too large"));
        }
        Ok(Self(value))
    }

    /// Parse a caller-supplied signed quantity (e.g. from a JSON body).
    pub fn from_signed(value: i64) -> DomainResult<Self> {
        if value < 1 {
            return Err(DomainError::validation("quantity must be at least 1"));
        }
        Self::new(value as u64)
    }

    pub fn get(self) -> u64 {
        self.0
    }

    pub fn as_i64(self) -> i64 {
        // Bounded by `MAX` on construction.
        self.0 as i64
    }

    pub fn increment(self) -> DomainResult<Self> {
        if self == Self::MAX {
            return Err(DomainError::invariant("quantity cannot exceed the store limit"));
        }
        Ok(Self(self.0 + 1))
    }

    /// One unit less, or `None` when that would reach zero.
    pub fn decrement(self) -> Option<Self> {
        if self.0 == 1 { None } else { Some(Self(self.0 - 1)) }
    }
}

impl Default for Quantity {
    fn default() -> Self {
        Self::ONE
    }
}

impl core::fmt::Display for Quantity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

impl TryFrom<i64> for Quantity {
    type Error = DomainError;

    fn try_from(value: i64) -> Result<Self, Self::Error> {
        Self::from_signed(value)
    }
}

impl From<Quantity> for i64 {
    fn from(value: Quantity) -> Self {
        value.as_i64()
    }
}

/// A named, countable inventory entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InventoryItem {
    pub name: ItemName,
    pub quantity: Quantity,
}

impl InventoryItem {
    pub fn new(name: ItemName, quantity: Quantity) -> Self {
        Self { name, quantity }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_names_are_rejected() {
        for raw in ["", "   ", "\t\n"] {
            match ItemName::parse(raw) {
                Err(DomainError::Validation(msg)) => assert_eq!(msg, "item name cannot be empty"),
                other => panic!("expected validation error for {raw:?}, got {other:?}"),
            }
        }
    }

    #[test]
    fn names_are_trimmed_but_case_is_kept() {
        let name = ItemName::parse("  apple Pie ").unwrap();
        assert_eq!(name.as_str(), "apple Pie");
        assert_ne!(name, ItemName::parse("Apple Pie").unwrap());
    }

    #[test]
    fn path_separators_are_rejected() {
        assert!(matches!(ItemName::parse("a/b"), Err(DomainError::Validation(_))));
    }

    #[test]
    fn display_name_capitalizes_first_character() {
        assert_eq!(ItemName::parse("apple").unwrap().display_name(), "Apple");
        assert_eq!(ItemName::parse("éclair").unwrap().display_name(), "Éclair");
        assert_eq!(ItemName::parse("42 bolts").unwrap().display_name(), "42 bolts");
    }

    #[test]
    fn quantity_rejects_zero_and_negative() {
        assert!(Quantity::new(0).is_err());
        assert!(Quantity::from_signed(0).is_err());
        assert!(Quantity::from_signed(-3).is_err());
        assert_eq!(Quantity::from_signed(7).unwrap().get(), 7);
    }

    #[test]
    fn quantity_decrement_stops_at_one() {
        assert_eq!(Quantity::new(2).unwrap().decrement(), Some(Quantity::ONE));
        assert_eq!(Quantity::ONE.decrement(), None);
    }

    #[test]
    fn quantity_increment_is_bounded() {
        assert_eq!(Quantity::ONE.increment().unwrap().get(), 2);
        assert!(Quantity::MAX.increment().is_err());
    }

    #[test]
    fn serde_validates_on_deserialize() {
        let item: InventoryItem =
            serde_json::from_str(r#"{"name":" apple ","quantity":3}"#).unwrap();
        assert_eq!(item.name.as_str(), "apple");
        assert_eq!(item.quantity.get(), 3);

        assert!(serde_json::from_str::<InventoryItem>(r#"{"name":"apple","quantity":0}"#).is_err());
        assert!(serde_json::from_str::<InventoryItem>(r#"{"name":"  ","quantity":1}"#).is_err());
    }
}
