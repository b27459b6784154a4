use std::collections::BTreeMap;

use crate::item::{InventoryItem, ItemName, Quantity};
use crate::mutation::{ItemState, MutationOutcome};

/// Local snapshot of the inventory listing.
///
/// Loaded in full from the store, then kept current by applying each
/// mutation's own outcome instead of re-reading the whole collection.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InventoryView {
    items: BTreeMap<ItemName, Quantity>,
}

impl InventoryView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the snapshot with a full listing.
    pub fn from_items(items: impl IntoIterator<Item = InventoryItem>) -> Self {
        Self {
            items: items.into_iter().map(|i| (i.name, i.quantity)).collect(),
        }
    }

    pub fn apply(&mut self, outcome: &MutationOutcome) {
        match outcome.state {
            ItemState::Present(q) => {
                self.items.insert(outcome.name.clone(), q);
            }
            ItemState::Absent => {
                self.items.remove(&outcome.name);
            }
        }
    }

    pub fn get(&self, name: &ItemName) -> Option<Quantity> {
        self.items.get(name).copied()
    }

    /// Items in ascending name order.
    pub fn items(&self) -> Vec<InventoryItem> {
        self.items
            .iter()
            .map(|(name, quantity)| InventoryItem::new(name.clone(), *quantity))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
