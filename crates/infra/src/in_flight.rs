//! Per-item in-flight markers.
//!
//! A mutation holds an [`InFlightGuard`] for its item while it runs. A second
//! mutation on the same item is refused until the guard drops; other items
//! stay available.

use std::collections::HashSet;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use stockpile_inventory::ItemName;

#[derive(Debug, Clone, Default)]
pub struct InFlightSet {
    names: Arc<Mutex<HashSet<ItemName>>>,
}

impl InFlightSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mark `name` as in flight, or `None` if it already is.
    pub fn try_acquire(&self, name: &ItemName) -> Option<InFlightGuard> {
        if !lock(&self.names).insert(name.clone()) {
            return None;
        }
        Some(InFlightGuard {
            names: self.names.clone(),
            name: name.clone(),
        })
    }

    pub fn contains(&self, name: &ItemName) -> bool {
        lock(&self.names).contains(name)
    }

    pub fn len(&self) -> usize {
        lock(&self.names).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Releases the item's in-flight marker on drop, whatever the outcome.
#[derive(Debug)]
pub struct InFlightGuard {
    names: Arc<Mutex<HashSet<ItemName>>>,
    name: ItemName,
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        lock(&self.names).remove(&self.name);
    }
}

// The set only holds names, so a panic while holding the lock leaves it usable.
fn lock(names: &Mutex<HashSet<ItemName>>) -> MutexGuard<'_, HashSet<ItemName>> {
    names.lock().unwrap_or_else(PoisonError::into_inner)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn name(s: &str) -> ItemName {
        ItemName::parse(s).unwrap()
    }

    #[test]
    fn same_item_cannot_be_acquired_twice() {
        let set = InFlightSet::new();
        let _guard = set.try_acquire(&name("apple")).unwrap();
        assert!(set.try_acquire(&name("apple")).is_none());
        assert!(set.contains(&name("apple")));
    }

    #[test]
    fn other_items_stay_available() {
        let set = InFlightSet::new();
        let _apple = set.try_acquire(&name("apple")).unwrap();
        let _pear = set.try_acquire(&name("pear")).unwrap();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn drop_releases_the_marker() {
        let set = InFlightSet::new();
        {
            let _guard = set.try_acquire(&name("apple")).unwrap();
        }
        assert!(set.is_empty());
        assert!(set.try_acquire(&name("apple")).is_some());
    }
}
