//! Inventory mutation protocol (pure decision logic).
//!
//! Every mutation is a read-modify-write against a single document:
//!
//! ```text
//! read current quantity -> plan(mutation, current) -> StoreAction -> write/delete
//! ```
//!
//! | mutation | current      | action                  |
//! |----------|--------------|-------------------------|
//! | add      | absent       | write initial quantity  |
//! | add      | `n`          | write `n + 1`           |
//! | remove   | absent       | unchanged               |
//! | remove   | `1`          | delete                  |
//! | remove   | `n > 1`      | write `n - 1`           |
//! | delete   | any          | delete                  |
//!
//! A quantity of zero is never written: the document is deleted instead.

use serde::{Deserialize, Serialize};

use stockpile_core::DomainResult;

use crate::item::{ItemName, Quantity};

/// A user intent against one item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Mutation {
    /// Create with `initial` or increment by one if the item already exists.
    Add { name: ItemName, initial: Quantity },
    /// Decrement by one, deleting the item when it would reach zero.
    Remove { name: ItemName },
    /// Delete regardless of quantity.
    Delete { name: ItemName },
}

impl Mutation {
    pub fn add(name: ItemName, initial: Quantity) -> Self {
        Self::Add { name, initial }
    }

    pub fn remove(name: ItemName) -> Self {
        Self::Remove { name }
    }

    pub fn delete(name: ItemName) -> Self {
        Self::Delete { name }
    }

    pub fn name(&self) -> &ItemName {
        match self {
            Mutation::Add { name, .. } | Mutation::Remove { name } | Mutation::Delete { name } => name,
        }
    }

    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Add { .. } => MutationKind::Add,
            Mutation::Remove { .. } => MutationKind::Remove,
            Mutation::Delete { .. } => MutationKind::Delete,
        }
    }

    /// Whether the outcome depends on the current quantity (needs a read first).
    pub fn reads_current(&self) -> bool {
        !matches!(self, Mutation::Delete { .. })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutationKind {
    Add,
    Remove,
    Delete,
}

impl MutationKind {
    pub fn as_str(self) -> &'static str {
        match self {
            MutationKind::Add => "add",
            MutationKind::Remove => "remove",
            MutationKind::Delete => "delete",
        }
    }
}

impl core::fmt::Display for MutationKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the store must do to apply a mutation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum StoreAction {
    Write(Quantity),
    Delete,
    Unchanged,
}

impl StoreAction {
    /// Item state once the action has been applied on top of `current`.
    pub fn resulting_state(self, current: Option<Quantity>) -> ItemState {
        match self {
            StoreAction::Write(q) => ItemState::Present(q),
            StoreAction::Delete => ItemState::Absent,
            StoreAction::Unchanged => current.map_or(ItemState::Absent, ItemState::Present),
        }
    }
}

/// Decide the store action for `mutation` given the item's current quantity.
pub fn plan(mutation: &Mutation, current: Option<Quantity>) -> DomainResult<StoreAction> {
    let action = match (mutation, current) {
        (Mutation::Add { initial, .. }, None) => StoreAction::Write(*initial),
        (Mutation::Add { .. }, Some(q)) => StoreAction::Write(q.increment()?),
        (Mutation::Remove { .. }, None) => StoreAction::Unchanged,
        (Mutation::Remove { .. }, Some(q)) => match q.decrement() {
            Some(next) => StoreAction::Write(next),
            None => StoreAction::Delete,
        },
        (Mutation::Delete { .. }, _) => StoreAction::Delete,
    };
    Ok(action)
}

/// Item state after a mutation.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "quantity", rename_all = "snake_case")]
pub enum ItemState {
    Present(Quantity),
    Absent,
}

impl ItemState {
    pub fn quantity(self) -> Option<Quantity> {
        match self {
            ItemState::Present(q) => Some(q),
            ItemState::Absent => None,
        }
    }
}

/// The result of one applied mutation, used to update local state incrementally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationOutcome {
    pub name: ItemName,
    pub kind: MutationKind,
    pub state: ItemState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn name(s: &str) -> ItemName {
        ItemName::parse(s).unwrap()
    }

    fn qty(n: u64) -> Quantity {
        Quantity::new(n).unwrap()
    }

    #[test]
    fn add_creates_with_initial_quantity() {
        let m = Mutation::add(name("apple"), qty(5));
        assert_eq!(plan(&m, None).unwrap(), StoreAction::Write(qty(5)));
    }

    #[test]
    fn remove_of_absent_item_does_nothing() {
        let m = Mutation::remove(name("apple"));
        let action = plan(&m, None).unwrap();
        assert_eq!(action, StoreAction::Unchanged);
        assert_eq!(action.resulting_state(None), ItemState::Absent);
    }

    #[test]
    fn remove_at_one_deletes() {
        let m = Mutation::remove(name("apple"));
        assert_eq!(plan(&m, Some(Quantity::ONE)).unwrap(), StoreAction::Delete);
    }

    #[test]
    fn delete_ignores_current_quantity() {
        let m = Mutation::delete(name("apple"));
        assert!(!m.reads_current());
        assert_eq!(plan(&m, None).unwrap(), StoreAction::Delete);
        assert_eq!(plan(&m, Some(qty(99))).unwrap(), StoreAction::Delete);
    }

    #[test]
    fn add_at_store_limit_is_rejected() {
        let m = Mutation::add(name("apple"), Quantity::ONE);
        assert!(plan(&m, Some(Quantity::MAX)).is_err());
    }

    #[test]
    fn mutation_serializes_with_kind_tag() {
        let json = serde_json::to_value(Mutation::add(name("apple"), qty(2))).unwrap();
        assert_eq!(json["kind"], "add");
        assert_eq!(json["name"], "apple");
        assert_eq!(json["initial"], 2);
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Adding to an existing item always increments by one, whatever initial quantity is passed.
        #[test]
        fn add_increments_existing(current in 1u64..1_000_000, initial in 1u64..1_000_000) {
            let m = Mutation::add(name("bolt"), qty(initial));
            prop_assert_eq!(plan(&m, Some(qty(current))).unwrap(), StoreAction::Write(qty(current + 1)));
        }

        /// Removing above one decrements; nothing ever plans a write of zero.
        #[test]
        fn remove_decrements_above_one(current in 2u64..1_000_000) {
            let m = Mutation::remove(name("bolt"));
            prop_assert_eq!(plan(&m, Some(qty(current))).unwrap(), StoreAction::Write(qty(current - 1)));
        }

        /// Replaying a sequence of intents through `plan` matches a simple counter model.
        #[test]
        fn plan_matches_counter_model(ops in prop::collection::vec((0u8..3, 1u64..5), 0..40)) {
            let mut current: Option<Quantity> = None;
            let mut model: u64 = 0;

            for (op, initial) in ops {
                let m = match op {
                    0 => Mutation::add(name("bolt"), qty(initial)),
                    1 => Mutation::remove(name("bolt")),
                    _ => Mutation::delete(name("bolt")),
                };
                let action = plan(&m, current).unwrap();
                current = action.resulting_state(current).quantity();

                model = match op {
                    0 if model == 0 => initial,
                    0 => model + 1,
                    1 => model.saturating_sub(1),
                    _ => 0,
                };

                prop_assert_eq!(current.map_or(0, Quantity::get), model);
            }
        }
    }
}
