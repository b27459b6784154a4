//! Inventory domain module.
//!
//! This crate contains the business rules for the inventory mutation protocol,
//! implemented purely as deterministic domain logic (no IO, no HTTP, no storage).
//! The infra layer reads current state from a store, asks [`plan`] what to do,
//! and writes the result back.

pub mod item;
pub mod mutation;
pub mod notice;
pub mod view;

pub use item::{EMPTY_NAME, InventoryItem, ItemName, Quantity};
pub use mutation::{ItemState, Mutation, MutationKind, MutationOutcome, StoreAction, plan};
pub use notice::{Notice, NoticeLevel};
pub use view::InventoryView;
