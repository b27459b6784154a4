//! Inventory document store: one document per item name in the `inventory` collection.

mod in_memory;
mod postgres;

pub use in_memory::InMemoryInventoryStore;
pub use postgres::PostgresInventoryStore;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use stockpile_core::{ExpectedVersion, Revision};
use stockpile_inventory::{InventoryItem, ItemName, Quantity};

/// Name of the document collection (table) holding inventory items.
pub const COLLECTION: &str = "inventory";

/// A persisted inventory document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoredItem {
    pub name: ItemName,
    pub quantity: Quantity,
    /// Optimistic concurrency token, bumped on every write.
    pub revision: Revision,
    pub updated_at: DateTime<Utc>,
}

impl From<StoredItem> for InventoryItem {
    fn from(value: StoredItem) -> Self {
        InventoryItem::new(value.name, value.quantity)
    }
}

/// Store operation error.
///
/// These are infrastructure errors, as opposed to domain errors (validation,
/// invariants). Every store call is atomic for its single document, so a
/// failed call never leaves a partial write behind.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A conditional write/delete found a different revision than expected.
    #[error("optimistic concurrency check failed: {0}")]
    Conflict(String),

    /// The backend could not be reached (pool closed, lock poisoned, IO).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A persisted document violates the inventory invariants.
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// Any other backend failure.
    #[error("store backend error: {0}")]
    Backend(String),
}

impl StoreError {
    pub fn is_conflict(&self) -> bool {
        matches!(self, StoreError::Conflict(_))
    }
}

/// Single-document CRUD over the inventory collection.
///
/// ## Semantics
///
/// - `write` with `ExpectedVersion::Any` is an idempotent upsert; with
///   `Exact(r)` it only succeeds if the document's current revision is `r`
///   (`Revision::ABSENT`: only if no document exists).
/// - `delete` with `Any` is a no-op when the document is absent; with
///   `Exact(r)` it fails with `Conflict` on a revision mismatch.
/// - `list_all` order is unspecified by the contract; the bundled backends
///   return ascending name order.
#[async_trait::async_trait]
pub trait InventoryStore: Send + Sync {
    async fn list_all(&self) -> Result<Vec<StoredItem>, StoreError>;

    async fn read(&self, name: &ItemName) -> Result<Option<StoredItem>, StoreError>;

    async fn write(
        &self,
        name: &ItemName,
        quantity: Quantity,
        expected: ExpectedVersion,
    ) -> Result<StoredItem, StoreError>;

    async fn delete(&self, name: &ItemName, expected: ExpectedVersion) -> Result<(), StoreError>;
}

#[async_trait::async_trait]
impl<S> InventoryStore for Arc<S>
where
    S: InventoryStore + ?Sized,
{
    async fn list_all(&self) -> Result<Vec<StoredItem>, StoreError> {
        (**self).list_all().await
    }

    async fn read(&self, name: &ItemName) -> Result<Option<StoredItem>, StoreError> {
        (**self).read(name).await
    }

    async fn write(
        &self,
        name: &ItemName,
        quantity: Quantity,
        expected: ExpectedVersion,
    ) -> Result<StoredItem, StoreError> {
        (**self).write(name, quantity, expected).await
    }

    async fn delete(&self, name: &ItemName, expected: ExpectedVersion) -> Result<(), StoreError> {
        (**self).delete(name, expected).await
    }
}
