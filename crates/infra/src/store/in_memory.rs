use std::collections::BTreeMap;
use std::sync::RwLock;

use chrono::Utc;

use stockpile_core::{ExpectedVersion, Revision};
use stockpile_inventory::{ItemName, Quantity};

use super::{InventoryStore, StoreError, StoredItem};

/// In-memory inventory collection.
///
/// Intended for tests/dev. Not optimized for performance.
#[derive(Debug, Default)]
pub struct InMemoryInventoryStore {
    docs: RwLock<BTreeMap<ItemName, StoredItem>>,
}

impl InMemoryInventoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn current_revision(docs: &BTreeMap<ItemName, StoredItem>, name: &ItemName) -> Revision {
        docs.get(name).map(|d| d.revision).unwrap_or(Revision::ABSENT)
    }

    fn check(expected: ExpectedVersion, name: &ItemName, current: Revision) -> Result<(), StoreError> {
        expected
            .check(current)
            .map_err(|e| StoreError::Conflict(format!("{name}: {}", e.detail())))
    }
}

#[async_trait::async_trait]
impl InventoryStore for InMemoryInventoryStore {
    async fn list_all(&self) -> Result<Vec<StoredItem>, StoreError> {
        let docs = self
            .docs
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(docs.values().cloned().collect())
    }

    async fn read(&self, name: &ItemName) -> Result<Option<StoredItem>, StoreError> {
        let docs = self
            .docs
            .read()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;
        Ok(docs.get(name).cloned())
    }

    async fn write(
        &self,
        name: &ItemName,
        quantity: Quantity,
        expected: ExpectedVersion,
    ) -> Result<StoredItem, StoreError> {
        let mut docs = self
            .docs
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let current = Self::current_revision(&docs, name);
        Self::check(expected, name, current)?;

        let doc = StoredItem {
            name: name.clone(),
            quantity,
            revision: current.next(),
            updated_at: Utc::now(),
        };
        docs.insert(name.clone(), doc.clone());
        Ok(doc)
    }

    async fn delete(&self, name: &ItemName, expected: ExpectedVersion) -> Result<(), StoreError> {
        let mut docs = self
            .docs
            .write()
            .map_err(|_| StoreError::Unavailable("lock poisoned".to_string()))?;

        let current = Self::current_revision(&docs, name);
        Self::check(expected, name, current)?;

        docs.remove(name);
        Ok(())
    }
}
