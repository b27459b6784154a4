//! Inventory mutation pipeline (application-level orchestration).
//!
//! The `InventoryMutator` runs each user intent as one read-plan-write sequence
//! against an [`InventoryStore`]:
//!
//! ```text
//! add / remove / delete
//!   ↓
//! 1. Validate input (no store access on failure)
//!   ↓
//! 2. Mark the item in flight (refuse overlapping mutations of the same item)
//!   ↓
//! 3. Read the current document (skipped for delete)
//!   ↓
//! 4. Plan the store action (pure, `stockpile_inventory::plan`)
//!   ↓
//! 5. Write / delete, conditioned on the revision read in step 3
//!   ↓
//! 6. Refresh the listing (full re-read or incremental, see `RefreshMode`)
//! ```
//!
//! A conflict in step 5 means another writer touched the item between the read
//! and the write; the whole sequence is retried from step 3. Backend faults are
//! not retried.

use std::sync::{PoisonError, RwLock};
use std::time::Duration;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use stockpile_core::{DomainError, ExpectedVersion, Revision};
use stockpile_inventory::{
    InventoryItem, InventoryView, ItemName, ItemState, Mutation, MutationOutcome, Quantity,
    StoreAction, plan,
};

use crate::in_flight::InFlightSet;
use crate::store::{InventoryStore, StoreError};

#[derive(Debug, Error)]
pub enum MutationError {
    /// Input rejected before any store access.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Another mutation of the same item is still running.
    #[error("a mutation of '{0}' is already in flight")]
    Busy(String),

    /// A store call failed (including conflicts that outlived the retry budget).
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<DomainError> for MutationError {
    fn from(value: DomainError) -> Self {
        MutationError::Validation(value.detail().to_string())
    }
}

/// Retry budget for optimistic concurrency conflicts.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    max_attempts: u32,
    backoff: Duration,
}

impl RetryPolicy {
    /// `max_attempts` counts the first try; values below 1 are raised to 1.
    pub fn new(max_attempts: u32, backoff: Duration) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    pub fn no_retry() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    /// Linear backoff before attempt `attempt + 1`.
    fn delay_after(&self, attempt: u32) -> Duration {
        self.backoff.saturating_mul(attempt)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(5, Duration::from_millis(10))
    }
}

/// How the listing returned with each mutation is produced.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub enum RefreshMode {
    /// Re-read the whole collection after every mutation.
    Full,
    /// Apply the mutation's own result to a cached listing; read the whole
    /// collection only on first use or explicit reconciliation.
    #[default]
    Incremental,
}

impl core::str::FromStr for RefreshMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "full" => Ok(RefreshMode::Full),
            "incremental" => Ok(RefreshMode::Incremental),
            other => Err(format!("unknown refresh mode '{other}' (expected 'full' or 'incremental')")),
        }
    }
}

#[derive(Debug, Copy, Clone, Default, PartialEq, Eq)]
pub struct MutatorConfig {
    pub retry: RetryPolicy,
    pub refresh: RefreshMode,
}

/// Full re-reads attempted by `reconcile` while other mutations keep changing
/// the cached listing.
const RECONCILE_ATTEMPTS: u32 = 3;

/// Cached listing plus a counter bumped on every change to it.
///
/// A reload only installs its snapshot if the generation it saw before reading
/// the store is still current; otherwise an outcome applied in between would be
/// overwritten by an older snapshot.
#[derive(Debug, Default)]
struct ViewCache {
    listing: Option<InventoryView>,
    generation: u64,
}

/// Result of a successful mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MutationReport {
    pub outcome: MutationOutcome,
    /// Listing after the mutation.
    pub items: Vec<InventoryItem>,
    /// The listing could not be re-read; `items` is the last known listing
    /// with this mutation applied.
    pub stale: bool,
    /// Store attempts used (more than one after conflicts).
    pub attempts: u32,
}

/// Runs add/remove/delete against an inventory store.
///
/// ## Concurrency
///
/// - Mutations of the same item never overlap within one mutator: the second
///   one fails fast with `MutationError::Busy`. Mutations of different items
///   run concurrently.
/// - Writes and deletes that depend on a read carry the revision that was read
///   (`ExpectedVersion::Exact`), so a concurrent writer causes a conflict and a
///   retry instead of a lost update.
/// - The explicit `delete` is unconditional (`ExpectedVersion::Any`).
///
/// ## Failure semantics
///
/// Every store call is single-document atomic. A failed mutation leaves the
/// store and the cached listing exactly as they were.
#[derive(Debug)]
pub struct InventoryMutator<S> {
    store: S,
    in_flight: InFlightSet,
    config: MutatorConfig,
    view: RwLock<ViewCache>,
}

impl<S> InventoryMutator<S> {
    pub fn new(store: S) -> Self {
        Self::with_config(store, MutatorConfig::default())
    }

    pub fn with_config(store: S, config: MutatorConfig) -> Self {
        Self {
            store,
            in_flight: InFlightSet::new(),
            config,
            view: RwLock::new(ViewCache::default()),
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn in_flight(&self) -> &InFlightSet {
        &self.in_flight
    }

    pub fn config(&self) -> MutatorConfig {
        self.config
    }

    fn cached_items(&self) -> Option<Vec<InventoryItem>> {
        let cache = self.view.read().unwrap_or_else(PoisonError::into_inner);
        cache.listing.as_ref().map(InventoryView::items)
    }

    fn view_generation(&self) -> u64 {
        self.view.read().unwrap_or_else(PoisonError::into_inner).generation
    }

    /// Install a full listing unless the cache changed since `seen`.
    fn replace_view_if_unchanged(&self, seen: u64, items: &[InventoryItem]) -> bool {
        let mut cache = self.view.write().unwrap_or_else(PoisonError::into_inner);
        if cache.generation != seen {
            return false;
        }
        cache.listing = Some(InventoryView::from_items(items.iter().cloned()));
        cache.generation += 1;
        true
    }

    /// Apply an outcome to the cached listing (if loaded) and return it.
    fn apply_to_view(&self, outcome: &MutationOutcome) -> Vec<InventoryItem> {
        let mut cache = self.view.write().unwrap_or_else(PoisonError::into_inner);
        let ViewCache { listing, generation } = &mut *cache;
        match listing.as_mut() {
            Some(v) => {
                v.apply(outcome);
                *generation += 1;
                v.items()
            }
            None => Vec::new(),
        }
    }
}

impl<S> InventoryMutator<S>
where
    S: InventoryStore,
{
    /// Add one unit of `name`, creating it with `initial` units if it does not exist.
    #[instrument(skip(self), fields(op = "add"))]
    pub async fn add(&self, name: &str, initial: Quantity) -> Result<MutationReport, MutationError> {
        let name = ItemName::parse(name)?;
        self.execute(Mutation::add(name, initial)).await
    }

    /// Remove one unit of `name`, deleting it at zero. Absent items are left alone.
    #[instrument(skip(self), fields(op = "remove"))]
    pub async fn remove(&self, name: &str) -> Result<MutationReport, MutationError> {
        let name = ItemName::parse(name)?;
        self.execute(Mutation::remove(name)).await
    }

    /// Delete `name` regardless of its quantity. Absent items are left alone.
    #[instrument(skip(self), fields(op = "delete"))]
    pub async fn delete(&self, name: &str) -> Result<MutationReport, MutationError> {
        let name = ItemName::parse(name)?;
        self.execute(Mutation::delete(name)).await
    }

    /// Current listing.
    ///
    /// In `Full` mode this always re-reads the store; in `Incremental` mode it
    /// serves the cached listing once loaded.
    pub async fn list(&self) -> Result<Vec<InventoryItem>, MutationError> {
        if self.config.refresh == RefreshMode::Incremental {
            if let Some(items) = self.cached_items() {
                return Ok(items);
            }
        }
        self.reconcile().await
    }

    /// Re-read the whole collection and replace the cached listing.
    ///
    /// A snapshot is discarded if another mutation changed the cached listing
    /// while it was being read; the collection is then read again. When that
    /// keeps happening, the cached listing (which already carries those
    /// mutations) is returned as is.
    #[instrument(skip(self))]
    pub async fn reconcile(&self) -> Result<Vec<InventoryItem>, MutationError> {
        for attempt in 1..=RECONCILE_ATTEMPTS {
            let seen = self.view_generation();
            let docs = self.store.list_all().await.inspect_err(|e| {
                warn!(error = %e, "failed to fetch inventory");
            })?;
            let items: Vec<InventoryItem> = docs.into_iter().map(InventoryItem::from).collect();
            if self.replace_view_if_unchanged(seen, &items) {
                debug!(count = items.len(), "inventory listing reloaded");
                return Ok(items);
            }
            debug!(attempt, "inventory listing changed during reload; discarding snapshot");
        }
        Ok(self.cached_items().unwrap_or_default())
    }

    async fn execute(&self, mutation: Mutation) -> Result<MutationReport, MutationError> {
        let name = mutation.name().clone();
        let kind = mutation.kind();

        let _guard = self
            .in_flight
            .try_acquire(&name)
            .ok_or_else(|| MutationError::Busy(name.to_string()))?;

        let (outcome, attempts) = self.apply_with_retry(&mutation).await.inspect_err(|e| {
            warn!(op = %kind, item = %name, error = %e, "inventory mutation failed");
        })?;

        let (items, stale) = self.refresh_after(&outcome).await;

        info!(
            op = %kind,
            item = %name,
            state = ?outcome.state,
            attempts,
            "inventory mutation applied"
        );

        Ok(MutationReport {
            outcome,
            items,
            stale,
            attempts,
        })
    }

    async fn apply_with_retry(&self, mutation: &Mutation) -> Result<(MutationOutcome, u32), MutationError> {
        let retry = self.config.retry;
        let mut attempt = 0;
        loop {
            attempt += 1;
            match self.apply_once(mutation).await {
                Ok(outcome) => return Ok((outcome, attempt)),
                Err(MutationError::Store(e)) if e.is_conflict() && attempt < retry.max_attempts() => {
                    debug!(item = %mutation.name(), attempt, error = %e, "conflict; retrying");
                    tokio::time::sleep(retry.delay_after(attempt)).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn apply_once(&self, mutation: &Mutation) -> Result<MutationOutcome, MutationError> {
        let name = mutation.name();

        // 1) Read current state (the explicit delete does not depend on it)
        let (current, expected) = if mutation.reads_current() {
            let doc = self.store.read(name).await?;
            let revision = doc.as_ref().map_or(Revision::ABSENT, |d| d.revision);
            (doc.map(|d| d.quantity), ExpectedVersion::Exact(revision))
        } else {
            (None, ExpectedVersion::Any)
        };

        // 2) Decide
        let action = plan(mutation, current)?;

        // 3) Apply, conditioned on what was read
        let state = match action {
            StoreAction::Write(quantity) => {
                let doc = self.store.write(name, quantity, expected).await?;
                ItemState::Present(doc.quantity)
            }
            StoreAction::Delete => {
                self.store.delete(name, expected).await?;
                ItemState::Absent
            }
            StoreAction::Unchanged => action.resulting_state(current),
        };

        Ok(MutationOutcome {
            name: name.clone(),
            kind: mutation.kind(),
            state,
        })
    }

    async fn refresh_after(&self, outcome: &MutationOutcome) -> (Vec<InventoryItem>, bool) {
        let loaded = self.cached_items().is_some();
        if self.config.refresh == RefreshMode::Incremental && loaded {
            return (self.apply_to_view(outcome), false);
        }

        match self.reconcile().await {
            Ok(items) => (items, false),
            // The mutation itself succeeded; report it with the last known listing.
            Err(_) => (self.apply_to_view(outcome), true),
        }
    }
}
